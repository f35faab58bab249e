//! The builtin operator and conversion tables (§4.4). Looked up by the
//! compiler before it ever asks the host's `ReflectionAdapter` anything —
//! primitive arithmetic, comparison, and conversions never touch host code.
//!
//! Keyed the way the host's own builtin dispatch table is (`src/builtin.rs`
//! in the teacher): a `phf::Map` from a compile-time string key to an entry
//! holding a result type and a function pointer. `phf` can't key on tuples of
//! enum variants directly, so the key is the lexeme and operand type names
//! joined with `|`.

use crate::value::{PrimitiveType, Value};

/// A resolved binary builtin: the type the operation produces, and the
/// function that actually computes it.
pub struct BinaryEntry {
	pub result: PrimitiveType,
	pub apply: fn(&Value, &Value) -> Value,
}

/// A resolved unary or increment/decrement builtin.
pub struct UnaryEntry {
	pub result: PrimitiveType,
	pub apply: fn(&Value) -> Value,
}

/// A resolved conversion: result type plus the function that performs it.
pub struct ConversionEntry {
	pub to: PrimitiveType,
	pub convert: fn(&Value) -> Value,
}

static BINARY_OPERATORS: phf::Map<&'static str, BinaryEntry> = phf::phf_map! {
	"+|Int|Int" => BinaryEntry { result: PrimitiveType::Int, apply: |a, b| Value::Int(as_int(a).wrapping_add(as_int(b))) },
	"-|Int|Int" => BinaryEntry { result: PrimitiveType::Int, apply: |a, b| Value::Int(as_int(a).wrapping_sub(as_int(b))) },
	"*|Int|Int" => BinaryEntry { result: PrimitiveType::Int, apply: |a, b| Value::Int(as_int(a).wrapping_mul(as_int(b))) },
	"/|Int|Int" => BinaryEntry { result: PrimitiveType::Int, apply: |a, b| Value::Int(as_int(a) / as_int(b)) },
	"%|Int|Int" => BinaryEntry { result: PrimitiveType::Int, apply: |a, b| Value::Int(as_int(a) % as_int(b)) },
	"<|Int|Int" => BinaryEntry { result: PrimitiveType::Bool, apply: |a, b| Value::Bool(as_int(a) < as_int(b)) },
	"<=|Int|Int" => BinaryEntry { result: PrimitiveType::Bool, apply: |a, b| Value::Bool(as_int(a) <= as_int(b)) },
	">|Int|Int" => BinaryEntry { result: PrimitiveType::Bool, apply: |a, b| Value::Bool(as_int(a) > as_int(b)) },
	">=|Int|Int" => BinaryEntry { result: PrimitiveType::Bool, apply: |a, b| Value::Bool(as_int(a) >= as_int(b)) },
	"==|Int|Int" => BinaryEntry { result: PrimitiveType::Bool, apply: |a, b| Value::Bool(as_int(a) == as_int(b)) },
	"!=|Int|Int" => BinaryEntry { result: PrimitiveType::Bool, apply: |a, b| Value::Bool(as_int(a) != as_int(b)) },

	"+|Long|Long" => BinaryEntry { result: PrimitiveType::Long, apply: |a, b| Value::Long(as_long(a).wrapping_add(as_long(b))) },
	"-|Long|Long" => BinaryEntry { result: PrimitiveType::Long, apply: |a, b| Value::Long(as_long(a).wrapping_sub(as_long(b))) },
	"*|Long|Long" => BinaryEntry { result: PrimitiveType::Long, apply: |a, b| Value::Long(as_long(a).wrapping_mul(as_long(b))) },
	"/|Long|Long" => BinaryEntry { result: PrimitiveType::Long, apply: |a, b| Value::Long(as_long(a) / as_long(b)) },
	"%|Long|Long" => BinaryEntry { result: PrimitiveType::Long, apply: |a, b| Value::Long(as_long(a) % as_long(b)) },
	"<|Long|Long" => BinaryEntry { result: PrimitiveType::Bool, apply: |a, b| Value::Bool(as_long(a) < as_long(b)) },
	"<=|Long|Long" => BinaryEntry { result: PrimitiveType::Bool, apply: |a, b| Value::Bool(as_long(a) <= as_long(b)) },
	">|Long|Long" => BinaryEntry { result: PrimitiveType::Bool, apply: |a, b| Value::Bool(as_long(a) > as_long(b)) },
	">=|Long|Long" => BinaryEntry { result: PrimitiveType::Bool, apply: |a, b| Value::Bool(as_long(a) >= as_long(b)) },
	"==|Long|Long" => BinaryEntry { result: PrimitiveType::Bool, apply: |a, b| Value::Bool(as_long(a) == as_long(b)) },
	"!=|Long|Long" => BinaryEntry { result: PrimitiveType::Bool, apply: |a, b| Value::Bool(as_long(a) != as_long(b)) },

	"+|Float|Float" => BinaryEntry { result: PrimitiveType::Float, apply: |a, b| Value::Float(as_float(a) + as_float(b)) },
	"-|Float|Float" => BinaryEntry { result: PrimitiveType::Float, apply: |a, b| Value::Float(as_float(a) - as_float(b)) },
	"*|Float|Float" => BinaryEntry { result: PrimitiveType::Float, apply: |a, b| Value::Float(as_float(a) * as_float(b)) },
	"/|Float|Float" => BinaryEntry { result: PrimitiveType::Float, apply: |a, b| Value::Float(as_float(a) / as_float(b)) },
	"%|Float|Float" => BinaryEntry { result: PrimitiveType::Float, apply: |a, b| Value::Float(as_float(a) % as_float(b)) },
	"<|Float|Float" => BinaryEntry { result: PrimitiveType::Bool, apply: |a, b| Value::Bool(as_float(a) < as_float(b)) },
	"<=|Float|Float" => BinaryEntry { result: PrimitiveType::Bool, apply: |a, b| Value::Bool(as_float(a) <= as_float(b)) },
	">|Float|Float" => BinaryEntry { result: PrimitiveType::Bool, apply: |a, b| Value::Bool(as_float(a) > as_float(b)) },
	">=|Float|Float" => BinaryEntry { result: PrimitiveType::Bool, apply: |a, b| Value::Bool(as_float(a) >= as_float(b)) },
	"==|Float|Float" => BinaryEntry { result: PrimitiveType::Bool, apply: |a, b| Value::Bool(as_float(a) == as_float(b)) },
	"!=|Float|Float" => BinaryEntry { result: PrimitiveType::Bool, apply: |a, b| Value::Bool(as_float(a) != as_float(b)) },

	"+|Double|Double" => BinaryEntry { result: PrimitiveType::Double, apply: |a, b| Value::Double(as_double(a) + as_double(b)) },
	"-|Double|Double" => BinaryEntry { result: PrimitiveType::Double, apply: |a, b| Value::Double(as_double(a) - as_double(b)) },
	"*|Double|Double" => BinaryEntry { result: PrimitiveType::Double, apply: |a, b| Value::Double(as_double(a) * as_double(b)) },
	"/|Double|Double" => BinaryEntry { result: PrimitiveType::Double, apply: |a, b| Value::Double(as_double(a) / as_double(b)) },
	"%|Double|Double" => BinaryEntry { result: PrimitiveType::Double, apply: |a, b| Value::Double(as_double(a) % as_double(b)) },
	"<|Double|Double" => BinaryEntry { result: PrimitiveType::Bool, apply: |a, b| Value::Bool(as_double(a) < as_double(b)) },
	"<=|Double|Double" => BinaryEntry { result: PrimitiveType::Bool, apply: |a, b| Value::Bool(as_double(a) <= as_double(b)) },
	">|Double|Double" => BinaryEntry { result: PrimitiveType::Bool, apply: |a, b| Value::Bool(as_double(a) > as_double(b)) },
	">=|Double|Double" => BinaryEntry { result: PrimitiveType::Bool, apply: |a, b| Value::Bool(as_double(a) >= as_double(b)) },
	"==|Double|Double" => BinaryEntry { result: PrimitiveType::Bool, apply: |a, b| Value::Bool(as_double(a) == as_double(b)) },
	"!=|Double|Double" => BinaryEntry { result: PrimitiveType::Bool, apply: |a, b| Value::Bool(as_double(a) != as_double(b)) },

	"&&|Bool|Bool" => BinaryEntry { result: PrimitiveType::Bool, apply: |a, b| Value::Bool(as_bool(a) && as_bool(b)) },
	"|||Bool|Bool" => BinaryEntry { result: PrimitiveType::Bool, apply: |a, b| Value::Bool(as_bool(a) || as_bool(b)) },
	"==|Bool|Bool" => BinaryEntry { result: PrimitiveType::Bool, apply: |a, b| Value::Bool(as_bool(a) == as_bool(b)) },
	"!=|Bool|Bool" => BinaryEntry { result: PrimitiveType::Bool, apply: |a, b| Value::Bool(as_bool(a) != as_bool(b)) },

	"==|Char|Char" => BinaryEntry { result: PrimitiveType::Bool, apply: |a, b| Value::Bool(as_char(a) == as_char(b)) },
	"!=|Char|Char" => BinaryEntry { result: PrimitiveType::Bool, apply: |a, b| Value::Bool(as_char(a) != as_char(b)) },
	"<|Char|Char" => BinaryEntry { result: PrimitiveType::Bool, apply: |a, b| Value::Bool(as_char(a) < as_char(b)) },
	"<=|Char|Char" => BinaryEntry { result: PrimitiveType::Bool, apply: |a, b| Value::Bool(as_char(a) <= as_char(b)) },
	">|Char|Char" => BinaryEntry { result: PrimitiveType::Bool, apply: |a, b| Value::Bool(as_char(a) > as_char(b)) },
	">=|Char|Char" => BinaryEntry { result: PrimitiveType::Bool, apply: |a, b| Value::Bool(as_char(a) >= as_char(b)) },

	"+|Str|Str" => BinaryEntry { result: PrimitiveType::Str, apply: |a, b| Value::string(format!("{}{}", as_str(a), as_str(b))) },
	"==|Str|Str" => BinaryEntry { result: PrimitiveType::Bool, apply: |a, b| Value::Bool(as_str(a) == as_str(b)) },
	"!=|Str|Str" => BinaryEntry { result: PrimitiveType::Bool, apply: |a, b| Value::Bool(as_str(a) != as_str(b)) },
	"<|Str|Str" => BinaryEntry { result: PrimitiveType::Bool, apply: |a, b| Value::Bool(as_str(a) < as_str(b)) },
	"<=|Str|Str" => BinaryEntry { result: PrimitiveType::Bool, apply: |a, b| Value::Bool(as_str(a) <= as_str(b)) },
	">|Str|Str" => BinaryEntry { result: PrimitiveType::Bool, apply: |a, b| Value::Bool(as_str(a) > as_str(b)) },
	">=|Str|Str" => BinaryEntry { result: PrimitiveType::Bool, apply: |a, b| Value::Bool(as_str(a) >= as_str(b)) },
};

static UNARY_OPERATORS: phf::Map<&'static str, UnaryEntry> = phf::phf_map! {
	"-|Int" => UnaryEntry { result: PrimitiveType::Int, apply: |a| Value::Int(-as_int(a)) },
	"-|Long" => UnaryEntry { result: PrimitiveType::Long, apply: |a| Value::Long(-as_long(a)) },
	"-|Float" => UnaryEntry { result: PrimitiveType::Float, apply: |a| Value::Float(-as_float(a)) },
	"-|Double" => UnaryEntry { result: PrimitiveType::Double, apply: |a| Value::Double(-as_double(a)) },
	"!|Bool" => UnaryEntry { result: PrimitiveType::Bool, apply: |a| Value::Bool(!as_bool(a)) },

	"++|Int" => UnaryEntry { result: PrimitiveType::Int, apply: |a| Value::Int(as_int(a).wrapping_add(1)) },
	"--|Int" => UnaryEntry { result: PrimitiveType::Int, apply: |a| Value::Int(as_int(a).wrapping_sub(1)) },
	"++|Long" => UnaryEntry { result: PrimitiveType::Long, apply: |a| Value::Long(as_long(a).wrapping_add(1)) },
	"--|Long" => UnaryEntry { result: PrimitiveType::Long, apply: |a| Value::Long(as_long(a).wrapping_sub(1)) },
	"++|Float" => UnaryEntry { result: PrimitiveType::Float, apply: |a| Value::Float(as_float(a) + 1.0) },
	"--|Float" => UnaryEntry { result: PrimitiveType::Float, apply: |a| Value::Float(as_float(a) - 1.0) },
	"++|Double" => UnaryEntry { result: PrimitiveType::Double, apply: |a| Value::Double(as_double(a) + 1.0) },
	"--|Double" => UnaryEntry { result: PrimitiveType::Double, apply: |a| Value::Double(as_double(a) - 1.0) },
};

/// Conversions inserted automatically by the compiler's cartesian search.
static IMPLICIT_CONVERSIONS: phf::Map<&'static str, ConversionEntry> = phf::phf_map! {
	"Int|Long" => ConversionEntry { to: PrimitiveType::Long, convert: |v| Value::Long(i64::from(as_int(v))) },
	"Int|Float" => ConversionEntry { to: PrimitiveType::Float, convert: |v| Value::Float(as_int(v) as f32) },
	"Int|Double" => ConversionEntry { to: PrimitiveType::Double, convert: |v| Value::Double(f64::from(as_int(v))) },
	"Long|Float" => ConversionEntry { to: PrimitiveType::Float, convert: |v| Value::Float(as_long(v) as f32) },
	"Long|Double" => ConversionEntry { to: PrimitiveType::Double, convert: |v| Value::Double(as_long(v) as f64) },
	"Float|Double" => ConversionEntry { to: PrimitiveType::Double, convert: |v| Value::Double(f64::from(as_float(v))) },
	"Char|Int" => ConversionEntry { to: PrimitiveType::Int, convert: |v| Value::Int(as_char(v) as i32) },
	"Int|Str" => ConversionEntry { to: PrimitiveType::Str, convert: |v| Value::string(as_int(v).to_string()) },
	"Long|Str" => ConversionEntry { to: PrimitiveType::Str, convert: |v| Value::string(as_long(v).to_string()) },
	"Float|Str" => ConversionEntry { to: PrimitiveType::Str, convert: |v| Value::string(as_float(v).to_string()) },
	"Double|Str" => ConversionEntry { to: PrimitiveType::Str, convert: |v| Value::string(as_double(v).to_string()) },
	"Bool|Str" => ConversionEntry { to: PrimitiveType::Str, convert: |v| Value::string(as_bool(v).to_string()) },
	"Char|Str" => ConversionEntry { to: PrimitiveType::Str, convert: |v| Value::string(as_char(v).to_string()) },
};

/// Conversions that require an explicit `(T)value` cast in source text.
static EXPLICIT_CONVERSIONS: phf::Map<&'static str, ConversionEntry> = phf::phf_map! {
	"Double|Float" => ConversionEntry { to: PrimitiveType::Float, convert: |v| Value::Float(as_double(v) as f32) },
	"Float|Int" => ConversionEntry { to: PrimitiveType::Int, convert: |v| Value::Int(as_float(v) as i32) },
	"Double|Int" => ConversionEntry { to: PrimitiveType::Int, convert: |v| Value::Int(as_double(v) as i32) },
	"Long|Int" => ConversionEntry { to: PrimitiveType::Int, convert: |v| Value::Int(as_long(v) as i32) },
	"Double|Long" => ConversionEntry { to: PrimitiveType::Long, convert: |v| Value::Long(as_double(v) as i64) },
	"Float|Long" => ConversionEntry { to: PrimitiveType::Long, convert: |v| Value::Long(as_float(v) as i64) },
	"Int|Char" => ConversionEntry { to: PrimitiveType::Char, convert: |v| Value::Char(char::from_u32(as_int(v) as u32).unwrap_or('\u{FFFD}')) },
};

fn as_int(value: &Value) -> i32 {
	match value {
		Value::Int(v) => *v,
		_ => unreachable!("compiler only emits this operator over the type it matched"),
	}
}

fn as_long(value: &Value) -> i64 {
	match value {
		Value::Long(v) => *v,
		_ => unreachable!("compiler only emits this operator over the type it matched"),
	}
}

fn as_float(value: &Value) -> f32 {
	match value {
		Value::Float(v) => *v,
		_ => unreachable!("compiler only emits this operator over the type it matched"),
	}
}

fn as_double(value: &Value) -> f64 {
	match value {
		Value::Double(v) => *v,
		_ => unreachable!("compiler only emits this operator over the type it matched"),
	}
}

fn as_bool(value: &Value) -> bool {
	match value {
		Value::Bool(v) => *v,
		_ => unreachable!("compiler only emits this operator over the type it matched"),
	}
}

fn as_char(value: &Value) -> char {
	match value {
		Value::Char(v) => *v,
		_ => unreachable!("compiler only emits this operator over the type it matched"),
	}
}

fn as_str(value: &Value) -> &str {
	match value {
		Value::Str(v) => v,
		_ => unreachable!("compiler only emits this operator over the type it matched"),
	}
}

fn key2(op: &str, lhs: PrimitiveType, rhs: PrimitiveType) -> String {
	format!("{op}|{}|{}", lhs.name(), rhs.name())
}

fn key1(op: &str, ty: PrimitiveType) -> String {
	format!("{op}|{}", ty.name())
}

fn conversion_key(from: PrimitiveType, to: PrimitiveType) -> String {
	format!("{}|{}", from.name(), to.name())
}

/// Looks up a binary builtin by lexeme and exact operand types (§4.4's first
/// resolution step, before any host or conversion search).
#[must_use]
pub fn lookup_binary(op: &str, lhs: PrimitiveType, rhs: PrimitiveType) -> Option<&'static BinaryEntry> {
	BINARY_OPERATORS.get(key2(op, lhs, rhs).as_str())
}

#[must_use]
pub fn lookup_unary(op: &str, operand: PrimitiveType) -> Option<&'static UnaryEntry> {
	UNARY_OPERATORS.get(key1(op, operand).as_str())
}

#[must_use]
pub fn lookup_implicit_conversion(from: PrimitiveType, to: PrimitiveType) -> Option<&'static ConversionEntry> {
	IMPLICIT_CONVERSIONS.get(conversion_key(from, to).as_str())
}

#[must_use]
pub fn lookup_explicit_conversion(from: PrimitiveType, to: PrimitiveType) -> Option<&'static ConversionEntry> {
	EXPLICIT_CONVERSIONS.get(conversion_key(from, to).as_str())
}

/// All primitive types reachable from `from` by a single implicit
/// conversion, `from` itself first — used by the compiler's cartesian
/// conversion search (§4.4), which tries the identity conversion before any
/// real one.
#[must_use]
pub fn implicit_conversion_candidates(from: PrimitiveType) -> Vec<PrimitiveType> {
	let mut candidates = vec![from];
	for to in ALL_PRIMITIVES {
		if *to != from && lookup_implicit_conversion(from, *to).is_some() {
			candidates.push(*to);
		}
	}
	candidates
}

const ALL_PRIMITIVES: &[PrimitiveType] =
	&[PrimitiveType::Int, PrimitiveType::Long, PrimitiveType::Float, PrimitiveType::Double, PrimitiveType::Bool, PrimitiveType::Char, PrimitiveType::Str];

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn finds_int_addition() {
		let entry = lookup_binary("+", PrimitiveType::Int, PrimitiveType::Int).unwrap();
		match (entry.apply)(&Value::Int(2), &Value::Int(3)) {
			Value::Int(5) => {},
			other => panic!("unexpected result {other:?}"),
		}
	}

	#[test]
	fn string_concatenation_builtin() {
		let entry = lookup_binary("+", PrimitiveType::Str, PrimitiveType::Str).unwrap();
		match (entry.apply)(&Value::string("a"), &Value::string("b")) {
			Value::Str(s) => assert_eq!(*s, "ab"),
			other => panic!("unexpected result {other:?}"),
		}
	}

	#[test]
	fn int_to_double_is_implicit() {
		assert!(lookup_implicit_conversion(PrimitiveType::Int, PrimitiveType::Double).is_some());
		assert!(lookup_implicit_conversion(PrimitiveType::Double, PrimitiveType::Int).is_none());
	}

	#[test]
	fn double_to_int_is_explicit_only() {
		assert!(lookup_explicit_conversion(PrimitiveType::Double, PrimitiveType::Int).is_some());
		assert!(lookup_implicit_conversion(PrimitiveType::Double, PrimitiveType::Int).is_none());
	}

	#[test]
	fn conversion_candidates_include_identity_first() {
		let candidates = implicit_conversion_candidates(PrimitiveType::Int);
		assert_eq!(candidates[0], PrimitiveType::Int);
		assert!(candidates.contains(&PrimitiveType::Double));
	}
}
