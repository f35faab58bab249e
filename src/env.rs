//! The variable environment the compiler type-checks `Reference`s against
//! and the evaluator reads/writes through `VarPlace` (§3, §6). Flat by
//! design — unlike the teacher's `Scope`/`ScopeData` tree (`src/api/scope.rs`),
//! this engine has no block-scoping construct to nest, so one flat map per
//! `parse`/`compile`/`run` cycle is enough.

use std::collections::HashMap;

use crate::value::{Type, Value};

/// Caller-owned variable bindings. The compiler calls `type_of` to resolve
/// `Reference` tokens and reject unknown identifiers; the evaluator calls
/// `get`/`set` to execute `VarPlace` reads and writes.
pub trait Environment {
	fn type_of(&self, name: &str) -> Option<Type>;
	fn get(&self, name: &str) -> Option<Value>;
	fn set(&mut self, name: &str, value: Value);
}

/// A straightforward hash-map-backed `Environment`, suitable both for
/// embedding hosts and for the engine's own tests.
#[derive(Default)]
pub struct MapEnvironment {
	bindings: HashMap<String, Value>,
}

impl MapEnvironment {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
		self.bindings.insert(name.into(), value);
		self
	}
}

impl Environment for MapEnvironment {
	fn type_of(&self, name: &str) -> Option<Type> {
		self.bindings.get(name).map(Value::type_of)
	}

	fn get(&self, name: &str) -> Option<Value> {
		self.bindings.get(name).cloned()
	}

	fn set(&mut self, name: &str, value: Value) {
		self.bindings.insert(name.to_owned(), value);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn round_trips_a_binding() {
		let mut env = MapEnvironment::new().with("x", Value::Int(1));
		assert_eq!(env.get("x").unwrap().type_of(), Type::Primitive(crate::value::PrimitiveType::Int));
		env.set("x", Value::Int(2));
		match env.get("x").unwrap() {
			Value::Int(2) => {},
			other => panic!("unexpected value {other:?}"),
		}
	}

	#[test]
	fn unknown_binding_is_none() {
		let env = MapEnvironment::new();
		assert!(env.type_of("missing").is_none());
	}
}
