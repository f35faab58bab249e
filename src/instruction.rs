//! The postfix instruction stream the compiler lowers a token tree into, and
//! the evaluator runs (§3 "Instruction stream", §4.2, §4.3).

use std::fmt;
use std::rc::Rc;

use crate::error::HostInvocationError;
use crate::host::HostProperty;
use crate::value::{FunctionSignature, Type, Value};

/// Something the evaluator can invoke with a fixed argument count, unifying
/// builtin operators and host methods/functions/constructors/conversions
/// under one call shape for `Instruction::Call`/`Construct`.
pub trait Callable {
	fn invoke(&self, args: &[Value]) -> Result<Value, HostInvocationError>;
}

/// A builtin binary or unary operator, adapted to the `Callable` shape.
#[derive(Clone)]
pub struct BuiltinBinary {
	pub apply: fn(&Value, &Value) -> Value,
}

impl Callable for BuiltinBinary {
	fn invoke(&self, args: &[Value]) -> Result<Value, HostInvocationError> {
		Ok((self.apply)(&args[0], &args[1]))
	}
}

#[derive(Clone)]
pub struct BuiltinUnary {
	pub apply: fn(&Value) -> Value,
}

impl Callable for BuiltinUnary {
	fn invoke(&self, args: &[Value]) -> Result<Value, HostInvocationError> {
		Ok((self.apply)(&args[0]))
	}
}

/// One step of the compiled instruction stream. Each instruction pops
/// whatever operands it needs off the stack (in source order — see
/// `Instruction::Call`'s doc) and pushes its result.
#[derive(Clone)]
pub enum Instruction {
	/// Pushes a constant value (a `Literal` token, or an implicit/explicit
	/// conversion baked into a constant at compile time).
	Push(Value),
	/// Pops `arg_count` values, reversed to source order (`RunDelegate`'s
	/// Open Question resolution in §9 applies here too: the stack pops in
	/// reverse, so the callable always receives arguments left-to-right as
	/// written), and invokes `callable` with them.
	Call { callable: Rc<dyn Callable>, arg_count: usize, result_type: Type },
	/// Pops `arg_count` values (source order, as `Call`) and invokes a host
	/// constructor.
	Construct { callable: Rc<dyn Callable>, arg_count: usize, result_type: Type },
	/// Pops a `Value::Function` off the stack, then pops `arg_count`
	/// arguments (source order) and invokes it.
	RunDelegate { arg_count: usize, result_type: Type },
	/// Pushes a place referring to a variable binding in the `Environment`.
	VarPlace(String),
	/// Pops a subject value, pushes a place referring to one of its members.
	/// The evaluator never reflects (§2), so the resolved property itself —
	/// not just its name — travels with the instruction.
	MemberPlace { name: String, property: Rc<dyn HostProperty> },
	/// Pushes a place referring to a *static* member of a host type — unlike
	/// `MemberPlace`, no subject is popped, since the receiver is the type
	/// itself rather than a value on the stack (§4.2's static-receiver rule).
	StaticMemberPlace { name: String, property: Rc<dyn HostProperty> },
	/// Pops `index_count` index values (source order) then a subject value,
	/// pushes a place referring to the indexed element.
	IndexPlace { index_count: usize, getter: Rc<dyn Callable>, setter: Rc<dyn Callable> },
	/// Pops a value and a place (in that order — the place was pushed first,
	/// so it's deeper in the stack) and writes the value through the place,
	/// leaving the written value on the stack.
	SetOp,
	/// Pops a place, reads its current value, applies `apply` to compute the
	/// new value, writes it back through the same place, and pushes the new
	/// value (prefix increment/decrement semantics — the grammar has no
	/// postfix form).
	IncrementOp { apply: fn(&Value) -> Value },
}

impl fmt::Debug for Instruction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Push(value) => write!(f, "Push({value:?})"),
			Self::Call { arg_count, result_type, .. } => write!(f, "Call(arg_count={arg_count}, result={})", result_type.display_name()),
			Self::Construct { arg_count, result_type, .. } => write!(f, "Construct(arg_count={arg_count}, result={})", result_type.display_name()),
			Self::RunDelegate { arg_count, result_type } => write!(f, "RunDelegate(arg_count={arg_count}, result={})", result_type.display_name()),
			Self::VarPlace(name) => write!(f, "VarPlace({name})"),
			Self::MemberPlace { name, .. } => write!(f, "MemberPlace({name})"),
			Self::StaticMemberPlace { name, .. } => write!(f, "StaticMemberPlace({name})"),
			Self::IndexPlace { index_count, .. } => write!(f, "IndexPlace(index_count={index_count})"),
			Self::SetOp => write!(f, "SetOp"),
			Self::IncrementOp { .. } => write!(f, "IncrementOp"),
		}
	}
}

/// A host function's signature, reported for an `Environment` binding that
/// is itself callable via `RunDelegate`.
#[must_use]
pub fn function_type(params: Vec<Type>, return_type: Type) -> Type {
	Type::Function(Rc::new(FunctionSignature { params, return_type }))
}
