//! Structured errors (§7). Every variant here is named after, and carries the
//! same fields as, the taxonomy in `spec.md` §7. None of these are ever
//! collapsed into a string at the API boundary; `anyhow` is only used
//! internally to wrap host-call failures before they're re-boxed into
//! `HostInvocationFailed`.

use crate::span::Span;
use crate::value::Type;

/// A token produced so far, kept around for `UnexpectedToken`'s "dump of the
/// partial tree" requirement.
#[derive(Debug, Clone)]
pub struct PartialTree(pub Option<crate::token::Token>);

#[derive(Debug)]
pub enum ParserError {
	/// The parse didn't succeed, or succeeded but didn't cover the whole
	/// input. `position` is the furthest byte offset the parser reached.
	UnexpectedToken { position: usize, partial_tree: PartialTree },
}

impl std::fmt::Display for ParserError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::UnexpectedToken { position, .. } => write!(f, "unexpected token at byte offset {position}"),
		}
	}
}

impl std::error::Error for ParserError {}

#[derive(Debug)]
pub enum CompilerError {
	UnknownIdentifier { name: String, position: usize },
	MethodNotFound { name: String, arg_types: Vec<Type> },
	NoExplicitConversion { from: Type, to: Type },
	InvalidAssignmentTarget { position: usize },
	IncrementRequiresPlace { position: usize },
	IncrementRequiresPrimitive { position: usize, found: Type },
	VoidMethodNotSupported { name: String },
}

impl std::fmt::Display for CompilerError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::UnknownIdentifier { name, position } => write!(f, "unknown identifier `{name}` at byte offset {position}"),
			Self::MethodNotFound { name, arg_types } => write!(
				f,
				"no overload of `{name}` found for argument types ({})",
				arg_types.iter().map(Type::display_name).collect::<Vec<_>>().join(", ")
			),
			Self::NoExplicitConversion { from, to } => write!(f, "no conversion from `{}` to `{}`", from.display_name(), to.display_name()),
			Self::InvalidAssignmentTarget { position } => write!(f, "invalid assignment target at byte offset {position}"),
			Self::IncrementRequiresPlace { position } => write!(f, "increment/decrement requires an assignable place at byte offset {position}"),
			Self::IncrementRequiresPrimitive { position, found } => {
				write!(f, "increment/decrement requires a primitive numeric type, found `{}` at byte offset {position}", found.display_name())
			},
			Self::VoidMethodNotSupported { name } => write!(f, "method `{name}` returns no value and cannot be used as an expression"),
		}
	}
}

impl std::error::Error for CompilerError {}

/// The underlying failure of a host method/function/conversion/constructor
/// invocation, carried as the `cause` of `EvaluatorError::HostInvocationFailed`.
#[derive(Debug)]
pub struct HostInvocationError(pub anyhow::Error);

impl std::fmt::Display for HostInvocationError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl std::error::Error for HostInvocationError {}

impl<E> From<E> for HostInvocationError
where
	E: Into<anyhow::Error>,
{
	fn from(error: E) -> Self {
		Self(error.into())
	}
}

#[derive(Debug)]
pub enum EvaluatorError {
	/// A `SetOp` found something other than a place where a place was
	/// required. Also returned for `++`/`--` at runtime, defensively — the
	/// compiler should have already rejected these at compile time.
	InvalidLeftSide { instruction_index: usize },
	HostInvocationFailed { instruction_index: usize, cause: HostInvocationError },
}

impl std::fmt::Display for EvaluatorError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::InvalidLeftSide { instruction_index } => write!(f, "expected an assignable place at instruction {instruction_index}"),
			Self::HostInvocationFailed { instruction_index, cause } => write!(f, "host invocation failed at instruction {instruction_index}: {cause}"),
		}
	}
}

impl std::error::Error for EvaluatorError {}
