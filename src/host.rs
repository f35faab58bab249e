//! The host integration surface (§6 "Host reflection adapter contract").
//!
//! Rust has no runtime reflection, so the `ReflectionAdapter` the compiler
//! consults is a trait the embedding host implements once, by hand, to
//! describe its own types' members, conversions, constructors, and extension
//! methods. The builtin operator table in `builtins.rs` covers the primitive
//! types on its own and never calls into this trait.

use std::rc::Rc;

use crate::error::HostInvocationError;
use crate::value::{FunctionSignature, Type, Value};

/// An opaque host value reachable from the engine only through the
/// `ReflectionAdapter` that described its type.
pub trait HostObject {
	/// The name the host registered this object's type under. Used as the
	/// `Type::Host` discriminant.
	fn type_name(&self) -> &'static str;

	/// Rust has no runtime reflection, so a `HostProperty`/`HostMethod`/
	/// `HostIndexer` implementation that needs to get from the erased
	/// `&dyn HostObject` it's handed back to its concrete backing type
	/// downcasts through this, the same way the host's own reflection data
	/// would look a field up by name in a language with real reflection.
	fn as_any(&self) -> &dyn std::any::Any;
}

/// A host-provided function, reachable as an `Environment` binding and
/// invoked through `RunDelegate`.
pub trait HostFunction {
	fn signature(&self) -> FunctionSignature;
	fn invoke(&self, args: &[Value]) -> Result<Value, HostInvocationError>;
}

/// A property or field on a host type, reached through a `MemberPlace`.
pub trait HostProperty {
	fn name(&self) -> &str;
	fn return_type(&self) -> Type;
	fn is_static(&self) -> bool;
	fn get(&self, receiver: Option<&Value>) -> Result<Value, HostInvocationError>;
	fn set(&self, receiver: Option<&Value>, value: Value) -> Result<(), HostInvocationError>;
}

/// A method on a host type (instance, static, or extension), reached as a
/// call resolved via `get_method`/`get_extension_methods`.
pub trait HostMethod {
	fn name(&self) -> &str;
	fn param_types(&self) -> &[Type];
	fn return_type(&self) -> Type;
	fn is_static(&self) -> bool;
	fn invoke(&self, receiver: Option<&Value>, args: &[Value]) -> Result<Value, HostInvocationError>;
}

/// A constructor for a host type, reached via `new T(args)`.
pub trait HostConstructor {
	fn param_types(&self) -> &[Type];
	fn result_type(&self) -> Type;
	fn invoke(&self, args: &[Value]) -> Result<Value, HostInvocationError>;
}

/// An implicit or explicit conversion from one type to another, either
/// builtin (`builtins.rs`) or host-declared.
pub trait HostConversion {
	fn from_type(&self) -> Type;
	fn to_type(&self) -> Type;
	fn convert(&self, value: &Value) -> Result<Value, HostInvocationError>;
}

/// A multi-argument indexer (`subject[idx1, .., idxn]`) on a host type,
/// including plain arrays.
pub trait HostIndexer {
	fn element_type(&self) -> Type;
	fn arity(&self) -> usize;
	fn get(&self, subject: &Value, indices: &[Value]) -> Result<Value, HostInvocationError>;
	fn set(&self, subject: &Value, indices: &[Value], value: Value) -> Result<(), HostInvocationError>;
}

/// Whether a conversion is inserted automatically by the compiler
/// (`Implicit`) or requires an explicit cast in the source text
/// (`Explicit`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionKind {
	Implicit,
	Explicit,
}

/// A member found on a type by name: either a callable method or a
/// readable/writable property-or-field.
pub enum Member {
	Method(Rc<dyn HostMethod>),
	Property(Rc<dyn HostProperty>),
}

/// The host-provided facility the compiler uses to discover members,
/// conversions, constructors, and extension methods on host types (§6). The
/// evaluator never calls into this trait — only the compiler does, per §2's
/// "used by the compiler only; the evaluator never reflects".
pub trait ReflectionAdapter {
	/// Resolves a bare identifier that isn't a variable to a host type
	/// marker, e.g. for `Math.pi` or `new Point(..)`.
	fn resolve_type_name(&self, name: &str) -> Option<Type>;

	fn get_members(&self, ty: &Type, name: &str, is_static: bool) -> Vec<Member>;

	fn get_method(&self, ty: &Type, name: &str, arg_types: &[Type]) -> Option<Rc<dyn HostMethod>>;

	fn get_constructor(&self, type_name: &str, arg_types: &[Type]) -> Option<Rc<dyn HostConstructor>>;

	fn get_conversions(&self, ty: &Type, kind: ConversionKind) -> Vec<Rc<dyn HostConversion>>;

	fn get_extension_methods(&self, ty: &Type, name: &str) -> Vec<Rc<dyn HostMethod>>;

	/// The declared `Item` indexer for a type, if it has one. Plain arrays
	/// are handled by the engine directly and never reach this.
	fn get_indexer(&self, ty: &Type) -> Option<Rc<dyn HostIndexer>>;
}

/// A `ReflectionAdapter` that knows no host types at all. Useful both as a
/// starting point for a host that only needs primitive operators and
/// environment variables (no custom types, methods, or indexers), and as the
/// fixture the compiler's and evaluator's own unit tests build expressions
/// against.
pub struct NullAdapter;

impl ReflectionAdapter for NullAdapter {
	fn resolve_type_name(&self, _name: &str) -> Option<Type> {
		None
	}

	fn get_members(&self, _ty: &Type, _name: &str, _is_static: bool) -> Vec<Member> {
		Vec::new()
	}

	fn get_method(&self, _ty: &Type, _name: &str, _arg_types: &[Type]) -> Option<Rc<dyn HostMethod>> {
		None
	}

	fn get_constructor(&self, _type_name: &str, _arg_types: &[Type]) -> Option<Rc<dyn HostConstructor>> {
		None
	}

	fn get_conversions(&self, _ty: &Type, _kind: ConversionKind) -> Vec<Rc<dyn HostConversion>> {
		Vec::new()
	}

	fn get_extension_methods(&self, _ty: &Type, _name: &str) -> Vec<Rc<dyn HostMethod>> {
		Vec::new()
	}

	fn get_indexer(&self, _ty: &Type) -> Option<Rc<dyn HostIndexer>> {
		None
	}
}
