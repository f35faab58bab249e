//! A small in-memory host used by the integration suite: one reflection
//! adapter plus the handful of host types and functions the end-to-end
//! scenarios need (a field-bearing object, a growable string array, a
//! stateless 2D indexer, two numeric free functions, and a `Math` static
//! type reachable only through its registered type name).

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use flowscript::error::HostInvocationError;
use flowscript::host::{ConversionKind, HostConstructor, HostConversion, HostFunction, HostIndexer, HostMethod, HostObject, HostProperty, Member, ReflectionAdapter};
use flowscript::value::{FunctionSignature, PrimitiveType, Type, Value};

/// A host object with a single mutable `int` field, reached as `.field`.
pub struct TestObject {
	pub field: Cell<i32>,
}

impl TestObject {
	#[must_use]
	pub fn new(field: i32) -> Rc<Self> {
		Rc::new(Self { field: Cell::new(field) })
	}
}

impl HostObject for TestObject {
	fn type_name(&self) -> &'static str {
		"TestObject"
	}

	fn as_any(&self) -> &dyn std::any::Any {
		self
	}
}

struct FieldProperty;

impl HostProperty for FieldProperty {
	fn name(&self) -> &str {
		"field"
	}

	fn return_type(&self) -> Type {
		Type::Primitive(PrimitiveType::Int)
	}

	fn is_static(&self) -> bool {
		false
	}

	fn get(&self, receiver: Option<&Value>) -> Result<Value, HostInvocationError> {
		let object = downcast::<TestObject>(receiver)?;
		Ok(Value::Int(object.field.get()))
	}

	fn set(&self, receiver: Option<&Value>, value: Value) -> Result<(), HostInvocationError> {
		let object = downcast::<TestObject>(receiver)?;
		let Value::Int(new_value) = value else {
			return Err(anyhow::anyhow!("TestObject.field expects an Int, found {:?}", value.type_of()).into());
		};
		object.field.set(new_value);
		Ok(())
	}
}

/// A growable host array of strings, reached as `test[i]` (read and write).
pub struct StringArray {
	pub items: RefCell<Vec<String>>,
}

impl StringArray {
	#[must_use]
	pub fn new(items: Vec<String>) -> Rc<Self> {
		Rc::new(Self { items: RefCell::new(items) })
	}
}

impl HostObject for StringArray {
	fn type_name(&self) -> &'static str {
		"StringArray"
	}

	fn as_any(&self) -> &dyn std::any::Any {
		self
	}
}

struct StringArrayIndexer;

impl HostIndexer for StringArrayIndexer {
	fn element_type(&self) -> Type {
		Type::Primitive(PrimitiveType::Str)
	}

	fn arity(&self) -> usize {
		1
	}

	fn get(&self, subject: &Value, indices: &[Value]) -> Result<Value, HostInvocationError> {
		let array = downcast::<StringArray>(Some(subject))?;
		let index = index_of(&indices[0])?;
		let items = array.items.borrow();
		let item = items.get(index).ok_or_else(|| anyhow::anyhow!("index {index} out of bounds"))?;
		Ok(Value::string(item.clone()))
	}

	fn set(&self, subject: &Value, indices: &[Value], value: Value) -> Result<(), HostInvocationError> {
		let array = downcast::<StringArray>(Some(subject))?;
		let index = index_of(&indices[0])?;
		let Value::Str(new_value) = value else {
			return Err(anyhow::anyhow!("StringArray element expects a Str, found {:?}", value.type_of()).into());
		};
		let mut items = array.items.borrow_mut();
		let slot = items.get_mut(index).ok_or_else(|| anyhow::anyhow!("index {index} out of bounds"))?;
		*slot = (*new_value).clone();
		Ok(())
	}
}

/// A stateless 2D indexer: `grid[a, b]` yields the concatenation of `a` and
/// `b` (in the order passed) as a string. Needs no backing storage at all —
/// every cell is computed directly from its own indices.
pub struct Grid;

impl Grid {
	#[must_use]
	pub fn new() -> Rc<Self> {
		Rc::new(Self)
	}
}

impl HostObject for Grid {
	fn type_name(&self) -> &'static str {
		"Grid"
	}

	fn as_any(&self) -> &dyn std::any::Any {
		self
	}
}

struct GridIndexer;

impl HostIndexer for GridIndexer {
	fn element_type(&self) -> Type {
		Type::Primitive(PrimitiveType::Str)
	}

	fn arity(&self) -> usize {
		2
	}

	fn get(&self, _subject: &Value, indices: &[Value]) -> Result<Value, HostInvocationError> {
		let mut result = String::new();
		for index in indices {
			result.push_str(&index_of(index)?.to_string());
		}
		Ok(Value::string(result))
	}

	fn set(&self, _subject: &Value, _indices: &[Value], _value: Value) -> Result<(), HostInvocationError> {
		Err(anyhow::anyhow!("Grid is read-only").into())
	}
}

/// A host object with a single `void`-returning method, used to exercise
/// `VoidMethodNotSupported`.
pub struct Logger;

impl Logger {
	#[must_use]
	pub fn new() -> Rc<Self> {
		Rc::new(Self)
	}
}

impl HostObject for Logger {
	fn type_name(&self) -> &'static str {
		"Logger"
	}

	fn as_any(&self) -> &dyn std::any::Any {
		self
	}
}

struct LogMethod;

impl HostMethod for LogMethod {
	fn name(&self) -> &str {
		"log"
	}

	fn param_types(&self) -> &[Type] {
		&[]
	}

	fn return_type(&self) -> Type {
		Type::Void
	}

	fn is_static(&self) -> bool {
		false
	}

	fn invoke(&self, _receiver: Option<&Value>, _args: &[Value]) -> Result<Value, HostInvocationError> {
		Ok(Value::Void)
	}
}

/// A stateless `Math` host type, reached only as a static receiver (`Math.pi`,
/// `Math.max(a, b)`) — it is never bound as an environment variable, so it is
/// reachable exclusively through `ReflectionAdapter::resolve_type_name`.
struct MathPi;

impl HostProperty for MathPi {
	fn name(&self) -> &str {
		"pi"
	}

	fn return_type(&self) -> Type {
		Type::Primitive(PrimitiveType::Double)
	}

	fn is_static(&self) -> bool {
		true
	}

	fn get(&self, _receiver: Option<&Value>) -> Result<Value, HostInvocationError> {
		Ok(Value::Double(std::f64::consts::PI))
	}

	fn set(&self, _receiver: Option<&Value>, _value: Value) -> Result<(), HostInvocationError> {
		Err(anyhow::anyhow!("Math.pi is read-only").into())
	}
}

struct MathMaxMethod;

impl HostMethod for MathMaxMethod {
	fn name(&self) -> &str {
		"max"
	}

	fn param_types(&self) -> &[Type] {
		const PARAMS: [Type; 2] = [Type::Primitive(PrimitiveType::Double), Type::Primitive(PrimitiveType::Double)];
		&PARAMS
	}

	fn return_type(&self) -> Type {
		Type::Primitive(PrimitiveType::Double)
	}

	fn is_static(&self) -> bool {
		true
	}

	fn invoke(&self, _receiver: Option<&Value>, args: &[Value]) -> Result<Value, HostInvocationError> {
		let (Value::Double(a), Value::Double(b)) = (&args[0], &args[1]) else {
			return Err(anyhow::anyhow!("Math.max expects two Doubles").into());
		};
		Ok(Value::Double(a.max(*b)))
	}
}

fn index_of(value: &Value) -> Result<usize, HostInvocationError> {
	match value {
		Value::Int(index) => usize::try_from(*index).map_err(|_| anyhow::anyhow!("negative index {index}").into()),
		other => Err(anyhow::anyhow!("expected an Int index, found {:?}", other.type_of()).into()),
	}
}

fn downcast<T: 'static>(receiver: Option<&Value>) -> Result<&T, HostInvocationError> {
	match receiver {
		Some(Value::Host(object)) => object.as_any().downcast_ref::<T>().ok_or_else(|| anyhow::anyhow!("receiver is the wrong host type").into()),
		_ => Err(anyhow::anyhow!("expected a host receiver").into()),
	}
}

pub struct MaxFn;

impl HostFunction for MaxFn {
	fn signature(&self) -> FunctionSignature {
		FunctionSignature { params: vec![Type::Primitive(PrimitiveType::Int), Type::Primitive(PrimitiveType::Int)], return_type: Type::Primitive(PrimitiveType::Int) }
	}

	fn invoke(&self, args: &[Value]) -> Result<Value, HostInvocationError> {
		let (Value::Int(a), Value::Int(b)) = (&args[0], &args[1]) else {
			return Err(anyhow::anyhow!("max expects two Ints").into());
		};
		Ok(Value::Int(*a.max(b)))
	}
}

pub struct AbsFn;

impl HostFunction for AbsFn {
	fn signature(&self) -> FunctionSignature {
		FunctionSignature { params: vec![Type::Primitive(PrimitiveType::Int)], return_type: Type::Primitive(PrimitiveType::Int) }
	}

	fn invoke(&self, args: &[Value]) -> Result<Value, HostInvocationError> {
		let Value::Int(a) = &args[0] else {
			return Err(anyhow::anyhow!("abs expects an Int").into());
		};
		Ok(Value::Int(a.abs()))
	}
}

/// The `ReflectionAdapter` backing all of this module's host types. Stateless
/// (every method dispatches purely on the type/name/arity it's asked about),
/// so one instance serves every test.
pub struct MockAdapter;

impl ReflectionAdapter for MockAdapter {
	fn resolve_type_name(&self, name: &str) -> Option<Type> {
		match name {
			"Math" => Some(Type::Host("Math")),
			_ => None,
		}
	}

	fn get_members(&self, ty: &Type, name: &str, is_static: bool) -> Vec<Member> {
		if is_static {
			return match (ty, name) {
				(Type::Host("Math"), "pi") => vec![Member::Property(Rc::new(MathPi))],
				_ => Vec::new(),
			};
		}
		match (ty, name) {
			(Type::Host("TestObject"), "field") => vec![Member::Property(Rc::new(FieldProperty))],
			(Type::Host("Logger"), "log") => vec![Member::Method(Rc::new(LogMethod))],
			_ => Vec::new(),
		}
	}

	fn get_method(&self, ty: &Type, name: &str, arg_types: &[Type]) -> Option<Rc<dyn HostMethod>> {
		match (ty, name) {
			(Type::Host("Logger"), "log") if arg_types.is_empty() => Some(Rc::new(LogMethod)),
			(Type::Host("Math"), "max")
				if matches!(arg_types, [Type::Primitive(PrimitiveType::Double), Type::Primitive(PrimitiveType::Double)]) =>
			{
				Some(Rc::new(MathMaxMethod))
			},
			_ => None,
		}
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

	fn get_indexer(&self, ty: &Type) -> Option<Rc<dyn HostIndexer>> {
		match ty {
			Type::Host("StringArray") => Some(Rc::new(StringArrayIndexer)),
			Type::Host("Grid") => Some(Rc::new(GridIndexer)),
			_ => None,
		}
	}
}
