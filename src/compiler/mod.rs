//! Lowers a token tree into a postfix instruction stream (§4.2). Method
//! resolution (§4.4) is the compiler's only real job beyond tree-walking: an
//! exact match against the builtin operator table first, then an exact host
//! `ReflectionAdapter` match, then a cartesian implicit-conversion search over
//! the operand types (identity-first, so an exact match is always preferred
//! over a widened one), and only then `CompilerError::MethodNotFound`.
//!
//! The evaluator never reflects (§2) — every place and call instruction this
//! module emits carries everything the evaluator needs (a resolved
//! `HostProperty`, `HostMethod`, or function pointer) rather than a name to
//! look up again at run time.

use std::rc::Rc;

use crate::builtins;
use crate::env::Environment;
use crate::error::{CompilerError, HostInvocationError};
use crate::host::{ConversionKind, HostConstructor, HostIndexer, HostMethod, HostProperty, Member, ReflectionAdapter};
use crate::instruction::{BuiltinBinary, BuiltinUnary, Callable, Instruction};
use crate::token::{Token, TokenKind};
use crate::value::{PrimitiveType, Type, Value};

/// Lowers `token` (the root of a `parse`d tree) into its static type and the
/// instruction stream that computes it (§6 `compile(token) -> (Type,
/// Vec<Instruction>) | CompilerError`).
pub fn compile(token: &Token, source: &str, env: &dyn Environment, adapter: &dyn ReflectionAdapter) -> Result<(Type, Vec<Instruction>), CompilerError> {
	compile_node(token, source, env, adapter)
}

fn compile_node(token: &Token, source: &str, env: &dyn Environment, adapter: &dyn ReflectionAdapter) -> Result<(Type, Vec<Instruction>), CompilerError> {
	match token.kind {
		TokenKind::Block => compile_chain(&token.children, source, env, adapter),
		TokenKind::Literal => {
			let value = token.literal_value().expect("Literal token always carries a value").clone();
			let ty = value.type_of();
			Ok((ty, vec![Instruction::Push(value)]))
		},
		TokenKind::Reference => {
			let name = token.name_value().expect("Reference token always carries a name");
			if let Some(ty) = env.type_of(name) {
				return Ok((ty, vec![Instruction::VarPlace(name.to_owned())]));
			}
			// Not a variable: maybe `name` names a registered host type, in
			// which case it's a static receiver for a following
			// MemberRef/call (§4.2's Reference lowering rule) rather than a
			// value -- no instruction is emitted for the marker itself.
			if let Some(target) = adapter.resolve_type_name(name) {
				return Ok((Type::TypeRef(Box::new(target)), Vec::new()));
			}
			Err(CompilerError::UnknownIdentifier { name: name.to_owned(), position: token.span.start })
		},
		TokenKind::Unary => {
			let (operand_ty, mut instrs) = compile_node(&token.children[0], source, env, adapter)?;
			let op = token.lexeme(source);
			let (result_ty, callable) = resolve_unary(op, &operand_ty, adapter)?;
			instrs.push(Instruction::Call { callable, arg_count: 1, result_type: result_ty.clone() });
			Ok((result_ty, instrs))
		},
		TokenKind::Increment => {
			let (operand_ty, mut instrs) = compile_node(&token.children[0], source, env, adapter)?;
			if !ends_in_place(&instrs) {
				return Err(CompilerError::IncrementRequiresPlace { position: token.span.start });
			}
			let Type::Primitive(primitive) = operand_ty else {
				return Err(CompilerError::IncrementRequiresPrimitive { position: token.span.start, found: operand_ty });
			};
			let op = token.lexeme(source);
			let Some(entry) = builtins::lookup_unary(op, primitive) else {
				return Err(CompilerError::IncrementRequiresPrimitive { position: token.span.start, found: Type::Primitive(primitive) });
			};
			instrs.push(Instruction::IncrementOp { apply: entry.apply });
			Ok((Type::Primitive(entry.result), instrs))
		},
		TokenKind::ExplicitConversion => {
			let target_name = token.name_value().expect("ExplicitConversion always carries a target name");
			let target_ty =
				resolve_type_name(target_name, adapter).ok_or_else(|| CompilerError::UnknownIdentifier { name: target_name.to_owned(), position: token.span.start })?;
			let (operand_ty, mut instrs) = compile_node(&token.children[0], source, env, adapter)?;
			if let Some(conversion) = resolve_conversion(&operand_ty, &target_ty, adapter)? {
				instrs.push(conversion);
			}
			Ok((target_ty, instrs))
		},
		TokenKind::Constructor => {
			let name = token.name_value().expect("Constructor always carries a name");
			let mut arg_types = Vec::with_capacity(token.children.len());
			let mut arg_instrs_list = Vec::with_capacity(token.children.len());
			for child in &token.children {
				let (ty, instrs) = compile_node(child, source, env, adapter)?;
				arg_types.push(ty);
				arg_instrs_list.push(instrs);
			}
			resolve_constructor(name, &arg_types, &arg_instrs_list, adapter)
		},
		TokenKind::Skip | TokenKind::MemberRef | TokenKind::Binary | TokenKind::Function | TokenKind::Index | TokenKind::Setter => {
			unreachable!("the grammar only ever produces these as chain children, never as a standalone compile target")
		},
	}
}

/// Compiles a `Block`'s children left to right, threading a running
/// `(Type, instructions)` accumulator through `Binary`/`MemberRef`/`Function`/
/// `Index`/`Setter` siblings exactly as §4.2 describes.
fn compile_chain(children: &[Token], source: &str, env: &dyn Environment, adapter: &dyn ReflectionAdapter) -> Result<(Type, Vec<Instruction>), CompilerError> {
	// `x = 1` where `x` has never been bound declares it rather than erroring:
	// this language has no separate declaration syntax, so assignment is how
	// bindings come into existence (see DESIGN.md's Open Question decision).
	if children.len() == 2 && children[1].kind == TokenKind::Setter {
		if let TokenKind::Reference = children[0].kind {
			let name = children[0].name_value().expect("Reference token always carries a name");
			if env.type_of(name).is_none() {
				let (rhs_ty, rhs_instrs) = compile_node(&children[1].children[0], source, env, adapter)?;
				let mut instrs = vec![Instruction::VarPlace(name.to_owned())];
				instrs.extend(rhs_instrs);
				instrs.push(Instruction::SetOp);
				return Ok((rhs_ty, instrs));
			}
		}
	}

	let (mut ty, mut instrs) = compile_node(&children[0], source, env, adapter)?;
	let mut i = 1;
	while i < children.len() {
		let child = &children[i];
		match child.kind {
			TokenKind::Binary => {
				let op = child.lexeme(source).to_owned();
				i += 1;
				let rhs_node = children.get(i).expect("Binary is always followed by its right operand by construction");
				let (rhs_ty, rhs_instrs) = compile_node(rhs_node, source, env, adapter)?;
				i += 1;
				let (result_ty, lhs_conversion, rhs_conversion, callable) = resolve_binary(&op, &ty, &rhs_ty, adapter)?;
				if let Some(conversion) = lhs_conversion {
					instrs.push(conversion);
				}
				instrs.extend(rhs_instrs);
				if let Some(conversion) = rhs_conversion {
					instrs.push(conversion);
				}
				instrs.push(Instruction::Call { callable, arg_count: 2, result_type: result_ty.clone() });
				ty = result_ty;
			},
			TokenKind::MemberRef => {
				let name = child.name_value().expect("MemberRef always carries a name").to_owned();
				let is_call = i + 1 < children.len() && children[i + 1].kind == TokenKind::Function;
				if let Type::TypeRef(target) = ty.clone() {
					// Static receiver (§4.2): resolve against static members, and
					// emit no subject -- the marker produced no instruction either.
					if is_call {
						let args_token = &children[i + 1];
						let mut arg_types = Vec::with_capacity(args_token.children.len());
						let mut arg_instrs_list = Vec::with_capacity(args_token.children.len());
						for arg_child in &args_token.children {
							let (arg_ty, arg_instrs) = compile_node(arg_child, source, env, adapter)?;
							arg_types.push(arg_ty);
							arg_instrs_list.push(arg_instrs);
						}
						let (result_ty, method, converted, call_instrs) = resolve_static_method(&target, &name, &arg_types, &arg_instrs_list, adapter)?;
						if result_ty == Type::Void {
							return Err(CompilerError::VoidMethodNotSupported { name });
						}
						instrs.extend(call_instrs);
						instrs.push(Instruction::Call { callable: Rc::new(StaticOperatorCall { method }), arg_count: converted.len(), result_type: result_ty.clone() });
						ty = result_ty;
						i += 2;
					} else {
						let property = resolve_static_property(&target, &name, adapter, child.span.start)?;
						ty = property.return_type();
						instrs.push(Instruction::StaticMemberPlace { name, property });
						i += 1;
					}
				} else if is_call {
					let args_token = &children[i + 1];
					let mut arg_types = Vec::with_capacity(args_token.children.len());
					let mut arg_instrs_list = Vec::with_capacity(args_token.children.len());
					for arg_child in &args_token.children {
						let (arg_ty, arg_instrs) = compile_node(arg_child, source, env, adapter)?;
						arg_types.push(arg_ty);
						arg_instrs_list.push(arg_instrs);
					}
					let (result_ty, method, converted, call_instrs) = resolve_method(&ty, &name, &arg_types, &arg_instrs_list, adapter)?;
					if result_ty == Type::Void {
						return Err(CompilerError::VoidMethodNotSupported { name });
					}
					instrs.extend(call_instrs);
					instrs.push(Instruction::Call { callable: Rc::new(HostMethodCall { method }), arg_count: 1 + converted.len(), result_type: result_ty.clone() });
					ty = result_ty;
					i += 2;
				} else {
					let property = resolve_property(&ty, &name, adapter, child.span.start)?;
					ty = property.return_type();
					instrs.push(Instruction::MemberPlace { name, property });
					i += 1;
				}
			},
			TokenKind::Function => {
				let Type::Function(signature) = ty.clone() else {
					return Err(CompilerError::MethodNotFound { name: "()".to_owned(), arg_types: vec![ty.clone()] });
				};
				let mut arg_types = Vec::with_capacity(child.children.len());
				let mut arg_instrs_list = Vec::with_capacity(child.children.len());
				for arg_child in &child.children {
					let (arg_ty, arg_instrs) = compile_node(arg_child, source, env, adapter)?;
					arg_types.push(arg_ty);
					arg_instrs_list.push(arg_instrs);
				}
				if arg_types.len() != signature.params.len() {
					return Err(CompilerError::MethodNotFound { name: "()".to_owned(), arg_types });
				}
				for (arg_instrs, (arg_ty, param_ty)) in arg_instrs_list.into_iter().zip(arg_types.iter().zip(signature.params.iter())) {
					instrs.extend(convert_to(arg_ty.clone(), param_ty.clone(), arg_instrs)?);
				}
				instrs.push(Instruction::RunDelegate { arg_count: arg_types.len(), result_type: signature.return_type.clone() });
				ty = signature.return_type.clone();
				i += 1;
			},
			TokenKind::Index => {
				let mut index_types = Vec::with_capacity(child.children.len());
				let mut index_instrs_list = Vec::with_capacity(child.children.len());
				for index_child in &child.children {
					let (index_ty, index_instrs) = compile_node(index_child, source, env, adapter)?;
					index_types.push(index_ty);
					index_instrs_list.push(index_instrs);
				}
				let indexer = adapter.get_indexer(&ty).ok_or_else(|| CompilerError::MethodNotFound { name: "[]".to_owned(), arg_types: index_types.clone() })?;
				if indexer.arity() != index_types.len() {
					return Err(CompilerError::MethodNotFound { name: "[]".to_owned(), arg_types: index_types });
				}
				for index_instrs in index_instrs_list {
					instrs.extend(index_instrs);
				}
				instrs.push(Instruction::IndexPlace {
					index_count: index_types.len(),
					getter: Rc::new(IndexerGet { indexer: Rc::clone(&indexer) }),
					setter: Rc::new(IndexerSet { indexer: Rc::clone(&indexer) }),
				});
				ty = indexer.element_type();
				i += 1;
			},
			TokenKind::Setter => {
				if !ends_in_place(&instrs) {
					return Err(CompilerError::InvalidAssignmentTarget { position: children[0].span.start });
				}
				let (rhs_ty, rhs_instrs) = compile_node(&child.children[0], source, env, adapter)?;
				instrs.extend(convert_to(rhs_ty, ty.clone(), rhs_instrs)?);
				instrs.push(Instruction::SetOp);
				i += 1;
			},
			_ => unreachable!("only Binary/MemberRef/Function/Index/Setter appear as non-leading chain children"),
		}
	}
	Ok((ty, instrs))
}

fn ends_in_place(instrs: &[Instruction]) -> bool {
	matches!(instrs.last(), Some(Instruction::VarPlace(_) | Instruction::MemberPlace { .. } | Instruction::StaticMemberPlace { .. } | Instruction::IndexPlace { .. }))
}

/// Maps a surface-syntax type name — as written in a cast `(int)x` or a
/// constructor `new Point(..)` — to a `PrimitiveType`. The grammar's C-like
/// surface (§1, §8 scenario 2's `(float)-...`) spells primitives in lowercase
/// keyword form; `Type::display_name`'s PascalCase is purely for
/// diagnostics/Debug output and never appears in source text, so the two
/// don't need to agree.
fn primitive_by_name(name: &str) -> Option<PrimitiveType> {
	Some(match name {
		"int" => PrimitiveType::Int,
		"long" => PrimitiveType::Long,
		"float" => PrimitiveType::Float,
		"double" => PrimitiveType::Double,
		"bool" => PrimitiveType::Bool,
		"char" => PrimitiveType::Char,
		"string" | "str" => PrimitiveType::Str,
		_ => return None,
	})
}

fn resolve_type_name(name: &str, adapter: &dyn ReflectionAdapter) -> Option<Type> {
	primitive_by_name(name).map(Type::Primitive).or_else(|| adapter.resolve_type_name(name))
}

fn op_binary_method_name(op: &str) -> &'static str {
	match op {
		"+" => "op_Addition",
		"-" => "op_Subtraction",
		"*" => "op_Multiplication",
		"/" => "op_Division",
		"%" => "op_Modulo",
		"<" => "op_LessThan",
		">" => "op_GreaterThan",
		"<=" => "op_LessThanOrEqual",
		">=" => "op_GreaterThanOrEqual",
		"==" => "op_Equality",
		"!=" => "op_Inequality",
		"&&" => "op_And",
		"||" => "op_Or",
		other => unreachable!("grammar never produces a Binary token with lexeme {other:?}"),
	}
}

fn op_unary_method_name(op: &str) -> &'static str {
	match op {
		"-" => "op_UnaryNegation",
		"!" => "op_LogicalNot",
		other => unreachable!("grammar never produces a Unary token with lexeme {other:?}"),
	}
}

/// All primitive types reachable from each of `arg_types` by zero or one
/// implicit conversion, combined cartesian-style (identity first in each
/// per-argument list, so the identity combination is tried before any real
/// one) and capped at 16 combinations overall — non-primitive arguments only
/// ever offer themselves as a candidate, since conversions are a primitives-only
/// concept here.
fn cartesian_conversions(arg_types: &[Type]) -> Vec<Vec<Type>> {
	let per_arg: Vec<Vec<Type>> = arg_types
		.iter()
		.map(|ty| match ty {
			Type::Primitive(primitive) => builtins::implicit_conversion_candidates(*primitive).into_iter().map(Type::Primitive).collect(),
			other => vec![other.clone()],
		})
		.collect();
	let mut combos: Vec<Vec<Type>> = vec![Vec::new()];
	for candidates in &per_arg {
		let mut next = Vec::new();
		'outer: for combo in &combos {
			for candidate in candidates {
				let mut extended = combo.clone();
				extended.push(candidate.clone());
				next.push(extended);
				if next.len() >= 16 {
					break 'outer;
				}
			}
		}
		combos = next;
	}
	combos
}

/// Converts a single already-compiled value from `from` to `to`, inserting a
/// builtin conversion call if they differ. Used for assignment coercion and
/// delegate/host-call argument coercion — both contexts only ever need
/// implicit (never explicit-only) conversions inserted automatically.
fn convert_to(from: Type, to: Type, mut instrs: Vec<Instruction>) -> Result<Vec<Instruction>, CompilerError> {
	if from == to {
		return Ok(instrs);
	}
	let (Type::Primitive(from_primitive), Type::Primitive(to_primitive)) = (&from, &to) else {
		return Err(CompilerError::NoExplicitConversion { from, to });
	};
	let entry =
		builtins::lookup_implicit_conversion(*from_primitive, *to_primitive).ok_or(CompilerError::NoExplicitConversion { from: from.clone(), to: to.clone() })?;
	instrs.push(Instruction::Call { callable: Rc::new(BuiltinUnary { apply: entry.convert }), arg_count: 1, result_type: to });
	Ok(instrs)
}

fn apply_conversions(arg_instrs_list: &[Vec<Instruction>], arg_types: &[Type], target_types: &[Type]) -> Result<Vec<Instruction>, CompilerError> {
	let mut out = Vec::new();
	for ((instrs, from), to) in arg_instrs_list.iter().zip(arg_types).zip(target_types) {
		out.extend(convert_to(from.clone(), to.clone(), instrs.clone())?);
	}
	Ok(out)
}

fn flatten(arg_instrs_list: &[Vec<Instruction>]) -> Vec<Instruction> {
	arg_instrs_list.iter().flat_map(|instrs| instrs.iter().cloned()).collect()
}

/// Resolves a binary operator (§4.4): exact builtin match, then an exact host
/// `op_*`-named method on the left operand's type, then a conversion search
/// over the builtin table only (operator overloading via conversions is rare
/// enough in practice that reaching for it here would be over-engineering).
/// Returns the optional conversion instruction for each operand alongside the
/// resolved callable, since a converted operand needs its conversion spliced
/// into the instruction stream at the right point.
fn resolve_binary(
	op: &str,
	lhs_ty: &Type,
	rhs_ty: &Type,
	adapter: &dyn ReflectionAdapter,
) -> Result<(Type, Option<Instruction>, Option<Instruction>, Rc<dyn Callable>), CompilerError> {
	if let (Type::Primitive(lhs_primitive), Type::Primitive(rhs_primitive)) = (lhs_ty, rhs_ty) {
		if let Some(entry) = builtins::lookup_binary(op, *lhs_primitive, *rhs_primitive) {
			return Ok((Type::Primitive(entry.result), None, None, Rc::new(BuiltinBinary { apply: entry.apply })));
		}
	}
	if let Some(method) = adapter.get_method(lhs_ty, op_binary_method_name(op), &[lhs_ty.clone(), rhs_ty.clone()]) {
		return Ok((method.return_type(), None, None, Rc::new(StaticOperatorCall { method })));
	}
	if let (Type::Primitive(lhs_primitive), Type::Primitive(rhs_primitive)) = (lhs_ty, rhs_ty) {
		for lhs_candidate in builtins::implicit_conversion_candidates(*lhs_primitive) {
			for rhs_candidate in builtins::implicit_conversion_candidates(*rhs_primitive) {
				if lhs_candidate == *lhs_primitive && rhs_candidate == *rhs_primitive {
					continue; // identity already tried above
				}
				let Some(entry) = builtins::lookup_binary(op, lhs_candidate, rhs_candidate) else { continue };
				let lhs_conversion = (lhs_candidate != *lhs_primitive).then(|| {
					let conversion = builtins::lookup_implicit_conversion(*lhs_primitive, lhs_candidate).expect("candidate list only offers valid conversions");
					Instruction::Call { callable: Rc::new(BuiltinUnary { apply: conversion.convert }), arg_count: 1, result_type: Type::Primitive(lhs_candidate) }
				});
				let rhs_conversion = (rhs_candidate != *rhs_primitive).then(|| {
					let conversion = builtins::lookup_implicit_conversion(*rhs_primitive, rhs_candidate).expect("candidate list only offers valid conversions");
					Instruction::Call { callable: Rc::new(BuiltinUnary { apply: conversion.convert }), arg_count: 1, result_type: Type::Primitive(rhs_candidate) }
				});
				return Ok((Type::Primitive(entry.result), lhs_conversion, rhs_conversion, Rc::new(BuiltinBinary { apply: entry.apply })));
			}
		}
	}
	Err(CompilerError::MethodNotFound { name: op.to_owned(), arg_types: vec![lhs_ty.clone(), rhs_ty.clone()] })
}

fn resolve_unary(op: &str, operand_ty: &Type, adapter: &dyn ReflectionAdapter) -> Result<(Type, Rc<dyn Callable>), CompilerError> {
	if let Type::Primitive(primitive) = operand_ty {
		if let Some(entry) = builtins::lookup_unary(op, *primitive) {
			return Ok((Type::Primitive(entry.result), Rc::new(BuiltinUnary { apply: entry.apply })));
		}
	}
	if let Some(method) = adapter.get_method(operand_ty, op_unary_method_name(op), &[operand_ty.clone()]) {
		return Ok((method.return_type(), Rc::new(StaticOperatorCall { method })));
	}
	Err(CompilerError::MethodNotFound { name: op.to_owned(), arg_types: vec![operand_ty.clone()] })
}

/// Resolves an explicit-conversion target: identity needs no instruction at
/// all, otherwise a builtin implicit-or-explicit conversion is tried before
/// falling back to the host's declared conversions of either kind.
fn resolve_conversion(from: &Type, to: &Type, adapter: &dyn ReflectionAdapter) -> Result<Option<Instruction>, CompilerError> {
	if from == to {
		return Ok(None);
	}
	if let (Type::Primitive(from_primitive), Type::Primitive(to_primitive)) = (from, to) {
		if let Some(entry) = builtins::lookup_implicit_conversion(*from_primitive, *to_primitive).or_else(|| builtins::lookup_explicit_conversion(*from_primitive, *to_primitive))
		{
			return Ok(Some(Instruction::Call { callable: Rc::new(BuiltinUnary { apply: entry.convert }), arg_count: 1, result_type: to.clone() }));
		}
	}
	for kind in [ConversionKind::Implicit, ConversionKind::Explicit] {
		if let Some(conversion) = adapter.get_conversions(from, kind).into_iter().find(|conversion| &conversion.to_type() == to) {
			return Ok(Some(Instruction::Call { callable: Rc::new(HostConversionCall { conversion }), arg_count: 1, result_type: to.clone() }));
		}
	}
	Err(CompilerError::NoExplicitConversion { from: from.clone(), to: to.clone() })
}

/// Resolves a static property/field on `target` (§4.2's static-receiver
/// rule), e.g. `Math.pi`. The host distinguishes static from instance
/// members itself via `get_members`'s `is_static` flag.
fn resolve_static_property(target: &Type, name: &str, adapter: &dyn ReflectionAdapter, position: usize) -> Result<Rc<dyn HostProperty>, CompilerError> {
	let members = adapter.get_members(target, name, true);
	if let Some(property) = members.iter().find_map(|member| match member {
		Member::Property(property) => Some(Rc::clone(property)),
		Member::Method(_) => None,
	}) {
		return Ok(property);
	}
	if members.is_empty() {
		return Err(CompilerError::UnknownIdentifier { name: name.to_owned(), position });
	}
	Err(CompilerError::MethodNotFound { name: name.to_owned(), arg_types: vec![target.clone()] })
}

/// Resolves a static method call on `target`, mirroring `resolve_method`'s
/// exact-match-then-conversion-search shape but with no extension-method
/// search (extensions only apply to instance receivers, §4.2).
fn resolve_static_method(
	target: &Type,
	name: &str,
	arg_types: &[Type],
	arg_instrs_list: &[Vec<Instruction>],
	adapter: &dyn ReflectionAdapter,
) -> Result<(Type, Rc<dyn HostMethod>, Vec<Type>, Vec<Instruction>), CompilerError> {
	if let Some(method) = adapter.get_method(target, name, arg_types) {
		return Ok((method.return_type(), method, arg_types.to_vec(), flatten(arg_instrs_list)));
	}
	for combo in cartesian_conversions(arg_types) {
		if combo == arg_types {
			continue;
		}
		if let Some(method) = adapter.get_method(target, name, &combo) {
			let instrs = apply_conversions(arg_instrs_list, arg_types, &combo)?;
			return Ok((method.return_type(), method, combo, instrs));
		}
	}
	Err(CompilerError::MethodNotFound { name: name.to_owned(), arg_types: arg_types.to_vec() })
}

fn resolve_property(ty: &Type, name: &str, adapter: &dyn ReflectionAdapter, position: usize) -> Result<Rc<dyn HostProperty>, CompilerError> {
	let members = adapter.get_members(ty, name, false);
	if let Some(property) = members.iter().find_map(|member| match member {
		Member::Property(property) => Some(Rc::clone(property)),
		Member::Method(_) => None,
	}) {
		return Ok(property);
	}
	if members.is_empty() {
		return Err(CompilerError::UnknownIdentifier { name: name.to_owned(), position });
	}
	// A method name was found but referenced without being called.
	Err(CompilerError::MethodNotFound { name: name.to_owned(), arg_types: vec![ty.clone()] })
}

/// Resolves a method call (§4.4): exact host match, then exact extension
/// method, then a conversion search over both, identity-first.
fn resolve_method(
	receiver_ty: &Type,
	name: &str,
	arg_types: &[Type],
	arg_instrs_list: &[Vec<Instruction>],
	adapter: &dyn ReflectionAdapter,
) -> Result<(Type, Rc<dyn HostMethod>, Vec<Type>, Vec<Instruction>), CompilerError> {
	let extensions = adapter.get_extension_methods(receiver_ty, name);
	if let Some(method) = adapter.get_method(receiver_ty, name, arg_types) {
		return Ok((method.return_type(), method, arg_types.to_vec(), flatten(arg_instrs_list)));
	}
	if let Some(method) = extensions.iter().find(|method| method.param_types() == arg_types) {
		return Ok((method.return_type(), Rc::clone(method), arg_types.to_vec(), flatten(arg_instrs_list)));
	}
	for combo in cartesian_conversions(arg_types) {
		if combo == arg_types {
			continue;
		}
		if let Some(method) = adapter.get_method(receiver_ty, name, &combo) {
			let instrs = apply_conversions(arg_instrs_list, arg_types, &combo)?;
			return Ok((method.return_type(), method, combo, instrs));
		}
		if let Some(method) = extensions.iter().find(|method| method.param_types() == combo.as_slice()) {
			let instrs = apply_conversions(arg_instrs_list, arg_types, &combo)?;
			return Ok((method.return_type(), Rc::clone(method), combo, instrs));
		}
	}
	Err(CompilerError::MethodNotFound { name: name.to_owned(), arg_types: arg_types.to_vec() })
}

fn resolve_constructor(
	name: &str,
	arg_types: &[Type],
	arg_instrs_list: &[Vec<Instruction>],
	adapter: &dyn ReflectionAdapter,
) -> Result<(Type, Vec<Instruction>), CompilerError> {
	if let Some(constructor) = adapter.get_constructor(name, arg_types) {
		return finish_construct(constructor, arg_types.len(), flatten(arg_instrs_list));
	}
	for combo in cartesian_conversions(arg_types) {
		if combo == arg_types {
			continue;
		}
		if let Some(constructor) = adapter.get_constructor(name, &combo) {
			let instrs = apply_conversions(arg_instrs_list, arg_types, &combo)?;
			return finish_construct(constructor, combo.len(), instrs);
		}
	}
	Err(CompilerError::MethodNotFound { name: name.to_owned(), arg_types: arg_types.to_vec() })
}

fn finish_construct(constructor: Rc<dyn HostConstructor>, arg_count: usize, mut instrs: Vec<Instruction>) -> Result<(Type, Vec<Instruction>), CompilerError> {
	let result_type = constructor.result_type();
	instrs.push(Instruction::Construct { callable: Rc::new(HostConstructorCall { constructor }), arg_count, result_type: result_type.clone() });
	Ok((result_type, instrs))
}

/// Adapts a resolved `HostMethod` call to `Callable`: the receiver travels as
/// `args[0]`, the declared parameters as the rest.
struct HostMethodCall {
	method: Rc<dyn HostMethod>,
}

impl Callable for HostMethodCall {
	fn invoke(&self, args: &[Value]) -> Result<Value, HostInvocationError> {
		let (receiver, rest) = args.split_first().expect("a method call always has a receiver operand");
		self.method.invoke(Some(receiver), rest)
	}
}

/// A host-declared operator overload (`op_Addition` and friends), invoked
/// statically over both operands with no receiver.
struct StaticOperatorCall {
	method: Rc<dyn HostMethod>,
}

impl Callable for StaticOperatorCall {
	fn invoke(&self, args: &[Value]) -> Result<Value, HostInvocationError> {
		self.method.invoke(None, args)
	}
}

struct HostConstructorCall {
	constructor: Rc<dyn HostConstructor>,
}

impl Callable for HostConstructorCall {
	fn invoke(&self, args: &[Value]) -> Result<Value, HostInvocationError> {
		self.constructor.invoke(args)
	}
}

struct HostConversionCall {
	conversion: Rc<dyn crate::host::HostConversion>,
}

impl Callable for HostConversionCall {
	fn invoke(&self, args: &[Value]) -> Result<Value, HostInvocationError> {
		self.conversion.convert(&args[0])
	}
}

/// `IndexPlace`'s getter: `args` is `[subject, ...indices]`.
struct IndexerGet {
	indexer: Rc<dyn HostIndexer>,
}

impl Callable for IndexerGet {
	fn invoke(&self, args: &[Value]) -> Result<Value, HostInvocationError> {
		let (subject, indices) = args.split_first().expect("an index read always has a subject operand");
		self.indexer.get(subject, indices)
	}
}

/// `IndexPlace`'s setter: `args` is `[subject, ...indices, value]`.
struct IndexerSet {
	indexer: Rc<dyn HostIndexer>,
}

impl Callable for IndexerSet {
	fn invoke(&self, args: &[Value]) -> Result<Value, HostInvocationError> {
		let (value, rest) = args.split_last().expect("an index write always has a value operand");
		let (subject, indices) = rest.split_first().expect("an index write always has a subject operand");
		self.indexer.set(subject, indices, value.clone())?;
		Ok(Value::Void)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::env::MapEnvironment;
	use crate::host::NullAdapter;
	use crate::parser;

	fn compile_source(source: &str, env: &dyn Environment) -> Result<(Type, Vec<Instruction>), CompilerError> {
		let token = parser::parse(source).expect("source parses");
		compile(&token, source, env, &NullAdapter)
	}

	#[test]
	fn compiles_integer_addition() {
		let (ty, instrs) = compile_source("1 + 2", &MapEnvironment::new()).unwrap();
		assert_eq!(ty, Type::Primitive(PrimitiveType::Int));
		assert_eq!(instrs.len(), 3); // Push(1), Push(2), Call
		assert!(matches!(instrs[0], Instruction::Push(Value::Int(1))));
	}

	#[test]
	fn widens_int_to_double_for_mixed_addition() {
		let (ty, instrs) = compile_source("1 + 2.5", &MapEnvironment::new()).unwrap();
		assert_eq!(ty, Type::Primitive(PrimitiveType::Double));
		// Push(1), convert-to-Double, Push(2.5), Call.
		assert_eq!(instrs.len(), 4);
	}

	#[test]
	fn unknown_identifier_is_rejected() {
		let error = compile_source("missing", &MapEnvironment::new()).unwrap_err();
		assert!(matches!(error, CompilerError::UnknownIdentifier { .. }));
	}

	#[test]
	fn assigning_to_a_fresh_name_declares_it() {
		let (ty, instrs) = compile_source("x = 5", &MapEnvironment::new()).unwrap();
		assert_eq!(ty, Type::Primitive(PrimitiveType::Int));
		assert!(matches!(instrs[0], Instruction::VarPlace(_)));
		assert!(matches!(instrs.last(), Some(Instruction::SetOp)));
	}

	#[test]
	fn reassigning_an_existing_variable_compiles() {
		let env = MapEnvironment::new().with("x", Value::Int(1));
		let (ty, _instrs) = compile_source("x = 2", &env).unwrap();
		assert_eq!(ty, Type::Primitive(PrimitiveType::Int));
	}

	#[test]
	fn increment_requires_a_place() {
		let error = compile_source("++1", &MapEnvironment::new()).unwrap_err();
		assert!(matches!(error, CompilerError::IncrementRequiresPlace { .. }));
	}

	#[test]
	fn increment_on_a_variable_compiles() {
		let env = MapEnvironment::new().with("count", Value::Int(0));
		let (ty, instrs) = compile_source("++count", &env).unwrap();
		assert_eq!(ty, Type::Primitive(PrimitiveType::Int));
		assert!(matches!(instrs.last(), Some(Instruction::IncrementOp { .. })));
	}

	#[test]
	fn boolean_mismatch_has_no_builtin_or_conversion() {
		// Unlike `+`, `*` has no `Str|Str` builtin entry, so the implicit
		// Bool->Str/Int->Str widening the conversion search would otherwise try
		// can't rescue this one — it's a genuine type mismatch.
		let error = compile_source("true * 1", &MapEnvironment::new()).unwrap_err();
		assert!(matches!(error, CompilerError::MethodNotFound { .. }));
	}

	#[test]
	fn explicit_conversion_narrows_double_to_int() {
		let (ty, instrs) = compile_source("(int)2.5", &MapEnvironment::new()).unwrap();
		assert_eq!(ty, Type::Primitive(PrimitiveType::Int));
		assert_eq!(instrs.len(), 2);
	}

	#[test]
	fn assignment_to_a_literal_is_invalid() {
		// `1 = 2` can't parse as an assignment at all (LSExpression requires a
		// Reference-rooted chain), so it surfaces as a parser error rather than
		// reaching the compiler — this is covered by the parser's own test
		// `trailing_garbage_is_unexpected_token`-style coverage. This test
		// instead exercises the compiler's defensive check directly by
		// constructing a malformed tree no real parse would ever produce.
		use crate::span::Span;
		use crate::token::Token;
		let lhs = Token::literal(Value::Int(1), Span::new(0, 1));
		let setter = Token { kind: TokenKind::Setter, value: None, span: Span::new(2, 1), children: vec![Token::literal(Value::Int(2), Span::new(4, 1))] };
		let block = Token { kind: TokenKind::Block, value: None, span: Span::new(0, 5), children: vec![lhs, setter] };
		let error = compile(&block, "1 = 2", &MapEnvironment::new(), &NullAdapter).unwrap_err();
		assert!(matches!(error, CompilerError::InvalidAssignmentTarget { .. }));
	}
}
