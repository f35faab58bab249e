//! The stack evaluator (§4.3). Runs a compiled instruction stream against an
//! `Environment`, materializing places lazily and reading through them only
//! when a consumer actually needs a value.
//!
//! The evaluator never reflects (§2): every instruction already carries the
//! resolved `Callable`/`HostProperty`/`HostIndexer` the compiler picked, so
//! running a program never touches the `ReflectionAdapter` again.

use crate::env::Environment;
use crate::error::EvaluatorError;
use crate::instruction::{Callable, Instruction};
use crate::value::Value;

/// A runtime stack item: either a plain value or a lazily-materialized place
/// (§3 "Places are materialized lazily"). Kept distinct from `Value` so a
/// place can be read zero, one, or two times (once to read, once to write
/// back) without re-resolving its subject/indices from scratch each time.
enum Slot {
	Value(Value),
	VarPlace(String),
	MemberPlace { subject: Box<Slot>, property: std::rc::Rc<dyn crate::host::HostProperty> },
	/// A static member place: unlike `MemberPlace`, there is no subject —
	/// the receiver is the host type itself, so reads/writes pass `None`.
	StaticMemberPlace { property: std::rc::Rc<dyn crate::host::HostProperty> },
	IndexPlace { subject: Box<Slot>, indices: Vec<Slot>, getter: std::rc::Rc<dyn crate::instruction::Callable>, setter: std::rc::Rc<dyn crate::instruction::Callable> },
}

/// Runs `instructions` against `env`, returning the final value on the stack
/// (§6 `run(instructions, env) -> Value | EvaluatorError`).
pub fn run(instructions: &[Instruction], env: &mut dyn Environment) -> Result<Value, EvaluatorError> {
	let mut stack: Vec<Slot> = Vec::new();
	for (index, instruction) in instructions.iter().enumerate() {
		execute(instruction, index, &mut stack, env)?;
	}
	let last = stack.pop().unwrap_or(Slot::Value(Value::Void));
	read(last, env, instructions.len().saturating_sub(1))
}

fn execute(instruction: &Instruction, index: usize, stack: &mut Vec<Slot>, env: &mut dyn Environment) -> Result<(), EvaluatorError> {
	match instruction {
		Instruction::Push(value) => stack.push(Slot::Value(value.clone())),
		Instruction::Call { callable, arg_count, .. } | Instruction::Construct { callable, arg_count, .. } => {
			let args = pop_values(stack, *arg_count, env, index)?;
			let result = callable.invoke(&args).map_err(|cause| EvaluatorError::HostInvocationFailed { instruction_index: index, cause })?;
			stack.push(Slot::Value(result));
		},
		Instruction::RunDelegate { arg_count, .. } => {
			// Arguments were pushed in source order; the compiler emits them
			// before the callable slot, so the callable is deepest on the
			// stack. `pop_values` already un-reverses pop order back to
			// source order, so no further reversal is needed here — `Call`
			// and `RunDelegate` agree on this convention (§9's Open Question,
			// resolved in DESIGN.md).
			let args = pop_values(stack, *arg_count, env, index)?;
			let callable_slot = stack.pop().ok_or(EvaluatorError::InvalidLeftSide { instruction_index: index })?;
			let callable_value = read(callable_slot, env, index)?;
			let Value::Function(function) = callable_value else {
				return Err(EvaluatorError::InvalidLeftSide { instruction_index: index });
			};
			let result = function.invoke(&args).map_err(|cause| EvaluatorError::HostInvocationFailed { instruction_index: index, cause })?;
			stack.push(Slot::Value(result));
		},
		Instruction::VarPlace(name) => stack.push(Slot::VarPlace(name.clone())),
		Instruction::MemberPlace { property, .. } => {
			let subject = stack.pop().ok_or(EvaluatorError::InvalidLeftSide { instruction_index: index })?;
			stack.push(Slot::MemberPlace { subject: Box::new(subject), property: std::rc::Rc::clone(property) });
		},
		Instruction::StaticMemberPlace { property, .. } => {
			stack.push(Slot::StaticMemberPlace { property: std::rc::Rc::clone(property) });
		},
		Instruction::IndexPlace { index_count, getter, setter } => {
			let mut indices = Vec::with_capacity(*index_count);
			for _ in 0..*index_count {
				indices.push(stack.pop().ok_or(EvaluatorError::InvalidLeftSide { instruction_index: index })?);
			}
			indices.reverse();
			let subject = stack.pop().ok_or(EvaluatorError::InvalidLeftSide { instruction_index: index })?;
			stack.push(Slot::IndexPlace { subject: Box::new(subject), indices, getter: std::rc::Rc::clone(getter), setter: std::rc::Rc::clone(setter) });
		},
		Instruction::SetOp => {
			let value_slot = stack.pop().ok_or(EvaluatorError::InvalidLeftSide { instruction_index: index })?;
			let value = read(value_slot, env, index)?;
			let place = stack.pop().ok_or(EvaluatorError::InvalidLeftSide { instruction_index: index })?;
			write(place, value.clone(), env, index)?;
			stack.push(Slot::Value(value));
		},
		Instruction::IncrementOp { apply } => {
			let place = stack.pop().ok_or(EvaluatorError::InvalidLeftSide { instruction_index: index })?;
			let (current, rewritable) = read_keeping_place(place, env, index)?;
			let updated = apply(&current);
			write(rewritable, updated.clone(), env, index)?;
			stack.push(Slot::Value(updated));
		},
	}
	Ok(())
}

fn pop_values(stack: &mut Vec<Slot>, count: usize, env: &mut dyn Environment, index: usize) -> Result<Vec<Value>, EvaluatorError> {
	let mut values = Vec::with_capacity(count);
	for _ in 0..count {
		let slot = stack.pop().ok_or(EvaluatorError::InvalidLeftSide { instruction_index: index })?;
		values.push(read(slot, env, index)?);
	}
	values.reverse();
	Ok(values)
}

/// Read-through (§4.3 "Read-through semantics"): resolves a place down to its
/// current value, recursively reading through any nested place (a member's
/// subject, or an index's subject/indices).
fn read(slot: Slot, env: &mut dyn Environment, index: usize) -> Result<Value, EvaluatorError> {
	match slot {
		Slot::Value(value) => Ok(value),
		Slot::VarPlace(name) => env.get(&name).ok_or(EvaluatorError::InvalidLeftSide { instruction_index: index }),
		Slot::MemberPlace { subject, property } => {
			let subject_value = read(*subject, env, index)?;
			property.get(Some(&subject_value)).map_err(|cause| EvaluatorError::HostInvocationFailed { instruction_index: index, cause })
		},
		Slot::StaticMemberPlace { property } => {
			property.get(None).map_err(|cause| EvaluatorError::HostInvocationFailed { instruction_index: index, cause })
		},
		Slot::IndexPlace { subject, indices, getter, .. } => {
			let subject_value = read(*subject, env, index)?;
			let mut index_values = Vec::with_capacity(indices.len());
			for index_slot in indices {
				index_values.push(read(index_slot, env, index)?);
			}
			let mut args = Vec::with_capacity(1 + index_values.len());
			args.push(subject_value);
			args.extend(index_values);
			getter.invoke(&args).map_err(|cause| EvaluatorError::HostInvocationFailed { instruction_index: index, cause })
		},
	}
}

/// Like `read`, but also hands back a place the caller can immediately write
/// the new value through — used by `IncrementOp`, which needs both the old
/// value (to compute the new one) and a live place (to write it back) without
/// re-resolving a member/indexer subject twice.
fn read_keeping_place(slot: Slot, env: &mut dyn Environment, index: usize) -> Result<(Value, Slot), EvaluatorError> {
	let value = match &slot {
		Slot::Value(value) => value.clone(),
		Slot::VarPlace(name) => env.get(name).ok_or(EvaluatorError::InvalidLeftSide { instruction_index: index })?,
		Slot::MemberPlace { subject, property } => {
			let subject_value = read_clone(subject, env, index)?;
			property.get(Some(&subject_value)).map_err(|cause| EvaluatorError::HostInvocationFailed { instruction_index: index, cause })?
		},
		Slot::StaticMemberPlace { property } => {
			property.get(None).map_err(|cause| EvaluatorError::HostInvocationFailed { instruction_index: index, cause })?
		},
		Slot::IndexPlace { subject, indices, getter, .. } => {
			let subject_value = read_clone(subject, env, index)?;
			let mut args = Vec::with_capacity(1 + indices.len());
			args.push(subject_value);
			for index_slot in indices {
				args.push(read_clone(index_slot, env, index)?);
			}
			getter.invoke(&args).map_err(|cause| EvaluatorError::HostInvocationFailed { instruction_index: index, cause })?
		},
	};
	Ok((value, slot))
}

/// Reads a place without consuming it, for the cases where the same subject
/// is needed again immediately after (`read_keeping_place`'s member/index
/// arms).
fn read_clone(slot: &Slot, env: &mut dyn Environment, index: usize) -> Result<Value, EvaluatorError> {
	match slot {
		Slot::Value(value) => Ok(value.clone()),
		Slot::VarPlace(name) => env.get(name).ok_or(EvaluatorError::InvalidLeftSide { instruction_index: index }),
		Slot::MemberPlace { subject, property } => {
			let subject_value = read_clone(subject, env, index)?;
			property.get(Some(&subject_value)).map_err(|cause| EvaluatorError::HostInvocationFailed { instruction_index: index, cause })
		},
		Slot::StaticMemberPlace { property } => property.get(None).map_err(|cause| EvaluatorError::HostInvocationFailed { instruction_index: index, cause }),
		Slot::IndexPlace { subject, indices, getter, .. } => {
			let subject_value = read_clone(subject, env, index)?;
			let mut args = Vec::with_capacity(1 + indices.len());
			args.push(subject_value);
			for index_slot in indices {
				args.push(read_clone(index_slot, env, index)?);
			}
			getter.invoke(&args).map_err(|cause| EvaluatorError::HostInvocationFailed { instruction_index: index, cause })
		},
	}
}

/// Writing (§4.3 "Writing is symmetric"): rebinds a variable, sets a member
/// through its subject, or calls an indexer's setter.
fn write(slot: Slot, value: Value, env: &mut dyn Environment, index: usize) -> Result<(), EvaluatorError> {
	match slot {
		Slot::Value(_) => Err(EvaluatorError::InvalidLeftSide { instruction_index: index }),
		Slot::VarPlace(name) => {
			env.set(&name, value);
			Ok(())
		},
		Slot::MemberPlace { subject, property } => {
			let subject_value = read(*subject, env, index)?;
			property.set(Some(&subject_value), value).map_err(|cause| EvaluatorError::HostInvocationFailed { instruction_index: index, cause })
		},
		Slot::StaticMemberPlace { property } => property.set(None, value).map_err(|cause| EvaluatorError::HostInvocationFailed { instruction_index: index, cause }),
		Slot::IndexPlace { subject, indices, setter, .. } => {
			let subject_value = read(*subject, env, index)?;
			let mut args = Vec::with_capacity(2 + indices.len());
			args.push(subject_value);
			for index_slot in indices {
				args.push(read(index_slot, env, index)?);
			}
			// `IndexerSet::invoke` (instruction.rs) reads `args` as
			// `[subject, ...indices, value]` and always returns `Value::Void`.
			args.push(value);
			setter.invoke(&args).map(|_| ()).map_err(|cause| EvaluatorError::HostInvocationFailed { instruction_index: index, cause })
		},
	}
}
