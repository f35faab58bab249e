//! The property-style invariants from the testable-properties section,
//! expressed as ordinary `#[test]` functions over representative inputs
//! rather than as a property-based-testing harness.

use flowscript::env::MapEnvironment;
use flowscript::host::NullAdapter;
use flowscript::instruction::Instruction;
use flowscript::parse;
use flowscript::token::{Token, TokenKind};
use flowscript::value::Value;

fn assert_structural_invariants(token: &Token) {
	assert_ne!(token.kind, TokenKind::Skip, "a Skip token must never survive into the final tree");
	if token.kind == TokenKind::Block {
		assert_ne!(token.children.len(), 1, "a one-child Block must have been collapsed into that child during parsing");
	}
	if token.kind == TokenKind::Literal {
		assert!(token.literal_value().is_some(), "every Literal token must carry a value");
	}
	for child in &token.children {
		assert_structural_invariants(child);
	}
}

#[test]
fn block_collapse_and_skip_invariants_hold_across_varied_inputs() {
	for source in ["1 + 2 * 3", "(1 + 2)", "x.y.z", "test[1, 2]", "new Point(1, 2)", "!true && false", "++x", "(int)1.5", "a = b = 1"] {
		let token = parse(source).unwrap_or_else(|error| panic!("{source:?} failed to parse: {error:?}"));
		assert_structural_invariants(&token);
	}
}

#[test]
fn repeated_compiles_of_the_same_expression_are_deterministic() {
	let source = "1 + 2 * (3 - 1) == 5";
	let mut results = Vec::new();
	for _ in 0..5 {
		let token = parse(source).unwrap();
		let env = MapEnvironment::new();
		let (ty, instructions) = flowscript::compile(&token, source, &env, &NullAdapter).unwrap();
		results.push((ty, format!("{instructions:?}")));
	}
	let first = &results[0];
	assert!(results.iter().all(|result| result == first), "compiling the same expression repeatedly must yield equal (type, instructions) pairs");
}

#[test]
fn unexpected_token_offset_is_within_input_bounds() {
	for source in ["1 +", "(1 + 2", "\"abc", "1 = 2", "*3"] {
		let error = parse(source).unwrap_err();
		let flowscript::error::ParserError::UnexpectedToken { position, .. } = error;
		assert!(position <= source.len(), "offset {position} exceeds input length {} for {source:?}", source.len());
	}
}

#[test]
fn literal_round_trip_for_every_literal_producible_primitive() {
	// The grammar's `Primary` production only ever mints `Literal` tokens for
	// four of the seven primitive types directly (`Int`, `Double`, `Bool`,
	// `Str`); `Long`, `Float`, and `Char` are only ever reached through a
	// conversion, never spelled as a literal in source text (§4.1's grammar
	// has no dedicated literal syntax for them).
	let cases: [(&str, Value); 4] = [("42", Value::Int(42)), ("3.5", Value::Double(3.5)), ("true", Value::Bool(true)), ("\"hi\"", Value::string("hi"))];
	for (source, expected) in cases {
		let token = parse(source).unwrap();
		let env = MapEnvironment::new();
		let (ty, instructions) = flowscript::compile(&token, source, &env, &NullAdapter).unwrap();
		assert_eq!(ty, expected.type_of());
		assert_eq!(instructions.len(), 1, "a bare literal must compile to exactly one Push instruction");
		let Instruction::Push(value) = &instructions[0] else { panic!("expected a Push instruction, found {:?}", instructions[0]) };
		assert_eq!(format!("{value:?}"), format!("{expected:?}"));
	}
}

#[test]
fn assignment_returns_the_new_value_and_chained_assignment_unifies_both_locations() {
	let mut env = MapEnvironment::new().with("x", Value::Int(0));
	let (_, value) = flowscript::eval_source("x = 9", &mut env, &NullAdapter).unwrap();
	match value {
		Value::Int(9) => {},
		other => panic!("unexpected {other:?}"),
	}
	use flowscript::env::Environment;
	match env.get("x").unwrap() {
		Value::Int(9) => {},
		other => panic!("unexpected {other:?}"),
	}

	let mut env = MapEnvironment::new().with("a", Value::Int(0)).with("b", Value::Int(0));
	flowscript::eval_source("a = b = 4", &mut env, &NullAdapter).unwrap();
	match (env.get("a").unwrap(), env.get("b").unwrap()) {
		(Value::Int(4), Value::Int(4)) => {},
		other => panic!("unexpected {other:?}"),
	}
}

#[test]
fn increment_and_decrement_mutate_and_return_the_new_value() {
	let mut env = MapEnvironment::new().with("x", Value::Int(5));
	let (_, value) = flowscript::eval_source("++x", &mut env, &NullAdapter).unwrap();
	match value {
		Value::Int(6) => {},
		other => panic!("unexpected {other:?}"),
	}

	let mut env = MapEnvironment::new().with("x", Value::Int(5));
	let (_, value) = flowscript::eval_source("--x", &mut env, &NullAdapter).unwrap();
	match value {
		Value::Int(4) => {},
		other => panic!("unexpected {other:?}"),
	}
}
