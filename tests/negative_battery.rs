//! The negative battery: inputs the pipeline must reject, and with which
//! specific error variant.

mod support;

use flowscript::env::MapEnvironment;
use flowscript::error::{CompilerError, ParserError};
use flowscript::host::NullAdapter;
use flowscript::value::Value;
use flowscript::{eval_source, parse, EngineError};

use support::{Logger, MockAdapter};

#[test]
fn trailing_binary_operator_is_unexpected_token() {
	let error = parse("1 +").unwrap_err();
	assert!(matches!(error, ParserError::UnexpectedToken { .. }));
}

#[test]
fn unclosed_parenthesis_is_unexpected_token() {
	let error = parse("(1 + 2").unwrap_err();
	assert!(matches!(error, ParserError::UnexpectedToken { .. }));
}

#[test]
fn unterminated_string_is_unexpected_token() {
	let error = parse("\"abc").unwrap_err();
	assert!(matches!(error, ParserError::UnexpectedToken { .. }));
}

#[test]
fn assigning_to_a_literal_cannot_even_parse() {
	// `LSExpression` only ever starts at a `Reference`, so `1 = 2` never
	// reaches `InvalidAssignmentTarget` through a real parse — it fails
	// upstream as `UnexpectedToken` once `RSExpression` stops at `1` and
	// leaves ` = 2` uncovered. The compiler's own defensive
	// `InvalidAssignmentTarget` check is exercised directly against a
	// hand-built tree in `compiler::tests::assignment_to_a_literal_is_invalid`.
	let error = parse("1 = 2").unwrap_err();
	assert!(matches!(error, ParserError::UnexpectedToken { .. }));
}

#[test]
fn mismatched_operand_types_with_no_conversion_path_is_method_not_found() {
	let mut env = MapEnvironment::new();
	let error = eval_source("true + 1", &mut env, &NullAdapter).unwrap_err();
	assert!(matches!(error, EngineError::Compiler(CompilerError::MethodNotFound { .. })));
}

#[test]
fn calling_a_void_returning_member_is_rejected() {
	let mut env = MapEnvironment::new().with("logger", Value::Host(Logger::new()));
	let error = eval_source("logger.log()", &mut env, &MockAdapter).unwrap_err();
	assert!(matches!(error, EngineError::Compiler(CompilerError::VoidMethodNotSupported { .. })));
}
