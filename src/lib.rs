//! # flowscript
//!
//! An embeddable expression engine: a single C-like textual expression
//! compiles to a postfix instruction stream that a small stack-based virtual
//! machine runs against a caller-supplied [`Environment`] and
//! [`ReflectionAdapter`]. Meant to be dropped into a host application (a game
//! runtime, editor tool, configuration layer) that wants to let end users
//! write short live expressions — array indexing, arithmetic, member access,
//! constructor calls, comparisons, assignment — without writing a full
//! interpreter of their own.
//!
//! The engine has no statements, loops, branches, closures, or user-defined
//! types; it evaluates exactly one expression per [`parse`]/[`compile`]/[`run`]
//! cycle. Three pieces do the work:
//!
//! - [`parser`] — a recursive-descent combinator parser that turns source
//!   text into a [`Token`](token::Token) tree.
//! - [`compiler`] — walks the tree, resolves every operator/call/member/
//!   indexer/constructor to a concrete callable (inserting implicit
//!   conversions where needed), and lowers it to a postfix
//!   [`Instruction`](instruction::Instruction) stream while propagating
//!   static types.
//! - [`eval`] — a stack evaluator that interprets the instruction stream
//!   against an [`Environment`], with first-class "place" values for
//!   l-values (variables, members, indexers).
//!
//! ```
//! use flowscript::env::MapEnvironment;
//! use flowscript::host::NullAdapter;
//! use flowscript::value::Value;
//!
//! let mut env = MapEnvironment::new().with("x", Value::Int(10));
//! let (ty, value) = flowscript::eval_source("x * 2 + 1", &mut env, &NullAdapter).unwrap();
//! assert_eq!(ty.display_name(), "Int");
//! match value {
//!     Value::Int(21) => {},
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```

pub mod builtins;
pub mod compiler;
pub mod env;
pub mod error;
pub mod eval;
pub mod host;
pub mod instruction;
pub mod parser;
pub mod span;
pub mod token;
pub mod value;

use env::Environment;
use error::{CompilerError, EvaluatorError, ParserError};
use host::ReflectionAdapter;
use instruction::Instruction;
use parser::ParserLimits;
use token::Token;
use value::{Type, Value};

/// An error from any of the three pipeline stages, for callers that want a
/// single error type to propagate with `?` across a full
/// parse-compile-run cycle (e.g. [`eval_source`]). Hosts that need to match
/// on a specific stage's variants should call [`parse`], [`compile`], and
/// [`run`] directly instead.
#[derive(Debug)]
pub enum EngineError {
	Parser(ParserError),
	Compiler(CompilerError),
	Evaluator(EvaluatorError),
}

impl std::fmt::Display for EngineError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Parser(error) => write!(f, "{error}"),
			Self::Compiler(error) => write!(f, "{error}"),
			Self::Evaluator(error) => write!(f, "{error}"),
		}
	}
}

impl std::error::Error for EngineError {}

impl From<ParserError> for EngineError {
	fn from(error: ParserError) -> Self {
		Self::Parser(error)
	}
}

impl From<CompilerError> for EngineError {
	fn from(error: CompilerError) -> Self {
		Self::Compiler(error)
	}
}

impl From<EvaluatorError> for EngineError {
	fn from(error: EvaluatorError) -> Self {
		Self::Evaluator(error)
	}
}

/// `parse(text) -> Token | ParserError` (§6).
pub fn parse(text: &str) -> Result<Token, ParserError> {
	parser::parse(text)
}

/// `compile(token, environment) -> (Type, Vec<Instruction>) | CompilerError` (§6).
pub fn compile(token: &Token, source: &str, env: &dyn Environment, adapter: &dyn ReflectionAdapter) -> Result<(Type, Vec<Instruction>), CompilerError> {
	compiler::compile(token, source, env, adapter)
}

/// `run(instructions, environment) -> Value | EvaluatorError` (§6).
pub fn run(instructions: &[Instruction], env: &mut dyn Environment) -> Result<Value, EvaluatorError> {
	eval::run(instructions, env)
}

/// Convenience one-shot entry point driving the full `parse -> compile -> run`
/// pipeline over `source`, for hosts that don't need to cache the compiled
/// program across repeated runs (callers that do should use [`Parser`]
/// directly and hold onto the returned instructions).
pub fn eval_source(source: &str, env: &mut dyn Environment, adapter: &dyn ReflectionAdapter) -> Result<(Type, Value), EngineError> {
	let token = parse(source)?;
	let (ty, instructions) = compile(&token, source, env, adapter)?;
	let value = run(&instructions, env)?;
	Ok((ty, value))
}

/// The `Parser(text, env?)` / `parser.parse()` / `parser.compile()`
/// convenience object from §6, bundling the source text with an optional
/// recursion-depth override so a host can parse once and compile against
/// several candidate environments without re-typing the source.
pub struct Parser<'source> {
	source: &'source str,
	limits: ParserLimits,
}

impl<'source> Parser<'source> {
	#[must_use]
	pub fn new(source: &'source str) -> Self {
		Self { source, limits: ParserLimits::default() }
	}

	#[must_use]
	pub fn with_limits(source: &'source str, limits: ParserLimits) -> Self {
		Self { source, limits }
	}

	/// Parses `self.source` into a token tree, honoring the configured
	/// [`ParserLimits`].
	pub fn parse(&self) -> Result<Token, ParserError> {
		parser::parse_with_limits(self.source, self.limits)
	}

	/// Parses and then compiles `self.source` in one call, for callers that
	/// don't need the intermediate token tree.
	pub fn compile(&self, env: &dyn Environment, adapter: &dyn ReflectionAdapter) -> Result<(Type, Vec<Instruction>), EngineError> {
		let token = self.parse()?;
		Ok(compile(&token, self.source, env, adapter)?)
	}
}

/// The `Evaluator.run(flow, env?)` convenience wrapper from §6, as a
/// zero-sized type so call sites read `Evaluator::run(...)` the same way the
/// source's static-method surface does.
pub struct Evaluator;

impl Evaluator {
	pub fn run(instructions: &[Instruction], env: &mut dyn Environment) -> Result<Value, EvaluatorError> {
		eval::run(instructions, env)
	}
}
