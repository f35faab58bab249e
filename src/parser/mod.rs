//! The recursive-descent combinator parser (§4.1). `Builder` tracks a byte
//! cursor over the input plus a side-stack of in-progress `Block` children,
//! mirroring the source's `match`/`and`/`or`/`zeroOrMore`/`block` combinator
//! set. Rust's ownership model makes literally composing those five as data
//! (closures stored in a tree) awkward, so here they're realized as a small
//! set of reusable helper functions (`chain`, `fixed`, `with_scope`,
//! `eat_literal`) that every grammar production in `grammar.rs` is built
//! from — see `DESIGN.md` for the mapping from spec combinator to helper.

mod grammar;

use crate::error::{ParserError, PartialTree};
use crate::token::{Token, TokenKind};
use crate::span::Span;

/// Caller-imposed limits guarding against pathological input, per §5
/// ("pathological inputs should be rejected by a caller-imposed length
/// limit"). Not a new language feature — exceeding the limit surfaces as an
/// ordinary `UnexpectedToken` at the offset where parsing gave up.
#[derive(Debug, Clone, Copy)]
pub struct ParserLimits {
	pub max_depth: usize,
}

impl Default for ParserLimits {
	fn default() -> Self {
		Self { max_depth: 256 }
	}
}

/// The parser's working state: the input, a byte cursor, the block stack,
/// and the furthest position any attempt (including ones later rolled back)
/// reached, for error reporting.
pub(crate) struct Builder<'source> {
	source: &'source str,
	pos: usize,
	max_reached: usize,
	stack: Vec<Vec<Token>>,
	depth: usize,
	limits: ParserLimits,
}

impl<'source> Builder<'source> {
	fn new(source: &'source str, limits: ParserLimits) -> Self {
		Self { source, pos: 0, max_reached: 0, stack: vec![Vec::new()], depth: 0, limits }
	}

	fn remaining(&self) -> &'source str {
		&self.source[self.pos..]
	}

	fn set_pos(&mut self, pos: usize) {
		self.pos = pos;
		self.max_reached = self.max_reached.max(pos);
	}

	fn push(&mut self, token: Token) {
		self.stack.last_mut().expect("block stack is never empty").push(token);
	}

	fn scope_len(&self) -> usize {
		self.stack.last().expect("block stack is never empty").len()
	}

	fn truncate_scope(&mut self, len: usize) {
		self.stack.last_mut().expect("block stack is never empty").truncate(len);
	}
}

/// Runs `body` with a fresh, empty child scope on top of the stack, and
/// returns whatever `body` produced together with the tokens it pushed.
/// Implements the "push a new Block token as the current parent" half of
/// `block()`, generalized to also back `fixed()`'s non-collapsing shapes.
fn with_scope<R>(builder: &mut Builder<'_>, body: impl FnOnce(&mut Builder<'_>) -> R) -> (R, Vec<Token>) {
	builder.stack.push(Vec::new());
	let result = body(builder);
	let children = builder.stack.pop().expect("scope pushed above");
	(result, children)
}

/// `block(body, Block, None)`: runs `body`, and on success either collapses
/// to the single child produced (the "passed straight through" case used at
/// every precedence level when no operator matched) or wraps the children in
/// a genuine multi-child `Block` token. On failure, rolls the cursor back and
/// pushes nothing, matching `and`'s rollback contract.
fn chain(builder: &mut Builder<'_>, body: impl FnOnce(&mut Builder<'_>) -> bool) -> bool {
	let start = builder.pos;
	let (ok, children) = with_scope(builder, body);
	if !ok {
		builder.set_pos(start);
		return false;
	}
	match children.len() {
		0 => {},
		1 => builder.push(children.into_iter().next().expect("len checked above")),
		_ => builder.push(Token { kind: TokenKind::Block, value: None, span: Span::new(start, builder.pos - start), children }),
	}
	true
}

/// `block(body, kind, None)` for a kind that never collapses (`Function`,
/// `Index`): always tagged `kind`, span covers everything `body` consumed,
/// children are exactly what `body` pushed.
fn fixed(builder: &mut Builder<'_>, kind: TokenKind, body: impl FnOnce(&mut Builder<'_>) -> bool) -> bool {
	let start = builder.pos;
	let (ok, children) = with_scope(builder, body);
	if !ok {
		builder.set_pos(start);
		return false;
	}
	builder.push(Token { kind, value: None, span: Span::new(start, builder.pos - start), children });
	true
}

/// `match(s, Skip)`: advances past a literal if present, pushing nothing.
fn eat_literal(builder: &mut Builder<'_>, literal: &str) -> bool {
	if builder.remaining().starts_with(literal) {
		builder.set_pos(builder.pos + literal.len());
		true
	} else {
		false
	}
}

/// `zeroOrMore(match(" ", Skip))`-equivalent: consumes ASCII/Unicode
/// whitespace. Always succeeds, per `zeroOrMore`'s contract.
fn skip_ws(builder: &mut Builder<'_>) {
	let trimmed = builder.remaining().trim_start();
	let consumed = builder.remaining().len() - trimmed.len();
	builder.set_pos(builder.pos + consumed);
}

fn match_identifier(builder: &mut Builder<'_>) -> Option<String> {
	let matched = grammar::identifier_pattern().find(builder.remaining())?;
	let text = matched.as_str().to_owned();
	builder.set_pos(builder.pos + text.len());
	Some(text)
}

/// Parses `source` into a token tree (§6 `parse(text) -> Token | ParserError`).
///
/// Fails with `UnexpectedToken` if the grammar doesn't accept the input, or
/// accepts only a prefix of it.
pub fn parse(source: &str) -> Result<Token, ParserError> {
	parse_with_limits(source, ParserLimits::default())
}

/// As `parse`, with caller-supplied recursion limits (§5).
pub fn parse_with_limits(source: &str, limits: ParserLimits) -> Result<Token, ParserError> {
	let mut builder = Builder::new(source, limits);
	let ok = grammar::parse_expression(&mut builder);
	if !ok || builder.pos != source.len() {
		let position = builder.max_reached.max(builder.pos);
		let partial_tree = PartialTree(builder.stack.last().and_then(|children| children.last()).cloned());
		return Err(ParserError::UnexpectedToken { position, partial_tree });
	}
	let mut root = builder.stack.pop().expect("root scope always present");
	Ok(root.pop().expect("successful top-level parse produces exactly one token"))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::token::TokenKind;

	#[test]
	fn parses_simple_comparison() {
		let token = parse("10 < 20").unwrap();
		assert_eq!(token.kind, TokenKind::Block);
		assert_eq!(token.children.len(), 3);
		assert_eq!(token.children[1].kind, TokenKind::Binary);
	}

	#[test]
	fn single_literal_collapses_to_bare_literal() {
		let token = parse("42").unwrap();
		assert_eq!(token.kind, TokenKind::Literal);
	}

	#[test]
	fn trailing_garbage_is_unexpected_token() {
		let error = parse("1 +").unwrap_err();
		match error {
			ParserError::UnexpectedToken { position, .. } => assert!(position <= 3),
		}
	}

	#[test]
	fn unterminated_parenthesis_is_unexpected_token() {
		assert!(parse("(1 + 2").is_err());
	}

	#[test]
	fn unterminated_string_is_unexpected_token() {
		assert!(parse("\"abc").is_err());
	}
}
