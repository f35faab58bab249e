//! Grammar productions (§4.1), one function per nonterminal. Every function
//! follows the same contract as the spec's combinators: on success it pushes
//! exactly one token onto the enclosing scope and leaves the cursor after
//! what it consumed; on failure it pushes nothing and leaves the cursor
//! exactly where it found it.

use super::{Builder, chain, eat_literal, fixed, match_identifier, skip_ws, with_scope};
use crate::span::Span;
use crate::token::{Token, TokenKind, TokenValue};
use crate::value::Value;

pub(super) fn identifier_pattern() -> &'static regex_macro::Regex {
	regex_macro::regex!(r"^[A-Za-z_][A-Za-z0-9]*")
}

fn enter(builder: &mut Builder<'_>) -> bool {
	if builder.depth >= builder.limits.max_depth {
		return false;
	}
	builder.depth += 1;
	true
}

fn leave(builder: &mut Builder<'_>) {
	builder.depth -= 1;
}

/// `Expression := LSExpression '=' Expression | RSExpression`
pub(super) fn parse_expression(builder: &mut Builder<'_>) -> bool {
	if !enter(builder) {
		return false; // recursion limit reached
	}
	let ok = chain(builder, |builder| {
		let snapshot = builder.pos;
		let children_before = builder.scope_len();
		if parse_ls_expression(builder) {
			skip_ws(builder);
			if parse_setter(builder) {
				return true;
			}
		}
		builder.set_pos(snapshot);
		builder.truncate_scope(children_before);
		parse_rs_expression(builder)
	});
	leave(builder);
	ok
}

/// The `'=' Expression` suffix of an assignment, built directly as a
/// `Setter` token whose span is just the `=` lexeme (per the data model's
/// lexeme-from-span invariant) and whose single child is the right side.
fn parse_setter(builder: &mut Builder<'_>) -> bool {
	if !builder.remaining().starts_with('=') || builder.remaining().starts_with("==") {
		return false;
	}
	let start = builder.pos;
	builder.set_pos(start + 1);
	skip_ws(builder);
	let (ok, children) = with_scope(builder, parse_expression);
	if !ok {
		builder.set_pos(start);
		return false;
	}
	builder.push(Token { kind: TokenKind::Setter, value: None, span: Span::new(start, 1), children });
	true
}

/// `LSExpression := Reference (MemberRef | Index)*`
fn parse_ls_expression(builder: &mut Builder<'_>) -> bool {
	chain(builder, |builder| {
		if !parse_reference(builder) {
			return false;
		}
		loop {
			if parse_member_ref(builder) || parse_index(builder) {
				continue;
			}
			break;
		}
		true
	})
}

fn binary_chain(builder: &mut Builder<'_>, next: fn(&mut Builder<'_>) -> bool, ops: &'static [&'static str]) -> bool {
	chain(builder, |builder| {
		if !next(builder) {
			return false;
		}
		loop {
			let iteration_start = builder.pos;
			let children_before = builder.scope_len();
			let Some(op) = ops.iter().find(|op| builder.remaining().starts_with(**op)) else { break };
			let op_span = Span::new(builder.pos, op.len());
			builder.set_pos(builder.pos + op.len());
			builder.push(Token::new(TokenKind::Binary, op_span));
			if !next(builder) {
				builder.set_pos(iteration_start);
				builder.truncate_scope(children_before);
				break;
			}
		}
		true
	})
}

/// `RSExpression := Comparison (('&&' | '||') Comparison)*`
fn parse_rs_expression(builder: &mut Builder<'_>) -> bool {
	binary_chain(builder, parse_comparison, &["&&", "||"])
}

/// `Comparison := Additive (('<=' | '>=' | '<' | '>' | '==' | '!=') Additive)*`
fn parse_comparison(builder: &mut Builder<'_>) -> bool {
	binary_chain(builder, parse_additive, &["<=", ">=", "==", "!=", "<", ">"])
}

/// `Additive := Term (('+' | '-') Term)*`
fn parse_additive(builder: &mut Builder<'_>) -> bool {
	binary_chain(builder, parse_term, &["+", "-"])
}

/// `Term := Factor (('*' | '/' | '%') Factor)*`
fn parse_term(builder: &mut Builder<'_>) -> bool {
	binary_chain(builder, parse_factor, &["*", "/", "%"])
}

/// `Factor := space (BlockValue | Unary) space`. Always produces exactly one
/// child, so unlike the other precedence levels this never needs its own
/// `chain()` wrapper — it's a transparent pass-through whose only job is to
/// consume surrounding whitespace.
fn parse_factor(builder: &mut Builder<'_>) -> bool {
	skip_ws(builder);
	let ok = parse_block_value(builder) || parse_unary_or_increment(builder);
	skip_ws(builder);
	ok
}

/// `Unary := ('++' | '--' | '-' | '!') space (BlockValue | Unary)`. Produces
/// an `Increment` token for `++`/`--` or a `Unary` token for `-`/`!`, spanned
/// over just the operator lexeme, with the operand as its single child.
fn parse_unary_or_increment(builder: &mut Builder<'_>) -> bool {
	const OPERATORS: [(&str, TokenKind); 4] =
		[("++", TokenKind::Increment), ("--", TokenKind::Increment), ("-", TokenKind::Unary), ("!", TokenKind::Unary)];
	let Some((lexeme, kind)) = OPERATORS.iter().find(|(lexeme, _)| builder.remaining().starts_with(lexeme)) else {
		return false;
	};
	if !enter(builder) {
		return false; // recursion limit reached
	}
	let start = builder.pos;
	builder.set_pos(start + lexeme.len());
	skip_ws(builder);
	let (ok, children) = with_scope(builder, |builder| parse_block_value(builder) || parse_unary_or_increment(builder));
	leave(builder);
	if !ok {
		builder.set_pos(start);
		return false;
	}
	builder.push(Token { kind: *kind, value: None, span: Span::new(start, lexeme.len()), children });
	true
}

/// `BlockValue := Primary (MemberRef | FunctionArgs | Index)*`
fn parse_block_value(builder: &mut Builder<'_>) -> bool {
	chain(builder, |builder| {
		if !parse_primary(builder) {
			return false;
		}
		loop {
			if parse_member_ref(builder) || parse_function_args(builder) || parse_index(builder) {
				continue;
			}
			break;
		}
		true
	})
}

/// `Primary := ExplicitConversion | Number | String | Bool | Constructor | Reference | '(' Expression ')'`
fn parse_primary(builder: &mut Builder<'_>) -> bool {
	parse_explicit_conversion(builder)
		|| parse_number_literal(builder)
		|| parse_string_literal(builder)
		|| parse_bool_literal(builder)
		|| parse_constructor(builder)
		|| parse_reference(builder)
		|| parse_paren_expression(builder)
}

/// `ExplicitConversion := '(' Identifier ')' Factor`
fn parse_explicit_conversion(builder: &mut Builder<'_>) -> bool {
	let start = builder.pos;
	if !eat_literal(builder, "(") {
		return false;
	}
	skip_ws(builder);
	let Some(name) = match_identifier(builder) else {
		builder.set_pos(start);
		return false;
	};
	skip_ws(builder);
	if !eat_literal(builder, ")") {
		builder.set_pos(start);
		return false;
	}
	fixed_with_value_at(builder, start, TokenKind::ExplicitConversion, TokenValue::Name(name), parse_factor)
}

/// Like `fixed`, but also attaches a parsed name/value and measures the span
/// from `start` (already past a prefix matched outside the scope) rather
/// than from the current cursor.
fn fixed_with_value_at(builder: &mut Builder<'_>, start: usize, kind: TokenKind, value: TokenValue, body: impl FnOnce(&mut Builder<'_>) -> bool) -> bool {
	let (ok, children) = with_scope(builder, body);
	if !ok {
		builder.set_pos(start);
		return false;
	}
	builder.push(Token { kind, value: Some(value), span: Span::new(start, builder.pos - start), children });
	true
}

fn parse_number_literal(builder: &mut Builder<'_>) -> bool {
	let start = builder.pos;
	if let Some(matched) = regex_macro::regex!(r"^\d+\.\d+").find(builder.remaining()) {
		let text = matched.as_str();
		let value: f64 = text.parse().expect("regex guarantees a valid float literal");
		builder.set_pos(start + text.len());
		builder.push(Token::literal(Value::Double(value), Span::new(start, text.len())));
		return true;
	}
	if let Some(matched) = regex_macro::regex!(r"^\d+").find(builder.remaining()) {
		let text = matched.as_str();
		let value: i32 = text.parse().unwrap_or(i32::MAX);
		builder.set_pos(start + text.len());
		builder.push(Token::literal(Value::Int(value), Span::new(start, text.len())));
		return true;
	}
	false
}

fn parse_string_literal(builder: &mut Builder<'_>) -> bool {
	let Some(matched) = regex_macro::regex!(r#"(?s)^"(?:\\.|[^"\\])*""#).find(builder.remaining()) else { return false };
	let raw = matched.as_str();
	let start = builder.pos;
	let inner = &raw[1..raw.len() - 1];
	let unescaped = inner.replace("\\\"", "\"").replace("\\\\", "\\");
	builder.set_pos(start + raw.len());
	builder.push(Token::literal(Value::string(unescaped), Span::new(start, raw.len())));
	true
}

fn parse_bool_literal(builder: &mut Builder<'_>) -> bool {
	let Some(matched) = regex_macro::regex!(r"^(true|false)\b").find(builder.remaining()) else { return false };
	let text = matched.as_str();
	let start = builder.pos;
	builder.set_pos(start + text.len());
	builder.push(Token::literal(Value::Bool(text == "true"), Span::new(start, text.len())));
	true
}

fn parse_reference(builder: &mut Builder<'_>) -> bool {
	let start = builder.pos;
	let Some(name) = match_identifier(builder) else { return false };
	builder.push(Token::name(TokenKind::Reference, name, Span::new(start, builder.pos - start)));
	true
}

/// `'(' Expression ')'`, the grouping alternative. Doesn't introduce a token
/// of its own — the inner `Expression` already pushed its result, and
/// parentheses only ever affect precedence, never tree shape.
fn parse_paren_expression(builder: &mut Builder<'_>) -> bool {
	let start = builder.pos;
	if !eat_literal(builder, "(") {
		return false;
	}
	if !parse_expression(builder) {
		builder.set_pos(start);
		return false;
	}
	if !eat_literal(builder, ")") {
		builder.set_pos(start);
		return false;
	}
	true
}

/// `MemberRef := '.' Identifier`
fn parse_member_ref(builder: &mut Builder<'_>) -> bool {
	let start = builder.pos;
	if !eat_literal(builder, ".") {
		return false;
	}
	let Some(name) = match_identifier(builder) else {
		builder.set_pos(start);
		return false;
	};
	builder.push(Token::name(TokenKind::MemberRef, name, Span::new(start, builder.pos - start)));
	true
}

/// `FunctionArgs := '(' (Expression (',' Expression)*)? ')'`
fn parse_function_args(builder: &mut Builder<'_>) -> bool {
	if !builder.remaining().starts_with('(') {
		return false;
	}
	fixed(builder, TokenKind::Function, |builder| {
		builder.set_pos(builder.pos + 1);
		parse_arg_list(builder) && eat_literal(builder, ")")
	})
}

/// `Index := '[' (Expression (',' Expression)*)? ']'`
fn parse_index(builder: &mut Builder<'_>) -> bool {
	if !builder.remaining().starts_with('[') {
		return false;
	}
	fixed(builder, TokenKind::Index, |builder| {
		builder.set_pos(builder.pos + 1);
		parse_arg_list(builder) && eat_literal(builder, "]")
	})
}

/// The optional comma-separated `Expression` list shared by `FunctionArgs`,
/// `Index`, and `Constructor`. Always succeeds (an empty list is valid); a
/// dangling trailing comma is treated as the end of the list rather than an
/// error, leaving the comma for the caller's closing-delimiter check to
/// reject.
fn parse_arg_list(builder: &mut Builder<'_>) -> bool {
	skip_ws(builder);
	if !parse_expression(builder) {
		return true;
	}
	loop {
		let snapshot = builder.pos;
		skip_ws(builder);
		if !eat_literal(builder, ",") {
			builder.set_pos(snapshot);
			break;
		}
		skip_ws(builder);
		if !parse_expression(builder) {
			builder.set_pos(snapshot);
			break;
		}
	}
	skip_ws(builder);
	true
}

/// `Constructor := 'new' Identifier FunctionArgs`. The argument list becomes
/// the `Constructor` token's own children directly — there's no nested
/// `Function` token, since the call is intrinsic to construction.
fn parse_constructor(builder: &mut Builder<'_>) -> bool {
	let start = builder.pos;
	if !eat_literal(builder, "new") {
		return false;
	}
	if builder.remaining().starts_with(|c: char| c.is_alphanumeric() || c == '_') {
		builder.set_pos(start);
		return false;
	}
	skip_ws(builder);
	let Some(name) = match_identifier(builder) else {
		builder.set_pos(start);
		return false;
	};
	skip_ws(builder);
	if !builder.remaining().starts_with('(') {
		builder.set_pos(start);
		return false;
	}
	builder.set_pos(builder.pos + 1);
	fixed_with_value_at(builder, start, TokenKind::Constructor, TokenValue::Name(name), |builder| parse_arg_list(builder) && eat_literal(builder, ")"))
}
