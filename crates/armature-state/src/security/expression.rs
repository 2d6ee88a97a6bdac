//! Security expression grammar
//!
//! ```text
//! expr       := or
//! or         := and (("or" | "||") and)*
//! and        := unary (("and" | "&&") unary)*
//! unary      := ("not" | "!") unary | comparison
//! comparison := primary (op primary)?
//! op         := "===" | "==" | "!==" | "!=" | "<=" | ">=" | "<" | ">" | "not in" | "in"
//! primary    := "(" expr ")" | "[" expr,* "]" | literal | call | path
//! call       := identifier "(" expr,* ")"
//! path       := identifier ("." identifier)*
//! ```

use armature_core::{Error, Result};
use nom::{
	IResult, Parser,
	branch::alt,
	bytes::complete::{tag, take_while},
	character::complete::{alpha1, alphanumeric1, char, digit1, multispace0, multispace1, satisfy},
	combinator::{all_consuming, map, map_res, not, opt, recognize, value},
	multi::{many0, many0_count, separated_list0},
	sequence::{delimited, pair, preceded, terminated},
};
use serde_json::Value;

// ============================================================================
// AST
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
	And,
	Or,
	Eq,
	Ne,
	Lt,
	Le,
	Gt,
	Ge,
	In,
	NotIn,
}

/// Parsed security expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
	Literal(Value),
	Array(Vec<Expr>),
	/// `object.owner.name` is `["object", "owner", "name"]`
	Path(Vec<String>),
	Call { name: String, args: Vec<Expr> },
	Not(Box<Expr>),
	Binary {
		op: BinaryOp,
		left: Box<Expr>,
		right: Box<Expr>,
	},
}

// ============================================================================
// Nom Parsers
// ============================================================================

type ParseError<'a> = nom::error::Error<&'a str>;

fn ws<'a, O, F>(inner: F) -> impl Parser<&'a str, Output = O, Error = ParseError<'a>>
where
	F: Parser<&'a str, Output = O, Error = ParseError<'a>>,
{
	delimited(multispace0, inner, multispace0)
}

/// A word not directly followed by an identifier character
fn keyword<'a>(word: &'static str) -> impl Parser<&'a str, Output = &'a str, Error = ParseError<'a>> {
	terminated(
		tag(word),
		not(satisfy(|c: char| c.is_alphanumeric() || c == '_')),
	)
}

fn identifier(input: &str) -> IResult<&str, &str> {
	recognize(pair(
		alt((alpha1, tag("_"))),
		many0_count(alt((alphanumeric1, tag("_")))),
	))
	.parse(input)
}

fn string_literal(input: &str) -> IResult<&str, Value> {
	map(
		alt((
			delimited(char('\''), take_while(|c: char| c != '\''), char('\'')),
			delimited(char('"'), take_while(|c: char| c != '"'), char('"')),
		)),
		|s: &str| Value::String(s.to_string()),
	)
	.parse(input)
}

fn number_literal(input: &str) -> IResult<&str, Value> {
	map_res(
		recognize((opt(char('-')), digit1, opt(pair(char('.'), digit1)))),
		|raw: &str| -> std::result::Result<Value, String> {
			if raw.contains('.') {
				raw.parse::<f64>()
					.ok()
					.and_then(serde_json::Number::from_f64)
					.map(Value::Number)
					.ok_or_else(|| raw.to_string())
			} else {
				raw.parse::<i64>()
					.map(|n| Value::Number(n.into()))
					.map_err(|e| e.to_string())
			}
		},
	)
	.parse(input)
}

fn literal(input: &str) -> IResult<&str, Expr> {
	map(
		alt((
			value(Value::Bool(true), keyword("true")),
			value(Value::Bool(false), keyword("false")),
			value(Value::Null, keyword("null")),
			number_literal,
			string_literal,
		)),
		Expr::Literal,
	)
	.parse(input)
}

fn arguments(input: &str) -> IResult<&str, Vec<Expr>> {
	separated_list0(ws(char(',')), expression).parse(input)
}

fn array(input: &str) -> IResult<&str, Expr> {
	map(
		delimited(ws(char('[')), arguments, ws(char(']'))),
		Expr::Array,
	)
	.parse(input)
}

fn call(input: &str) -> IResult<&str, Expr> {
	map(
		pair(
			identifier,
			delimited(ws(char('(')), arguments, char(')')),
		),
		|(name, args)| Expr::Call {
			name: name.to_string(),
			args,
		},
	)
	.parse(input)
}

fn path(input: &str) -> IResult<&str, Expr> {
	map(
		pair(identifier, many0(preceded(char('.'), identifier))),
		|(root, rest)| {
			let mut segments = vec![root.to_string()];
			segments.extend(rest.into_iter().map(str::to_string));
			Expr::Path(segments)
		},
	)
	.parse(input)
}

fn parenthesized(input: &str) -> IResult<&str, Expr> {
	delimited(ws(char('(')), expression, ws(char(')'))).parse(input)
}

fn primary(input: &str) -> IResult<&str, Expr> {
	ws(alt((parenthesized, array, literal, call, path))).parse(input)
}

fn comparison_op(input: &str) -> IResult<&str, BinaryOp> {
	alt((
		value(BinaryOp::Eq, tag("===")),
		value(BinaryOp::Eq, tag("==")),
		value(BinaryOp::Ne, tag("!==")),
		value(BinaryOp::Ne, tag("!=")),
		value(BinaryOp::Le, tag("<=")),
		value(BinaryOp::Ge, tag(">=")),
		value(BinaryOp::Lt, tag("<")),
		value(BinaryOp::Gt, tag(">")),
		value(BinaryOp::NotIn, (keyword("not"), multispace1, keyword("in"))),
		value(BinaryOp::In, keyword("in")),
	))
	.parse(input)
}

fn comparison(input: &str) -> IResult<&str, Expr> {
	map(
		pair(primary, opt(pair(ws(comparison_op), primary))),
		|(left, rest)| match rest {
			Some((op, right)) => Expr::Binary {
				op,
				left: Box::new(left),
				right: Box::new(right),
			},
			None => left,
		},
	)
	.parse(input)
}

fn unary(input: &str) -> IResult<&str, Expr> {
	alt((
		map(
			preceded(ws(alt((keyword("not"), tag("!")))), unary),
			|inner| Expr::Not(Box::new(inner)),
		),
		comparison,
	))
	.parse(input)
}

fn fold_binary(op: BinaryOp, first: Expr, rest: Vec<Expr>) -> Expr {
	rest.into_iter().fold(first, |left, right| Expr::Binary {
		op,
		left: Box::new(left),
		right: Box::new(right),
	})
}

fn and_expression(input: &str) -> IResult<&str, Expr> {
	map(
		pair(
			unary,
			many0(preceded(ws(alt((keyword("and"), tag("&&")))), unary)),
		),
		|(first, rest)| fold_binary(BinaryOp::And, first, rest),
	)
	.parse(input)
}

fn expression(input: &str) -> IResult<&str, Expr> {
	map(
		pair(
			and_expression,
			many0(preceded(ws(alt((keyword("or"), tag("||")))), and_expression)),
		),
		|(first, rest)| fold_binary(BinaryOp::Or, first, rest),
	)
	.parse(input)
}

// ============================================================================
// Entry point
// ============================================================================

/// Parse a complete security expression
///
/// # Examples
///
/// ```
/// use armature_state::security::{BinaryOp, Expr, parse_expression};
///
/// let expr = parse_expression("is_granted('ROLE_ADMIN') or object.owner == user.username").unwrap();
/// assert!(matches!(expr, Expr::Binary { op: BinaryOp::Or, .. }));
/// assert!(parse_expression("object.owner ==").is_err());
/// ```
pub fn parse_expression(source: &str) -> Result<Expr> {
	match all_consuming(ws(expression)).parse(source) {
		Ok((_, expr)) => Ok(expr),
		Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
			let position = source.len() - e.input.len();
			Err(Error::Configuration(format!(
				"Invalid security expression \"{}\": unexpected input at position {}",
				source, position
			)))
		}
		Err(nom::Err::Incomplete(_)) => Err(Error::Configuration(format!(
			"Invalid security expression \"{}\": incomplete input",
			source
		))),
	}
}
