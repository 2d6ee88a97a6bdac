//! Security expression evaluation
//!
//! Expressions see the variables `user`, `object`, `previous_object` and
//! `request`, plus whatever the caller adds through
//! [`SecurityVariables::with_variable`]. The functions `is_granted(attribute)`
//! and `is_authenticated()` consult the user token.

use super::expression::{BinaryOp, Expr};
use crate::request::ApiRequest;
use crate::user::UserToken;
use armature_core::{ApiResource, Error, PropertyValue, Result};
use indexmap::IndexMap;
use serde_json::Value;
use std::cmp::Ordering;

/// Attribute granted to everyone, authenticated or not
pub const PUBLIC_ACCESS: &str = "PUBLIC_ACCESS";

/// Variables visible to one evaluation
#[derive(Default, Clone, Copy)]
struct Roots<'a> {
	user: Option<&'a UserToken>,
	object: Option<&'a dyn ApiResource>,
	previous_object: Option<&'a dyn ApiResource>,
	request: Option<&'a ApiRequest>,
}

/// Variables an expression is evaluated against
#[derive(Default, Clone)]
pub struct SecurityVariables<'a> {
	roots: Roots<'a>,
	extra: IndexMap<String, Value>,
}

impl<'a> SecurityVariables<'a> {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_user(mut self, user: Option<&'a UserToken>) -> Self {
		self.roots.user = user;
		self
	}

	pub fn with_object(mut self, object: Option<&'a dyn ApiResource>) -> Self {
		self.roots.object = object;
		self
	}

	pub fn with_previous_object(mut self, previous: Option<&'a dyn ApiResource>) -> Self {
		self.roots.previous_object = previous;
		self
	}

	pub fn with_request(mut self, request: Option<&'a ApiRequest>) -> Self {
		self.roots.request = request;
		self
	}

	/// Extra root variable, e.g. `parameter` for parameter security
	pub fn with_variable(mut self, name: impl Into<String>, value: Value) -> Self {
		self.extra.insert(name.into(), value);
		self
	}

	pub fn user(&self) -> Option<&'a UserToken> {
		self.roots.user
	}
}

/// Evaluate `expr` to a JSON value
pub fn evaluate(expr: &Expr, variables: &SecurityVariables<'_>) -> Result<Value> {
	match expr {
		Expr::Literal(value) => Ok(value.clone()),
		Expr::Array(items) => items
			.iter()
			.map(|item| evaluate(item, variables))
			.collect::<Result<Vec<_>>>()
			.map(Value::Array),
		Expr::Path(segments) => resolve_path(segments, variables),
		Expr::Call { name, args } => call(name, args, variables),
		Expr::Not(inner) => Ok(Value::Bool(!truthy(&evaluate(inner, variables)?))),
		Expr::Binary { op, left, right } => binary(*op, left, right, variables),
	}
}

/// Evaluate `expr` and coerce the result to a boolean
///
/// # Examples
///
/// ```
/// use armature_state::UserToken;
/// use armature_state::security::{SecurityVariables, evaluate_bool, parse_expression};
///
/// let user = UserToken::new("alice").with_role("ROLE_ADMIN");
/// let variables = SecurityVariables::new().with_user(Some(&user));
/// let expr = parse_expression("is_granted('ROLE_ADMIN') and user.username == 'alice'").unwrap();
/// assert!(evaluate_bool(&expr, &variables).unwrap());
/// ```
pub fn evaluate_bool(expr: &Expr, variables: &SecurityVariables<'_>) -> Result<bool> {
	evaluate(expr, variables).map(|value| truthy(&value))
}

fn call(name: &str, args: &[Expr], variables: &SecurityVariables<'_>) -> Result<Value> {
	match name {
		"is_granted" => {
			let [attribute] = args else {
				return Err(Error::Configuration(
					"is_granted() expects exactly one argument".to_string(),
				));
			};
			let attribute = evaluate(attribute, variables)?;
			let Value::String(attribute) = attribute else {
				return Err(Error::Configuration(
					"is_granted() expects a string attribute".to_string(),
				));
			};
			let granted = attribute == PUBLIC_ACCESS
				|| variables
					.roots
					.user
					.is_some_and(|user| user.is_granted(&attribute));
			Ok(Value::Bool(granted))
		}
		"is_authenticated" => Ok(Value::Bool(variables.roots.user.is_some())),
		other => Err(Error::Configuration(format!(
			"Unknown function \"{}\" in security expression",
			other
		))),
	}
}

fn resolve_path(segments: &[String], variables: &SecurityVariables<'_>) -> Result<Value> {
	let Some((root, rest)) = segments.split_first() else {
		return Ok(Value::Null);
	};
	match root.as_str() {
		"user" => Ok(match variables.roots.user {
			None => Value::Null,
			Some(user) => match rest.split_first() {
				None => Value::String(user.identifier.clone()),
				Some((first, tail)) => index_value(user.property(first), tail),
			},
		}),
		"object" => Ok(resource_path(variables.roots.object, rest)),
		"previous_object" => Ok(resource_path(variables.roots.previous_object, rest)),
		"request" => Ok(request_path(variables.roots.request, rest)),
		other => match variables.extra.get(other) {
			Some(value) => Ok(index_value(value.clone(), rest)),
			None => Err(Error::Configuration(format!(
				"Unknown variable \"{}\" in security expression",
				other
			))),
		},
	}
}

fn resource_path(object: Option<&dyn ApiResource>, segments: &[String]) -> Value {
	let Some(object) = object else {
		return Value::Null;
	};
	let Some((first, rest)) = segments.split_first() else {
		return Value::String(object.resource_class().to_string());
	};
	match object.get_property(first) {
		None => Value::Null,
		Some(PropertyValue::Scalar(value)) => index_value(value, rest),
		Some(PropertyValue::Resource(related)) => resource_path(Some(related.as_ref()), rest),
		Some(PropertyValue::Resources(items)) if rest.is_empty() => Value::Array(
			items
				.iter()
				.map(|item| Value::String(item.resource_class().to_string()))
				.collect(),
		),
		Some(PropertyValue::Resources(_)) => Value::Null,
	}
}

fn request_path(request: Option<&ApiRequest>, segments: &[String]) -> Value {
	let Some(request) = request else {
		return Value::Null;
	};
	let Some((first, rest)) = segments.split_first() else {
		return Value::String(request.path.clone());
	};
	match first.as_str() {
		"method" => Value::String(request.method.as_str().to_string()),
		"path" => Value::String(request.path.clone()),
		"query" => index_value(Value::Object(request.query.clone()), rest),
		"headers" => match rest.first() {
			Some(name) => request
				.header(name.replace('_', "-").as_str())
				.map(|v| Value::String(v.to_string()))
				.unwrap_or(Value::Null),
			None => Value::Null,
		},
		_ => Value::Null,
	}
}

fn index_value(value: Value, segments: &[String]) -> Value {
	segments.iter().fold(value, |current, segment| match current {
		Value::Object(mut map) => map.remove(segment).unwrap_or(Value::Null),
		Value::Array(mut items) => match segment.parse::<usize>() {
			Ok(idx) if idx < items.len() => items.swap_remove(idx),
			_ => Value::Null,
		},
		_ => Value::Null,
	})
}

fn binary(
	op: BinaryOp,
	left: &Expr,
	right: &Expr,
	variables: &SecurityVariables<'_>,
) -> Result<Value> {
	let value = |expr: &Expr| evaluate(expr, variables);
	let result = match op {
		// Right side only evaluated when needed
		BinaryOp::And => truthy(&value(left)?) && truthy(&value(right)?),
		BinaryOp::Or => truthy(&value(left)?) || truthy(&value(right)?),
		BinaryOp::Eq => loose_eq(&value(left)?, &value(right)?),
		BinaryOp::Ne => !loose_eq(&value(left)?, &value(right)?),
		BinaryOp::Lt => compare(&value(left)?, &value(right)?) == Some(Ordering::Less),
		BinaryOp::Le => matches!(
			compare(&value(left)?, &value(right)?),
			Some(Ordering::Less | Ordering::Equal)
		),
		BinaryOp::Gt => compare(&value(left)?, &value(right)?) == Some(Ordering::Greater),
		BinaryOp::Ge => matches!(
			compare(&value(left)?, &value(right)?),
			Some(Ordering::Greater | Ordering::Equal)
		),
		BinaryOp::In => contains(&value(right)?, &value(left)?),
		BinaryOp::NotIn => !contains(&value(right)?, &value(left)?),
	};
	Ok(Value::Bool(result))
}

/// `false`, `null`, `0`, `""` and empty containers are false
pub fn truthy(value: &Value) -> bool {
	match value {
		Value::Null => false,
		Value::Bool(b) => *b,
		Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
		Value::String(s) => !s.is_empty(),
		Value::Array(items) => !items.is_empty(),
		Value::Object(map) => !map.is_empty(),
	}
}

fn as_number(value: &Value) -> Option<f64> {
	match value {
		Value::Number(n) => n.as_f64(),
		Value::String(s) => s.trim().parse().ok(),
		_ => None,
	}
}

/// Numbers compare numerically even when one side is a numeric string
fn loose_eq(left: &Value, right: &Value) -> bool {
	match (left, right) {
		(Value::Number(_), Value::String(_)) | (Value::String(_), Value::Number(_)) => {
			match (as_number(left), as_number(right)) {
				(Some(l), Some(r)) => l == r,
				_ => false,
			}
		}
		(Value::Number(l), Value::Number(r)) => l.as_f64() == r.as_f64(),
		_ => left == right,
	}
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
	match (left, right) {
		(Value::String(l), Value::String(r)) => Some(l.cmp(r)),
		_ => as_number(left)?.partial_cmp(&as_number(right)?),
	}
}

fn contains(haystack: &Value, needle: &Value) -> bool {
	match haystack {
		Value::Array(items) => items.iter().any(|item| loose_eq(item, needle)),
		Value::String(s) => needle.as_str().is_some_and(|n| s.contains(n)),
		Value::Object(map) => needle.as_str().is_some_and(|n| map.contains_key(n)),
		_ => false,
	}
}
