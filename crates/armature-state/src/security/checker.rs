//! Resource access checking

use super::evaluator::{SecurityVariables, evaluate_bool};
use super::expression::{Expr, parse_expression};
use armature_core::Result;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Decides whether a security expression grants access
pub trait ResourceAccessChecker: Send + Sync {
	fn is_granted(
		&self,
		resource_class: &str,
		expression: &str,
		variables: &SecurityVariables<'_>,
	) -> Result<bool>;
}

/// Checker backed by the built-in expression language
///
/// Parsed expressions are cached by source text.
#[derive(Default)]
pub struct ExpressionAccessChecker {
	parsed: RwLock<HashMap<String, Arc<Expr>>>,
}

impl ExpressionAccessChecker {
	pub fn new() -> Self {
		Self::default()
	}

	fn compile(&self, expression: &str) -> Result<Arc<Expr>> {
		if let Some(expr) = self.parsed.read().get(expression) {
			return Ok(Arc::clone(expr));
		}
		let expr = Arc::new(parse_expression(expression)?);
		self.parsed
			.write()
			.insert(expression.to_string(), Arc::clone(&expr));
		Ok(expr)
	}
}

impl ResourceAccessChecker for ExpressionAccessChecker {
	fn is_granted(
		&self,
		resource_class: &str,
		expression: &str,
		variables: &SecurityVariables<'_>,
	) -> Result<bool> {
		let expr = self.compile(expression)?;
		let granted = evaluate_bool(&expr, variables)?;
		tracing::debug!(resource_class, expression, granted, "Security expression evaluated");
		Ok(granted)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::user::UserToken;
	use armature_core::Error;
	use rstest::rstest;

	#[rstest]
	fn test_expressions_are_cached() {
		// Arrange
		let checker = ExpressionAccessChecker::new();
		let user = UserToken::new("bob").with_role("ROLE_USER");
		let variables = SecurityVariables::new().with_user(Some(&user));

		// Act
		let first = checker
			.is_granted("Book", "is_granted('ROLE_USER')", &variables)
			.unwrap();
		let second = checker
			.is_granted("Book", "is_granted('ROLE_USER')", &variables)
			.unwrap();

		// Assert
		assert!(first && second);
		assert_eq!(checker.parsed.read().len(), 1);
	}

	#[rstest]
	fn test_invalid_expression_is_a_configuration_error() {
		let checker = ExpressionAccessChecker::new();

		let result = checker.is_granted("Book", "is_granted(", &SecurityVariables::new());

		assert!(matches!(result, Err(Error::Configuration(_))));
	}
}
