//! Operation security stage

use super::Provider;
use crate::context::{OperationContext, UriVariables};
use crate::data::StateData;
use crate::security::{ResourceAccessChecker, SecurityVariables};
use armature_core::{Error, Result};
use armature_metadata::Operation;
use async_trait::async_trait;
use std::sync::Arc;

/// Which of the operation's expressions a stage checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessCheckEvent {
	/// `security`, checked against the data as read
	Security,
	/// `security_post_denormalize`, checked against the data after the body was applied
	PostDenormalize,
}

/// Evaluates an operation security expression after the inner stage ran
///
/// `object` is the provided item; `previous_object` is the item as read,
/// before deserialization.
pub struct AccessCheckerProvider {
	inner: Arc<dyn Provider>,
	checker: Arc<dyn ResourceAccessChecker>,
	event: AccessCheckEvent,
}

impl AccessCheckerProvider {
	pub fn new(
		inner: Arc<dyn Provider>,
		checker: Arc<dyn ResourceAccessChecker>,
		event: AccessCheckEvent,
	) -> Self {
		Self {
			inner,
			checker,
			event,
		}
	}
}

#[async_trait]
impl Provider for AccessCheckerProvider {
	async fn provide(
		&self,
		operation: &Operation,
		uri_variables: &UriVariables,
		context: &mut OperationContext,
	) -> Result<StateData> {
		let body = self.inner.provide(operation, uri_variables, context).await?;
		if context.request.is_none() {
			return Ok(body);
		}

		let operation = context.resolved_operation(operation);
		let (expression, message) = match self.event {
			AccessCheckEvent::Security => (&operation.security, &operation.security_message),
			AccessCheckEvent::PostDenormalize => (
				&operation.security_post_denormalize,
				&operation.security_post_denormalize_message,
			),
		};
		let Some(expression) = expression.as_deref() else {
			return Ok(body);
		};

		let variables = SecurityVariables::new()
			.with_user(context.user.as_ref())
			.with_request(context.request.as_deref())
			.with_object(body.as_item())
			.with_previous_object(context.previous_data.as_deref());
		if !self
			.checker
			.is_granted(&operation.class, expression, &variables)?
		{
			tracing::debug!(
				resource_class = %operation.class,
				operation = %operation.name,
				event = ?self.event,
				"Access denied"
			);
			return Err(Error::AccessDenied(
				message.clone().unwrap_or_else(|| "Access Denied.".to_string()),
			));
		}
		Ok(body)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::provider::test_support::StubProvider;
	use crate::request::ApiRequest;
	use crate::security::ExpressionAccessChecker;
	use crate::user::UserToken;
	use armature_macros::ApiResource;
	use armature_metadata::HttpMethod;
	use rstest::rstest;

	#[derive(Debug, Clone, Default, ApiResource)]
	struct Note {
		#[api(identifier)]
		pub id: i64,
		pub owner: String,
	}

	fn note(owner: &str) -> Note {
		Note {
			id: 1,
			owner: owner.to_string(),
		}
	}

	async fn check(
		event: AccessCheckEvent,
		operation: Operation,
		user: &str,
		previous: Option<Note>,
	) -> Result<StateData> {
		let provider = AccessCheckerProvider::new(
			StubProvider::item(note("alice")),
			Arc::new(ExpressionAccessChecker::new()),
			event,
		);
		let mut context = OperationContext::new()
			.with_request(ApiRequest::put("/notes/1").with_user(UserToken::new(user)));
		context.previous_data = previous.map(|n| Box::new(n) as Box<dyn armature_core::ApiResource>);
		provider
			.provide(&operation, &UriVariables::new(), &mut context)
			.await
	}

	#[rstest]
	#[case("alice", true)]
	#[case("bob", false)]
	#[tokio::test]
	async fn test_security_uses_object(#[case] user: &str, #[case] granted: bool) {
		let operation =
			Operation::new(HttpMethod::Get, false).with_security("object.owner == user.username");

		let result = check(AccessCheckEvent::Security, operation, user, None).await;

		assert_eq!(result.is_ok(), granted);
		if !granted {
			assert!(matches!(result, Err(Error::AccessDenied(m)) if m == "Access Denied."));
		}
	}

	#[rstest]
	#[tokio::test]
	async fn test_post_denormalize_sees_previous_object() {
		// Arrange
		let mut operation = Operation::new(HttpMethod::Put, false);
		operation.security_post_denormalize =
			Some("previous_object.owner == object.owner".to_string());
		operation.security_post_denormalize_message = Some("Owner cannot change.".to_string());

		// Act
		let unchanged =
			check(AccessCheckEvent::PostDenormalize, operation.clone(), "alice", Some(note("alice")))
				.await;
		let changed =
			check(AccessCheckEvent::PostDenormalize, operation, "alice", Some(note("carol"))).await;

		// Assert
		assert!(unchanged.is_ok());
		assert!(matches!(changed, Err(Error::AccessDenied(m)) if m == "Owner cannot change."));
	}

	#[rstest]
	#[tokio::test]
	async fn test_other_event_expression_is_ignored() {
		let operation = Operation::new(HttpMethod::Get, false).with_security("false");

		let result = check(AccessCheckEvent::PostDenormalize, operation, "bob", None).await;

		assert!(result.is_ok());
	}
}
