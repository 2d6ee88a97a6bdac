//! Parameter security stage

use super::Provider;
use crate::context::{OperationContext, UriVariables};
use crate::data::StateData;
use crate::security::{ResourceAccessChecker, SecurityVariables};
use armature_core::{Error, Result};
use armature_metadata::Operation;
use async_trait::async_trait;
use std::sync::Arc;

const DEFAULT_DENIED_MESSAGE: &str = "Access Denied.";

/// Checks `Parameter::security` for every parameter the request supplied
///
/// The expression sees the parameter value as `parameter`, plus the usual
/// `user`, `request` and `object` variables.
pub struct SecurityParameterProvider {
	inner: Arc<dyn Provider>,
	checker: Arc<dyn ResourceAccessChecker>,
}

impl SecurityParameterProvider {
	pub fn new(inner: Arc<dyn Provider>, checker: Arc<dyn ResourceAccessChecker>) -> Self {
		Self { inner, checker }
	}
}

#[async_trait]
impl Provider for SecurityParameterProvider {
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
		for parameter in operation.parameters.values() {
			let (Some(expression), Some(value)) =
				(parameter.security.as_deref(), parameter.value.as_value())
			else {
				continue;
			};
			let variables = SecurityVariables::new()
				.with_user(context.user.as_ref())
				.with_request(context.request.as_deref())
				.with_object(body.as_item())
				.with_variable("parameter", value.clone());
			if !self
				.checker
				.is_granted(&operation.class, expression, &variables)?
			{
				tracing::debug!(parameter = %parameter.key, "Parameter security denied access");
				return Err(Error::AccessDenied(
					parameter
						.security_message
						.clone()
						.unwrap_or_else(|| DEFAULT_DENIED_MESSAGE.to_string()),
				));
			}
		}
		Ok(body)
	}
}
