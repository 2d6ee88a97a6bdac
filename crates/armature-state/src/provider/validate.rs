//! Validation stage

use super::Provider;
use crate::context::{OperationContext, UriVariables};
use crate::data::StateData;
use crate::validator::Validator;
use armature_core::Result;
use armature_metadata::Operation;
use async_trait::async_trait;
use std::sync::Arc;

/// Validates the deserialized item with the operation's validation groups
pub struct ValidateProvider {
	inner: Arc<dyn Provider>,
	validator: Arc<dyn Validator>,
}

impl ValidateProvider {
	pub fn new(inner: Arc<dyn Provider>, validator: Arc<dyn Validator>) -> Self {
		Self { inner, validator }
	}
}

#[async_trait]
impl Provider for ValidateProvider {
	async fn provide(
		&self,
		operation: &Operation,
		uri_variables: &UriVariables,
		context: &mut OperationContext,
	) -> Result<StateData> {
		let data = self.inner.provide(operation, uri_variables, context).await?;
		if context.request.is_none() {
			return Ok(data);
		}
		let operation = context.resolved_operation(operation);
		if !operation.validate {
			return Ok(data);
		}
		if let Some(item) = data.as_item() {
			self.validator
				.validate(item, operation.validation_groups.as_deref())?;
		}
		Ok(data)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::provider::test_support::StubProvider;
	use crate::request::ApiRequest;
	use crate::validator::ConstraintValidator;
	use armature_core::{Error, ResourceClassRegistry};
	use armature_macros::ApiResource;
	use armature_metadata::HttpMethod;
	use rstest::rstest;

	#[derive(Debug, Clone, Default, ApiResource)]
	struct Tag {
		#[api(identifier)]
		pub id: i64,
		#[api(not_blank)]
		pub label: String,
	}

	fn provider() -> ValidateProvider {
		let registry = Arc::new(ResourceClassRegistry::new().with::<Tag>());
		ValidateProvider::new(
			StubProvider::item(Tag::default()),
			Arc::new(ConstraintValidator::new(registry).unwrap()),
		)
	}

	#[rstest]
	#[case(HttpMethod::Post, true)]
	#[case(HttpMethod::Get, false)]
	#[tokio::test]
	async fn test_validates_writes_only(#[case] method: HttpMethod, #[case] fails: bool) {
		let mut context = OperationContext::new().with_request(ApiRequest::post("/tags"));

		let result = provider()
			.provide(&Operation::new(method, true), &UriVariables::new(), &mut context)
			.await;

		assert_eq!(matches!(result, Err(Error::Validation(_))), fails);
	}
}
