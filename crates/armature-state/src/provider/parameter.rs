//! Parameter resolution stage

use super::Provider;
use crate::context::{OperationContext, UriVariables};
use crate::data::StateData;
use crate::locator::ServiceLocator;
use armature_core::{ConstraintViolation, ConstraintViolationList, Result};
use armature_metadata::{Operation, Parameter, ParameterLocation, ParameterValue};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Extra-property key holding a parameter's resolved value
pub const API_VALUES_KEY: &str = "_api_values";

/// Custom logic attached to a parameter through `Parameter::provider`
///
/// Returning an operation replaces the active one for the rest of the request.
#[async_trait]
pub trait ParameterValueProvider: Send + Sync {
	async fn provide(
		&self,
		parameter: &Parameter,
		operation: &Operation,
		context: &OperationContext,
	) -> Result<Option<Operation>>;
}

pub type ParameterProviderLocator = ServiceLocator<dyn ParameterValueProvider>;

/// Resolves every declared parameter before delegating
pub struct ParameterProvider {
	inner: Arc<dyn Provider>,
	providers: Arc<ParameterProviderLocator>,
}

impl ParameterProvider {
	pub fn new(inner: Arc<dyn Provider>, providers: Arc<ParameterProviderLocator>) -> Self {
		Self { inner, providers }
	}
}

fn extract(
	parameter: &Parameter,
	uri_variables: &UriVariables,
	context: &OperationContext,
) -> Option<Value> {
	match parameter.location {
		ParameterLocation::Query => context.filters.get(&parameter.key).cloned(),
		ParameterLocation::Header => context
			.request
			.as_ref()
			.and_then(|request| request.header(parameter.key.as_str()))
			.map(|v| Value::String(v.to_string())),
		ParameterLocation::Path => uri_variables.get(&parameter.key).cloned(),
	}
}

#[async_trait]
impl Provider for ParameterProvider {
	async fn provide(
		&self,
		operation: &Operation,
		uri_variables: &UriVariables,
		context: &mut OperationContext,
	) -> Result<StateData> {
		if context.request.is_none() || operation.parameters.is_empty() {
			return self.inner.provide(operation, uri_variables, context).await;
		}

		let mut resolved = operation.clone();
		let mut violations = ConstraintViolationList::new();
		let keys: Vec<String> = resolved.parameters.keys().cloned().collect();
		for key in keys {
			let Some(parameter) = resolved.parameters.get(&key).cloned() else {
				continue;
			};
			let value = match extract(&parameter, uri_variables, context).or(parameter.default.clone()) {
				Some(value) => ParameterValue::Value(value),
				None => ParameterValue::NotFound,
			};
			if parameter.required && !value.is_found() {
				violations.add(
					ConstraintViolation::new(&key, "This parameter is required.")
						.with_code("required"),
				);
				continue;
			}

			let mut parameter = parameter.with_value(value);
			if let Some(found) = parameter.value.as_value().cloned() {
				parameter
					.extra_properties
					.insert(API_VALUES_KEY.to_string(), found.clone());
				context.parameters.insert(key.clone(), found);
			}
			resolved.parameters.insert(key.clone(), parameter.clone());

			if let Some(name) = parameter.provider.as_deref() {
				let provider = self.providers.resolve(Some(name), &resolved.class)?;
				if let Some(replacement) = provider.provide(&parameter, &resolved, context).await? {
					tracing::debug!(
						parameter = %key,
						operation = %replacement.name,
						"Parameter provider replaced the operation"
					);
					resolved = replacement;
				}
			}
		}
		violations.into_result()?;

		context.operation = Some(resolved.clone());
		self.inner.provide(&resolved, uri_variables, context).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::provider::test_support::StubProvider;
	use crate::request::ApiRequest;
	use armature_core::Error;
	use armature_metadata::HttpMethod;
	use http::HeaderValue;
	use http::header::HeaderName;
	use rstest::{fixture, rstest};
	use serde_json::json;

	struct SwapOperation;

	#[async_trait]
	impl ParameterValueProvider for SwapOperation {
		async fn provide(
			&self,
			parameter: &Parameter,
			operation: &Operation,
			_context: &OperationContext,
		) -> Result<Option<Operation>> {
			let mut replacement = operation.clone().with_name("swapped");
			replacement.extra.insert(
				"author".to_string(),
				parameter.value.as_value().cloned().unwrap_or(Value::Null),
			);
			Ok(Some(replacement))
		}
	}

	#[fixture]
	fn operation() -> Operation {
		Operation::new(HttpMethod::Get, true)
			.with_name("books_get_collection")
			.with_parameter(Parameter::query("author"))
			.with_parameter(Parameter::query("sort").with_default(json!("title")))
			.with_parameter(Parameter::header("x-tenant").with_required(true))
	}

	fn provider(inner: Arc<StubProvider>) -> ParameterProvider {
		let locator = ServiceLocator::new("parameter provider")
			.with_named("swap", Arc::new(SwapOperation) as Arc<dyn ParameterValueProvider>);
		ParameterProvider::new(inner, Arc::new(locator))
	}

	fn context(uri: &str, tenant: Option<&'static str>) -> OperationContext {
		let mut request = ApiRequest::get(uri);
		if let Some(tenant) = tenant {
			request = request.with_header(
				HeaderName::from_static("x-tenant"),
				HeaderValue::from_static(tenant),
			);
		}
		OperationContext::new().with_request(request)
	}

	#[rstest]
	#[tokio::test]
	async fn test_values_defaults_and_headers(operation: Operation) {
		// Arrange
		let inner = StubProvider::returning(StateData::Empty);
		let mut context = context("/books?author=Herbert", Some("acme"));

		// Act
		provider(inner.clone())
			.provide(&operation, &UriVariables::new(), &mut context)
			.await
			.unwrap();

		// Assert
		assert_eq!(context.parameters["author"], "Herbert");
		assert_eq!(context.parameters["sort"], "title");
		assert_eq!(context.parameters["x-tenant"], "acme");
		let resolved = context.operation.unwrap();
		assert_eq!(
			resolved.parameters["author"].extra_properties[API_VALUES_KEY],
			"Herbert"
		);
		assert_eq!(inner.call_count(), 1);
	}

	#[rstest]
	#[tokio::test]
	async fn test_missing_required_parameter(operation: Operation) {
		let inner = StubProvider::returning(StateData::Empty);
		let mut context = context("/books", None);

		let result = provider(inner.clone())
			.provide(&operation, &UriVariables::new(), &mut context)
			.await;

		let Err(Error::Validation(violations)) = result else {
			panic!("expected a validation error");
		};
		assert_eq!(violations.len(), 1);
		assert_eq!(
			violations.for_property("x-tenant").next().map(|v| v.message.as_str()),
			Some("This parameter is required.")
		);
		assert_eq!(inner.call_count(), 0);
	}

	#[rstest]
	#[tokio::test]
	async fn test_provider_replaces_operation(mut operation: Operation) {
		// Arrange
		operation.parameters.insert(
			"author".to_string(),
			Parameter::query("author").with_provider("swap"),
		);
		let inner = StubProvider::returning(StateData::Empty);
		let mut context = context("/books?author=Le%20Guin", Some("acme"));

		// Act
		provider(inner.clone())
			.provide(&operation, &UriVariables::new(), &mut context)
			.await
			.unwrap();

		// Assert
		let calls = inner.calls.lock();
		assert_eq!(calls[0].0, "swapped");
		assert_eq!(context.operation.unwrap().extra["author"], "Le Guin");
	}

	#[rstest]
	#[tokio::test]
	async fn test_without_request_is_pass_through(operation: Operation) {
		let inner = StubProvider::returning(StateData::Empty);
		let mut context = OperationContext::new();

		provider(inner.clone())
			.provide(&operation, &UriVariables::new(), &mut context)
			.await
			.unwrap();

		assert!(context.parameters.is_empty());
		assert_eq!(inner.call_count(), 1);
	}
}
