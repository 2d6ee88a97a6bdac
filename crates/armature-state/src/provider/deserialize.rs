//! Deserialize stage

use super::Provider;
use crate::context::{OperationContext, UriVariables};
use crate::data::StateData;
use crate::denormalizer::{DenormalizationContext, ResourceDenormalizer};
use crate::negotiation::{format_for_mime, mime_types};
use armature_conf::ApiSettings;
use armature_core::{Error, ResourceClassRegistry, Result};
use armature_metadata::{HttpMethod, Operation};
use async_trait::async_trait;
use std::sync::Arc;

/// Applies the request body to the data read by the inner stage
///
/// The item read for PUT/PATCH is the population target; POST (or an input
/// class) starts from a fresh instance.
pub struct DeserializeProvider {
	inner: Arc<dyn Provider>,
	denormalizer: Arc<dyn ResourceDenormalizer>,
	registry: Arc<ResourceClassRegistry>,
	settings: Arc<ApiSettings>,
}

impl DeserializeProvider {
	pub fn new(
		inner: Arc<dyn Provider>,
		denormalizer: Arc<dyn ResourceDenormalizer>,
		registry: Arc<ResourceClassRegistry>,
		settings: Arc<ApiSettings>,
	) -> Self {
		Self {
			inner,
			denormalizer,
			registry,
			settings,
		}
	}

	/// Input format named by the `Content-Type` header
	pub fn input_format(&self, operation: &Operation, content_type: Option<&str>) -> Result<String> {
		let Some(content_type) = content_type else {
			return Err(Error::UnsupportedMediaType(
				"The \"Content-Type\" header must exist.".to_string(),
			));
		};
		let formats = if operation.input_formats.is_empty() {
			&self.settings.formats
		} else {
			&operation.input_formats
		};
		format_for_mime(formats, content_type).ok_or_else(|| {
			Error::UnsupportedMediaType(format!(
				"The content-type \"{}\" is not supported. Supported MIME types are \"{}\".",
				content_type,
				mime_types(formats).join("\", \"")
			))
		})
	}
}

#[async_trait]
impl Provider for DeserializeProvider {
	async fn provide(
		&self,
		operation: &Operation,
		uri_variables: &UriVariables,
		context: &mut OperationContext,
	) -> Result<StateData> {
		let data = self.inner.provide(operation, uri_variables, context).await?;
		let Some(request) = context.request.clone() else {
			return Ok(data);
		};
		let operation = context.resolved_operation(operation).clone();
		if !operation.deserialize || !operation.method.has_body() {
			return Ok(data);
		}

		let format = self.input_format(&operation, request.content_type())?;
		context.input_format = Some(format.clone());

		let target = match (data, operation.input.as_deref()) {
			(StateData::Item(item), None) => item,
			(_, input) => self.registry.instantiate(input.unwrap_or(&operation.class))?,
		};
		let denormalization = DenormalizationContext::new(target.resource_class(), format)
			.with_operation_name(Some(operation.name.clone()))
			.with_groups(operation.denormalization_groups.clone())
			.with_partial(operation.method == HttpMethod::Patch);

		tracing::debug!(
			resource_class = %denormalization.resource_class,
			format = %denormalization.format,
			partial = denormalization.partial,
			"Deserializing request body"
		);
		let item = self
			.denormalizer
			.denormalize(&request.body, target, &denormalization)
			.await?;
		Ok(StateData::Item(item))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::provider::test_support::StubProvider;
	use crate::request::ApiRequest;
	use armature_core::{ApiResource, PropertyValue, ResourceClass};
	use armature_macros::ApiResource;
	use http::HeaderValue;
	use http::header::CONTENT_TYPE;
	use parking_lot::Mutex;
	use rstest::rstest;
	use serde_json::Value;

	#[derive(Debug, Clone, Default, ApiResource)]
	struct Memo {
		#[api(identifier)]
		pub id: i64,
		pub text: String,
	}

	/// Writes every top-level key of a JSON body
	#[derive(Default)]
	struct JsonKeys {
		seen: Mutex<Vec<DenormalizationContext>>,
	}

	#[async_trait]
	impl ResourceDenormalizer for JsonKeys {
		async fn denormalize(
			&self,
			body: &[u8],
			mut target: Box<dyn ApiResource>,
			context: &DenormalizationContext,
		) -> Result<Box<dyn ApiResource>> {
			self.seen.lock().push(context.clone());
			let Value::Object(fields) = serde_json::from_slice::<Value>(body)? else {
				return Err(Error::Serialization("expected an object".to_string()));
			};
			for (key, value) in fields {
				target
					.set_property(&key, PropertyValue::Scalar(value))
					.map_err(|e| Error::Serialization(e.to_string()))?;
			}
			Ok(target)
		}
	}

	fn provider(inner: Arc<StubProvider>, denormalizer: Arc<JsonKeys>) -> DeserializeProvider {
		DeserializeProvider::new(
			inner,
			denormalizer,
			Arc::new(ResourceClassRegistry::new().with::<Memo>()),
			Arc::new(ApiSettings::default()),
		)
	}

	fn request(method: http::Method, content_type: Option<&'static str>) -> OperationContext {
		let mut request = ApiRequest::new(method, "/memos/1").with_body(r#"{"text":"updated"}"#);
		if let Some(content_type) = content_type {
			request = request.with_header(CONTENT_TYPE, HeaderValue::from_static(content_type));
		}
		OperationContext::new().with_request(request)
	}

	fn operation(method: HttpMethod, collection: bool) -> Operation {
		Operation::new(method, collection)
			.with_name("memo_op")
			.with_class(Memo::RESOURCE_CLASS, "Memo")
	}

	#[rstest]
	#[tokio::test]
	async fn test_post_builds_fresh_instance() {
		// Arrange
		let denormalizer = Arc::new(JsonKeys::default());
		let provider = provider(StubProvider::returning(StateData::Empty), denormalizer.clone());
		let mut context = request(http::Method::POST, Some("application/ld+json"));

		// Act
		let data = provider
			.provide(&operation(HttpMethod::Post, true), &UriVariables::new(), &mut context)
			.await
			.unwrap();

		// Assert
		let memo = data.as_item().and_then(|i| i.downcast_ref::<Memo>()).unwrap();
		assert_eq!(memo.text, "updated");
		assert_eq!(context.input_format.as_deref(), Some("jsonld"));
		assert!(!denormalizer.seen.lock()[0].partial);
	}

	#[rstest]
	#[tokio::test]
	async fn test_patch_populates_existing_item() {
		// Arrange
		let existing = Memo {
			id: 7,
			text: "draft".to_string(),
		};
		let denormalizer = Arc::new(JsonKeys::default());
		let provider = provider(StubProvider::item(existing), denormalizer.clone());
		let mut context = request(http::Method::PATCH, Some("application/json"));

		// Act
		let data = provider
			.provide(&operation(HttpMethod::Patch, false), &UriVariables::new(), &mut context)
			.await
			.unwrap();

		// Assert
		let memo = data.as_item().and_then(|i| i.downcast_ref::<Memo>()).unwrap();
		assert_eq!(memo.id, 7);
		assert_eq!(memo.text, "updated");
		assert!(denormalizer.seen.lock()[0].partial);
	}

	#[rstest]
	#[case(None)]
	#[case(Some("text/plain"))]
	#[tokio::test]
	async fn test_unsupported_media_type(#[case] content_type: Option<&'static str>) {
		let denormalizer = Arc::new(JsonKeys::default());
		let provider = provider(StubProvider::returning(StateData::Empty), denormalizer.clone());
		let mut context = request(http::Method::POST, content_type);

		let result = provider
			.provide(&operation(HttpMethod::Post, true), &UriVariables::new(), &mut context)
			.await;

		assert!(matches!(result, Err(Error::UnsupportedMediaType(_))));
		assert!(denormalizer.seen.lock().is_empty());
	}

	#[rstest]
	#[tokio::test]
	async fn test_get_is_pass_through() {
		let denormalizer = Arc::new(JsonKeys::default());
		let provider = provider(StubProvider::item(Memo::default()), denormalizer.clone());
		let mut context = request(http::Method::GET, None);

		let data = provider
			.provide(&operation(HttpMethod::Get, false), &UriVariables::new(), &mut context)
			.await
			.unwrap();

		assert!(data.as_item().is_some());
		assert!(denormalizer.seen.lock().is_empty());
	}
}
