//! The per-format normalizer contract

use crate::context::NormalizationContext;
use armature_core::{ApiResource, Error, Result};
use armature_state::{CollectionData, DenormalizationContext};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Converts resources to and from one document format
#[async_trait]
pub trait FormatNormalizer: Send + Sync {
	/// Format name, e.g. `jsonld`
	fn format(&self) -> &str;

	fn normalize_item(&self, item: &dyn ApiResource, context: &NormalizationContext)
	-> Result<Value>;

	fn normalize_collection(
		&self,
		collection: &CollectionData,
		context: &NormalizationContext,
	) -> Result<Value>;

	async fn denormalize(
		&self,
		body: Value,
		target: Box<dyn ApiResource>,
		context: &DenormalizationContext,
	) -> Result<Box<dyn ApiResource>>;
}

#[async_trait]
impl<T: FormatNormalizer + ?Sized> FormatNormalizer for Arc<T> {
	fn format(&self) -> &str {
		(**self).format()
	}

	fn normalize_item(
		&self,
		item: &dyn ApiResource,
		context: &NormalizationContext,
	) -> Result<Value> {
		(**self).normalize_item(item, context)
	}

	fn normalize_collection(
		&self,
		collection: &CollectionData,
		context: &NormalizationContext,
	) -> Result<Value> {
		(**self).normalize_collection(collection, context)
	}

	async fn denormalize(
		&self,
		body: Value,
		target: Box<dyn ApiResource>,
		context: &DenormalizationContext,
	) -> Result<Box<dyn ApiResource>> {
		(**self).denormalize(body, target, context).await
	}
}

/// The top-level object of a request body
pub(crate) fn body_object(body: Value) -> Result<Map<String, Value>> {
	match body {
		Value::Object(map) => Ok(map),
		other => Err(Error::Serialization(format!(
			"The input data must be an object, {} given",
			match other {
				Value::Array(_) => "array",
				Value::Null => "null",
				_ => "scalar",
			}
		))),
	}
}
