//! Format registry and the body denormalizer used by the pipeline

use crate::context::NormalizationContext;
use crate::hal::HalNormalizer;
use crate::item::ItemNormalizer;
use crate::json::JsonNormalizer;
use crate::jsonapi::JsonApiNormalizer;
use crate::jsonld::JsonLdNormalizer;
use crate::normalizer::FormatNormalizer;
use armature_core::{ApiResource, Error, Result};
use armature_state::{DenormalizationContext, ResourceDenormalizer, StateData};
use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;

/// Normalizers by format name
#[derive(Clone, Default)]
pub struct ResourceSerializer {
	normalizers: IndexMap<String, Arc<dyn FormatNormalizer>>,
}

impl ResourceSerializer {
	pub fn new() -> Self {
		Self::default()
	}

	/// JSON, JSON-LD, HAL and JSON:API sharing one item normalizer
	pub fn with_defaults(items: Arc<ItemNormalizer>) -> Self {
		Self::new()
			.with_normalizer(Arc::new(JsonNormalizer::new(Arc::clone(&items))))
			.with_normalizer(Arc::new(JsonLdNormalizer::new(Arc::clone(&items))))
			.with_normalizer(Arc::new(HalNormalizer::new(Arc::clone(&items))))
			.with_normalizer(Arc::new(JsonApiNormalizer::new(items)))
	}

	/// Register `normalizer`, replacing any previous one for its format
	pub fn with_normalizer(mut self, normalizer: Arc<dyn FormatNormalizer>) -> Self {
		self.normalizers
			.insert(normalizer.format().to_string(), normalizer);
		self
	}

	pub fn formats(&self) -> Vec<&str> {
		self.normalizers.keys().map(String::as_str).collect()
	}

	pub fn normalizer(&self, format: &str) -> Result<&Arc<dyn FormatNormalizer>> {
		self.normalizers.get(format).ok_or_else(|| {
			Error::NotAcceptable(format!("No normalizer is registered for format \"{}\"", format))
		})
	}

	/// Document for `data`; [`StateData::Empty`] normalizes to `null`
	pub fn normalize(
		&self,
		data: &StateData,
		format: &str,
		context: &NormalizationContext,
	) -> Result<Value> {
		let normalizer = self.normalizer(format)?;
		match data {
			StateData::Empty => Ok(Value::Null),
			StateData::Item(item) => normalizer.normalize_item(item.as_ref(), context),
			StateData::Collection(collection) => {
				normalizer.normalize_collection(collection, context)
			}
		}
	}

	pub fn serialize(
		&self,
		data: &StateData,
		format: &str,
		context: &NormalizationContext,
	) -> Result<Vec<u8>> {
		let document = self.normalize(data, format, context)?;
		Ok(serde_json::to_vec(&document)?)
	}
}

#[async_trait]
impl ResourceDenormalizer for ResourceSerializer {
	async fn denormalize(
		&self,
		body: &[u8],
		target: Box<dyn ApiResource>,
		context: &DenormalizationContext,
	) -> Result<Box<dyn ApiResource>> {
		let normalizer = self.normalizer(&context.format)?;
		let document: Value = if body.iter().all(u8::is_ascii_whitespace) {
			Value::Object(Default::default())
		} else {
			serde_json::from_slice(body)?
		};
		tracing::debug!(
			resource_class = context.resource_class.as_str(),
			format = context.format.as_str(),
			"Denormalizing request body"
		);
		normalizer.denormalize(document, target, context).await
	}
}
