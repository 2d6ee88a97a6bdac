//! Body deserialization seam
//!
//! The pipeline only knows this trait; format-specific implementations live
//! in the serializer crate.

use armature_core::{ApiResource, Result};
use async_trait::async_trait;

/// Options for one denormalization
#[derive(Debug, Clone, Default)]
pub struct DenormalizationContext {
	pub resource_class: String,
	pub operation_name: Option<String>,
	/// Format of the request body, e.g. `jsonld`
	pub format: String,
	/// Denormalization groups; `None` accepts every writable property
	pub groups: Option<Vec<String>>,
	/// Missing properties keep their current value (PATCH)
	pub partial: bool,
}

impl DenormalizationContext {
	pub fn new(resource_class: impl Into<String>, format: impl Into<String>) -> Self {
		Self {
			resource_class: resource_class.into(),
			format: format.into(),
			..Default::default()
		}
	}

	pub fn with_operation_name(mut self, name: Option<String>) -> Self {
		self.operation_name = name;
		self
	}

	pub fn with_groups(mut self, groups: Option<Vec<String>>) -> Self {
		self.groups = groups;
		self
	}

	pub fn with_partial(mut self, partial: bool) -> Self {
		self.partial = partial;
		self
	}
}

/// Decodes a request body into `target`
///
/// Field-level failures are collected into a single
/// [`armature_core::Error::Validation`] instead of stopping at the first one.
#[async_trait]
pub trait ResourceDenormalizer: Send + Sync {
	async fn denormalize(
		&self,
		body: &[u8],
		target: Box<dyn ApiResource>,
		context: &DenormalizationContext,
	) -> Result<Box<dyn ApiResource>>;
}
