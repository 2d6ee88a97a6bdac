//! Base factory: resources declared with `#[api(...)]` on the struct

use super::ResourceMetadataCollectionFactory;
use crate::resource::{ApiResourceMetadata, ResourceMetadataCollection};
use armature_core::{ResourceClassRegistry, Result};
use std::sync::Arc;

/// Reads the resource declaration carried by the class descriptor
///
/// A class without a declaration yields an empty collection.
pub struct AttributeResourceMetadataCollectionFactory {
	registry: Arc<ResourceClassRegistry>,
}

impl AttributeResourceMetadataCollectionFactory {
	pub fn new(registry: Arc<ResourceClassRegistry>) -> Self {
		Self { registry }
	}
}

impl ResourceMetadataCollectionFactory for AttributeResourceMetadataCollectionFactory {
	fn create(&self, resource_class: &str) -> Result<Arc<ResourceMetadataCollection>> {
		let descriptor = self.registry.descriptor(resource_class)?;
		let mut collection = ResourceMetadataCollection::new(&descriptor.name);

		if let Some(declaration) = &descriptor.resource {
			let mut resource = ApiResourceMetadata::new(&descriptor.name, &descriptor.short_name);
			resource.description = descriptor.description.clone();
			resource.iri = descriptor.iri.clone();
			collection.push(resource.apply_declaration(declaration)?);
		}

		Ok(Arc::new(collection))
	}
}
