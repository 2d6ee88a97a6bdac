//! Persistence-mapping conventions: associations and identifiers

use super::ClassMetadataFactory;
use crate::class::{ClassMetadata, MetadataOptions};
use armature_core::{BuiltinType, ResourceClassRegistry, Result};
use std::sync::Arc;

/// Property name treated as the identifier when none is declared
pub const CONVENTIONAL_IDENTIFIER: &str = "id";

/// Marks associations to registered classes as links and applies the
/// identifier convention
///
/// An `id` property becomes the identifier unless another property declares
/// `#[api(identifier)]`. Conventional integer identifiers are generated by the
/// store and therefore not writable.
pub struct PersistenceMappingClassMetadataFactory {
	inner: Arc<dyn ClassMetadataFactory>,
	registry: Arc<ResourceClassRegistry>,
}

impl PersistenceMappingClassMetadataFactory {
	pub fn new(inner: Arc<dyn ClassMetadataFactory>, registry: Arc<ResourceClassRegistry>) -> Self {
		Self { inner, registry }
	}
}

impl ClassMetadataFactory for PersistenceMappingClassMetadataFactory {
	fn create(
		&self,
		resource_class: &str,
		options: &MetadataOptions,
	) -> Result<Arc<ClassMetadata>> {
		let metadata = Arc::unwrap_or_clone(self.inner.create(resource_class, options)?);
		let descriptor = self.registry.descriptor(resource_class)?;

		let declares_identifier = descriptor.properties.iter().any(|p| {
			p.attribute
				.as_ref()
				.and_then(|a| a.identifier)
				.unwrap_or(false)
		});

		let metadata = metadata.map_properties(|property| {
			let mut property = property;
			let target = property
				.primary_type()
				.and_then(|t| t.class.clone())
				.filter(|class| self.registry.contains(class));
			if let Some(target) = target {
				property = property.with_link(true).with_link_class(target);
			}

			if property.identifier().is_none() && !declares_identifier {
				let conventional = property.name() == CONVENTIONAL_IDENTIFIER;
				property = property.with_identifier(conventional);
				if conventional
					&& property
						.primary_type()
						.is_some_and(|t| t.builtin == BuiltinType::Int)
				{
					property = property.with_writable(false);
				}
			}
			Ok(property)
		})?;

		Ok(Arc::new(metadata))
	}
}
