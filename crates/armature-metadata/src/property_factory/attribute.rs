//! Applies `#[api(...)]` declarations found on fields and on the class

use super::ClassMetadataFactory;
use crate::class::{ClassMetadata, MetadataOptions};
use armature_core::{ResourceClassRegistry, Result};
use std::sync::Arc;

/// Overlays declared property attributes on the discovered metadata
///
/// Declared values always win over discovered ones. A declared property
/// that no discoverer found (a private field with `#[api(readable)]`, for
/// instance) is added.
pub struct AttributeClassMetadataFactory {
	inner: Arc<dyn ClassMetadataFactory>,
	registry: Arc<ResourceClassRegistry>,
}

impl AttributeClassMetadataFactory {
	pub fn new(inner: Arc<dyn ClassMetadataFactory>, registry: Arc<ResourceClassRegistry>) -> Self {
		Self { inner, registry }
	}
}

impl ClassMetadataFactory for AttributeClassMetadataFactory {
	fn create(
		&self,
		resource_class: &str,
		options: &MetadataOptions,
	) -> Result<Arc<ClassMetadata>> {
		let mut metadata = Arc::unwrap_or_clone(self.inner.create(resource_class, options)?);
		let descriptor = self.registry.descriptor(resource_class)?;

		if let Some(description) = &descriptor.description {
			metadata = metadata.with_description(description);
		}
		if let Some(iri) = &descriptor.iri {
			metadata = metadata.with_iri(iri);
		}

		for field in &descriptor.properties {
			let Some(declaration) = &field.attribute else {
				continue;
			};
			let mut property = match metadata.property(&field.name) {
				Some(existing) => existing.clone(),
				None => crate::PropertyMetadata::new(&field.name)
					.with_builtin_types(vec![field.type_info.clone()]),
			};

			if let Some(description) = &declaration.description {
				property = property.with_description(description);
			}
			if let Some(readable) = declaration.readable {
				property = property.with_readable(readable);
			}
			if let Some(writable) = declaration.writable {
				property = property.with_writable(writable);
			}
			if let Some(required) = declaration.required {
				property = property.with_required(required);
			}
			if let Some(identifier) = declaration.identifier {
				property = property.with_identifier(identifier);
			}
			if let Some(iri) = &declaration.iri {
				property = property.with_iri(iri).with_types(vec![iri.clone()]);
			}
			if let Some(readable_link) = declaration.readable_link {
				property = property.with_readable_link(readable_link);
			}
			if let Some(writable_link) = declaration.writable_link {
				property = property.with_writable_link(writable_link);
			}
			if let Some(security) = &declaration.security {
				property = property.with_security(security);
			}
			if !declaration.groups.is_empty() {
				property = property.with_groups(declaration.groups.clone());
			}

			metadata = metadata.with_property(property);
		}

		Ok(Arc::new(metadata))
	}
}
