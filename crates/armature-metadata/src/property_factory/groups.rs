//! Restricts readability and writability to serialization groups

use super::ClassMetadataFactory;
use crate::class::{ClassMetadata, MetadataOptions};
use armature_core::{ResourceClassRegistry, Result};
use std::sync::Arc;

fn intersects(left: &[String], right: &[String]) -> bool {
	left.iter().any(|g| right.contains(g))
}

/// Applies normalization and denormalization groups
///
/// With normalization groups set, a property stays readable only when it
/// belongs to one of them; denormalization groups do the same for
/// writability. A link whose embedding is undecided is embedded when its
/// target class exposes at least one property in the active groups.
pub struct SerializerGroupsClassMetadataFactory {
	inner: Arc<dyn ClassMetadataFactory>,
	registry: Arc<ResourceClassRegistry>,
}

impl SerializerGroupsClassMetadataFactory {
	pub fn new(inner: Arc<dyn ClassMetadataFactory>, registry: Arc<ResourceClassRegistry>) -> Self {
		Self { inner, registry }
	}

	fn target_exposes(&self, target: &str, groups: &[String]) -> bool {
		let Ok(descriptor) = self.registry.descriptor(target) else {
			return false;
		};
		descriptor.properties.iter().any(|p| {
			p.attribute
				.as_ref()
				.is_some_and(|a| intersects(&a.groups, groups))
		})
	}
}

impl ClassMetadataFactory for SerializerGroupsClassMetadataFactory {
	fn create(
		&self,
		resource_class: &str,
		options: &MetadataOptions,
	) -> Result<Arc<ClassMetadata>> {
		let metadata = self.inner.create(resource_class, options)?;
		if options.normalization_groups.is_none() && options.denormalization_groups.is_none() {
			return Ok(metadata);
		}

		let metadata = Arc::unwrap_or_clone(metadata).map_properties(|mut property| {
			if let Some(groups) = &options.normalization_groups {
				let readable = property.is_readable() && intersects(property.groups(), groups);
				property = property.with_readable(readable);
				if property.is_link()
					&& property.readable_link().is_none()
					&& let Some(target) = property.link_class()
				{
					let embed = self.target_exposes(target, groups);
					property = property.with_readable_link(embed);
				}
			}
			if let Some(groups) = &options.denormalization_groups {
				let writable = property.is_writable() && intersects(property.groups(), groups);
				property = property.with_writable(writable);
				if property.is_link()
					&& property.writable_link().is_none()
					&& let Some(target) = property.link_class()
				{
					let embed = self.target_exposes(target, groups);
					property = property.with_writable_link(embed);
				}
			}
			Ok(property)
		})?;

		Ok(Arc::new(metadata))
	}
}
