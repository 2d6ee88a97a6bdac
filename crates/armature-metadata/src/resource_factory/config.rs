//! User configuration from `ApiSettings::resources`

use super::ResourceMetadataCollectionFactory;
use crate::resource::{ApiResourceMetadata, ResourceMetadataCollection};
use armature_conf::ApiSettings;
use armature_core::{ResourceClassRegistry, Result};
use std::sync::Arc;

/// Overlays configured resource declarations
///
/// A configuration entry keyed by class name or short name overrides the
/// declared values; it also exposes a class that declares no resource.
pub struct ConfigResourceMetadataCollectionFactory {
	inner: Arc<dyn ResourceMetadataCollectionFactory>,
	registry: Arc<ResourceClassRegistry>,
	settings: Arc<ApiSettings>,
}

impl ConfigResourceMetadataCollectionFactory {
	pub fn new(
		inner: Arc<dyn ResourceMetadataCollectionFactory>,
		registry: Arc<ResourceClassRegistry>,
		settings: Arc<ApiSettings>,
	) -> Self {
		Self {
			inner,
			registry,
			settings,
		}
	}
}

impl ResourceMetadataCollectionFactory for ConfigResourceMetadataCollectionFactory {
	fn create(&self, resource_class: &str) -> Result<Arc<ResourceMetadataCollection>> {
		let collection = self.inner.create(resource_class)?;
		let descriptor = self.registry.descriptor(resource_class)?;
		let Some(config) = self
			.settings
			.resource_config(&descriptor.name, &descriptor.short_name)
		else {
			return Ok(collection);
		};

		tracing::debug!(resource_class = %resource_class, "applying configured resource");
		let collection = Arc::unwrap_or_clone(collection);
		if collection.is_empty() {
			let resource = ApiResourceMetadata::new(&descriptor.name, &descriptor.short_name)
				.apply_declaration(config)?;
			return Ok(Arc::new(collection.with_resource(resource)));
		}
		let collection = collection.map_resources(|resource| resource.apply_declaration(config))?;
		Ok(Arc::new(collection))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::resource_factory::AttributeResourceMetadataCollectionFactory;
	use armature_core::{OperationDeclaration, ResourceClass, ResourceDeclaration};
	use armature_macros::ApiResource;
	use rstest::rstest;

	#[derive(Debug, Clone, Default, ApiResource)]
	pub struct Shelf {
		pub id: i64,
	}

	#[derive(Debug, Clone, Default, ApiResource)]
	#[api(resource = false)]
	pub struct Pallet {
		pub id: i64,
	}

	fn factory(settings: ApiSettings) -> ConfigResourceMetadataCollectionFactory {
		let registry = Arc::new(ResourceClassRegistry::new().with::<Shelf>().with::<Pallet>());
		ConfigResourceMetadataCollectionFactory::new(
			Arc::new(AttributeResourceMetadataCollectionFactory::new(Arc::clone(&registry))),
			registry,
			Arc::new(settings),
		)
	}

	#[rstest]
	fn test_configuration_overrides_declaration() {
		let settings = ApiSettings::default().with_resource(
			"Shelf",
			ResourceDeclaration {
				items_per_page: Some(5),
				operations: Some(vec![OperationDeclaration::get()]),
				..Default::default()
			},
		);

		let collection = factory(settings).create(Shelf::RESOURCE_CLASS).unwrap();

		let resource = &collection.resources()[0];
		assert_eq!(resource.items_per_page, Some(5));
		assert_eq!(resource.operations().len(), 1);
	}

	#[rstest]
	fn test_configuration_exposes_plain_class() {
		let settings = ApiSettings::default()
			.with_resource(Pallet::RESOURCE_CLASS, ResourceDeclaration::default());

		let collection = factory(settings).create(Pallet::RESOURCE_CLASS).unwrap();

		assert_eq!(collection.resources().len(), 1);
		assert_eq!(collection.resources()[0].short_name, "Pallet");
	}
}
