//! Resource metadata collection factory chain
//!
//! Default chain, inner to outer: declared attributes → user configuration →
//! operation defaults → URI templates → formats → cache.

mod attribute;
mod cached;
mod config;
mod defaults;
mod formats;
mod name_collection;
mod uri_template;

pub use attribute::AttributeResourceMetadataCollectionFactory;
pub use cached::CachedResourceMetadataCollectionFactory;
pub use config::ConfigResourceMetadataCollectionFactory;
pub use defaults::OperationDefaultsResourceMetadataCollectionFactory;
pub use formats::FormatsResourceMetadataCollectionFactory;
pub use name_collection::{RegistryResourceNameCollectionFactory, ResourceNameCollectionFactory};
pub use uri_template::{UriTemplateResourceMetadataCollectionFactory, template_variables};

use crate::property_factory::ClassMetadataFactory;
use crate::resource::ResourceMetadataCollection;
use armature_conf::ApiSettings;
use armature_core::{ResourceClassRegistry, Result};
use std::sync::Arc;

/// Builds every resource declared on one class
pub trait ResourceMetadataCollectionFactory: Send + Sync {
	fn create(&self, resource_class: &str) -> Result<Arc<ResourceMetadataCollection>>;
}

pub type ResourceMetadataLayer = Box<
	dyn FnOnce(Arc<dyn ResourceMetadataCollectionFactory>) -> Arc<dyn ResourceMetadataCollectionFactory>,
>;

/// Ordered composition of resource collection factories
pub struct ResourceMetadataFactoryChain {
	base: Arc<dyn ResourceMetadataCollectionFactory>,
	layers: Vec<ResourceMetadataLayer>,
}

impl ResourceMetadataFactoryChain {
	pub fn new(base: Arc<dyn ResourceMetadataCollectionFactory>) -> Self {
		Self {
			base,
			layers: Vec::new(),
		}
	}

	/// Add a decorator; layers added later wrap earlier ones
	pub fn layer<F>(mut self, layer: F) -> Self
	where
		F: FnOnce(Arc<dyn ResourceMetadataCollectionFactory>) -> Arc<dyn ResourceMetadataCollectionFactory>
			+ 'static,
	{
		self.layers.push(Box::new(layer));
		self
	}

	pub fn build(self) -> Arc<dyn ResourceMetadataCollectionFactory> {
		self.layers
			.into_iter()
			.fold(self.base, |inner, layer| layer(inner))
	}
}

/// The standard chain configured from settings
pub fn default_resource_metadata_factory(
	registry: Arc<ResourceClassRegistry>,
	class_metadata: Arc<dyn ClassMetadataFactory>,
	settings: Arc<ApiSettings>,
) -> Arc<dyn ResourceMetadataCollectionFactory> {
	let config_settings = Arc::clone(&settings);
	let format_settings = Arc::clone(&settings);
	let cache_enabled = settings.metadata.cache_enabled;

	let chain = ResourceMetadataFactoryChain::new(Arc::new(
		AttributeResourceMetadataCollectionFactory::new(Arc::clone(&registry)),
	))
	.layer(move |inner| {
		Arc::new(ConfigResourceMetadataCollectionFactory::new(
			inner,
			registry,
			config_settings,
		))
	})
	.layer(|inner| Arc::new(OperationDefaultsResourceMetadataCollectionFactory::new(inner)))
	.layer(move |inner| {
		Arc::new(UriTemplateResourceMetadataCollectionFactory::new(
			inner,
			class_metadata,
		))
	})
	.layer(move |inner| {
		Arc::new(FormatsResourceMetadataCollectionFactory::new(
			inner,
			format_settings,
		))
	});

	if cache_enabled {
		chain
			.layer(|inner| Arc::new(CachedResourceMetadataCollectionFactory::new(inner)))
			.build()
	} else {
		chain.build()
	}
}
