//! Class metadata factory chain
//!
//! Each factory wraps an inner factory of the same contract and contributes
//! one slice of metadata. The reflection factory is the base case; the
//! default chain, inner to outer, is:
//!
//! reflection → persistence mapping → declared attributes → validator →
//! serializer groups → cache

mod attribute;
mod cached;
mod groups;
mod mapping;
mod reflection;
mod validator;

pub use attribute::AttributeClassMetadataFactory;
pub use cached::CachedClassMetadataFactory;
pub use groups::SerializerGroupsClassMetadataFactory;
pub use mapping::PersistenceMappingClassMetadataFactory;
pub use reflection::{Accessor, ReflectionClassMetadataFactory, accessor_property};
pub use validator::ValidatorClassMetadataFactory;

use crate::cache::MetadataCacheStore;
use crate::class::{ClassMetadata, MetadataOptions};
use armature_conf::ApiSettings;
use armature_core::{ResourceClassRegistry, Result};
use std::sync::Arc;

/// Builds the metadata of one resource class
pub trait ClassMetadataFactory: Send + Sync {
	fn create(&self, resource_class: &str, options: &MetadataOptions)
	-> Result<Arc<ClassMetadata>>;
}

/// A layer wraps the factory built so far
pub type ClassMetadataLayer =
	Box<dyn FnOnce(Arc<dyn ClassMetadataFactory>) -> Arc<dyn ClassMetadataFactory>>;

/// Ordered composition of class metadata factories
///
/// # Examples
///
/// ```
/// use armature_core::ResourceClassRegistry;
/// use armature_metadata::property_factory::{
///     ClassMetadataFactoryChain, PersistenceMappingClassMetadataFactory,
///     ReflectionClassMetadataFactory,
/// };
/// use std::sync::Arc;
///
/// let registry = Arc::new(ResourceClassRegistry::new());
/// let factory = ClassMetadataFactoryChain::new(Arc::new(
///     ReflectionClassMetadataFactory::new(registry.clone()),
/// ))
/// .layer(move |inner| Arc::new(PersistenceMappingClassMetadataFactory::new(inner, registry)))
/// .build();
/// # let _ = factory;
/// ```
pub struct ClassMetadataFactoryChain {
	base: Arc<dyn ClassMetadataFactory>,
	layers: Vec<ClassMetadataLayer>,
}

impl ClassMetadataFactoryChain {
	pub fn new(base: Arc<dyn ClassMetadataFactory>) -> Self {
		Self {
			base,
			layers: Vec::new(),
		}
	}

	/// Add a decorator; layers added later wrap earlier ones
	pub fn layer<F>(mut self, layer: F) -> Self
	where
		F: FnOnce(Arc<dyn ClassMetadataFactory>) -> Arc<dyn ClassMetadataFactory> + 'static,
	{
		self.layers.push(Box::new(layer));
		self
	}

	pub fn build(self) -> Arc<dyn ClassMetadataFactory> {
		self.layers
			.into_iter()
			.fold(self.base, |inner, layer| layer(inner))
	}
}

/// The standard chain configured from settings
pub fn default_class_metadata_factory(
	registry: Arc<ResourceClassRegistry>,
	settings: &ApiSettings,
	store: Option<Arc<dyn MetadataCacheStore>>,
) -> Arc<dyn ClassMetadataFactory> {
	let required_constraints = settings.validator.required_constraints.clone();
	let cache_enabled = settings.metadata.cache_enabled;
	let (mapping_registry, attribute_registry, validator_registry, groups_registry) = (
		Arc::clone(&registry),
		Arc::clone(&registry),
		Arc::clone(&registry),
		Arc::clone(&registry),
	);

	let chain = ClassMetadataFactoryChain::new(Arc::new(ReflectionClassMetadataFactory::new(
		registry,
	)))
	.layer(move |inner| {
		Arc::new(PersistenceMappingClassMetadataFactory::new(
			inner,
			mapping_registry,
		))
	})
	.layer(move |inner| Arc::new(AttributeClassMetadataFactory::new(inner, attribute_registry)))
	.layer(move |inner| {
		Arc::new(
			ValidatorClassMetadataFactory::new(inner, validator_registry)
				.with_required_constraints(required_constraints),
		)
	})
	.layer(move |inner| {
		Arc::new(SerializerGroupsClassMetadataFactory::new(
			inner,
			groups_registry,
		))
	});

	if cache_enabled {
		chain
			.layer(move |inner| {
				let cached = CachedClassMetadataFactory::new(inner);
				Arc::new(match store {
					Some(store) => cached.with_store(store),
					None => cached,
				})
			})
			.build()
	} else {
		chain.build()
	}
}
