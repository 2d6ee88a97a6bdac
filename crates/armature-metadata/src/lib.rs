//! # armature-metadata
//!
//! Resource metadata model and the factory chains that build it.
//!
//! Two chains of decorating factories turn a class descriptor into metadata:
//!
//! - [`property_factory`] produces a [`ClassMetadata`] (the property map) for a
//!   class and a set of serialization / validation groups
//! - [`resource_factory`] produces a [`ResourceMetadataCollection`] (resources,
//!   operations, URI templates, formats) for a class
//!
//! Both chains are built once by the composition root and cached for the
//! lifetime of the process; returned metadata is never mutated.
//!
//! ## Example
//!
//! ```
//! use armature_conf::ApiSettings;
//! use armature_core::ResourceClassRegistry;
//! use armature_metadata::property_factory::default_class_metadata_factory;
//! use armature_metadata::resource_factory::default_resource_metadata_factory;
//! use std::sync::Arc;
//!
//! let registry = Arc::new(ResourceClassRegistry::new());
//! let settings = Arc::new(ApiSettings::default());
//! let classes = default_class_metadata_factory(registry.clone(), &settings, None);
//! let resources = default_resource_metadata_factory(registry, classes, settings);
//! assert!(resources.create("app::Unknown").is_err());
//! ```

pub mod cache;
pub mod class;
pub mod inflector;
pub mod operation;
pub mod property;
pub mod property_factory;
pub mod resource;
pub mod resource_factory;

pub use cache::{InMemoryCacheStore, MetadataCacheStore, cache_key};
pub use class::{ClassMetadata, MetadataOptions};
pub use operation::{HttpMethod, Link, Operation, Parameter, ParameterLocation, ParameterValue};
pub use property::PropertyMetadata;
pub use property_factory::ClassMetadataFactory;
pub use resource::{ApiResourceMetadata, ResourceMetadataCollection};
pub use resource_factory::{ResourceMetadataCollectionFactory, ResourceNameCollectionFactory};
