//! Resource class registry
//!
//! The derive macros submit one [`ResourceRegistration`] per struct through
//! `inventory`. A [`ResourceClassRegistry`] is built from those submissions
//! (or from explicit `register` calls) by the application's composition root
//! and shared read-only afterwards.

use crate::descriptor::ClassDescriptor;
use crate::exception::{Error, Result};
use crate::resource::{ApiResource, ResourceClass};
use indexmap::IndexMap;
use std::sync::Arc;

/// Link-time registration emitted by `#[derive(ApiResource)]`
pub struct ResourceRegistration {
	pub class: &'static str,
	pub descriptor: fn() -> ClassDescriptor,
	pub instantiate: fn() -> Box<dyn ApiResource>,
}

inventory::collect!(ResourceRegistration);

#[derive(Clone)]
struct RegisteredClass {
	descriptor: Arc<ClassDescriptor>,
	instantiate: fn() -> Box<dyn ApiResource>,
}

/// Lookup table from class name to descriptor and constructor
#[derive(Clone, Default)]
pub struct ResourceClassRegistry {
	classes: IndexMap<String, RegisteredClass>,
}

impl ResourceClassRegistry {
	/// Create an empty registry
	///
	/// # Examples
	///
	/// ```
	/// use armature_core::registry::ResourceClassRegistry;
	///
	/// let registry = ResourceClassRegistry::new();
	/// assert!(registry.is_empty());
	/// assert!(registry.descriptor("app::Missing").is_err());
	/// ```
	pub fn new() -> Self {
		Self::default()
	}

	/// Build a registry from every `inventory` submission linked into the binary
	pub fn from_inventory() -> Self {
		let mut registry = Self::new();
		for registration in inventory::iter::<ResourceRegistration> {
			registry.insert((registration.descriptor)(), registration.instantiate);
		}
		tracing::debug!(classes = registry.len(), "resource class registry built");
		registry
	}

	/// Register a class by type
	pub fn register<T: ResourceClass>(&mut self) -> &mut Self {
		self.insert(T::descriptor(), T::instantiate);
		self
	}

	/// Builder-style variant of [`register`](Self::register)
	pub fn with<T: ResourceClass>(mut self) -> Self {
		self.register::<T>();
		self
	}

	/// Register a hand-written descriptor
	pub fn register_descriptor(
		&mut self,
		descriptor: ClassDescriptor,
		instantiate: fn() -> Box<dyn ApiResource>,
	) -> &mut Self {
		self.insert(descriptor, instantiate);
		self
	}

	fn insert(&mut self, descriptor: ClassDescriptor, instantiate: fn() -> Box<dyn ApiResource>) {
		self.classes.insert(
			descriptor.name.clone(),
			RegisteredClass {
				descriptor: Arc::new(descriptor),
				instantiate,
			},
		);
	}

	fn lookup(&self, class: &str) -> Result<&RegisteredClass> {
		if class.is_empty() {
			return Err(Error::InvalidArgument(
				"The resource class name must not be empty".to_string(),
			));
		}
		self.classes.get(class).ok_or_else(|| {
			Error::InvalidArgument(format!(
				"The class \"{}\" does not exist or is not registered",
				class
			))
		})
	}

	pub fn descriptor(&self, class: &str) -> Result<Arc<ClassDescriptor>> {
		self.lookup(class).map(|c| Arc::clone(&c.descriptor))
	}

	/// Create a default instance of `class`
	pub fn instantiate(&self, class: &str) -> Result<Box<dyn ApiResource>> {
		self.lookup(class).map(|c| (c.instantiate)())
	}

	pub fn contains(&self, class: &str) -> bool {
		self.classes.contains_key(class)
	}

	/// Every registered class name, in registration order
	pub fn class_names(&self) -> Vec<String> {
		self.classes.keys().cloned().collect()
	}

	/// Classes that declare themselves as API resources
	pub fn resource_class_names(&self) -> Vec<String> {
		self.classes
			.values()
			.filter(|c| c.descriptor.is_resource())
			.map(|c| c.descriptor.name.clone())
			.collect()
	}

	/// Find a class by its short name (`Book`)
	pub fn find_by_short_name(&self, short_name: &str) -> Option<Arc<ClassDescriptor>> {
		self.classes
			.values()
			.find(|c| c.descriptor.short_name == short_name)
			.map(|c| Arc::clone(&c.descriptor))
	}

	pub fn len(&self) -> usize {
		self.classes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.classes.is_empty()
	}
}

impl std::fmt::Debug for ResourceClassRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ResourceClassRegistry")
			.field("classes", &self.classes.keys().collect::<Vec<_>>())
			.finish()
	}
}
