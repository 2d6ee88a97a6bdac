//! Named service lookup for providers and persisters
//!
//! Operations reference providers and processors by name. A locator resolves
//! the name, falling back to a per-class service and then to a default.

use armature_core::{Error, Result};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Services of one kind, addressable by name or resource class
pub struct ServiceLocator<T: ?Sized> {
	kind: &'static str,
	named: IndexMap<String, Arc<T>>,
	by_class: IndexMap<String, Arc<T>>,
	fallback: Option<Arc<T>>,
}

impl<T: ?Sized> ServiceLocator<T> {
	/// `kind` names the service type in error messages
	pub fn new(kind: &'static str) -> Self {
		Self {
			kind,
			named: IndexMap::new(),
			by_class: IndexMap::new(),
			fallback: None,
		}
	}

	pub fn with_named(mut self, name: impl Into<String>, service: Arc<T>) -> Self {
		self.named.insert(name.into(), service);
		self
	}

	pub fn with_class(mut self, resource_class: impl Into<String>, service: Arc<T>) -> Self {
		self.by_class.insert(resource_class.into(), service);
		self
	}

	pub fn with_fallback(mut self, service: Arc<T>) -> Self {
		self.fallback = Some(service);
		self
	}

	pub fn contains(&self, name: &str) -> bool {
		self.named.contains_key(name)
	}

	/// Resolve by explicit name, then by class, then the fallback
	///
	/// An explicit name that is not registered is a configuration error.
	pub fn resolve(&self, name: Option<&str>, resource_class: &str) -> Result<Arc<T>> {
		if let Some(name) = name {
			return self.named.get(name).cloned().ok_or_else(|| {
				Error::Configuration(format!("Unknown {} \"{}\"", self.kind, name))
			});
		}
		self.by_class
			.get(resource_class)
			.or(self.fallback.as_ref())
			.cloned()
			.ok_or_else(|| {
				Error::Runtime(format!(
					"No {} registered for resource class \"{}\"",
					self.kind, resource_class
				))
			})
	}
}

impl<T: ?Sized> fmt::Debug for ServiceLocator<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ServiceLocator")
			.field("kind", &self.kind)
			.field("named", &self.named.keys().collect::<Vec<_>>())
			.field("by_class", &self.by_class.keys().collect::<Vec<_>>())
			.field("fallback", &self.fallback.is_some())
			.finish()
	}
}
