//! Enumerates resource classes

use armature_conf::ApiSettings;
use armature_core::{ResourceClassRegistry, Result};
use std::sync::Arc;

/// Lists every class exposed as a resource
pub trait ResourceNameCollectionFactory: Send + Sync {
	fn create(&self) -> Result<Vec<String>>;
}

/// Classes declaring a resource, plus classes exposed through configuration
pub struct RegistryResourceNameCollectionFactory {
	registry: Arc<ResourceClassRegistry>,
	settings: Arc<ApiSettings>,
}

impl RegistryResourceNameCollectionFactory {
	pub fn new(registry: Arc<ResourceClassRegistry>, settings: Arc<ApiSettings>) -> Self {
		Self { registry, settings }
	}
}

impl ResourceNameCollectionFactory for RegistryResourceNameCollectionFactory {
	fn create(&self) -> Result<Vec<String>> {
		let mut classes = self.registry.resource_class_names();
		for key in self.settings.resources.keys() {
			let class = if self.registry.contains(key) {
				Some(key.clone())
			} else {
				self.registry.find_by_short_name(key).map(|d| d.name.clone())
			};
			match class {
				Some(class) if !classes.contains(&class) => classes.push(class),
				Some(_) => {}
				None => tracing::warn!(resource = %key, "configured resource matches no registered class"),
			}
		}
		Ok(classes)
	}
}
