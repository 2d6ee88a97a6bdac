//! Caching decorator for resource metadata collections

use super::ResourceMetadataCollectionFactory;
use crate::resource::ResourceMetadataCollection;
use armature_core::Result;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Keeps one collection per class for the life of the process
pub struct CachedResourceMetadataCollectionFactory {
	inner: Arc<dyn ResourceMetadataCollectionFactory>,
	local: RwLock<HashMap<String, Arc<ResourceMetadataCollection>>>,
}

impl CachedResourceMetadataCollectionFactory {
	pub fn new(inner: Arc<dyn ResourceMetadataCollectionFactory>) -> Self {
		Self {
			inner,
			local: RwLock::new(HashMap::new()),
		}
	}
}

impl ResourceMetadataCollectionFactory for CachedResourceMetadataCollectionFactory {
	fn create(&self, resource_class: &str) -> Result<Arc<ResourceMetadataCollection>> {
		if let Some(hit) = self.local.read().get(resource_class) {
			return Ok(Arc::clone(hit));
		}
		tracing::debug!(resource_class = %resource_class, "resource metadata cache miss");
		let built = self.inner.create(resource_class)?;
		let mut local = self.local.write();
		Ok(Arc::clone(
			local.entry(resource_class.to_string()).or_insert(built),
		))
	}
}
