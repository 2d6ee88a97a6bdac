//! Caching decorator for class metadata

use super::ClassMetadataFactory;
use crate::cache::{MetadataCacheStore, cache_key};
use crate::class::{ClassMetadata, MetadataOptions};
use armature_core::Result;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Caches built metadata per class and group set
///
/// Lookup order: in-process map, then the optional persistent store, then
/// the inner factory. A fresh build is written to both layers. Entries are
/// never invalidated; concurrent first requests for one key may build twice,
/// which is harmless since builds are deterministic.
pub struct CachedClassMetadataFactory {
	inner: Arc<dyn ClassMetadataFactory>,
	local: RwLock<HashMap<String, Arc<ClassMetadata>>>,
	store: Option<Arc<dyn MetadataCacheStore>>,
}

impl CachedClassMetadataFactory {
	pub fn new(inner: Arc<dyn ClassMetadataFactory>) -> Self {
		Self {
			inner,
			local: RwLock::new(HashMap::new()),
			store: None,
		}
	}

	pub fn with_store(mut self, store: Arc<dyn MetadataCacheStore>) -> Self {
		self.store = Some(store);
		self
	}

	/// Number of entries held in process
	pub fn len(&self) -> usize {
		self.local.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.local.read().is_empty()
	}

	fn fetch_persisted(&self, key: &str, resource_class: &str) -> Option<ClassMetadata> {
		let raw = self.store.as_ref()?.fetch(key)?;
		match serde_json::from_str(&raw) {
			Ok(metadata) => Some(metadata),
			Err(error) => {
				tracing::warn!(
					resource_class = %resource_class,
					%error,
					"discarding unreadable cached metadata"
				);
				None
			}
		}
	}
}

impl ClassMetadataFactory for CachedClassMetadataFactory {
	fn create(
		&self,
		resource_class: &str,
		options: &MetadataOptions,
	) -> Result<Arc<ClassMetadata>> {
		let key = cache_key(resource_class, options);
		if let Some(hit) = self.local.read().get(&key) {
			return Ok(Arc::clone(hit));
		}

		let metadata = match self.fetch_persisted(&key, resource_class) {
			Some(persisted) => {
				tracing::debug!(resource_class = %resource_class, "class metadata loaded from store");
				Arc::new(persisted)
			}
			None => {
				tracing::debug!(resource_class = %resource_class, "class metadata cache miss");
				let built = self.inner.create(resource_class, options)?;
				if let Some(store) = &self.store {
					store.save(&key, serde_json::to_string(built.as_ref())?);
				}
				built
			}
		};

		let mut local = self.local.write();
		let entry = local.entry(key).or_insert(metadata);
		Ok(Arc::clone(entry))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::cache::InMemoryCacheStore;
	use crate::property::PropertyMetadata;
	use rstest::rstest;
	use std::sync::atomic::{AtomicUsize, Ordering};

	#[derive(Default)]
	struct CountingFactory {
		calls: AtomicUsize,
	}

	impl ClassMetadataFactory for CountingFactory {
		fn create(
			&self,
			resource_class: &str,
			options: &MetadataOptions,
		) -> Result<Arc<ClassMetadata>> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			Ok(Arc::new(
				ClassMetadata::new(resource_class, "Book")
					.with_options(options.clone())
					.with_property(PropertyMetadata::new("title").with_readable(true)),
			))
		}
	}

	#[rstest]
	fn test_same_key_returns_identical_instance() {
		// Arrange
		let inner = Arc::new(CountingFactory::default());
		let factory = CachedClassMetadataFactory::new(inner.clone());

		// Act
		let first = factory.create("app::Book", &MetadataOptions::new()).unwrap();
		let second = factory.create("app::Book", &MetadataOptions::new()).unwrap();

		// Assert
		assert!(Arc::ptr_eq(&first, &second));
		assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
	}

	#[rstest]
	fn test_different_groups_are_distinct_entries() {
		let inner = Arc::new(CountingFactory::default());
		let factory = CachedClassMetadataFactory::new(inner.clone());

		let plain = factory.create("app::Book", &MetadataOptions::new()).unwrap();
		let grouped = factory
			.create(
				"app::Book",
				&MetadataOptions::new().with_normalization_groups(["book:read"]),
			)
			.unwrap();

		assert!(!Arc::ptr_eq(&plain, &grouped));
		assert_eq!(factory.len(), 2);
		assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
	}

	#[rstest]
	fn test_persistent_store_is_shared_between_instances() {
		// Arrange
		let store: Arc<dyn MetadataCacheStore> = Arc::new(InMemoryCacheStore::new());
		let inner = Arc::new(CountingFactory::default());
		let warm = CachedClassMetadataFactory::new(inner.clone()).with_store(Arc::clone(&store));
		let built = warm.create("app::Book", &MetadataOptions::new()).unwrap();

		// Act
		let cold = CachedClassMetadataFactory::new(inner.clone()).with_store(store);
		let loaded = cold.create("app::Book", &MetadataOptions::new()).unwrap();

		// Assert
		assert_eq!(*built, *loaded);
		assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
	}
}
