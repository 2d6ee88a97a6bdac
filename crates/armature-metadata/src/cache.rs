//! Metadata cache stores and key derivation

use crate::class::MetadataOptions;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Persistent store for serialized metadata
///
/// Implementations provide their own atomicity for `fetch`/`save`; entries
/// are written at most once per key and never invalidated by the factories.
pub trait MetadataCacheStore: Send + Sync {
	fn fetch(&self, key: &str) -> Option<String>;

	fn save(&self, key: &str, value: String);
}

/// Process-local store, mostly useful in tests
#[derive(Debug, Default)]
pub struct InMemoryCacheStore {
	entries: RwLock<HashMap<String, String>>,
}

impl InMemoryCacheStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.entries.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.read().is_empty()
	}
}

impl MetadataCacheStore for InMemoryCacheStore {
	fn fetch(&self, key: &str) -> Option<String> {
		self.entries.read().get(key).cloned()
	}

	fn save(&self, key: &str, value: String) {
		self.entries.write().insert(key.to_string(), value);
	}
}

/// Cache key for a class built with `options`
///
/// SHA-256 of the class name and the serialized group sets, hex encoded.
///
/// # Examples
///
/// ```
/// use armature_metadata::{MetadataOptions, cache::cache_key};
///
/// let plain = cache_key("app::Book", &MetadataOptions::new());
/// let grouped = cache_key(
///     "app::Book",
///     &MetadataOptions::new().with_normalization_groups(["read"]),
/// );
/// assert_ne!(plain, grouped);
/// assert_eq!(plain.len(), 64);
/// ```
pub fn cache_key(class: &str, options: &MetadataOptions) -> String {
	let mut hasher = Sha256::new();
	hasher.update(class.as_bytes());
	hasher.update(b"\0");
	hasher.update(serde_json::to_string(options).unwrap_or_default().as_bytes());
	hex::encode(hasher.finalize())
}
