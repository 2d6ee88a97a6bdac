//! Resolution of dotted property paths across associations

use armature_core::Result;
use armature_metadata::{ClassMetadataFactory, MetadataOptions, PropertyMetadata};
use std::sync::Arc;

/// Longest association chain a filter may traverse
pub const MAX_NESTING_DEPTH: usize = 5;

/// A property path resolved against class metadata
#[derive(Debug, Clone)]
pub struct ResolvedProperty {
	/// The full dotted path, as requested
	pub path: String,
	/// Association prefixes to join: `a.b.c` gives `a` and `a.b`
	pub associations: Vec<String>,
	/// Class owning the leaf property
	pub class: String,
	pub metadata: PropertyMetadata,
}

impl ResolvedProperty {
	pub fn is_nested(&self) -> bool {
		!self.associations.is_empty()
	}

	/// The leaf is itself an association or an identifier
	pub fn is_identifier_like(&self) -> bool {
		self.metadata.is_link() || self.metadata.is_identifier()
	}
}

/// Walks `a.b.c` one association at a time
///
/// A segment that is not an association of a resource class while more
/// segments remain makes the path inapplicable; so does a path crossing more
/// than [`MAX_NESTING_DEPTH`] associations. Self-referencing models
/// resolve up to that depth.
pub struct PropertyResolver {
	class_metadata: Arc<dyn ClassMetadataFactory>,
	max_depth: usize,
}

impl PropertyResolver {
	pub fn new(class_metadata: Arc<dyn ClassMetadataFactory>) -> Self {
		Self {
			class_metadata,
			max_depth: MAX_NESTING_DEPTH,
		}
	}

	pub fn with_max_depth(mut self, max_depth: usize) -> Self {
		self.max_depth = max_depth;
		self
	}

	/// Names of the class's directly mapped properties
	pub fn properties(&self, resource_class: &str) -> Result<Vec<String>> {
		Ok(self
			.class_metadata
			.create(resource_class, &MetadataOptions::default())?
			.property_names()
			.map(str::to_string)
			.collect())
	}

	/// `Ok(None)` when the path does not apply to the class
	pub fn resolve(&self, resource_class: &str, path: &str) -> Result<Option<ResolvedProperty>> {
		let segments: Vec<&str> = path.split('.').collect();
		if segments.iter().any(|s| s.is_empty()) || segments.len() > self.max_depth + 1 {
			tracing::debug!(
				resource_class = %resource_class,
				property = %path,
				max_depth = self.max_depth,
				"Property path is malformed or too deep"
			);
			return Ok(None);
		}

		let mut class = resource_class.to_string();
		let mut associations = Vec::new();
		for (idx, segment) in segments.iter().enumerate() {
			let metadata = self
				.class_metadata
				.create(&class, &MetadataOptions::default())?;
			let Some(property) = metadata.property(segment) else {
				return Ok(None);
			};
			if idx + 1 == segments.len() {
				return Ok(Some(ResolvedProperty {
					path: path.to_string(),
					associations,
					class,
					metadata: property.clone(),
				}));
			}

			let Some(target) = property.link_class().filter(|_| property.is_link()) else {
				return Ok(None);
			};
			associations.push(segments[..=idx].join("."));
			class = target.to_string();
		}
		Ok(None)
	}
}
