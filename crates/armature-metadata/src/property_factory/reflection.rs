//! Base factory: discovers properties from the compile-time class descriptor

use super::ClassMetadataFactory;
use crate::class::{ClassMetadata, MetadataOptions};
use crate::property::PropertyMetadata;
use armature_core::{
	BuiltinType, ClassDescriptor, MethodDescriptor, ResourceClassRegistry, Result, TypeInfo,
	Visibility,
};
use indexmap::IndexMap;
use std::sync::Arc;

/// Kind of accessor method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accessor {
	Getter,
	Setter,
}

const GETTER_PREFIXES: [&str; 3] = ["get", "is", "has"];
const SETTER_PREFIX: &str = "set";

/// Property addressed by an accessor method name
///
/// Accepts `get_title` and `getTitle` alike; the prefix is stripped and the
/// first letter lowercased.
///
/// # Examples
///
/// ```
/// use armature_metadata::property_factory::{Accessor, accessor_property};
///
/// assert_eq!(accessor_property("get_title"), Some((Accessor::Getter, "title".to_string())));
/// assert_eq!(accessor_property("isPublished"), Some((Accessor::Getter, "published".to_string())));
/// assert_eq!(accessor_property("settle"), None);
/// ```
pub fn accessor_property(method: &str) -> Option<(Accessor, String)> {
	let candidates = GETTER_PREFIXES
		.iter()
		.map(|p| (Accessor::Getter, *p))
		.chain(std::iter::once((Accessor::Setter, SETTER_PREFIX)));

	for (kind, prefix) in candidates {
		let Some(rest) = method.strip_prefix(prefix) else {
			continue;
		};
		let name = if let Some(snake) = rest.strip_prefix('_') {
			snake.to_string()
		} else if rest.starts_with(|c: char| c.is_ascii_uppercase()) {
			rest.to_string()
		} else {
			continue;
		};
		if name.is_empty() {
			continue;
		}
		let mut chars = name.chars();
		let lowered: String = match chars.next() {
			Some(first) => first.to_lowercase().chain(chars).collect(),
			None => continue,
		};
		return Some((kind, lowered));
	}
	None
}

/// Discovers readable and writable properties of a class
///
/// - public fields are readable and writable
/// - a public `get_x`/`has_x`/`is_x` with no required parameter makes `x` readable
/// - a public `set_x` with exactly one required parameter makes `x` writable
///
/// A property found by several discoverers has its flags OR-ed.
pub struct ReflectionClassMetadataFactory {
	registry: Arc<ResourceClassRegistry>,
}

impl ReflectionClassMetadataFactory {
	pub fn new(registry: Arc<ResourceClassRegistry>) -> Self {
		Self { registry }
	}

	fn field_type(descriptor: &ClassDescriptor, name: &str) -> Vec<TypeInfo> {
		descriptor
			.property(name)
			.map(|p| vec![p.type_info.clone()])
			.unwrap_or_else(|| vec![TypeInfo::new(BuiltinType::Mixed)])
	}

	fn discover_method(
		descriptor: &ClassDescriptor,
		method: &MethodDescriptor,
	) -> Option<PropertyMetadata> {
		if method.visibility != Visibility::Public {
			return None;
		}
		let (kind, name) = accessor_property(&method.name)?;
		let property = match kind {
			Accessor::Getter if method.required_parameters == 0 => {
				PropertyMetadata::new(&name).with_readable(true)
			}
			Accessor::Setter if method.required_parameters == 1 => {
				PropertyMetadata::new(&name).with_writable(true)
			}
			_ => return None,
		};
		Some(property.with_builtin_types(Self::field_type(descriptor, &name)))
	}
}

impl ClassMetadataFactory for ReflectionClassMetadataFactory {
	fn create(
		&self,
		resource_class: &str,
		options: &MetadataOptions,
	) -> Result<Arc<ClassMetadata>> {
		let descriptor = self.registry.descriptor(resource_class)?;
		let mut discovered: IndexMap<String, PropertyMetadata> = IndexMap::new();

		let mut record = |property: PropertyMetadata| {
			let name = property.name().to_string();
			let merged = match discovered.shift_remove(&name) {
				Some(existing) => existing.merge(property),
				None => property,
			};
			discovered.insert(name, merged);
		};

		for field in &descriptor.properties {
			if field.visibility == Visibility::Public {
				record(
					PropertyMetadata::new(&field.name)
						.with_readable(true)
						.with_writable(true)
						.with_builtin_types(vec![field.type_info.clone()]),
				);
			}
		}
		for method in &descriptor.methods {
			if let Some(property) = Self::discover_method(&descriptor, method) {
				record(property);
			}
		}

		// Keep field declaration order first, accessor-only properties after
		let mut metadata = ClassMetadata::new(&descriptor.name, &descriptor.short_name)
			.with_options(options.clone());
		for field in &descriptor.properties {
			if let Some(property) = discovered.shift_remove(&field.name) {
				metadata = metadata.with_property(property);
			}
		}
		for (_, property) in discovered {
			metadata = metadata.with_property(property);
		}

		tracing::debug!(
			resource_class = %resource_class,
			properties = metadata.len(),
			"properties discovered"
		);
		Ok(Arc::new(metadata))
	}
}
