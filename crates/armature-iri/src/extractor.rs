//! Identifier extraction from resource instances

use armature_core::identifier::{identifier_to_string, stringify_composite};
use armature_core::{ApiResource, Error, PropertyValue, Result};
use armature_metadata::{ClassMetadataFactory, MetadataOptions, Operation};
use indexmap::IndexMap;
use std::sync::Arc;

/// Reads identifier values off resource instances
///
/// An identifier holding a related resource is replaced by that resource's
/// own identifier, composite when it has several.
pub struct IdentifiersExtractor {
	class_metadata: Arc<dyn ClassMetadataFactory>,
}

fn unable(class: &str) -> Error {
	Error::InvalidArgument(format!(
		"Unable to generate an IRI for the item of type \"{}\"",
		class
	))
}

impl IdentifiersExtractor {
	pub fn new(class_metadata: Arc<dyn ClassMetadataFactory>) -> Self {
		Self { class_metadata }
	}

	/// Identifier property names of the item's class
	pub fn identifier_names(&self, resource_class: &str) -> Result<Vec<String>> {
		self.class_metadata
			.create(resource_class, &MetadataOptions::default())?
			.require_identifiers()
	}

	/// Identifier values keyed by property name, in declaration order
	pub fn identifiers(&self, item: &dyn ApiResource) -> Result<IndexMap<String, String>> {
		let class = item.resource_class();
		let names = self
			.identifier_names(class)
			.map_err(|_| unable(class))?;
		names
			.into_iter()
			.map(|name| {
				let value = self.identifier_value(item, &name)?;
				Ok((name, value))
			})
			.collect()
	}

	/// Values of the operation's URI variables for `item`
	pub fn identifiers_from_item(
		&self,
		item: &dyn ApiResource,
		operation: &Operation,
	) -> Result<IndexMap<String, String>> {
		let mut parameters = IndexMap::new();
		for (variable, link) in &operation.uri_variables {
			let names = if link.identifiers.is_empty() {
				self.identifier_names(item.resource_class())
					.map_err(|_| unable(item.resource_class()))?
			} else {
				link.identifiers.clone()
			};

			let value = if link.composite_identifier || names.len() > 1 {
				let mut values = IndexMap::new();
				for name in names {
					let value = self.identifier_value(item, &name)?;
					values.insert(name, value);
				}
				stringify_composite(&values)
			} else {
				let name = names.first().ok_or_else(|| unable(item.resource_class()))?;
				self.identifier_value(item, name)?
			};
			parameters.insert(variable.clone(), value);
		}
		Ok(parameters)
	}

	fn identifier_value(&self, item: &dyn ApiResource, name: &str) -> Result<String> {
		let class = item.resource_class();
		match item.get_property(name) {
			Some(PropertyValue::Scalar(value)) => {
				identifier_to_string(&value).ok_or_else(|| unable(class))
			}
			Some(PropertyValue::Resource(related)) => {
				let mut values = self.identifiers(related.as_ref())?;
				if values.len() == 1 {
					values.swap_remove_index(0).map(|(_, v)| v).ok_or_else(|| unable(class))
				} else {
					Ok(stringify_composite(&values))
				}
			}
			Some(PropertyValue::Resources(_)) | None => Err(unable(class)),
		}
	}
}
