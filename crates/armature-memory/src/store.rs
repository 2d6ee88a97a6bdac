//! Resources held in memory, grouped by class

use armature_core::identifier::{identifier_to_string, stringify_composite};
use armature_core::{ApiResource, Error, PropertyValue, Result};
use armature_metadata::{ClassMetadataFactory, MetadataOptions};
use armature_state::UriVariables;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
struct Table {
	items: IndexMap<String, Box<dyn ApiResource>>,
	last_id: i64,
}

/// Identifier values that mean "not assigned yet"
fn is_unset(value: &Value) -> bool {
	match value {
		Value::Null => true,
		Value::Number(n) => n.as_i64() == Some(0),
		Value::String(s) => s.is_empty(),
		_ => false,
	}
}

fn encode_key(mut identifiers: IndexMap<String, String>) -> String {
	if identifiers.len() == 1 {
		if let Some((_, value)) = identifiers.pop() {
			return value;
		}
	}
	stringify_composite(&identifiers)
}

/// Thread-safe resource storage keyed by identifier
///
/// A single identifier is keyed by its string form (`7`), several by their
/// composite form (`isbn=123;edition=2`). Items are cloned on the way in and
/// out, so no lock is held once a call returns.
///
/// Saving an item whose single identifier is unset (`null`, `0` or `""`)
/// assigns the next integer of its class.
#[derive(Clone)]
pub struct InMemoryStore {
	classes: Arc<dyn ClassMetadataFactory>,
	tables: Arc<RwLock<HashMap<String, Table>>>,
}

impl InMemoryStore {
	pub fn new(classes: Arc<dyn ClassMetadataFactory>) -> Self {
		Self {
			classes,
			tables: Arc::new(RwLock::new(HashMap::new())),
		}
	}

	pub fn class_metadata_factory(&self) -> &Arc<dyn ClassMetadataFactory> {
		&self.classes
	}

	/// Identifier property names of `resource_class`
	pub fn identifiers(&self, resource_class: &str) -> Result<Vec<String>> {
		self.classes
			.create(resource_class, &MetadataOptions::new())?
			.require_identifiers()
	}

	/// Storage key of `item`, `None` while one of its identifiers is unset
	pub fn key_of(&self, item: &dyn ApiResource) -> Result<Option<String>> {
		let mut identifiers = IndexMap::new();
		for name in self.identifiers(item.resource_class())? {
			let value = item
				.get_property(&name)
				.map(|v| v.to_scalar_lossy())
				.unwrap_or(Value::Null);
			if is_unset(&value) {
				return Ok(None);
			}
			let Some(value) = identifier_to_string(&value) else {
				return Ok(None);
			};
			identifiers.insert(name, value);
		}
		Ok(Some(encode_key(identifiers)))
	}

	/// Storage key addressed by resolved URI variables
	pub fn key_from_variables(
		&self,
		resource_class: &str,
		uri_variables: &UriVariables,
	) -> Result<Option<String>> {
		let mut identifiers = IndexMap::new();
		for name in self.identifiers(resource_class)? {
			let Some(value) = uri_variables.get(&name).and_then(identifier_to_string) else {
				return Ok(None);
			};
			identifiers.insert(name, value);
		}
		Ok(Some(encode_key(identifiers)))
	}

	pub fn find(&self, resource_class: &str, key: &str) -> Option<Box<dyn ApiResource>> {
		self.tables
			.read()
			.get(resource_class)
			.and_then(|table| table.items.get(key))
			.cloned()
	}

	/// The item addressed by `uri_variables`, if stored
	pub fn get(
		&self,
		resource_class: &str,
		uri_variables: &UriVariables,
	) -> Result<Option<Box<dyn ApiResource>>> {
		Ok(self
			.key_from_variables(resource_class, uri_variables)?
			.and_then(|key| self.find(resource_class, &key)))
	}

	/// Every item of `resource_class`, in insertion order
	pub fn all(&self, resource_class: &str) -> Vec<Box<dyn ApiResource>> {
		self.tables
			.read()
			.get(resource_class)
			.map(|table| table.items.values().cloned().collect())
			.unwrap_or_default()
	}

	/// Insert or replace `item`, returning the stored copy
	pub fn save(&self, mut item: Box<dyn ApiResource>) -> Result<Box<dyn ApiResource>> {
		let resource_class = item.resource_class();
		let existing_key = self.key_of(item.as_ref())?;
		let identifiers = if existing_key.is_none() {
			self.identifiers(resource_class)?
		} else {
			Vec::new()
		};

		let mut tables = self.tables.write();
		let table = tables.entry(resource_class.to_string()).or_default();
		let key = match existing_key {
			Some(key) => key,
			None => {
				let [identifier] = identifiers.as_slice() else {
					return Err(Error::InvalidArgument(format!(
						"Cannot generate a composite identifier for \"{}\"",
						resource_class
					)));
				};
				let id = table.last_id + 1;
				assign_id(item.as_mut(), identifier, id)?;
				id.to_string()
			}
		};
		if let Ok(id) = key.parse::<i64>() {
			table.last_id = table.last_id.max(id);
		}
		table.items.insert(key.clone(), item.clone());
		tracing::debug!(resource_class, key = key.as_str(), "Stored item");
		Ok(item)
	}

	/// Remove `item`; `false` when it was not stored
	pub fn remove(&self, item: &dyn ApiResource) -> Result<bool> {
		let Some(key) = self.key_of(item)? else {
			return Ok(false);
		};
		let removed = self
			.tables
			.write()
			.get_mut(item.resource_class())
			.and_then(|table| table.items.shift_remove(&key))
			.is_some();
		tracing::debug!(
			resource_class = item.resource_class(),
			key = key.as_str(),
			removed,
			"Removed item"
		);
		Ok(removed)
	}

	pub fn len(&self, resource_class: &str) -> usize {
		self.tables
			.read()
			.get(resource_class)
			.map_or(0, |table| table.items.len())
	}

	pub fn is_empty(&self, resource_class: &str) -> bool {
		self.len(resource_class) == 0
	}

	/// Drop every item of every class
	pub fn clear(&self) {
		self.tables.write().clear();
	}
}

/// Write a generated id, as a number or, for string identifiers, as text
fn assign_id(item: &mut dyn ApiResource, identifier: &str, id: i64) -> Result<()> {
	if item
		.set_property(identifier, PropertyValue::Scalar(Value::from(id)))
		.is_ok()
	{
		return Ok(());
	}
	item.set_property(identifier, PropertyValue::Scalar(Value::String(id.to_string())))
		.map_err(|e| Error::Runtime(e.to_string()))
}
