//! Ordering filter

use crate::filter::{Filter, FilterDescription, FilterProperties, notice};
use crate::property::PropertyResolver;
use crate::query::{Direction, QueryBuilder};
use armature_core::Result;
use armature_metadata::Operation;
use armature_state::OperationContext;
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;

const NAME: &str = "order";

/// Default query parameter holding the orderings
pub const DEFAULT_ORDER_PARAMETER: &str = "order";

/// Sorts on `?order[property]=asc|desc`
///
/// An empty direction falls back to the property's configured default,
/// then to ascending. Orderings apply in the order they appear in the query.
pub struct OrderFilter {
	resolver: Arc<PropertyResolver>,
	properties: FilterProperties<Direction>,
	parameter_name: String,
}

impl OrderFilter {
	pub fn new(resolver: Arc<PropertyResolver>) -> Self {
		Self {
			resolver,
			properties: FilterProperties::default(),
			parameter_name: DEFAULT_ORDER_PARAMETER.to_string(),
		}
	}

	pub fn with_property(mut self, property: impl Into<String>) -> Self {
		self.properties.insert(property.into(), None);
		self
	}

	pub fn with_default_direction(mut self, property: impl Into<String>, direction: Direction) -> Self {
		self.properties.insert(property.into(), Some(direction));
		self
	}

	pub fn with_parameter_name(mut self, name: impl Into<String>) -> Self {
		self.parameter_name = name.into();
		self
	}
}

impl Filter for OrderFilter {
	fn apply(
		&self,
		mut query: QueryBuilder,
		resource_class: &str,
		_operation: &Operation,
		context: &OperationContext,
	) -> Result<QueryBuilder> {
		let Some(Value::Object(orderings)) = context.filters.get(&self.parameter_name) else {
			return Ok(query);
		};

		for (property, raw) in orderings {
			if !self.properties.is_enabled(property) {
				continue;
			}
			let Some(resolved) = self.resolver.resolve(resource_class, property)? else {
				continue;
			};

			let direction = match raw.as_str().map(str::trim) {
				Some("") | None => self.properties.setting(property).unwrap_or_default(),
				Some(raw) => match raw.parse::<Direction>() {
					Ok(direction) => direction,
					Err(e) => {
						notice(NAME, resource_class, property, &e.to_string());
						continue;
					}
				},
			};

			for association in &resolved.associations {
				query = query.join(association.clone());
			}
			query = query.order_by(resolved.path, direction);
		}
		Ok(query)
	}

	fn description(&self, resource_class: &str) -> Result<IndexMap<String, FilterDescription>> {
		let mut description = IndexMap::new();
		for (property, _) in self.properties.enabled(&self.resolver, resource_class)? {
			if self.resolver.resolve(resource_class, &property)?.is_none() {
				continue;
			}
			description.insert(
				format!("{}[{}]", self.parameter_name, property),
				FilterDescription::new(&property, "string"),
			);
		}
		Ok(description)
	}
}
