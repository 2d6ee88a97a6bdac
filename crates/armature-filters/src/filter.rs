//! The filter contract

use crate::property::PropertyResolver;
use crate::query::QueryBuilder;
use armature_core::Result;
use armature_metadata::Operation;
use armature_state::{OperationContext, ServiceLocator};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// One query parameter understood by a filter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterDescription {
	pub property: String,
	#[serde(rename = "type")]
	pub value_type: String,
	pub required: bool,
	pub is_collection: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub strategy: Option<String>,
}

impl FilterDescription {
	pub fn new(property: impl Into<String>, value_type: impl Into<String>) -> Self {
		Self {
			property: property.into(),
			value_type: value_type.into(),
			required: false,
			is_collection: false,
			strategy: None,
		}
	}

	pub fn with_collection(mut self, is_collection: bool) -> Self {
		self.is_collection = is_collection;
		self
	}

	pub fn with_strategy(mut self, strategy: impl Into<String>) -> Self {
		self.strategy = Some(strategy.into());
		self
	}
}

/// Refines a collection query from the request's query parameters
///
/// Malformed or inapplicable parameters leave the query unchanged and are
/// logged; only metadata failures are returned as errors.
pub trait Filter: Send + Sync {
	fn apply(
		&self,
		query: QueryBuilder,
		resource_class: &str,
		operation: &Operation,
		context: &OperationContext,
	) -> Result<QueryBuilder>;

	/// Query parameters by name
	fn description(&self, resource_class: &str) -> Result<IndexMap<String, FilterDescription>>;
}

/// Filters addressable by the ids operations list in `filters`
pub type FilterLocator = ServiceLocator<dyn Filter>;

/// Apply every filter declared on the operation, in declaration order
pub fn apply_filters(
	locator: &FilterLocator,
	query: QueryBuilder,
	operation: &Operation,
	context: &OperationContext,
) -> Result<QueryBuilder> {
	operation.filters.iter().try_fold(query, |query, id| {
		let filter = locator.resolve(Some(id), &operation.class)?;
		filter.apply(query, &operation.class, operation, context)
	})
}

/// Properties a filter is enabled for, with per-property settings
///
/// Left empty, every directly mapped property of the class is enabled;
/// nested paths need explicit configuration.
#[derive(Debug, Clone)]
pub(crate) struct FilterProperties<T> {
	configured: IndexMap<String, Option<T>>,
}

impl<T> Default for FilterProperties<T> {
	fn default() -> Self {
		Self {
			configured: IndexMap::new(),
		}
	}
}

impl<T: Clone> FilterProperties<T> {
	pub(crate) fn insert(&mut self, property: String, setting: Option<T>) {
		self.configured.insert(property, setting);
	}

	pub(crate) fn is_enabled(&self, property: &str) -> bool {
		if self.configured.is_empty() {
			return !property.contains('.');
		}
		self.configured.contains_key(property)
	}

	pub(crate) fn setting(&self, property: &str) -> Option<T> {
		self.configured.get(property).cloned().flatten()
	}

	/// Property names paired with their settings
	pub(crate) fn enabled(
		&self,
		resolver: &PropertyResolver,
		resource_class: &str,
	) -> Result<Vec<(String, Option<T>)>> {
		if self.configured.is_empty() {
			return Ok(resolver
				.properties(resource_class)?
				.into_iter()
				.map(|p| (p, None))
				.collect());
		}
		Ok(self
			.configured
			.iter()
			.map(|(p, s)| (p.clone(), s.clone()))
			.collect())
	}
}

/// Scalar query values as strings; objects yield nothing
pub(crate) fn string_values(value: &Value) -> Vec<String> {
	match value {
		Value::String(s) => vec![s.clone()],
		Value::Number(n) => vec![n.to_string()],
		Value::Bool(b) => vec![b.to_string()],
		Value::Array(items) => items.iter().flat_map(string_values).collect(),
		Value::Null | Value::Object(_) => Vec::new(),
	}
}

/// Log a skipped filter clause
pub(crate) fn notice(filter: &str, resource_class: &str, property: &str, reason: &str) {
	tracing::info!(
		filter = filter,
		resource_class = %resource_class,
		property = %property,
		"Filter skipped: {}",
		reason
	);
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::order::OrderFilter;
	use crate::search::SearchFilter;
	use crate::test_support::{book_list, query, resolver};
	use armature_core::Error;
	use rstest::rstest;
	use serde_json::json;
	use std::sync::Arc;

	fn locator() -> FilterLocator {
		FilterLocator::new("filter")
			.with_named("book.search", Arc::new(SearchFilter::new(resolver()).with_property("title")))
			.with_named("book.order", Arc::new(OrderFilter::new(resolver())))
	}

	#[rstest]
	fn test_declared_filters_apply_in_order() {
		// Arrange
		let operation = book_list().with_filter("book.search").with_filter("book.order");
		let context = query("title=Dune&order[id]=desc");

		// Act
		let result = apply_filters(
			&locator(),
			QueryBuilder::new(&operation.class),
			&operation,
			&context,
		)
		.unwrap();

		// Assert
		assert_eq!(result.conditions().len(), 1);
		assert_eq!(result.orderings().len(), 1);
	}

	#[rstest]
	fn test_unknown_filter_id_is_a_configuration_error() {
		let operation = book_list().with_filter("book.missing");

		let result = apply_filters(
			&locator(),
			QueryBuilder::new(&operation.class),
			&operation,
			&query(""),
		);

		assert!(matches!(result, Err(Error::Configuration(_))));
	}

	#[rstest]
	#[case(json!("a"), vec!["a"])]
	#[case(json!(["a", 2, true]), vec!["a", "2", "true"])]
	#[case(json!({"before": "x"}), vec![])]
	#[case(json!(null), vec![])]
	fn test_string_values(#[case] value: Value, #[case] expected: Vec<&str>) {
		assert_eq!(string_values(&value), expected);
	}

	#[rstest]
	fn test_unconfigured_properties_exclude_nested_paths() {
		let properties: FilterProperties<String> = FilterProperties::default();

		assert!(properties.is_enabled("title"));
		assert!(!properties.is_enabled("author.name"));
	}
}
