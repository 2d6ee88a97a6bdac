//! Date range filter

use crate::filter::{Filter, FilterDescription, FilterProperties, notice};
use crate::property::{PropertyResolver, ResolvedProperty};
use crate::query::{Comparison, Condition, QueryBuilder};
use armature_core::{BuiltinType, Result};
use armature_metadata::Operation;
use armature_state::OperationContext;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;

const NAME: &str = "date";

/// Bounds accepted under `property[...]`
const BOUNDS: [(&str, Comparison); 4] = [
	("before", Comparison::Le),
	("strictly_before", Comparison::Lt),
	("after", Comparison::Ge),
	("strictly_after", Comparison::Gt),
];

/// How items whose date is null take part in a range
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NullManagement {
	/// Null dates never match
	#[default]
	ExcludeNull,
	/// Null sorts before every date
	IncludeNullBefore,
	/// Null sorts after every date
	IncludeNullAfter,
	/// Null matches any bound
	IncludeNullBeforeAndAfter,
}

impl NullManagement {
	fn includes(&self, comparison: Comparison) -> bool {
		match self {
			NullManagement::ExcludeNull => false,
			NullManagement::IncludeNullBefore => comparison.is_upper_bound(),
			NullManagement::IncludeNullAfter => !comparison.is_upper_bound(),
			NullManagement::IncludeNullBeforeAndAfter => true,
		}
	}
}

/// Parse an RFC 3339 timestamp, `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DD`
///
/// Values without an offset are taken as UTC.
///
/// # Examples
///
/// ```
/// use armature_filters::date::parse_datetime;
///
/// assert!(parse_datetime("2024-03-01").is_some());
/// assert!(parse_datetime("2024-03-01T10:00:00+02:00").is_some());
/// assert!(parse_datetime("yesterday").is_none());
/// ```
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
	let raw = raw.trim();
	if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
		return Some(parsed.with_timezone(&Utc));
	}
	for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
		if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
			return Some(parsed.and_utc());
		}
	}
	NaiveDate::parse_from_str(raw, "%Y-%m-%d")
		.ok()
		.and_then(|date| date.and_hms_opt(0, 0, 0))
		.map(|datetime| datetime.and_utc())
}

/// Filters on `?property[after]=2024-01-01&property[strictly_before]=...`
pub struct DateFilter {
	resolver: Arc<PropertyResolver>,
	properties: FilterProperties<NullManagement>,
}

impl DateFilter {
	pub fn new(resolver: Arc<PropertyResolver>) -> Self {
		Self {
			resolver,
			properties: FilterProperties::default(),
		}
	}

	pub fn with_property(mut self, property: impl Into<String>) -> Self {
		self.properties.insert(property.into(), None);
		self
	}

	pub fn with_null_management(
		mut self,
		property: impl Into<String>,
		null_management: NullManagement,
	) -> Self {
		self.properties.insert(property.into(), Some(null_management));
		self
	}
}

fn is_date(resolved: &ResolvedProperty) -> bool {
	resolved
		.metadata
		.primary_type()
		.is_some_and(|t| t.builtin == BuiltinType::DateTime)
}

impl Filter for DateFilter {
	fn apply(
		&self,
		mut query: QueryBuilder,
		resource_class: &str,
		_operation: &Operation,
		context: &OperationContext,
	) -> Result<QueryBuilder> {
		for (property, raw) in &context.filters {
			if !self.properties.is_enabled(property) {
				continue;
			}
			let Value::Object(bounds) = raw else {
				continue;
			};
			let Some(resolved) = self.resolver.resolve(resource_class, property)? else {
				continue;
			};
			if !is_date(&resolved) {
				notice(NAME, resource_class, property, "property is not a date");
				continue;
			}
			let null_management = self.properties.setting(property).unwrap_or_default();

			let mut conditions = Vec::new();
			for (key, comparison) in BOUNDS {
				let Some(value) = bounds.get(key) else {
					continue;
				};
				let Some(date) = value.as_str().and_then(parse_datetime) else {
					notice(
						NAME,
						resource_class,
						property,
						&format!("\"{}\" is not a valid date for [{}]", value, key),
					);
					continue;
				};
				conditions.push(Condition::Compare {
					property: resolved.path.clone(),
					comparison,
					value: date,
					include_null: null_management.includes(comparison),
				});
			}
			if conditions.is_empty() {
				continue;
			}

			for association in &resolved.associations {
				query = query.join(association.clone());
			}
			if null_management == NullManagement::ExcludeNull {
				query = query.and_where(Condition::NotNull {
					property: resolved.path.clone(),
				});
			}
			query = conditions.into_iter().fold(query, QueryBuilder::and_where);
		}
		Ok(query)
	}

	fn description(&self, resource_class: &str) -> Result<IndexMap<String, FilterDescription>> {
		let mut description = IndexMap::new();
		for (property, _) in self.properties.enabled(&self.resolver, resource_class)? {
			let Some(resolved) = self.resolver.resolve(resource_class, &property)? else {
				continue;
			};
			if !is_date(&resolved) {
				continue;
			}
			for (key, _) in BOUNDS {
				description.insert(
					format!("{}[{}]", property, key),
					FilterDescription::new(&property, "datetime"),
				);
			}
		}
		Ok(description)
	}
}
