//! Search filter: equality and string matching

use crate::filter::{Filter, FilterDescription, FilterProperties, notice, string_values};
use crate::property::{PropertyResolver, ResolvedProperty};
use crate::query::{Condition, MatchStrategy, QueryBuilder};
use armature_core::identifier::{identifier_to_string, stringify_composite};
use armature_core::{Error, Result};
use armature_iri::Router;
use armature_metadata::{HttpMethod, Operation};
use armature_state::{OperationContext, UriVariables};
use armature_state::provider::read::resolve_identifiers;
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;

const NAME: &str = "search";

/// Filters on `?property=value` (or `property[]=a&property[]=b`)
///
/// Strategies: `exact` (default), `partial`, `start`, `end`, `word_start`,
/// each case-insensitive with an `i` prefix (`ipartial`). Identifier and
/// association properties always match exactly and accept IRIs.
pub struct SearchFilter {
	resolver: Arc<PropertyResolver>,
	properties: FilterProperties<String>,
	router: Option<Arc<Router>>,
}

/// `ipartial` is `(Partial, true)`
pub fn parse_strategy(raw: Option<&str>) -> Result<(MatchStrategy, bool)> {
	let raw = raw.unwrap_or("exact");
	if let Ok(strategy) = raw.parse::<MatchStrategy>() {
		return Ok((strategy, false));
	}
	match raw.strip_prefix('i').map(str::parse::<MatchStrategy>) {
		Some(Ok(strategy)) => Ok((strategy, true)),
		_ => Err(Error::InvalidArgument(format!(
			"strategy \"{}\" does not exist",
			raw
		))),
	}
}

impl SearchFilter {
	pub fn new(resolver: Arc<PropertyResolver>) -> Self {
		Self {
			resolver,
			properties: FilterProperties::default(),
			router: None,
		}
	}

	/// Enable a property with the exact strategy
	pub fn with_property(mut self, property: impl Into<String>) -> Self {
		self.properties.insert(property.into(), None);
		self
	}

	pub fn with_strategy(mut self, property: impl Into<String>, strategy: impl Into<String>) -> Self {
		self.properties.insert(property.into(), Some(strategy.into()));
		self
	}

	/// Router used to turn IRI values into identifiers
	pub fn with_router(mut self, router: Arc<Router>) -> Self {
		self.router = Some(router);
		self
	}

	/// The identifier an IRI points to, or the value itself
	fn identifier_from_value(&self, value: &str) -> String {
		let Some(router) = &self.router else {
			return value.to_string();
		};
		let path = match value.split_once("://") {
			Some((_, rest)) => rest.find('/').map_or("/", |idx| &rest[idx..]),
			None => value,
		};
		if !path.starts_with('/') {
			return value.to_string();
		}
		router
			.match_path(HttpMethod::Get, path)
			.ok()
			.filter(|matched| !matched.operation.collection)
			.and_then(|matched| resolve_identifiers(&matched.operation, &matched.uri_variables).ok())
			.and_then(|identifiers| identifier_key(&identifiers))
			.unwrap_or_else(|| value.to_string())
	}

	fn condition(
		&self,
		resolved: &ResolvedProperty,
		values: Vec<String>,
		strategy: MatchStrategy,
		case_insensitive: bool,
		resource_class: &str,
	) -> Option<Condition> {
		if resolved.is_identifier_like() {
			return Some(Condition::Equals {
				property: resolved.path.clone(),
				values: values
					.iter()
					.map(|v| Value::String(self.identifier_from_value(v)))
					.collect(),
				case_insensitive: false,
				association: resolved.metadata.is_link(),
			});
		}

		if strategy != MatchStrategy::Exact && values.len() > 1 {
			notice(
				NAME,
				resource_class,
				&resolved.path,
				&format!(
					"multiple values are only supported with the \"exact\" strategy, \"{}\" given",
					strategy.as_str()
				),
			);
			return None;
		}

		Some(match strategy {
			MatchStrategy::Exact => Condition::Equals {
				property: resolved.path.clone(),
				values: values.into_iter().map(Value::String).collect(),
				case_insensitive,
				association: false,
			},
			strategy => Condition::Matches {
				property: resolved.path.clone(),
				strategy,
				value: values.into_iter().next()?,
				case_insensitive,
			},
		})
	}
}

/// Single identifiers as their plain value, several as `k=v;k=v`
fn identifier_key(identifiers: &UriVariables) -> Option<String> {
	let mut values = identifiers
		.iter()
		.map(|(name, value)| Some((name.clone(), identifier_to_string(value)?)))
		.collect::<Option<IndexMap<_, _>>>()?;
	match values.len() {
		0 => None,
		1 => values.pop().map(|(_, value)| value),
		_ => Some(stringify_composite(&values)),
	}
}

impl Filter for SearchFilter {
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
			let Some(resolved) = self.resolver.resolve(resource_class, property)? else {
				continue;
			};

			let values = string_values(raw);
			if values.is_empty() {
				notice(NAME, resource_class, property, "invalid value");
				continue;
			}
			let (strategy, case_insensitive) =
				match parse_strategy(self.properties.setting(property).as_deref()) {
					Ok(parsed) => parsed,
					Err(e) => {
						notice(NAME, resource_class, property, &e.to_string());
						continue;
					}
				};

			let Some(condition) =
				self.condition(&resolved, values, strategy, case_insensitive, resource_class)
			else {
				continue;
			};
			for association in &resolved.associations {
				query = query.join(association.clone());
			}
			query = query.and_where(condition);
		}
		Ok(query)
	}

	fn description(&self, resource_class: &str) -> Result<IndexMap<String, FilterDescription>> {
		let mut description = IndexMap::new();
		for (property, strategy) in self.properties.enabled(&self.resolver, resource_class)? {
			let Some(resolved) = self.resolver.resolve(resource_class, &property)? else {
				continue;
			};
			let value_type = resolved
				.metadata
				.primary_type()
				.map(|t| t.builtin.as_str())
				.unwrap_or("string");
			let strategy = strategy.unwrap_or_else(|| "exact".to_string());
			let exact = resolved.is_identifier_like()
				|| parse_strategy(Some(&strategy)).is_ok_and(|(s, _)| s == MatchStrategy::Exact);

			description.insert(
				property.clone(),
				FilterDescription::new(&property, value_type).with_strategy(&strategy),
			);
			if exact {
				description.insert(
					format!("{}[]", property),
					FilterDescription::new(&property, value_type)
						.with_strategy(&strategy)
						.with_collection(true),
				);
			}
		}
		Ok(description)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::{Author, Book, LogCapture, author_item, book_list, query, resolver};
	use armature_core::ResourceClass;
	use armature_metadata::Link;
	use rstest::rstest;
	use serde_json::json;

	fn apply(filter: &SearchFilter, raw: &str) -> QueryBuilder {
		filter
			.apply(
				QueryBuilder::new(Book::RESOURCE_CLASS),
				Book::RESOURCE_CLASS,
				&book_list(),
				&query(raw),
			)
			.unwrap()
	}

	#[rstest]
	#[case(None, (MatchStrategy::Exact, false))]
	#[case(Some("ipartial"), (MatchStrategy::Partial, true))]
	#[case(Some("iword_start"), (MatchStrategy::WordStart, true))]
	#[case(Some("end"), (MatchStrategy::End, false))]
	fn test_parse_strategy(#[case] raw: Option<&str>, #[case] expected: (MatchStrategy, bool)) {
		assert_eq!(parse_strategy(raw).unwrap(), expected);
	}

	#[rstest]
	fn test_exact_match_with_several_values() {
		// Arrange
		let filter = SearchFilter::new(resolver()).with_property("title");

		// Act
		let query = apply(&filter, "title[]=Dune&title[]=Emma&page=2");

		// Assert
		assert_eq!(
			query.conditions(),
			[Condition::Equals {
				property: "title".to_string(),
				values: vec![json!("Dune"), json!("Emma")],
				case_insensitive: false,
				association: false,
			}]
		);
	}

	#[rstest]
	fn test_case_insensitive_partial() {
		let filter = SearchFilter::new(resolver()).with_strategy("title", "ipartial");

		let query = apply(&filter, "title=dun");

		assert_eq!(
			query.conditions(),
			[Condition::Matches {
				property: "title".to_string(),
				strategy: MatchStrategy::Partial,
				value: "dun".to_string(),
				case_insensitive: true,
			}]
		);
	}

	#[rstest]
	fn test_non_exact_strategy_with_several_values_is_ignored() {
		// Arrange
		let filter = SearchFilter::new(resolver()).with_strategy("title", "partial");
		let logs = LogCapture::default();
		let untouched = QueryBuilder::new(Book::RESOURCE_CLASS);

		// Act
		let query = logs.capture(|| apply(&filter, "title[]=Dune&title[]=Emma"));

		// Assert
		assert_eq!(query, untouched);
		assert!(logs.lines().iter().any(|l| l.starts_with("[INFO]") && l.contains("multiple values")));
	}

	#[rstest]
	fn test_association_accepts_iri() {
		// Arrange
		let router = Router::new().with_operation(author_item()).unwrap();
		let filter = SearchFilter::new(resolver())
			.with_property("author")
			.with_router(Arc::new(router));

		// Act
		let query = apply(&filter, "author[]=/authors/7&author[]=8");

		// Assert
		assert_eq!(
			query.conditions(),
			[Condition::Equals {
				property: "author".to_string(),
				values: vec![json!("7"), json!("8")],
				case_insensitive: false,
				association: true,
			}]
		);
	}

	#[rstest]
	fn test_composite_iri_keeps_every_identifier() {
		// Arrange
		let composite_item = Operation::new(HttpMethod::Get, false)
			.with_name("_api_Author_get")
			.with_class(Author::RESOURCE_CLASS, "Author")
			.with_uri_template("/authors/{id}")
			.with_uri_variable(Link::new("id", Author::RESOURCE_CLASS).with_identifiers(vec![
				"first_name".to_string(),
				"last_name".to_string(),
			]));
		let router = Router::new().with_operation(composite_item).unwrap();
		let filter = SearchFilter::new(resolver())
			.with_property("author")
			.with_router(Arc::new(router));

		// Act
		let query = apply(&filter, "author=/authors/first_name=Ursula;last_name=LeGuin");

		// Assert
		assert_eq!(
			query.conditions(),
			[Condition::Equals {
				property: "author".to_string(),
				values: vec![json!("first_name=Ursula;last_name=LeGuin")],
				case_insensitive: false,
				association: true,
			}]
		);
	}

	#[rstest]
	fn test_nested_property_is_joined() {
		let filter = SearchFilter::new(resolver()).with_strategy("author.name", "istart");

		let query = apply(&filter, "author.name=ur");

		assert_eq!(query.joins(), ["author"]);
		assert_eq!(query.conditions()[0].property(), "author.name");
	}

	#[rstest]
	#[case("author.name=Ursula")]
	#[case("publisher=1")]
	#[case("title[op]=1")]
	fn test_inapplicable_parameters_are_ignored(#[case] raw: &str) {
		let filter = SearchFilter::new(resolver());

		let query = apply(&filter, raw);

		assert!(query.conditions().is_empty());
	}

	#[rstest]
	fn test_unknown_strategy_is_ignored() {
		let filter = SearchFilter::new(resolver()).with_strategy("title", "fuzzy");

		let query = apply(&filter, "title=Dune");

		assert!(query.conditions().is_empty());
	}

	#[rstest]
	fn test_description() {
		let filter = SearchFilter::new(resolver())
			.with_strategy("title", "ipartial")
			.with_property("author");

		let description = filter.description(Book::RESOURCE_CLASS).unwrap();

		assert_eq!(
			description.keys().collect::<Vec<_>>(),
			vec!["title", "author", "author[]"]
		);
		assert_eq!(description["title"].strategy.as_deref(), Some("ipartial"));
		assert!(description["author[]"].is_collection);
		assert_eq!(description["author"].value_type, "object");
	}
}
