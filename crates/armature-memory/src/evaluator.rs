//! Evaluation of query fragments against stored resources
//!
//! Property paths are walked through related resources (`author.name`); a
//! condition holds when any value reached by the path satisfies it.
//! Identifiers are compared in their string form, so the `"7"` carried by a
//! search filter matches an integer id of 7.

use crate::store::InMemoryStore;
use armature_core::{ApiResource, PropertyValue, Result};
use armature_filters::date::parse_datetime;
use armature_filters::{Comparison, Condition, Direction, MatchStrategy, Ordering, QueryBuilder};
use serde_json::Value;
use std::cmp::Ordering as CmpOrdering;

/// Items of one page plus the number of items matching the conditions
#[derive(Debug)]
pub struct QueryResult {
	pub items: Vec<Box<dyn ApiResource>>,
	pub total_items: u64,
}

pub struct QueryEvaluator<'a> {
	store: &'a InMemoryStore,
}

/// Values reached by a dotted path; collections fan out
fn leaves(item: &dyn ApiResource, path: &str) -> Vec<PropertyValue> {
	let segments: Vec<&str> = path.split('.').collect();
	let mut out = Vec::new();
	collect(item, &segments, &mut out);
	out
}

fn collect(item: &dyn ApiResource, segments: &[&str], out: &mut Vec<PropertyValue>) {
	let Some((head, rest)) = segments.split_first() else {
		return;
	};
	let Some(value) = item.get_property(head) else {
		return;
	};
	if rest.is_empty() {
		out.push(value);
		return;
	}
	match value {
		PropertyValue::Resource(related) => collect(related.as_ref(), rest, out),
		PropertyValue::Resources(related) => {
			for r in &related {
				collect(r.as_ref(), rest, out);
			}
		}
		PropertyValue::Scalar(value) => {
			if let Some(nested) = rest.iter().try_fold(&value, |v, s| v.get(*s)) {
				out.push(PropertyValue::Scalar(nested.clone()));
			}
		}
	}
}

fn text(value: &Value) -> Option<String> {
	match value {
		Value::Null => None,
		Value::String(s) => Some(s.clone()),
		other => Some(other.to_string()),
	}
}

fn fold(value: &str, case_insensitive: bool) -> String {
	if case_insensitive {
		value.to_lowercase()
	} else {
		value.to_string()
	}
}

fn matches_strategy(candidate: &str, strategy: MatchStrategy, needle: &str) -> bool {
	match strategy {
		MatchStrategy::Exact => candidate == needle,
		MatchStrategy::Partial => candidate.contains(needle),
		MatchStrategy::Start => candidate.starts_with(needle),
		MatchStrategy::End => candidate.ends_with(needle),
		MatchStrategy::WordStart => candidate
			.split_whitespace()
			.any(|word| word.starts_with(needle)),
	}
}

fn compare(candidate: &Value, comparison: Comparison, bound: &chrono::DateTime<chrono::Utc>) -> bool {
	let Some(date) = candidate.as_str().and_then(parse_datetime) else {
		return false;
	};
	match comparison {
		Comparison::Lt => date < *bound,
		Comparison::Le => date <= *bound,
		Comparison::Gt => date > *bound,
		Comparison::Ge => date >= *bound,
	}
}

/// Nulls sort first
fn compare_values(a: &Value, b: &Value) -> CmpOrdering {
	match (a, b) {
		(Value::Null, Value::Null) => CmpOrdering::Equal,
		(Value::Null, _) => CmpOrdering::Less,
		(_, Value::Null) => CmpOrdering::Greater,
		(Value::Number(x), Value::Number(y)) => x
			.as_f64()
			.partial_cmp(&y.as_f64())
			.unwrap_or(CmpOrdering::Equal),
		(Value::Bool(x), Value::Bool(y)) => x.cmp(y),
		(Value::String(x), Value::String(y)) => x.cmp(y),
		_ => a.to_string().cmp(&b.to_string()),
	}
}

impl<'a> QueryEvaluator<'a> {
	pub fn new(store: &'a InMemoryStore) -> Self {
		Self { store }
	}

	/// Filter, sort and slice `items` according to `query`
	pub fn execute(
		&self,
		query: &QueryBuilder,
		items: Vec<Box<dyn ApiResource>>,
	) -> Result<QueryResult> {
		let mut matched = Vec::with_capacity(items.len());
		for item in items {
			if self.matches_all(query.conditions(), item.as_ref())? {
				matched.push(item);
			}
		}
		let mut matched = self.sort(matched, query.orderings())?;
		let total_items = matched.len() as u64;

		let offset = query.offset().unwrap_or(0) as usize;
		let items = match query.limit() {
			Some(limit) => matched
				.drain(..)
				.skip(offset)
				.take(limit as usize)
				.collect(),
			None => matched.drain(..).skip(offset).collect(),
		};
		Ok(QueryResult { items, total_items })
	}

	fn matches_all(&self, conditions: &[Condition], item: &dyn ApiResource) -> Result<bool> {
		for condition in conditions {
			if !self.matches(condition, item)? {
				return Ok(false);
			}
		}
		Ok(true)
	}

	/// String forms a leaf is compared by; related resources by their key
	fn candidates(&self, leaf: &PropertyValue) -> Result<Vec<String>> {
		Ok(match leaf {
			PropertyValue::Scalar(Value::Array(values)) => values.iter().filter_map(text).collect(),
			PropertyValue::Scalar(value) => text(value).into_iter().collect(),
			PropertyValue::Resource(related) => {
				self.store.key_of(related.as_ref())?.into_iter().collect()
			}
			PropertyValue::Resources(related) => {
				let mut keys = Vec::with_capacity(related.len());
				for r in related {
					keys.extend(self.store.key_of(r.as_ref())?);
				}
				keys
			}
		})
	}

	fn matches(&self, condition: &Condition, item: &dyn ApiResource) -> Result<bool> {
		let leaves = leaves(item, condition.property());
		match condition {
			Condition::Equals {
				values,
				case_insensitive,
				..
			} => {
				let wanted: Vec<String> = values
					.iter()
					.filter_map(text)
					.map(|v| fold(&v, *case_insensitive))
					.collect();
				for leaf in &leaves {
					if self
						.candidates(leaf)?
						.iter()
						.any(|c| wanted.contains(&fold(c, *case_insensitive)))
					{
						return Ok(true);
					}
				}
				Ok(false)
			}
			Condition::Matches {
				strategy,
				value,
				case_insensitive,
				..
			} => {
				let needle = fold(value, *case_insensitive);
				Ok(leaves
					.iter()
					.filter_map(|leaf| leaf.as_scalar().and_then(Value::as_str))
					.any(|c| matches_strategy(&fold(c, *case_insensitive), *strategy, &needle)))
			}
			Condition::Compare {
				comparison,
				value,
				include_null,
				..
			} => {
				if leaves.iter().all(PropertyValue::is_null) {
					return Ok(*include_null);
				}
				Ok(leaves
					.iter()
					.filter_map(PropertyValue::as_scalar)
					.any(|c| compare(c, *comparison, value)))
			}
			Condition::NotNull { .. } => Ok(leaves.iter().any(|leaf| !leaf.is_null())),
		}
	}

	/// Value an item is ordered by: the first one its path reaches
	fn sort_value(&self, item: &dyn ApiResource, path: &str) -> Result<Value> {
		let Some(leaf) = leaves(item, path).into_iter().next() else {
			return Ok(Value::Null);
		};
		Ok(match leaf {
			PropertyValue::Scalar(value) => value,
			PropertyValue::Resource(related) => self
				.store
				.key_of(related.as_ref())?
				.map(Value::String)
				.unwrap_or(Value::Null),
			PropertyValue::Resources(_) => Value::Null,
		})
	}

	fn sort(
		&self,
		items: Vec<Box<dyn ApiResource>>,
		orderings: &[Ordering],
	) -> Result<Vec<Box<dyn ApiResource>>> {
		if orderings.is_empty() {
			return Ok(items);
		}
		let mut keyed = Vec::with_capacity(items.len());
		for item in items {
			let keys = orderings
				.iter()
				.map(|o| self.sort_value(item.as_ref(), &o.property))
				.collect::<Result<Vec<_>>>()?;
			keyed.push((keys, item));
		}
		keyed.sort_by(|(a, _), (b, _)| {
			orderings
				.iter()
				.zip(a.iter().zip(b.iter()))
				.map(|(ordering, (x, y))| match ordering.direction {
					Direction::Asc => compare_values(x, y),
					Direction::Desc => compare_values(y, x),
				})
				.find(|o| o.is_ne())
				.unwrap_or(CmpOrdering::Equal)
		});
		Ok(keyed.into_iter().map(|(_, item)| item).collect())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::{Book, library};
	use armature_core::ResourceClass;
	use chrono::{TimeZone, Utc};
	use rstest::rstest;
	use serde_json::json;

	fn titles(result: &QueryResult) -> Vec<String> {
		result
			.items
			.iter()
			.map(|i| i.downcast_ref::<Book>().unwrap().title.clone())
			.collect()
	}

	fn run(query: QueryBuilder) -> QueryResult {
		let store = library();
		let items = store.all(Book::RESOURCE_CLASS);
		QueryEvaluator::new(&store).execute(&query, items).unwrap()
	}

	#[rstest]
	fn test_no_conditions_keeps_insertion_order() {
		let result = run(QueryBuilder::new(Book::RESOURCE_CLASS));

		assert_eq!(titles(&result), ["Dune", "Emma", "Foundation", "Persuasion"]);
		assert_eq!(result.total_items, 4);
	}

	#[rstest]
	#[case(MatchStrategy::Partial, "on", false, &["Foundation", "Persuasion"])]
	#[case(MatchStrategy::Start, "d", true, &["Dune"])]
	#[case(MatchStrategy::Start, "d", false, &[])]
	#[case(MatchStrategy::End, "ma", false, &["Emma"])]
	#[case(MatchStrategy::Exact, "Emma", false, &["Emma"])]
	fn test_string_matching(
		#[case] strategy: MatchStrategy,
		#[case] value: &str,
		#[case] case_insensitive: bool,
		#[case] expected: &[&str],
	) {
		let query = QueryBuilder::new(Book::RESOURCE_CLASS).and_where(Condition::Matches {
			property: "title".to_string(),
			strategy,
			value: value.to_string(),
			case_insensitive,
		});

		let result = run(query);

		assert_eq!(titles(&result), expected);
	}

	#[rstest]
	fn test_association_equals_compares_identifiers() {
		// Arrange
		let query = QueryBuilder::new(Book::RESOURCE_CLASS).and_where(Condition::Equals {
			property: "author".to_string(),
			values: vec![json!("2")],
			case_insensitive: false,
			association: true,
		});

		// Act
		let result = run(query);

		// Assert
		assert_eq!(titles(&result), ["Emma", "Persuasion"]);
	}

	#[rstest]
	fn test_nested_property_path() {
		let query = QueryBuilder::new(Book::RESOURCE_CLASS)
			.join("author")
			.and_where(Condition::Equals {
				property: "author.name".to_string(),
				values: vec![json!("frank herbert")],
				case_insensitive: true,
				association: false,
			});

		let result = run(query);

		assert_eq!(titles(&result), ["Dune"]);
	}

	#[rstest]
	#[case(Comparison::Ge, false, &["Dune", "Foundation"])]
	#[case(Comparison::Ge, true, &["Dune", "Foundation", "Persuasion"])]
	#[case(Comparison::Lt, false, &["Emma"])]
	fn test_date_comparison(
		#[case] comparison: Comparison,
		#[case] include_null: bool,
		#[case] expected: &[&str],
	) {
		let query = QueryBuilder::new(Book::RESOURCE_CLASS).and_where(Condition::Compare {
			property: "published_at".to_string(),
			comparison,
			value: Utc.with_ymd_and_hms(1950, 1, 1, 0, 0, 0).unwrap(),
			include_null,
		});

		let result = run(query);

		assert_eq!(titles(&result), expected);
	}

	#[rstest]
	fn test_ordering_and_slicing() {
		// Arrange
		let query = QueryBuilder::new(Book::RESOURCE_CLASS)
			.order_by("title", Direction::Desc)
			.paginate(1, 2);

		// Act
		let result = run(query);

		// Assert
		assert_eq!(titles(&result), ["Foundation", "Emma"]);
		assert_eq!(result.total_items, 4);
	}

	#[rstest]
	fn test_nulls_sort_first() {
		let query =
			QueryBuilder::new(Book::RESOURCE_CLASS).order_by("published_at", Direction::Asc);

		let result = run(query);

		assert_eq!(titles(&result)[0], "Persuasion");
	}
}
