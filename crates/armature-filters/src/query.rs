//! Backend-agnostic query fragment
//!
//! Filters refine a [`QueryBuilder`] with conditions and orderings over
//! property paths. Backends translate the fragment: the in-memory store
//! evaluates it directly, [`crate::sql`] renders it to SQL.

use armature_core::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// String matching strategy of a search condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
	Exact,
	/// Substring
	Partial,
	Start,
	End,
	/// Start of any whitespace-separated word
	WordStart,
}

impl MatchStrategy {
	pub fn as_str(&self) -> &'static str {
		match self {
			MatchStrategy::Exact => "exact",
			MatchStrategy::Partial => "partial",
			MatchStrategy::Start => "start",
			MatchStrategy::End => "end",
			MatchStrategy::WordStart => "word_start",
		}
	}
}

impl FromStr for MatchStrategy {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		match s {
			"exact" => Ok(MatchStrategy::Exact),
			"partial" => Ok(MatchStrategy::Partial),
			"start" => Ok(MatchStrategy::Start),
			"end" => Ok(MatchStrategy::End),
			"word_start" => Ok(MatchStrategy::WordStart),
			other => Err(Error::InvalidArgument(format!(
				"strategy \"{}\" does not exist",
				other
			))),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
	Lt,
	Le,
	Gt,
	Ge,
}

impl Comparison {
	/// Whether the bound limits values from above
	pub fn is_upper_bound(&self) -> bool {
		matches!(self, Comparison::Lt | Comparison::Le)
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
	#[default]
	Asc,
	Desc,
}

impl FromStr for Direction {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		match s.to_ascii_lowercase().as_str() {
			"asc" => Ok(Direction::Asc),
			"desc" => Ok(Direction::Desc),
			other => Err(Error::InvalidArgument(format!(
				"order direction \"{}\" must be \"asc\" or \"desc\"",
				other
			))),
		}
	}
}

impl fmt::Display for Direction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Direction::Asc => "asc",
			Direction::Desc => "desc",
		})
	}
}

/// One restriction on the queried items; properties are dotted paths
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
	/// The property equals one of `values`; for an association the values
	/// are identifiers of the related item
	Equals {
		property: String,
		values: Vec<Value>,
		case_insensitive: bool,
		association: bool,
	},
	Matches {
		property: String,
		strategy: MatchStrategy,
		value: String,
		case_insensitive: bool,
	},
	Compare {
		property: String,
		comparison: Comparison,
		value: DateTime<Utc>,
		/// Null values satisfy the bound
		include_null: bool,
	},
	NotNull {
		property: String,
	},
}

impl Condition {
	pub fn property(&self) -> &str {
		match self {
			Condition::Equals { property, .. }
			| Condition::Matches { property, .. }
			| Condition::Compare { property, .. }
			| Condition::NotNull { property } => property,
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ordering {
	pub property: String,
	pub direction: Direction,
}

/// Query over the items of one resource class
#[derive(Debug, Clone, PartialEq)]
pub struct QueryBuilder {
	resource_class: String,
	conditions: Vec<Condition>,
	joins: Vec<String>,
	orderings: Vec<Ordering>,
	offset: Option<u64>,
	limit: Option<u64>,
}

impl QueryBuilder {
	pub fn new(resource_class: impl Into<String>) -> Self {
		Self {
			resource_class: resource_class.into(),
			conditions: Vec::new(),
			joins: Vec::new(),
			orderings: Vec::new(),
			offset: None,
			limit: None,
		}
	}

	pub fn resource_class(&self) -> &str {
		&self.resource_class
	}

	pub fn and_where(mut self, condition: Condition) -> Self {
		self.conditions.push(condition);
		self
	}

	/// Require the association path (`author`, `author.publisher`) to be joined
	pub fn join(mut self, association: impl Into<String>) -> Self {
		let association = association.into();
		if !self.joins.contains(&association) {
			self.joins.push(association);
		}
		self
	}

	pub fn order_by(mut self, property: impl Into<String>, direction: Direction) -> Self {
		self.orderings.push(Ordering {
			property: property.into(),
			direction,
		});
		self
	}

	pub fn paginate(mut self, offset: u64, limit: u64) -> Self {
		self.offset = Some(offset);
		self.limit = Some(limit);
		self
	}

	pub fn conditions(&self) -> &[Condition] {
		&self.conditions
	}

	pub fn joins(&self) -> &[String] {
		&self.joins
	}

	pub fn orderings(&self) -> &[Ordering] {
		&self.orderings
	}

	pub fn offset(&self) -> Option<u64> {
		self.offset
	}

	pub fn limit(&self) -> Option<u64> {
		self.limit
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_joins_are_deduplicated() {
		let query = QueryBuilder::new("app::Book")
			.join("author")
			.join("author")
			.join("author.publisher");

		assert_eq!(query.joins(), ["author", "author.publisher"]);
	}

	#[rstest]
	#[case("DESC", Some(Direction::Desc))]
	#[case("asc", Some(Direction::Asc))]
	#[case("sideways", None)]
	fn test_direction_parsing(#[case] raw: &str, #[case] expected: Option<Direction>) {
		assert_eq!(raw.parse::<Direction>().ok(), expected);
	}
}
