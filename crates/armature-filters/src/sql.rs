//! SQL rendering of filtered queries
//!
//! The root table is aliased `o`; every joined association is aliased by its
//! path with dots replaced by underscores and joined on `{parent}.{name}_id`.

use crate::query::{Comparison, Condition, Direction, MatchStrategy, QueryBuilder};
use armature_metadata::inflector::pluralize;
use sea_query::{
	Alias, Asterisk, Condition as SqlCondition, Expr, ExprTrait, Func, JoinType, MysqlQueryBuilder,
	Order, PostgresQueryBuilder, Query, SelectStatement,
};
use serde_json::Value;
use std::collections::HashMap;

/// Alias of the queried table
pub const ROOT_ALIAS: &str = "o";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SqlDialect {
	#[default]
	Postgres,
	MySql,
}

/// Renders a [`QueryBuilder`] as a `SELECT` over one table
///
/// # Examples
///
/// ```
/// use armature_filters::query::{Direction, QueryBuilder};
/// use armature_filters::sql::{SqlDialect, SqlRenderer};
///
/// let query = QueryBuilder::new("app::Book").order_by("title", Direction::Desc);
/// let sql = SqlRenderer::new(SqlDialect::Postgres).render(&query, "books");
///
/// assert_eq!(sql, r#"SELECT "o".* FROM "books" AS "o" ORDER BY "o"."title" DESC"#);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SqlRenderer {
	dialect: SqlDialect,
	tables: HashMap<String, String>,
}

impl SqlRenderer {
	pub fn new(dialect: SqlDialect) -> Self {
		Self {
			dialect,
			tables: HashMap::new(),
		}
	}

	/// Table joined for an association path; defaults to the plural of its
	/// last segment
	pub fn with_table(mut self, association: impl Into<String>, table: impl Into<String>) -> Self {
		self.tables.insert(association.into(), table.into());
		self
	}

	pub fn statement(&self, query: &QueryBuilder, table: &str) -> SelectStatement {
		let mut select = Query::select()
			.column((Alias::new(ROOT_ALIAS), Asterisk))
			.from_as(Alias::new(table), Alias::new(ROOT_ALIAS))
			.to_owned();

		for association in query.joins() {
			let (parent, name) = split_path(association);
			let table = self
				.tables
				.get(association)
				.cloned()
				.unwrap_or_else(|| pluralize(name));
			select.join_as(
				JoinType::LeftJoin,
				Alias::new(table),
				Alias::new(alias(association)),
				Expr::col((Alias::new(parent), Alias::new(format!("{}_id", name))))
					.equals((Alias::new(alias(association)), Alias::new("id"))),
			);
		}

		let mut condition = SqlCondition::all();
		for clause in query.conditions() {
			condition = condition.add(render_condition(clause));
		}
		if !query.conditions().is_empty() {
			select.cond_where(condition);
		}

		for ordering in query.orderings() {
			let order = match ordering.direction {
				Direction::Asc => Order::Asc,
				Direction::Desc => Order::Desc,
			};
			select.order_by(column_ref(&ordering.property), order);
		}
		if let Some(limit) = query.limit() {
			select.limit(limit);
		}
		if let Some(offset) = query.offset() {
			select.offset(offset);
		}
		select
	}

	pub fn render(&self, query: &QueryBuilder, table: &str) -> String {
		let statement = self.statement(query, table);
		match self.dialect {
			SqlDialect::Postgres => statement.to_string(PostgresQueryBuilder),
			SqlDialect::MySql => statement.to_string(MysqlQueryBuilder),
		}
	}
}

fn alias(association: &str) -> String {
	association.replace('.', "_")
}

/// Owning alias and leaf name of a dotted path
fn split_path(path: &str) -> (String, &str) {
	match path.rsplit_once('.') {
		Some((parent, leaf)) => (alias(parent), leaf),
		None => (ROOT_ALIAS.to_string(), path),
	}
}

fn column_ref(path: &str) -> (Alias, Alias) {
	let (owner, leaf) = split_path(path);
	(Alias::new(owner), Alias::new(leaf))
}

fn sql_value(value: &Value) -> sea_query::Value {
	match value {
		Value::String(s) => s.clone().into(),
		Value::Bool(b) => (*b).into(),
		Value::Number(n) => match (n.as_i64(), n.as_f64()) {
			(Some(i), _) => i.into(),
			(None, Some(f)) => f.into(),
			(None, None) => n.to_string().into(),
		},
		other => other.to_string().into(),
	}
}

/// Escape LIKE wildcards in user input
fn escape_like(value: &str) -> String {
	value
		.replace('\\', "\\\\")
		.replace('%', "\\%")
		.replace('_', "\\_")
}

fn render_condition(condition: &Condition) -> SqlCondition {
	match condition {
		Condition::Equals {
			property,
			values,
			case_insensitive,
			association,
		} => {
			let (owner, leaf) = split_path(property);
			let column = if *association {
				Expr::col((Alias::new(owner), Alias::new(format!("{}_id", leaf))))
			} else {
				Expr::col((Alias::new(owner), Alias::new(leaf)))
			};
			let expr = if *case_insensitive {
				let lowered = values.iter().map(|v| match v {
					Value::String(s) => sql_value(&Value::String(s.to_lowercase())),
					other => sql_value(other),
				});
				Func::lower(column).is_in(lowered)
			} else if let [single] = values.as_slice() {
				column.eq(sql_value(single))
			} else {
				column.is_in(values.iter().map(sql_value))
			};
			SqlCondition::all().add(expr)
		}
		Condition::Matches {
			property,
			strategy,
			value,
			case_insensitive,
		} => {
			let value = if *case_insensitive {
				escape_like(&value.to_lowercase())
			} else {
				escape_like(value)
			};
			let patterns = match strategy {
				MatchStrategy::Exact => vec![value],
				MatchStrategy::Partial => vec![format!("%{}%", value)],
				MatchStrategy::Start => vec![format!("{}%", value)],
				MatchStrategy::End => vec![format!("%{}", value)],
				MatchStrategy::WordStart => vec![format!("{}%", value), format!("% {}%", value)],
			};
			patterns
				.into_iter()
				.fold(SqlCondition::any(), |any, pattern| {
					let column = Expr::col(column_ref(property));
					if *case_insensitive {
						any.add(Func::lower(column).like(pattern))
					} else {
						any.add(column.like(pattern))
					}
				})
		}
		Condition::Compare {
			property,
			comparison,
			value,
			include_null,
		} => {
			let column = Expr::col(column_ref(property));
			let bound = match comparison {
				Comparison::Lt => column.clone().lt(*value),
				Comparison::Le => column.clone().lte(*value),
				Comparison::Gt => column.clone().gt(*value),
				Comparison::Ge => column.clone().gte(*value),
			};
			if *include_null {
				SqlCondition::any().add(bound).add(column.is_null())
			} else {
				SqlCondition::all().add(bound)
			}
		}
		Condition::NotNull { property } => {
			SqlCondition::all().add(Expr::col(column_ref(property)).is_not_null())
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::{TimeZone, Utc};
	use rstest::rstest;
	use serde_json::json;

	fn books() -> QueryBuilder {
		QueryBuilder::new("app::Book")
	}

	#[rstest]
	fn test_equality_and_pagination() {
		// Arrange
		let query = books()
			.and_where(Condition::Equals {
				property: "title".to_string(),
				values: vec![json!("Dune")],
				case_insensitive: false,
				association: false,
			})
			.paginate(30, 30);

		// Act
		let sql = SqlRenderer::new(SqlDialect::Postgres).render(&query, "books");

		// Assert
		assert!(sql.starts_with(r#"SELECT "o".* FROM "books" AS "o" WHERE"#));
		assert!(sql.contains(r#""o"."title" = 'Dune'"#));
		assert!(sql.ends_with("LIMIT 30 OFFSET 30"));
	}

	#[rstest]
	fn test_association_join() {
		// Arrange
		let query = books()
			.join("author")
			.and_where(Condition::Matches {
				property: "author.name".to_string(),
				strategy: MatchStrategy::Start,
				value: "Ur".to_string(),
				case_insensitive: true,
			});

		// Act
		let sql = SqlRenderer::new(SqlDialect::Postgres).render(&query, "books");

		// Assert
		assert!(sql.contains(r#"LEFT JOIN "authors" AS "author" ON "o"."author_id" = "author"."id""#));
		assert!(sql.contains(r#"LOWER("author"."name") LIKE 'ur%'"#));
	}

	#[rstest]
	fn test_association_equality_uses_foreign_key() {
		let query = books().and_where(Condition::Equals {
			property: "author".to_string(),
			values: vec![json!("7"), json!("8")],
			case_insensitive: false,
			association: true,
		});

		let sql = SqlRenderer::new(SqlDialect::MySql).render(&query, "books");

		assert!(sql.contains("`o`.`author_id` IN ('7', '8')"));
	}

	#[rstest]
	#[case("100%", "100\\%")]
	#[case("snake_case", "snake\\_case")]
	#[case("plain", "plain")]
	fn test_escape_like(#[case] raw: &str, #[case] expected: &str) {
		assert_eq!(escape_like(raw), expected);
	}

	#[rstest]
	fn test_nullable_bound() {
		let query = books().and_where(Condition::Compare {
			property: "published_at".to_string(),
			comparison: Comparison::Lt,
			value: Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap(),
			include_null: true,
		});

		let sql = SqlRenderer::new(SqlDialect::Postgres).render(&query, "books");

		assert!(sql.contains(r#""o"."published_at" < '2021-01-01"#));
		assert!(sql.contains(r#"OR "o"."published_at" IS NULL"#));
	}

	#[rstest]
	fn test_nested_join_table_override() {
		let query = books().join("author").join("author.publisher");

		let sql = SqlRenderer::new(SqlDialect::Postgres)
			.with_table("author.publisher", "publishing_houses")
			.render(&query, "books");

		assert!(sql.contains(
			r#"LEFT JOIN "publishing_houses" AS "author_publisher" ON "author"."publisher_id" = "author_publisher"."id""#
		));
	}
}
