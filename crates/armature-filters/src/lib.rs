//! # armature-filters
//!
//! Collection filtering driven by query parameters.
//!
//! Filters never touch storage. Each one reads the request's query
//! parameters and refines a [`QueryBuilder`]; a state provider then hands
//! the builder to its backend.
//!
//! - [`search`]: equality and string matching, IRIs for associations
//! - [`date`]: date ranges with configurable null handling
//! - [`order`]: `order[property]=asc|desc`
//! - [`sql`]: rendering a builder as a SQL `SELECT`
//!
//! Parameters that do not apply (unknown properties, malformed values,
//! unsupported combinations) leave the query unchanged and are logged at
//! `info` level.

pub mod date;
pub mod filter;
pub mod order;
pub mod property;
pub mod query;
pub mod search;
pub mod sql;

#[cfg(test)]
mod test_support;

pub use date::{DateFilter, NullManagement};
pub use filter::{Filter, FilterDescription, FilterLocator, apply_filters};
pub use order::OrderFilter;
pub use property::{MAX_NESTING_DEPTH, PropertyResolver, ResolvedProperty};
pub use query::{Comparison, Condition, Direction, MatchStrategy, Ordering, QueryBuilder};
pub use search::SearchFilter;
pub use sql::{SqlDialect, SqlRenderer};
