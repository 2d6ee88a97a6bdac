//! # armature-memory
//!
//! A storage backend that keeps resources in process memory.
//!
//! [`InMemoryProvider`] and [`InMemoryPersister`] share one
//! [`InMemoryStore`]. Collections honour the filters and pagination of the
//! operation: the [`armature_filters::QueryBuilder`] the filters produce is
//! evaluated directly against the stored items by [`QueryEvaluator`].
//!
//! Data lives as long as the store; nothing is written to disk.

pub mod evaluator;
pub mod persister;
pub mod provider;
pub mod store;

#[cfg(test)]
mod test_support;

pub use evaluator::{QueryEvaluator, QueryResult};
pub use persister::InMemoryPersister;
pub use provider::InMemoryProvider;
pub use store::InMemoryStore;
