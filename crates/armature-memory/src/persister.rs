//! Persister writing to an [`InMemoryStore`]

use crate::store::InMemoryStore;
use armature_core::{ApiResource, Result};
use armature_metadata::Operation;
use armature_state::{OperationContext, Persister, UriVariables};
use async_trait::async_trait;
use std::sync::Arc;

pub struct InMemoryPersister {
	store: Arc<InMemoryStore>,
}

impl InMemoryPersister {
	pub fn new(store: Arc<InMemoryStore>) -> Self {
		Self { store }
	}
}

#[async_trait]
impl Persister for InMemoryPersister {
	async fn persist(
		&self,
		data: Box<dyn ApiResource>,
		operation: &Operation,
		_uri_variables: &UriVariables,
		_context: &OperationContext,
	) -> Result<Box<dyn ApiResource>> {
		tracing::debug!(
			resource_class = %operation.class,
			operation = %operation.name,
			"Persisting item in memory"
		);
		self.store.save(data)
	}

	async fn remove(
		&self,
		data: &dyn ApiResource,
		operation: &Operation,
		_uri_variables: &UriVariables,
		_context: &OperationContext,
	) -> Result<()> {
		if !self.store.remove(data)? {
			tracing::debug!(
				resource_class = %operation.class,
				operation = %operation.name,
				"Item to remove was not stored"
			);
		}
		Ok(())
	}
}
