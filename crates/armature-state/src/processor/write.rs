//! Persistence dispatch

use super::{PersisterLocator, Processor};
use crate::context::{OperationContext, UriVariables};
use crate::data::StateData;
use armature_core::Result;
use armature_metadata::{HttpMethod, Operation};
use async_trait::async_trait;
use std::sync::Arc;

/// Dispatches to a persister by HTTP method
///
/// POST, PUT and PATCH persist the item and answer with what the persister
/// returned. DELETE removes it and answers with nothing.
pub struct WriteProcessor {
	persisters: Arc<PersisterLocator>,
}

impl WriteProcessor {
	pub fn new(persisters: Arc<PersisterLocator>) -> Self {
		Self { persisters }
	}
}

#[async_trait]
impl Processor for WriteProcessor {
	async fn process(
		&self,
		data: StateData,
		operation: &Operation,
		uri_variables: &UriVariables,
		context: &mut OperationContext,
	) -> Result<StateData> {
		if !operation.write || operation.method.is_safe() {
			return Ok(data);
		}
		let persister = self
			.persisters
			.resolve(operation.processor.as_deref(), &operation.class)?;

		match (operation.method, data) {
			(HttpMethod::Delete, data) => {
				if let Some(item) = data.as_item() {
					persister
						.remove(item, operation, uri_variables, context)
						.await?;
					tracing::debug!(resource_class = %operation.class, "Item removed");
				}
				Ok(StateData::Empty)
			}
			(_, StateData::Item(item)) => {
				let persisted = persister
					.persist(item, operation, uri_variables, context)
					.await?;
				tracing::debug!(resource_class = %operation.class, "Item persisted");
				Ok(StateData::Item(persisted))
			}
			(_, other) => Ok(other),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::locator::ServiceLocator;
	use crate::processor::Persister;
	use armature_core::{ApiResource, PropertyValue};
	use armature_macros::ApiResource;
	use parking_lot::Mutex;
	use rstest::rstest;
	use serde_json::json;

	#[derive(Debug, Clone, Default, ApiResource)]
	struct Task {
		#[api(identifier)]
		pub id: i64,
		pub title: String,
	}

	#[derive(Default)]
	struct Recording {
		log: Mutex<Vec<&'static str>>,
	}

	#[async_trait]
	impl Persister for Recording {
		async fn persist(
			&self,
			mut data: Box<dyn ApiResource>,
			_operation: &Operation,
			_uri_variables: &UriVariables,
			_context: &OperationContext,
		) -> Result<Box<dyn ApiResource>> {
			self.log.lock().push("persist");
			data.set_property("id", PropertyValue::Scalar(json!(42)))
				.map_err(|e| armature_core::Error::Runtime(e.to_string()))?;
			Ok(data)
		}

		async fn remove(
			&self,
			_data: &dyn ApiResource,
			_operation: &Operation,
			_uri_variables: &UriVariables,
			_context: &OperationContext,
		) -> Result<()> {
			self.log.lock().push("remove");
			Ok(())
		}
	}

	fn processor(persister: Arc<Recording>) -> WriteProcessor {
		WriteProcessor::new(Arc::new(
			ServiceLocator::new("persister").with_fallback(persister as Arc<dyn Persister>),
		))
	}

	fn task() -> StateData {
		StateData::Item(Box::new(Task {
			id: 0,
			title: "Write tests".to_string(),
		}))
	}

	#[rstest]
	#[tokio::test]
	async fn test_post_swaps_result() {
		// Arrange
		let persister = Arc::new(Recording::default());

		// Act
		let data = processor(persister.clone())
			.process(
				task(),
				&Operation::new(HttpMethod::Post, true),
				&UriVariables::new(),
				&mut OperationContext::new(),
			)
			.await
			.unwrap();

		// Assert
		let task = data.as_item().and_then(|i| i.downcast_ref::<Task>()).unwrap();
		assert_eq!(task.id, 42);
		assert_eq!(*persister.log.lock(), vec!["persist"]);
	}

	#[rstest]
	#[tokio::test]
	async fn test_delete_nulls_result() {
		let persister = Arc::new(Recording::default());

		let data = processor(persister.clone())
			.process(
				task(),
				&Operation::new(HttpMethod::Delete, false),
				&UriVariables::new(),
				&mut OperationContext::new(),
			)
			.await
			.unwrap();

		assert!(data.is_empty());
		assert_eq!(*persister.log.lock(), vec!["remove"]);
	}

	#[rstest]
	#[case(HttpMethod::Get, true)]
	#[case(HttpMethod::Put, false)]
	#[tokio::test]
	async fn test_skipped_operations(#[case] method: HttpMethod, #[case] write: bool) {
		// Arrange
		let persister = Arc::new(Recording::default());
		let mut operation = Operation::new(method, false);
		operation.write = write;

		// Act
		let data = processor(persister.clone())
			.process(task(), &operation, &UriVariables::new(), &mut OperationContext::new())
			.await
			.unwrap();

		// Assert
		assert!(data.as_item().is_some());
		assert!(persister.log.lock().is_empty());
	}
}
