//! State processors
//!
//! Processors run after the provider pipeline and the controller, on the
//! data the request produced.

pub mod write;

pub use write::WriteProcessor;

use crate::context::{OperationContext, UriVariables};
use crate::data::StateData;
use crate::locator::ServiceLocator;
use armature_core::{ApiResource, Result};
use armature_metadata::Operation;
use async_trait::async_trait;
use std::sync::Arc;

/// Handles the data of a mutating operation
#[async_trait]
pub trait Processor: Send + Sync {
	async fn process(
		&self,
		data: StateData,
		operation: &Operation,
		uri_variables: &UriVariables,
		context: &mut OperationContext,
	) -> Result<StateData>;
}

#[async_trait]
impl<T: Processor + ?Sized> Processor for Arc<T> {
	async fn process(
		&self,
		data: StateData,
		operation: &Operation,
		uri_variables: &UriVariables,
		context: &mut OperationContext,
	) -> Result<StateData> {
		(**self).process(data, operation, uri_variables, context).await
	}
}

/// Storage backend for one or more resource classes
#[async_trait]
pub trait Persister: Send + Sync {
	/// Store `data`; the returned item replaces it in the response
	async fn persist(
		&self,
		data: Box<dyn ApiResource>,
		operation: &Operation,
		uri_variables: &UriVariables,
		context: &OperationContext,
	) -> Result<Box<dyn ApiResource>>;

	async fn remove(
		&self,
		data: &dyn ApiResource,
		operation: &Operation,
		uri_variables: &UriVariables,
		context: &OperationContext,
	) -> Result<()>;
}

/// Persisters addressed by `Operation::processor` or resource class
pub type PersisterLocator = ServiceLocator<dyn Persister>;
