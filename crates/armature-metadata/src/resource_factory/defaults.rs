//! Default operations, names and inherited resource settings

use super::ResourceMetadataCollectionFactory;
use crate::operation::{HttpMethod, Operation};
use crate::resource::{ApiResourceMetadata, ResourceMetadataCollection};
use armature_core::{Error, OperationDeclaration, Result};
use std::collections::HashSet;
use std::sync::Arc;

fn default_operations() -> Result<Vec<Operation>> {
	[
		OperationDeclaration::get(),
		OperationDeclaration::get_collection(),
		OperationDeclaration::post(),
		OperationDeclaration::put(),
		OperationDeclaration::patch(),
		OperationDeclaration::delete(),
	]
	.iter()
	.map(Operation::from_declaration)
	.collect()
}

/// Completes every resource with its operations
///
/// Resources without declared operations get the CRUD set. Each operation
/// inherits resource-level settings it does not override and receives a
/// unique name of the form `_api_{ShortName}_{method}[_collection]`.
pub struct OperationDefaultsResourceMetadataCollectionFactory {
	inner: Arc<dyn ResourceMetadataCollectionFactory>,
}

impl OperationDefaultsResourceMetadataCollectionFactory {
	pub fn new(inner: Arc<dyn ResourceMetadataCollectionFactory>) -> Self {
		Self { inner }
	}

	/// Route name of an operation
	///
	/// # Examples
	///
	/// ```
	/// use armature_metadata::{HttpMethod, Operation};
	/// use armature_metadata::resource_factory::OperationDefaultsResourceMetadataCollectionFactory as Defaults;
	///
	/// let op = Operation::new(HttpMethod::Get, true);
	/// assert_eq!(Defaults::operation_name("Book", &op), "_api_Book_get_collection");
	/// ```
	pub fn operation_name(short_name: &str, operation: &Operation) -> String {
		let suffix = if operation.collection && operation.method == HttpMethod::Get {
			"_collection"
		} else {
			""
		};
		format!(
			"_api_{}_{}{}",
			short_name,
			operation.method.as_str().to_lowercase(),
			suffix
		)
	}

	fn complete(resource: &ApiResourceMetadata, mut operation: Operation) -> Operation {
		operation.class = resource.class.clone();
		operation.short_name = resource.short_name.clone();
		if operation.name.is_empty() {
			operation.name = Self::operation_name(&resource.short_name, &operation);
		}

		macro_rules! inherit {
			($($field:ident),*) => {
				$(if operation.$field.is_none() {
					operation.$field = resource.$field.clone();
				})*
			};
		}
		inherit!(
			description,
			security,
			security_message,
			security_post_denormalize,
			normalization_groups,
			denormalization_groups,
			validation_groups,
			paginated,
			items_per_page,
			provider,
			processor
		);
		if operation.filters.is_empty() {
			operation.filters = resource.filters.clone();
		}
		operation
	}
}

impl ResourceMetadataCollectionFactory for OperationDefaultsResourceMetadataCollectionFactory {
	fn create(&self, resource_class: &str) -> Result<Arc<ResourceMetadataCollection>> {
		let collection = Arc::unwrap_or_clone(self.inner.create(resource_class)?);
		let mut seen = HashSet::new();

		let collection = collection.map_resources(|mut resource| {
			let operations = match resource.operations.take() {
				Some(operations) => operations,
				None => default_operations()?,
			};
			let mut completed = Vec::with_capacity(operations.len());
			for operation in operations {
				let operation = Self::complete(&resource, operation);
				if !seen.insert(operation.name.clone()) {
					return Err(Error::Configuration(format!(
						"Duplicate operation name \"{}\" on resource \"{}\"; give one of them an explicit name",
						operation.name, resource_class
					)));
				}
				completed.push(operation);
			}
			resource.operations = Some(completed);
			Ok(resource)
		})?;

		Ok(Arc::new(collection))
	}
}
