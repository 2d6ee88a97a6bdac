//! URI templates and URI variables

use super::ResourceMetadataCollectionFactory;
use crate::class::MetadataOptions;
use crate::inflector::path_segment;
use crate::operation::{Link, Operation};
use crate::property_factory::ClassMetadataFactory;
use crate::resource::{ApiResourceMetadata, ResourceMetadataCollection};
use armature_core::Result;
use std::sync::Arc;

/// Default name of the item URI variable
pub const DEFAULT_IDENTIFIER_VARIABLE: &str = "id";

/// Variable names of a URI template, in order
///
/// Format placeholders such as `{._format}` are skipped.
///
/// # Examples
///
/// ```
/// use armature_metadata::resource_factory::template_variables;
///
/// assert_eq!(template_variables("/authors/{authorId}/books/{id}"), vec!["authorId", "id"]);
/// assert!(template_variables("/books{._format}").is_empty());
/// ```
pub fn template_variables(template: &str) -> Vec<String> {
	let mut variables = Vec::new();
	let mut rest = template;
	while let Some(start) = rest.find('{') {
		let after = &rest[start + 1..];
		let Some(end) = after.find('}') else {
			break;
		};
		let name = &after[..end];
		if !name.is_empty() && !name.starts_with('.') {
			variables.push(name.to_string());
		}
		rest = &after[end + 1..];
	}
	variables
}

/// Gives every operation a URI template and binds its variables
///
/// Collection operations live at `/{plural_snake_short_name}` (or the
/// resource's `uri_template` prefix); item operations append `/{id}`.
/// A variable naming an identifier property binds to that property; any
/// other variable binds to all identifiers of the class, composite when
/// there are several.
pub struct UriTemplateResourceMetadataCollectionFactory {
	inner: Arc<dyn ResourceMetadataCollectionFactory>,
	class_metadata: Arc<dyn ClassMetadataFactory>,
}

impl UriTemplateResourceMetadataCollectionFactory {
	pub fn new(
		inner: Arc<dyn ResourceMetadataCollectionFactory>,
		class_metadata: Arc<dyn ClassMetadataFactory>,
	) -> Self {
		Self {
			inner,
			class_metadata,
		}
	}

	fn base_path(resource: &ApiResourceMetadata) -> String {
		match &resource.uri_template {
			Some(template) => template.trim_end_matches('/').to_string(),
			None => format!("/{}", path_segment(&resource.short_name)),
		}
	}

	fn complete(
		resource: &ApiResourceMetadata,
		identifiers: &[String],
		mut operation: Operation,
	) -> Operation {
		if operation.uri_template.is_none() {
			let base = Self::base_path(resource);
			operation.uri_template = Some(if operation.collection {
				base
			} else {
				format!("{}/{{{}}}", base, DEFAULT_IDENTIFIER_VARIABLE)
			});
		}

		let template = operation.uri_template.clone().unwrap_or_default();
		for variable in template_variables(&template) {
			if operation.uri_variables.contains_key(&variable) {
				continue;
			}
			let bound = if identifiers.contains(&variable) {
				vec![variable.clone()]
			} else {
				identifiers.to_vec()
			};
			operation.uri_variables.insert(
				variable.clone(),
				Link::new(&variable, &resource.class).with_identifiers(bound),
			);
		}
		operation
	}
}

impl ResourceMetadataCollectionFactory for UriTemplateResourceMetadataCollectionFactory {
	fn create(&self, resource_class: &str) -> Result<Arc<ResourceMetadataCollection>> {
		let collection = Arc::unwrap_or_clone(self.inner.create(resource_class)?);
		if collection.is_empty() {
			return Ok(Arc::new(collection));
		}

		let identifiers = self
			.class_metadata
			.create(resource_class, &MetadataOptions::default())?
			.identifiers();
		if identifiers.is_empty() {
			tracing::warn!(
				resource_class = %resource_class,
				"resource declares no identifier; item operations cannot be addressed"
			);
		}

		let collection = collection.map_resources(|mut resource| {
			let operations = resource.operations.take().unwrap_or_default();
			let operations = operations
				.into_iter()
				.map(|operation| Self::complete(&resource, &identifiers, operation))
				.collect();
			resource.operations = Some(operations);
			Ok(resource)
		})?;

		Ok(Arc::new(collection))
	}
}
