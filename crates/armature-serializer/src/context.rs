//! Options carried through one normalization

use armature_iri::UrlReferenceType;
use armature_metadata::Operation;
use armature_state::{OperationContext, QueryParams, UserToken};

/// Normalization options, cloned and adjusted while descending into
/// related resources
#[derive(Debug, Clone, Default)]
pub struct NormalizationContext {
	pub resource_class: String,
	/// Operation being answered; selects the route of root IRIs
	pub operation: Option<Operation>,
	/// Normalization groups; `None` reads every readable property
	pub groups: Option<Vec<String>>,
	pub reference_type: UrlReferenceType,
	/// Evaluated against property `security` expressions
	pub user: Option<UserToken>,
	/// Path of the request, without the query string
	pub request_path: Option<String>,
	/// Query of the request, kept on pagination links
	pub filters: QueryParams,
	depth: usize,
	nested: bool,
}

impl NormalizationContext {
	pub fn new(resource_class: impl Into<String>) -> Self {
		Self {
			resource_class: resource_class.into(),
			..Default::default()
		}
	}

	/// Options for answering `operation` within a pipeline run
	pub fn for_operation(operation: &Operation, context: &OperationContext) -> Self {
		let operation = context.resolved_operation(operation).clone();
		Self {
			resource_class: operation.output.clone().unwrap_or_else(|| operation.class.clone()),
			groups: operation.normalization_groups.clone(),
			user: context.user.clone(),
			request_path: context.request.as_ref().map(|r| r.path.clone()),
			filters: context.filters.clone(),
			operation: Some(operation),
			..Default::default()
		}
	}

	pub fn with_operation(mut self, operation: Operation) -> Self {
		self.operation = Some(operation);
		self
	}

	pub fn with_groups(mut self, groups: Option<Vec<String>>) -> Self {
		self.groups = groups;
		self
	}

	pub fn with_reference_type(mut self, reference_type: UrlReferenceType) -> Self {
		self.reference_type = reference_type;
		self
	}

	pub fn with_user(mut self, user: Option<UserToken>) -> Self {
		self.user = user;
		self
	}

	pub fn with_request_path(mut self, path: impl Into<String>) -> Self {
		self.request_path = Some(path.into());
		self
	}

	pub fn with_filters(mut self, filters: QueryParams) -> Self {
		self.filters = filters;
		self
	}

	/// Levels of embedding above the current item
	pub fn depth(&self) -> usize {
		self.depth
	}

	/// Whether the item being normalized is the document root
	pub fn is_root(&self) -> bool {
		!self.nested
	}

	/// Context for a member of the collection being normalized
	pub fn member(&self) -> Self {
		Self {
			nested: true,
			..self.clone()
		}
	}

	/// Context for a related resource embedded in the current item
	pub fn embedded(&self, resource_class: &str) -> Self {
		Self {
			resource_class: resource_class.to_string(),
			operation: None,
			depth: self.depth + 1,
			nested: true,
			..self.clone()
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use armature_metadata::HttpMethod;
	use armature_state::ApiRequest;
	use rstest::rstest;

	#[rstest]
	fn test_for_operation_reads_request() {
		// Arrange
		let mut operation = Operation::new(HttpMethod::Get, true).with_class("app::Book", "Book");
		operation.normalization_groups = Some(vec!["book:read".to_string()]);
		let context = OperationContext::new().with_request(ApiRequest::get("/books?page=2"));

		// Act
		let normalization = NormalizationContext::for_operation(&operation, &context);

		// Assert
		assert_eq!(normalization.resource_class, "app::Book");
		assert_eq!(normalization.groups, Some(vec!["book:read".to_string()]));
		assert_eq!(normalization.request_path.as_deref(), Some("/books"));
		assert!(normalization.filters.contains_key("page"));
		assert!(normalization.is_root());
	}

	#[rstest]
	fn test_nesting() {
		let root = NormalizationContext::new("app::Book")
			.with_operation(Operation::new(HttpMethod::Get, false));

		let member = root.member();
		let embedded = member.embedded("app::Author");

		assert!(!member.is_root());
		assert_eq!(member.depth(), 0);
		assert_eq!(embedded.depth(), 1);
		assert_eq!(embedded.resource_class, "app::Author");
		assert!(embedded.operation.is_none());
	}
}
