//! Per-request operation context

use crate::request::{ApiRequest, QueryParams};
use crate::user::UserToken;
use armature_core::ApiResource;
use armature_metadata::Operation;
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;

/// URI variables matched by the router, keyed by template variable
pub type UriVariables = IndexMap<String, Value>;

/// State shared by the pipeline stages of one request
///
/// Filled once at pipeline entry and refined by the stages: negotiation sets
/// the formats, parameter resolution the parameter values and the resolved
/// operation, deserialization the previous data.
#[derive(Debug, Clone)]
pub struct OperationContext {
	pub request: Option<Arc<ApiRequest>>,
	/// Operation after parameter providers ran, when one replaced it
	pub operation: Option<Operation>,
	/// Negotiated response format
	pub format: Option<String>,
	pub mime_type: Option<String>,
	/// Format of the request body
	pub input_format: Option<String>,
	/// Query parameters, used by filters and pagination
	pub filters: QueryParams,
	/// Resolved parameter values by key
	pub parameters: IndexMap<String, Value>,
	/// Item as it was before deserialization
	pub previous_data: Option<Box<dyn ApiResource>>,
	pub user: Option<UserToken>,
	pub throw_on_not_acceptable: bool,
	pub is_error_operation: bool,
	pub extra: IndexMap<String, Value>,
}

impl Default for OperationContext {
	fn default() -> Self {
		Self {
			request: None,
			operation: None,
			format: None,
			mime_type: None,
			input_format: None,
			filters: QueryParams::new(),
			parameters: IndexMap::new(),
			previous_data: None,
			user: None,
			throw_on_not_acceptable: true,
			is_error_operation: false,
			extra: IndexMap::new(),
		}
	}
}

impl OperationContext {
	pub fn new() -> Self {
		Self::default()
	}

	/// Attach the inbound request; its query and user seed the context
	pub fn with_request(mut self, request: ApiRequest) -> Self {
		self.filters = request.query.clone();
		if self.user.is_none() {
			self.user = request.user.clone();
		}
		self.request = Some(Arc::new(request));
		self
	}

	pub fn with_user(mut self, user: UserToken) -> Self {
		self.user = Some(user);
		self
	}

	pub fn with_filters(mut self, filters: QueryParams) -> Self {
		self.filters = filters;
		self
	}

	/// Context used while rendering an error; negotiation never fails
	pub fn for_error(mut self) -> Self {
		self.is_error_operation = true;
		self.throw_on_not_acceptable = false;
		self
	}

	/// The operation replaced by a parameter provider, or `fallback`
	pub fn resolved_operation<'a>(&'a self, fallback: &'a Operation) -> &'a Operation {
		self.operation.as_ref().unwrap_or(fallback)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_request_seeds_filters_and_user() {
		// Arrange
		let request = ApiRequest::get("/books?title=Dune").with_user(UserToken::new("alice"));

		// Act
		let context = OperationContext::new().with_request(request);

		// Assert
		assert_eq!(context.filters["title"], "Dune");
		assert_eq!(context.user.as_ref().map(|u| u.identifier.as_str()), Some("alice"));
		assert!(context.throw_on_not_acceptable);
	}

	#[rstest]
	fn test_error_context_never_throws() {
		let context = OperationContext::new().for_error();

		assert!(context.is_error_operation);
		assert!(!context.throw_on_not_acceptable);
	}
}
