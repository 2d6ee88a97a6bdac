//! Requests flowing through the provider pipeline and write processor
//!
//! ## Test Coverage
//! - Missing items are a 404 from the read stage, whatever the backend
//! - Unsupported request media types fail before anything is persisted
//! - Create, replace, patch and delete round trips
//! - Constraint violations rendered as a JSON-LD violation list

use armature::prelude::*;
use armature::state::CollectionData;
use armature_integration_tests::{Book, LD_JSON, get, library, post};
use async_trait::async_trait;
use http::StatusCode;
use http::header::{ACCEPT, CONTENT_TYPE, HeaderValue, LOCATION};
use rstest::*;
use std::sync::Arc;

#[fixture]
fn kernel() -> ApiKernel {
	library(ApiSettings::default())
}

/// A backend that never finds anything
struct EmptyProvider;

#[async_trait]
impl Provider for EmptyProvider {
	async fn provide(
		&self,
		operation: &armature::metadata::Operation,
		_uri_variables: &UriVariables,
		_context: &mut OperationContext,
	) -> Result<StateData> {
		if operation.collection {
			return Ok(StateData::Collection(CollectionData::new(Vec::new())));
		}
		Ok(StateData::Empty)
	}
}

fn book_count(kernel: &ApiKernel) -> usize {
	kernel
		.memory_store()
		.unwrap()
		.len(<Book as ResourceClass>::RESOURCE_CLASS)
}

#[rstest]
#[tokio::test]
async fn test_missing_item_is_not_found(kernel: ApiKernel) {
	let response = kernel.handle(get("/books/999", LD_JSON)).await;

	assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[rstest]
#[tokio::test]
async fn test_missing_item_is_not_found_with_another_backend() {
	// Arrange
	let kernel = armature_integration_tests::kernel_builder(ApiSettings::default())
		.with_default_provider(Arc::new(EmptyProvider))
		.build()
		.unwrap();

	// Act
	let response = kernel.handle(get("/books/999", LD_JSON)).await;

	// Assert
	assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[rstest]
#[tokio::test]
async fn test_plain_text_body_is_rejected_before_persisting(kernel: ApiKernel) {
	// Act
	let response = kernel
		.handle(post("/books", "text/plain", "title=Hyperion"))
		.await;

	// Assert
	assert_eq!(response.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
	assert_eq!(book_count(&kernel), 4);
}

#[rstest]
#[tokio::test]
async fn test_create_links_an_existing_author(kernel: ApiKernel) {
	// Act
	let response = kernel
		.handle(post(
			"/books",
			LD_JSON,
			r#"{"title": "Sense and Sensibility", "author": "/authors/2"}"#,
		))
		.await;

	// Assert
	assert_eq!(response.status, StatusCode::CREATED);
	assert_eq!(response.header(LOCATION), Some("/books/5"));
	let document = response.json().unwrap();
	assert_eq!(document["@id"], "/books/5");
	assert_eq!(document["author"], "/authors/2");
	assert_eq!(book_count(&kernel), 5);
}

#[rstest]
#[tokio::test]
async fn test_unknown_author_iri_is_rejected(kernel: ApiKernel) {
	let response = kernel
		.handle(post(
			"/books",
			LD_JSON,
			r#"{"title": "Hyperion", "author": "/authors/404"}"#,
		))
		.await;

	assert!(response.status.is_client_error());
	assert_eq!(book_count(&kernel), 4);
}

#[rstest]
#[tokio::test]
async fn test_violation_list_in_jsonld(kernel: ApiKernel) {
	// Arrange
	let request = post("/authors", LD_JSON, r#"{"name": ""}"#)
		.with_header(ACCEPT, HeaderValue::from_static(LD_JSON));

	// Act
	let response = kernel.handle(request).await;

	// Assert
	assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
	let document = response.json().unwrap();
	assert_eq!(document["@type"], "ConstraintViolationList");
	assert_eq!(document["violations"][0]["propertyPath"], "name");
}

#[rstest]
#[tokio::test]
async fn test_patch_merges_into_the_stored_item(kernel: ApiKernel) {
	// Arrange
	let request = ApiRequest::patch("/books/1")
		.with_header(
			CONTENT_TYPE,
			HeaderValue::from_static("application/merge-patch+json"),
		)
		.with_body(r#"{"title": "Dune Messiah"}"#);

	// Act
	let response = kernel.handle(request).await;

	// Assert
	assert_eq!(response.status, StatusCode::OK);
	let stored = kernel.handle(get("/books/1", "application/json")).await;
	let document = stored.json().unwrap();
	assert_eq!(document["title"], "Dune Messiah");
	assert_eq!(document["author"], "/authors/1");
}

#[rstest]
#[tokio::test]
async fn test_delete_then_read(kernel: ApiKernel) {
	let deleted = kernel.handle(ApiRequest::delete("/books/2")).await;
	let read = kernel.handle(get("/books/2", LD_JSON)).await;

	assert_eq!(deleted.status, StatusCode::NO_CONTENT);
	assert!(deleted.body.is_empty());
	assert_eq!(read.status, StatusCode::NOT_FOUND);
	assert_eq!(book_count(&kernel), 3);
}

#[rstest]
#[tokio::test]
async fn test_wrong_method_lists_allowed_ones(kernel: ApiKernel) {
	let response = kernel.handle(ApiRequest::post("/books/1")).await;

	assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
}
