//! Item representations across formats
//!
//! ## Test Coverage
//! - JSON-LD item with its related author as an IRI
//! - HAL and JSON:API envelopes of the same item
//! - IRI generation is stable for an unchanged item

use armature::iri::UrlReferenceType;
use armature::prelude::*;
use armature_integration_tests::{Book, LD_JSON, get, library};
use http::StatusCode;
use rstest::*;
use serde_json::json;

#[fixture]
fn kernel() -> ApiKernel {
	library(ApiSettings::default())
}

#[rstest]
#[tokio::test]
async fn test_jsonld_item_links_its_author(kernel: ApiKernel) {
	// Act
	let response = kernel.handle(get("/books/3", LD_JSON)).await;

	// Assert
	assert_eq!(response.status, StatusCode::OK);
	assert_eq!(response.content_type(), Some(LD_JSON));
	let document = response.json().unwrap();
	assert_eq!(document["@context"], "/contexts/Book");
	assert_eq!(document["@id"], "/books/3");
	assert_eq!(document["@type"], "Book");
	assert_eq!(document["title"], "Foundation");
	assert_eq!(document["author"], "/authors/3");
}

#[rstest]
#[tokio::test]
async fn test_hal_item(kernel: ApiKernel) {
	let response = kernel.handle(get("/books/1", "application/hal+json")).await;

	let document = response.json().unwrap();
	assert_eq!(response.content_type(), Some("application/hal+json"));
	assert_eq!(document["_links"]["self"], json!({"href": "/books/1"}));
	assert_eq!(document["_links"]["author"], json!({"href": "/authors/1"}));
	assert_eq!(document["title"], "Dune");
}

#[rstest]
#[tokio::test]
async fn test_jsonapi_item(kernel: ApiKernel) {
	let response = kernel
		.handle(get("/books/2", "application/vnd.api+json"))
		.await;

	let data = &response.json().unwrap()["data"];
	assert_eq!(data["id"], "/books/2");
	assert_eq!(data["type"], "Book");
	assert_eq!(data["attributes"]["title"], "Emma");
	assert_eq!(
		data["relationships"]["author"],
		json!({"data": {"type": "Author", "id": "/authors/2"}})
	);
}

#[rstest]
#[tokio::test]
async fn test_route_format_suffix_wins_over_accept(kernel: ApiKernel) {
	let response = kernel.handle(get("/books/1.json", LD_JSON)).await;

	assert_eq!(response.content_type(), Some("application/json"));
	assert_eq!(response.json().unwrap()["title"], "Dune");
}

#[rstest]
fn test_item_iri_is_stable(kernel: ApiKernel) {
	// Arrange
	let store = kernel.memory_store().unwrap();
	let book = store
		.find(<Book as ResourceClass>::RESOURCE_CLASS, "3")
		.unwrap();
	let converter = kernel.iri_converter();

	// Act
	let first = converter
		.iri_from_item(book.as_ref(), None, UrlReferenceType::AbsolutePath)
		.unwrap();
	let second = converter
		.iri_from_item(book.as_ref(), None, UrlReferenceType::AbsolutePath)
		.unwrap();

	// Assert
	assert_eq!(first, "/books/3");
	assert_eq!(first.as_bytes(), second.as_bytes());
	assert_eq!(
		converter
			.iri_from_item(book.as_ref(), None, UrlReferenceType::AbsoluteUrl)
			.unwrap(),
		"http://localhost/books/3"
	);
}
