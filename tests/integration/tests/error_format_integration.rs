//! Error documents in the negotiated error format
//!
//! ## Test Coverage
//! - Problem documents by default
//! - Hydra errors for JSON-LD clients and `.jsonld` routes
//! - JSON:API error arrays
//! - Unacceptable response formats
//! - Entrypoint and context documents

use armature::prelude::*;
use armature_integration_tests::{LD_JSON, get, library};
use http::StatusCode;
use http::header::{CONTENT_TYPE, VARY};
use rstest::*;
use serde_json::json;

#[fixture]
fn kernel() -> ApiKernel {
	library(ApiSettings::default())
}

#[rstest]
#[case("*/*", "application/problem+json")]
#[case(LD_JSON, LD_JSON)]
#[case("application/vnd.api+json", "application/vnd.api+json")]
#[tokio::test]
async fn test_error_format_follows_accept(
	kernel: ApiKernel,
	#[case] accept: &'static str,
	#[case] content_type: &str,
) {
	let response = kernel.handle(get("/books/999", accept)).await;

	assert_eq!(response.status, StatusCode::NOT_FOUND);
	assert_eq!(response.header(CONTENT_TYPE), Some(content_type));
	assert_eq!(response.header(VARY), Some("Accept"));
}

#[rstest]
#[tokio::test]
async fn test_problem_document(kernel: ApiKernel) {
	let response = kernel.handle(ApiRequest::get("/books/999")).await;

	let document = response.json().unwrap();
	assert_eq!(document["type"], "/errors/404");
	assert_eq!(document["title"], "Not Found");
	assert_eq!(document["status"], 404);
}

#[rstest]
#[tokio::test]
async fn test_hydra_error_for_route_format(kernel: ApiKernel) {
	// Act
	let response = kernel.handle(ApiRequest::get("/books/999.jsonld")).await;

	// Assert
	assert_eq!(response.status, StatusCode::NOT_FOUND);
	let document = response.json().unwrap();
	assert_eq!(document["@context"], "/contexts/Error");
	assert_eq!(document["@type"], "hydra:Error");
	assert_eq!(document["hydra:title"], "Not Found");
}

#[rstest]
#[tokio::test]
async fn test_jsonapi_errors(kernel: ApiKernel) {
	let response = kernel
		.handle(get("/books/999", "application/vnd.api+json"))
		.await;

	let document = response.json().unwrap();
	assert_eq!(document["errors"][0]["status"], "404");
	assert_eq!(document["errors"][0]["title"], "Not Found");
}

#[rstest]
#[tokio::test]
async fn test_unacceptable_format(kernel: ApiKernel) {
	let response = kernel.handle(get("/books/1", "text/html")).await;

	assert_eq!(response.status, StatusCode::NOT_ACCEPTABLE);
	assert_eq!(response.json().unwrap()["status"], 406);
}

#[rstest]
#[tokio::test]
async fn test_entrypoint_lists_collections(kernel: ApiKernel) {
	// Act
	let entrypoint = kernel.handle(get("/", LD_JSON)).await;
	let context = kernel.handle(ApiRequest::get("/contexts/Entrypoint")).await;

	// Assert
	assert_eq!(
		entrypoint.json().unwrap(),
		json!({
			"@context": "/contexts/Entrypoint",
			"@id": "/",
			"@type": "Entrypoint",
			"author": "/authors",
			"book": "/books",
		})
	);
	let context = context.json().unwrap();
	assert_eq!(
		context["@context"]["book"],
		json!({"@id": "Entrypoint/book", "@type": "@id"})
	);
}

#[rstest]
#[tokio::test]
async fn test_resource_context_types_links(kernel: ApiKernel) {
	let response = kernel.handle(ApiRequest::get("/contexts/Book")).await;

	assert_eq!(response.content_type(), Some(LD_JSON));
	let context = &response.json().unwrap()["@context"];
	assert_eq!(context["title"], "Book/title");
	assert_eq!(context["author"], json!({"@id": "Book/author", "@type": "@id"}));
}
