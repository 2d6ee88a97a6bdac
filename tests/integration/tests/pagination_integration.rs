//! Paginated collections in each format
//!
//! ## Test Coverage
//! - Hydra partial collection views, totals and page links
//! - Client-selected page sizes
//! - HAL and JSON:API collection envelopes
//! - Partial pagination without totals

use armature::conf::PaginationSettings;
use armature::prelude::*;
use armature_integration_tests::{LD_JSON, get, library, member_titles};
use rstest::*;
use serde_json::json;

fn paginated(pagination: PaginationSettings) -> ApiKernel {
	library(ApiSettings {
		pagination,
		..Default::default()
	})
}

#[fixture]
fn kernel() -> ApiKernel {
	paginated(PaginationSettings {
		items_per_page: 2,
		..Default::default()
	})
}

#[rstest]
#[tokio::test]
async fn test_hydra_view(kernel: ApiKernel) {
	// Act
	let response = kernel.handle(get("/books?page=2", LD_JSON)).await;

	// Assert
	let document = response.json().unwrap();
	assert_eq!(document["@type"], "hydra:Collection");
	assert_eq!(document["hydra:totalItems"], 4);
	assert_eq!(member_titles(&document), ["Foundation", "Persuasion"]);
	assert_eq!(
		document["hydra:view"],
		json!({
			"@id": "/books?page=2",
			"@type": "hydra:PartialCollectionView",
			"hydra:first": "/books?page=1",
			"hydra:last": "/books?page=2",
			"hydra:previous": "/books?page=1",
		})
	);
}

#[rstest]
#[tokio::test]
async fn test_page_links_keep_filters(kernel: ApiKernel) {
	let response = kernel.handle(get("/books?title=e", LD_JSON)).await;

	let document = response.json().unwrap();
	assert_eq!(document["hydra:totalItems"], 3);
	assert_eq!(member_titles(&document), ["Dune", "Emma"]);
	assert_eq!(document["hydra:view"]["hydra:next"], "/books?title=e&page=2");
}

#[rstest]
#[tokio::test]
async fn test_client_items_per_page() {
	// Arrange
	let kernel = paginated(PaginationSettings {
		client_items_per_page: true,
		..Default::default()
	});

	// Act
	let response = kernel
		.handle(get("/books?itemsPerPage=3&page=2", LD_JSON))
		.await;

	// Assert
	let document = response.json().unwrap();
	assert_eq!(member_titles(&document), ["Persuasion"]);
	assert_eq!(document["hydra:totalItems"], 4);
}

#[rstest]
#[tokio::test]
async fn test_partial_pagination_has_no_total() {
	let kernel = paginated(PaginationSettings {
		items_per_page: 3,
		partial: true,
		..Default::default()
	});

	let response = kernel.handle(get("/books", LD_JSON)).await;

	let document = response.json().unwrap();
	assert_eq!(member_titles(&document), ["Dune", "Emma", "Foundation"]);
	assert!(document.get("hydra:totalItems").is_none());
	assert!(document["hydra:view"].get("hydra:last").is_none());
	assert_eq!(document["hydra:view"]["hydra:next"], "/books?page=2");
}

#[rstest]
#[tokio::test]
async fn test_hal_collection(kernel: ApiKernel) {
	let response = kernel.handle(get("/books", "application/hal+json")).await;

	let document = response.json().unwrap();
	assert_eq!(document["totalItems"], 4);
	assert_eq!(document["_embedded"]["item"].as_array().map(Vec::len), Some(2));
	assert_eq!(document["_links"]["next"], json!({"href": "/books?page=2"}));
}

#[rstest]
#[tokio::test]
async fn test_jsonapi_collection(kernel: ApiKernel) {
	let response = kernel
		.handle(get("/books?page=2", "application/vnd.api+json"))
		.await;

	let document = response.json().unwrap();
	assert_eq!(document["meta"]["totalItems"], 4);
	assert_eq!(document["data"][0]["id"], "/books/3");
	assert_eq!(document["data"][1]["attributes"]["title"], "Persuasion");
}
