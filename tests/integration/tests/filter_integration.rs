//! Collection filters applied by the in-memory backend
//!
//! ## Test Coverage
//! - Case-insensitive partial title search
//! - Association search by IRI
//! - Date ranges, with null dates excluded
//! - Ordering
//! - Malformed filter input leaves the collection untouched

use armature::prelude::*;
use armature_integration_tests::{LD_JSON, get, library, member_titles};
use http::StatusCode;
use rstest::*;

#[fixture]
fn kernel() -> ApiKernel {
	library(ApiSettings::default())
}

async fn titles(kernel: &ApiKernel, uri: &str) -> Vec<String> {
	let response = kernel.handle(get(uri, LD_JSON)).await;
	assert_eq!(response.status, StatusCode::OK, "{}", uri);
	member_titles(&response.json().unwrap())
}

#[rstest]
#[case("/books", &["Dune", "Emma", "Foundation", "Persuasion"])]
#[case("/books?title=ON", &["Foundation", "Persuasion"])]
#[case("/books?author=/authors/2", &["Emma", "Persuasion"])]
#[case("/books?published_at[before]=1900-01-01", &["Emma"])]
#[case("/books?published_at[after]=1950-01-01&published_at[strictly_before]=1960-01-01", &["Foundation"])]
#[case("/books?order[title]=desc", &["Persuasion", "Foundation", "Emma", "Dune"])]
#[tokio::test]
async fn test_collection_filters(
	kernel: ApiKernel,
	#[case] uri: &str,
	#[case] expected: &[&str],
) {
	assert_eq!(titles(&kernel, uri).await, expected);
}

#[rstest]
#[case("/books?title[]=Dune&title[]=Emma")]
#[case("/books?published_at[before]=not-a-date")]
#[case("/books?unknown=1")]
#[tokio::test]
async fn test_malformed_filters_are_ignored(kernel: ApiKernel, #[case] uri: &str) {
	assert_eq!(
		titles(&kernel, uri).await,
		["Dune", "Emma", "Foundation", "Persuasion"]
	);
}

#[rstest]
#[tokio::test]
async fn test_filters_and_order_combine(kernel: ApiKernel) {
	let found = titles(&kernel, "/books?author=/authors/2&order[published_at]=asc").await;

	assert_eq!(found, ["Persuasion", "Emma"]);
}
