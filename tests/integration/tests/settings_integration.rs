//! Kernels built from layered settings files

use armature::conf::{SettingsBuilder, TomlFileSource};
use armature::prelude::*;
use armature_integration_tests::{LD_JSON, get, library, member_titles};
use http::StatusCode;
use rstest::*;
use std::io::Write;

#[rstest]
#[tokio::test]
async fn test_toml_settings_drive_pagination_and_formats() {
	// Arrange
	let temp_dir = tempfile::TempDir::new().unwrap();
	let path = temp_dir.path().join("armature.toml");
	let mut file = std::fs::File::create(&path).unwrap();
	writeln!(
		file,
		"title = \"Library\"\n\n[pagination]\nitems_per_page = 3\n\n[formats]\njsonld = [\"application/ld+json\"]"
	)
	.unwrap();
	let settings = SettingsBuilder::new()
		.add_source(TomlFileSource::new(&path))
		.build()
		.unwrap();

	// Act
	let kernel = library(settings);
	let collection = kernel.handle(get("/books", LD_JSON)).await;
	let json = kernel.handle(get("/books/1", "application/json")).await;

	// Assert
	assert_eq!(kernel.settings().title, "Library");
	assert_eq!(
		member_titles(&collection.json().unwrap()),
		["Dune", "Emma", "Foundation"]
	);
	assert_eq!(json.status, StatusCode::NOT_ACCEPTABLE);
}
