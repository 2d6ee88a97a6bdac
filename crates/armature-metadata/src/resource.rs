//! Resource-level metadata and the per-class collection

use crate::operation::{HttpMethod, Operation};
use armature_conf::FormatMap;
use armature_core::{Error, ResourceDeclaration, Result};

/// One `#[api]` resource declared on a class
///
/// `operations` stays `None` until the operation defaults stage fills in
/// the default CRUD set or names the declared operations.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResourceMetadata {
	pub class: String,
	pub short_name: String,
	pub description: Option<String>,
	/// Semantic type (`@type`)
	pub iri: Option<String>,
	pub uri_template: Option<String>,
	pub operations: Option<Vec<Operation>>,
	pub normalization_groups: Option<Vec<String>>,
	pub denormalization_groups: Option<Vec<String>>,
	pub validation_groups: Option<Vec<String>>,
	pub filters: Vec<String>,
	pub security: Option<String>,
	pub security_message: Option<String>,
	pub security_post_denormalize: Option<String>,
	pub paginated: Option<bool>,
	pub items_per_page: Option<u64>,
	pub formats: Option<FormatMap>,
	pub provider: Option<String>,
	pub processor: Option<String>,
}

impl ApiResourceMetadata {
	pub fn new(class: impl Into<String>, short_name: impl Into<String>) -> Self {
		Self {
			class: class.into(),
			short_name: short_name.into(),
			description: None,
			iri: None,
			uri_template: None,
			operations: None,
			normalization_groups: None,
			denormalization_groups: None,
			validation_groups: None,
			filters: Vec::new(),
			security: None,
			security_message: None,
			security_post_denormalize: None,
			paginated: None,
			items_per_page: None,
			formats: None,
			provider: None,
			processor: None,
		}
	}

	/// Overlay a declaration; fields it sets win
	pub fn apply_declaration(mut self, declaration: &ResourceDeclaration) -> Result<Self> {
		if let Some(short_name) = &declaration.short_name {
			self.short_name = short_name.clone();
		}
		macro_rules! overlay {
			($($field:ident),*) => {
				$(if declaration.$field.is_some() {
					self.$field = declaration.$field.clone();
				})*
			};
		}
		overlay!(
			description,
			iri,
			uri_template,
			normalization_groups,
			denormalization_groups,
			validation_groups,
			security,
			security_message,
			security_post_denormalize,
			paginated,
			items_per_page,
			formats,
			provider,
			processor
		);
		for filter in &declaration.filters {
			if !self.filters.contains(filter) {
				self.filters.push(filter.clone());
			}
		}
		if let Some(operations) = &declaration.operations {
			let operations = operations
				.iter()
				.map(Operation::from_declaration)
				.collect::<Result<Vec<_>>>()?;
			self.operations = Some(operations);
		}
		Ok(self)
	}

	pub fn operations(&self) -> &[Operation] {
		self.operations.as_deref().unwrap_or_default()
	}

	pub fn operation(&self, name: &str) -> Option<&Operation> {
		self.operations().iter().find(|o| o.name == name)
	}
}

/// Every resource declared on one class
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceMetadataCollection {
	class: String,
	resources: Vec<ApiResourceMetadata>,
}

impl ResourceMetadataCollection {
	pub fn new(class: impl Into<String>) -> Self {
		Self {
			class: class.into(),
			resources: Vec::new(),
		}
	}

	pub fn class(&self) -> &str {
		&self.class
	}

	pub fn resources(&self) -> &[ApiResourceMetadata] {
		&self.resources
	}

	pub fn is_empty(&self) -> bool {
		self.resources.is_empty()
	}

	pub fn push(&mut self, resource: ApiResourceMetadata) {
		self.resources.push(resource);
	}

	pub fn with_resource(mut self, resource: ApiResourceMetadata) -> Self {
		self.resources.push(resource);
		self
	}

	/// Rebuild every resource through `f`
	pub fn map_resources<F>(mut self, f: F) -> Result<Self>
	where
		F: FnMut(ApiResourceMetadata) -> Result<ApiResourceMetadata>,
	{
		self.resources = std::mem::take(&mut self.resources)
			.into_iter()
			.map(f)
			.collect::<Result<Vec<_>>>()?;
		Ok(self)
	}

	pub fn operations(&self) -> impl Iterator<Item = &Operation> {
		self.resources.iter().flat_map(|r| r.operations().iter())
	}

	/// Look an operation up by name, or pick a default one
	///
	/// Without a name, the first GET targeting an item (or a collection when
	/// `collection` is set) is returned; unless `http_get_only` is set, the
	/// first operation of that kind is accepted as a fallback.
	pub fn operation(
		&self,
		name: Option<&str>,
		collection: bool,
		http_get_only: bool,
	) -> Result<&Operation> {
		if let Some(name) = name {
			return self.operations().find(|o| o.name == name).ok_or_else(|| {
				Error::InvalidArgument(format!(
					"Operation \"{}\" not found for resource \"{}\"",
					name, self.class
				))
			});
		}

		self.operations()
			.find(|o| o.method == HttpMethod::Get && o.collection == collection)
			.or_else(|| {
				if http_get_only {
					None
				} else {
					self.operations().find(|o| o.collection == collection)
				}
			})
			.ok_or_else(|| {
				Error::InvalidArgument(format!(
					"No {} operation found for resource \"{}\"",
					if collection { "collection" } else { "item" },
					self.class
				))
			})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn collection() -> ResourceMetadataCollection {
		let mut resource = ApiResourceMetadata::new("app::Book", "Book");
		resource.operations = Some(vec![
			Operation::new(HttpMethod::Post, true).with_name("_api_Book_post"),
			Operation::new(HttpMethod::Get, true).with_name("_api_Book_get_collection"),
			Operation::new(HttpMethod::Get, false).with_name("_api_Book_get"),
			Operation::new(HttpMethod::Delete, false).with_name("_api_Book_delete"),
		]);
		ResourceMetadataCollection::new("app::Book").with_resource(resource)
	}

	#[rstest]
	#[case(Some("_api_Book_delete"), false, "_api_Book_delete")]
	#[case(None, false, "_api_Book_get")]
	#[case(None, true, "_api_Book_get_collection")]
	fn test_operation_lookup(
		#[case] name: Option<&str>,
		#[case] is_collection: bool,
		#[case] expected: &str,
	) {
		let collection_metadata = collection();

		let operation = collection_metadata.operation(name, is_collection, false).unwrap();

		assert_eq!(operation.name, expected);
	}

	#[rstest]
	fn test_unknown_operation_fails() {
		let result = collection().operation(Some("_api_Book_patch"), false, false).map(|_| ());

		assert!(matches!(result, Err(Error::InvalidArgument(_))));
	}

	#[rstest]
	fn test_declaration_overlay() {
		let declaration = ResourceDeclaration {
			description: Some("Books".to_string()),
			filters: vec!["book.search".to_string()],
			paginated: Some(false),
			..Default::default()
		};

		let resource = ApiResourceMetadata::new("app::Book", "Book")
			.apply_declaration(&declaration)
			.unwrap();

		assert_eq!(resource.description.as_deref(), Some("Books"));
		assert_eq!(resource.filters, vec!["book.search"]);
		assert_eq!(resource.paginated, Some(false));
		assert!(resource.operations.is_none());
	}
}
