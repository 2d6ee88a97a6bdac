//! Fixtures shared by the serializer tests

use crate::item::ItemNormalizer;
use armature_conf::ApiSettings;
use armature_core::identifier::identifier_to_string;
use armature_core::{ApiResource, Error, ResourceClass, ResourceClassRegistry, Result};
use armature_iri::{IriConverter, UrlReferenceType};
use armature_macros::ApiResource;
use armature_metadata::Operation;
use armature_metadata::property_factory::default_class_metadata_factory;
use armature_state::{CollectionData, ExpressionAccessChecker, OperationContext};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Default, ApiResource)]
pub(crate) struct Author {
	pub id: i64,
	pub name: String,
}

#[derive(Debug, Clone, Default, ApiResource)]
pub(crate) struct Book {
	pub id: i64,
	#[api(not_blank)]
	pub title: String,
	#[api(security = "is_granted('ROLE_ADMIN')")]
	pub isbn: Option<String>,
	#[api(link)]
	pub author: Option<Author>,
}

pub(crate) fn author(id: i64, name: &str) -> Author {
	Author {
		id,
		name: name.to_string(),
	}
}

pub(crate) fn book(id: i64, title: &str, author_id: Option<i64>) -> Book {
	Book {
		id,
		title: title.to_string(),
		isbn: Some("978-0441013593".to_string()),
		author: author_id.map(|id| author(id, "Frank Herbert")),
	}
}

pub(crate) fn collection(books: Vec<Book>) -> CollectionData {
	CollectionData::new(
		books
			.into_iter()
			.map(|b| Box::new(b) as Box<dyn ApiResource>)
			.collect(),
	)
}

/// Books live under `/books/{id}`, authors under `/authors/{id}`
pub(crate) struct StubIriConverter {
	authors: HashMap<i64, Author>,
}

fn segment(resource_class: &str) -> Result<&'static str> {
	if resource_class == Book::RESOURCE_CLASS {
		Ok("books")
	} else if resource_class == Author::RESOURCE_CLASS {
		Ok("authors")
	} else {
		Err(Error::InvalidArgument(format!(
			"No route for \"{}\"",
			resource_class
		)))
	}
}

fn reference(path: String, reference_type: UrlReferenceType) -> String {
	match reference_type {
		UrlReferenceType::AbsolutePath => path,
		UrlReferenceType::AbsoluteUrl => format!("http://localhost{}", path),
	}
}

#[async_trait]
impl IriConverter for StubIriConverter {
	async fn item_from_iri(
		&self,
		iri: &str,
		_context: &mut OperationContext,
	) -> Result<Box<dyn ApiResource>> {
		let id = iri
			.strip_prefix("/authors/")
			.and_then(|id| id.parse::<i64>().ok())
			.ok_or_else(|| Error::InvalidArgument(format!("No route matches \"{}\"", iri)))?;
		self.authors
			.get(&id)
			.map(|a| Box::new(a.clone()) as Box<dyn ApiResource>)
			.ok_or_else(|| Error::ItemNotFound(iri.to_string()))
	}

	fn iri_from_item(
		&self,
		item: &dyn ApiResource,
		_operation: Option<&Operation>,
		reference_type: UrlReferenceType,
	) -> Result<String> {
		let segment = segment(item.resource_class())?;
		let id = item
			.get_property("id")
			.and_then(|v| v.as_scalar().and_then(identifier_to_string))
			.ok_or_else(|| Error::Runtime("missing identifier".to_string()))?;
		Ok(reference(format!("/{}/{}", segment, id), reference_type))
	}

	fn iri_from_class(
		&self,
		resource_class: &str,
		_operation: Option<&Operation>,
		reference_type: UrlReferenceType,
	) -> Result<String> {
		Ok(reference(format!("/{}", segment(resource_class)?), reference_type))
	}
}

pub(crate) struct Fixture {
	pub normalizer: Arc<ItemNormalizer>,
}

impl Fixture {
	pub(crate) fn new() -> Self {
		Self::with_settings(&ApiSettings::default())
	}

	pub(crate) fn with_settings(settings: &ApiSettings) -> Self {
		let registry = Arc::new(ResourceClassRegistry::new().with::<Author>().with::<Book>());
		let classes = default_class_metadata_factory(Arc::clone(&registry), settings, None);
		let converter = StubIriConverter {
			authors: HashMap::from([(7, author(7, "Frank Herbert"))]),
		};
		let normalizer = ItemNormalizer::from_settings(
			classes,
			Arc::new(converter),
			Arc::new(ExpressionAccessChecker::new()),
			registry,
			settings,
		);
		Self {
			normalizer: Arc::new(normalizer),
		}
	}
}
