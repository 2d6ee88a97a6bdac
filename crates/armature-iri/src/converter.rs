//! Conversion between resources and their IRIs

use crate::extractor::IdentifiersExtractor;
use crate::router::Router;
use armature_core::{ApiResource, Error, Result};
use armature_metadata::{HttpMethod, Operation, ResourceMetadataCollectionFactory};
use armature_state::provider::read::resolve_identifiers;
use armature_state::{OperationContext, Provider, StateData};
use async_trait::async_trait;
use std::sync::Arc;

/// Shape of a generated IRI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UrlReferenceType {
	/// `/books/1`
	#[default]
	AbsolutePath,
	/// `http://localhost/books/1`
	AbsoluteUrl,
}

/// Maps resources and resource classes to IRIs and back
#[async_trait]
pub trait IriConverter: Send + Sync {
	/// Load the item an IRI points to
	async fn item_from_iri(
		&self,
		iri: &str,
		context: &mut OperationContext,
	) -> Result<Box<dyn ApiResource>>;

	/// IRI of an item; `operation` selects the route when it is an item GET
	/// of the item's class
	fn iri_from_item(
		&self,
		item: &dyn ApiResource,
		operation: Option<&Operation>,
		reference_type: UrlReferenceType,
	) -> Result<String>;

	/// IRI of a resource class collection
	fn iri_from_class(
		&self,
		resource_class: &str,
		operation: Option<&Operation>,
		reference_type: UrlReferenceType,
	) -> Result<String>;
}

#[async_trait]
impl<T: IriConverter + ?Sized> IriConverter for Arc<T> {
	async fn item_from_iri(
		&self,
		iri: &str,
		context: &mut OperationContext,
	) -> Result<Box<dyn ApiResource>> {
		(**self).item_from_iri(iri, context).await
	}

	fn iri_from_item(
		&self,
		item: &dyn ApiResource,
		operation: Option<&Operation>,
		reference_type: UrlReferenceType,
	) -> Result<String> {
		(**self).iri_from_item(item, operation, reference_type)
	}

	fn iri_from_class(
		&self,
		resource_class: &str,
		operation: Option<&Operation>,
		reference_type: UrlReferenceType,
	) -> Result<String> {
		(**self).iri_from_class(resource_class, operation, reference_type)
	}
}

pub const DEFAULT_BASE_URL: &str = "http://localhost";

/// Router-backed converter
///
/// Items are loaded through `provider`, normally the backend provider
/// locator, so no pipeline stage runs for an embedded IRI.
pub struct DefaultIriConverter {
	router: Arc<Router>,
	resources: Arc<dyn ResourceMetadataCollectionFactory>,
	extractor: IdentifiersExtractor,
	provider: Arc<dyn Provider>,
	base_url: String,
}

impl DefaultIriConverter {
	pub fn new(
		router: Arc<Router>,
		resources: Arc<dyn ResourceMetadataCollectionFactory>,
		extractor: IdentifiersExtractor,
		provider: Arc<dyn Provider>,
	) -> Self {
		Self {
			router,
			resources,
			extractor,
			provider,
			base_url: DEFAULT_BASE_URL.to_string(),
		}
	}

	pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
		self.base_url = base_url.into().trim_end_matches('/').to_string();
		self
	}

	pub fn extractor(&self) -> &IdentifiersExtractor {
		&self.extractor
	}

	fn reference(&self, path: String, reference_type: UrlReferenceType) -> String {
		match reference_type {
			UrlReferenceType::AbsolutePath => path,
			UrlReferenceType::AbsoluteUrl => format!("{}{}", self.base_url, path),
		}
	}

	/// Path part of an IRI, accepting absolute URLs on any host
	fn path_of<'a>(&self, iri: &'a str) -> &'a str {
		if let Some(path) = iri.strip_prefix(self.base_url.as_str()) {
			return path;
		}
		match iri.split_once("://") {
			Some((_, rest)) => rest.find('/').map_or("/", |idx| &rest[idx..]),
			None => iri,
		}
	}

	fn default_operation(&self, resource_class: &str, collection: bool) -> Result<Operation> {
		let resources = self.resources.create(resource_class)?;
		resources
			.operation(None, collection, true)
			.cloned()
			.map_err(|_| {
				Error::InvalidArgument(format!(
					"Unable to generate an IRI for \"{}\": no {} GET operation",
					resource_class,
					if collection { "collection" } else { "item" }
				))
			})
	}
}

fn serves(operation: &Operation, resource_class: &str, collection: bool) -> bool {
	operation.method == HttpMethod::Get
		&& operation.collection == collection
		&& operation.class == resource_class
}

#[async_trait]
impl IriConverter for DefaultIriConverter {
	async fn item_from_iri(
		&self,
		iri: &str,
		context: &mut OperationContext,
	) -> Result<Box<dyn ApiResource>> {
		let route = self
			.router
			.match_path(HttpMethod::Get, self.path_of(iri))
			.map_err(|_| Error::InvalidArgument(format!("No route matches \"{}\".", iri)))?;
		let operation = route.operation;
		if operation.collection {
			return Err(Error::InvalidArgument(format!(
				"The iri \"{}\" references a collection not an item.",
				iri
			)));
		}

		let identifiers = resolve_identifiers(&operation, &route.uri_variables).map_err(|_| {
			Error::InvalidArgument(format!("Invalid identifier value in \"{}\".", iri))
		})?;
		tracing::debug!(
			iri = %iri,
			resource_class = %operation.class,
			operation = %operation.name,
			"Loading item from IRI"
		);
		match self.provider.provide(&operation, &identifiers, context).await? {
			StateData::Item(item) => Ok(item),
			StateData::Empty => Err(Error::ItemNotFound(format!("Item not found for \"{}\".", iri))),
			StateData::Collection(_) => Err(Error::InvalidArgument(format!(
				"The iri \"{}\" references a collection not an item.",
				iri
			))),
		}
	}

	fn iri_from_item(
		&self,
		item: &dyn ApiResource,
		operation: Option<&Operation>,
		reference_type: UrlReferenceType,
	) -> Result<String> {
		let class = item.resource_class();
		let operation = match operation.filter(|o| serves(o, class, false)) {
			Some(operation) => operation.clone(),
			None => self.default_operation(class, false)?,
		};
		let parameters = self.extractor.identifiers_from_item(item, &operation)?;
		let path = self.router.generate(&operation.name, &parameters).map_err(|e| {
			Error::InvalidArgument(format!(
				"Unable to generate an IRI for the item of type \"{}\": {}",
				class, e
			))
		})?;
		Ok(self.reference(path, reference_type))
	}

	fn iri_from_class(
		&self,
		resource_class: &str,
		operation: Option<&Operation>,
		reference_type: UrlReferenceType,
	) -> Result<String> {
		let operation = match operation.filter(|o| serves(o, resource_class, true)) {
			Some(operation) => operation.clone(),
			None => self.default_operation(resource_class, true)?,
		};
		let path = self
			.router
			.generate(&operation.name, &Default::default())
			.map_err(|e| {
				Error::InvalidArgument(format!(
					"Unable to generate an IRI for \"{}\": {}",
					resource_class, e
				))
			})?;
		Ok(self.reference(path, reference_type))
	}
}
