//! JSON-LD context documents served under `/contexts/{shortName}`

use super::HYDRA_NAMESPACE;
use crate::item::ItemNormalizer;
use armature_core::Result;
use serde_json::{Map, Value, json};
use std::sync::Arc;

/// Short name of the entrypoint context
pub const ENTRYPOINT: &str = "Entrypoint";

fn lcfirst(name: &str) -> String {
	let mut chars = name.chars();
	match chars.next() {
		Some(first) => first.to_lowercase().chain(chars).collect(),
		None => String::new(),
	}
}

/// Builds the `@context` of resource and entrypoint documents
pub struct ContextBuilder {
	items: Arc<ItemNormalizer>,
	base_url: String,
}

impl ContextBuilder {
	pub fn new(items: Arc<ItemNormalizer>) -> Self {
		Self {
			items,
			base_url: armature_iri::converter::DEFAULT_BASE_URL.to_string(),
		}
	}

	pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
		self.base_url = base_url.into().trim_end_matches('/').to_string();
		self
	}

	fn header(&self) -> Map<String, Value> {
		let mut context = Map::new();
		context.insert(
			"@vocab".to_string(),
			Value::String(format!("{}/docs.jsonld#", self.base_url)),
		);
		context.insert("hydra".to_string(), Value::String(HYDRA_NAMESPACE.to_string()));
		context
	}

	/// Context of a resource class; link properties are typed `@id`
	///
	/// ```text
	/// {"@context": {"@vocab": "...", "hydra": "...", "title": "Book/title",
	///   "author": {"@id": "Book/author", "@type": "@id"}}}
	/// ```
	pub fn resource_context(&self, resource_class: &str, groups: Option<&[String]>) -> Result<Value> {
		let metadata = self.items.read_metadata(resource_class, groups)?;
		let mut context = self.header();
		for property in metadata.properties().filter(|p| p.is_readable()) {
			let id = property
				.iri()
				.map(str::to_string)
				.unwrap_or_else(|| format!("{}/{}", metadata.short_name(), property.name()));
			let term = if property.is_link() {
				json!({"@id": id, "@type": "@id"})
			} else {
				Value::String(id)
			};
			context.insert(property.name().to_string(), term);
		}
		Ok(json!({"@context": context}))
	}

	/// Context of the entrypoint listing the given resource short names
	pub fn entrypoint_context<'a>(&self, short_names: impl IntoIterator<Item = &'a str>) -> Value {
		let mut context = self.header();
		context.insert(ENTRYPOINT.to_string(), Value::String(ENTRYPOINT.to_string()));
		for short_name in short_names {
			let key = lcfirst(short_name);
			context.insert(
				key.clone(),
				json!({"@id": format!("{}/{}", ENTRYPOINT, key), "@type": "@id"}),
			);
		}
		json!({"@context": context})
	}

	/// Key of a resource collection in the entrypoint document
	pub fn entrypoint_key(short_name: &str) -> String {
		lcfirst(short_name)
	}
}
