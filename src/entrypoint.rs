//! The document served at `/`, linking every resource collection

use armature_core::Result;
use armature_iri::{IriConverter, UrlReferenceType};
use armature_metadata::{ResourceMetadataCollectionFactory, ResourceNameCollectionFactory};
use armature_serializer::jsonld::context_builder::ENTRYPOINT;
use armature_serializer::jsonld::context_iri;
use armature_serializer::{ContextBuilder, hal, jsonapi, jsonld};
use serde_json::{Map, Value, json};

/// One collection listed by the entrypoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrypointEntry {
	pub short_name: String,
	pub iri: String,
}

impl EntrypointEntry {
	/// Key of the entry, the short name with a lowercase first letter
	pub fn key(&self) -> String {
		ContextBuilder::entrypoint_key(&self.short_name)
	}
}

/// Resources exposing a collection GET, in declaration order
///
/// A resource whose collection IRI cannot be generated is left out.
pub fn collect_entries(
	names: &dyn ResourceNameCollectionFactory,
	resources: &dyn ResourceMetadataCollectionFactory,
	iri_converter: &dyn IriConverter,
) -> Result<Vec<EntrypointEntry>> {
	let mut entries = Vec::new();
	for class in names.create()? {
		let collection = resources.create(&class)?;
		let Ok(operation) = collection.operation(None, true, true) else {
			continue;
		};
		match iri_converter.iri_from_class(&class, Some(operation), UrlReferenceType::AbsolutePath)
		{
			Ok(iri) => entries.push(EntrypointEntry {
				short_name: operation.short_name.clone(),
				iri,
			}),
			Err(error) => {
				tracing::debug!(
					resource_class = class.as_str(),
					error = %error,
					"Leaving resource out of the entrypoint"
				);
			}
		}
	}
	Ok(entries)
}

/// Entrypoint document in `format`
///
/// ```
/// use armature::entrypoint::{EntrypointEntry, entrypoint_document};
///
/// let entries = vec![EntrypointEntry { short_name: "Book".into(), iri: "/books".into() }];
/// let document = entrypoint_document(&entries, "jsonhal");
/// assert_eq!(document["_links"]["book"]["href"], "/books");
/// ```
pub fn entrypoint_document(entries: &[EntrypointEntry], format: &str) -> Value {
	match format {
		jsonld::FORMAT => {
			let mut document = Map::new();
			document.insert("@context".to_string(), Value::String(context_iri(ENTRYPOINT)));
			document.insert("@id".to_string(), Value::String("/".to_string()));
			document.insert("@type".to_string(), Value::String(ENTRYPOINT.to_string()));
			for entry in entries {
				document.insert(entry.key(), Value::String(entry.iri.clone()));
			}
			Value::Object(document)
		}
		hal::FORMAT => {
			let mut links = Map::new();
			links.insert("self".to_string(), json!({"href": "/"}));
			for entry in entries {
				links.insert(entry.key(), json!({"href": entry.iri}));
			}
			json!({"_links": links})
		}
		jsonapi::FORMAT => {
			let mut links = Map::new();
			links.insert("self".to_string(), Value::String("/".to_string()));
			for entry in entries {
				links.insert(entry.key(), Value::String(entry.iri.clone()));
			}
			json!({"links": links})
		}
		_ => Value::Object(
			entries
				.iter()
				.map(|entry| (entry.key(), Value::String(entry.iri.clone())))
				.collect(),
		),
	}
}
