//! JSON-LD with the Hydra vocabulary
//!
//! Every document carries `@id` and `@type`; the root one also links its
//! `@context`. Collections are `hydra:Collection`s with a
//! `hydra:PartialCollectionView` when paginated.

pub mod context_builder;

pub use context_builder::ContextBuilder;

use crate::context::NormalizationContext;
use crate::item::{Attribute, ItemNormalizer, Relation};
use crate::normalizer::{FormatNormalizer, body_object};
use crate::view::PageLinks;
use armature_core::{ApiResource, Result};
use armature_state::{CollectionData, DenormalizationContext};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

pub const FORMAT: &str = "jsonld";

pub const HYDRA_NAMESPACE: &str = "http://www.w3.org/ns/hydra/core#";

/// Keys of a JSON-LD body that are not resource properties
const RESERVED: &[&str] = &["@id", "@type", "@context"];

/// Path of the context document of a short name, e.g. `/contexts/Book`
pub fn context_iri(short_name: &str) -> String {
	format!("/contexts/{}", short_name)
}

pub struct JsonLdNormalizer {
	items: Arc<ItemNormalizer>,
}

impl JsonLdNormalizer {
	pub fn new(items: Arc<ItemNormalizer>) -> Self {
		Self { items }
	}

	fn relation(&self, relation: Relation, context: &NormalizationContext) -> Result<Value> {
		match relation.embedded {
			Some(embedded) => self.normalize_item(
				embedded.as_ref(),
				&context.embedded(&relation.resource_class),
			),
			None => Ok(relation.iri.map(Value::String).unwrap_or(Value::Null)),
		}
	}
}

#[async_trait]
impl FormatNormalizer for JsonLdNormalizer {
	fn format(&self) -> &str {
		FORMAT
	}

	fn normalize_item(
		&self,
		item: &dyn ApiResource,
		context: &NormalizationContext,
	) -> Result<Value> {
		let short_name = self.items.short_name(item.resource_class())?;
		let mut document = Map::new();
		if context.is_root() {
			document.insert("@context".to_string(), Value::String(context_iri(&short_name)));
		}
		// Embedded value objects have no IRI
		let iri = if context.depth() == 0 {
			Some(self.items.item_iri(item, context)?)
		} else {
			self.items.item_iri(item, context).ok()
		};
		if let Some(iri) = iri {
			document.insert("@id".to_string(), Value::String(iri));
		}
		document.insert(
			"@type".to_string(),
			Value::String(self.items.type_name(item.resource_class())?),
		);

		for (name, attribute) in self.items.attributes(item, context)? {
			let value = match attribute {
				Attribute::Value(value) => value,
				Attribute::Relation(relation) => self.relation(relation, context)?,
				Attribute::Relations(relations) => Value::Array(
					relations
						.into_iter()
						.map(|r| self.relation(r, context))
						.collect::<Result<Vec<_>>>()?,
				),
			};
			document.insert(name, value);
		}
		Ok(Value::Object(document))
	}

	fn normalize_collection(
		&self,
		collection: &CollectionData,
		context: &NormalizationContext,
	) -> Result<Value> {
		let short_name = self.items.short_name(&context.resource_class)?;
		let iri = self.items.iri_converter().iri_from_class(
			&context.resource_class,
			context.operation.as_ref(),
			context.reference_type,
		)?;

		let member = context.member();
		let members = collection
			.iter()
			.map(|item| self.normalize_item(item, &member))
			.collect::<Result<Vec<_>>>()?;

		let mut document = Map::new();
		document.insert("@context".to_string(), Value::String(context_iri(&short_name)));
		document.insert("@id".to_string(), Value::String(iri.clone()));
		document.insert("@type".to_string(), Value::String("hydra:Collection".to_string()));
		document.insert("hydra:member".to_string(), Value::Array(members));
		if let Some(total) = collection.total_items {
			document.insert("hydra:totalItems".to_string(), Value::from(total));
		}

		let path = context.request_path.clone().unwrap_or(iri);
		if let Some(links) =
			PageLinks::new(collection, &path, &context.filters, self.items.page_parameter())
		{
			let mut view = Map::new();
			view.insert("@id".to_string(), Value::String(links.current));
			view.insert(
				"@type".to_string(),
				Value::String("hydra:PartialCollectionView".to_string()),
			);
			view.insert("hydra:first".to_string(), Value::String(links.first));
			if let Some(last) = links.last {
				view.insert("hydra:last".to_string(), Value::String(last));
			}
			if let Some(previous) = links.previous {
				view.insert("hydra:previous".to_string(), Value::String(previous));
			}
			if let Some(next) = links.next {
				view.insert("hydra:next".to_string(), Value::String(next));
			}
			document.insert("hydra:view".to_string(), Value::Object(view));
		}
		Ok(Value::Object(document))
	}

	async fn denormalize(
		&self,
		body: Value,
		target: Box<dyn ApiResource>,
		context: &DenormalizationContext,
	) -> Result<Box<dyn ApiResource>> {
		let data = body_object(body)?;
		self.items
			.denormalize_attributes(data, target, context, RESERVED)
			.await
	}
}
