//! HAL (`application/hal+json`)
//!
//! Relations are listed under `_links`; embedded relations additionally
//! appear in full under `_embedded`.

use crate::context::NormalizationContext;
use crate::item::{Attribute, ItemNormalizer, Relation};
use crate::normalizer::{FormatNormalizer, body_object};
use crate::view::PageLinks;
use armature_core::{ApiResource, Result};
use armature_state::{CollectionData, DenormalizationContext};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::sync::Arc;

pub const FORMAT: &str = "jsonhal";

const RESERVED: &[&str] = &["_links", "_embedded"];

fn href(iri: impl Into<String>) -> Value {
	json!({"href": iri.into()})
}

pub struct HalNormalizer {
	items: Arc<ItemNormalizer>,
}

impl HalNormalizer {
	pub fn new(items: Arc<ItemNormalizer>) -> Self {
		Self { items }
	}

	fn embedded(&self, relation: &Relation, context: &NormalizationContext) -> Result<Option<Value>> {
		relation
			.embedded
			.as_ref()
			.map(|item| self.normalize_item(item.as_ref(), &context.embedded(&relation.resource_class)))
			.transpose()
	}
}

#[async_trait]
impl FormatNormalizer for HalNormalizer {
	fn format(&self) -> &str {
		FORMAT
	}

	fn normalize_item(
		&self,
		item: &dyn ApiResource,
		context: &NormalizationContext,
	) -> Result<Value> {
		let mut links = Map::new();
		let mut embedded = Map::new();
		let mut document = Map::new();

		let iri = if context.depth() == 0 {
			Some(self.items.item_iri(item, context)?)
		} else {
			self.items.item_iri(item, context).ok()
		};
		if let Some(iri) = iri {
			links.insert("self".to_string(), href(iri));
		}

		for (name, attribute) in self.items.attributes(item, context)? {
			match attribute {
				Attribute::Value(value) => {
					document.insert(name, value);
				}
				Attribute::Relation(relation) => {
					if let Some(iri) = &relation.iri {
						links.insert(name.clone(), href(iri.as_str()));
					}
					if let Some(value) = self.embedded(&relation, context)? {
						embedded.insert(name, value);
					}
				}
				Attribute::Relations(relations) => {
					let hrefs: Vec<Value> = relations
						.iter()
						.filter_map(|r| r.iri.as_deref().map(href))
						.collect();
					let nested = relations
						.iter()
						.map(|r| self.embedded(r, context))
						.collect::<Result<Vec<_>>>()?
						.into_iter()
						.flatten()
						.collect::<Vec<_>>();
					links.insert(name.clone(), Value::Array(hrefs));
					if !nested.is_empty() {
						embedded.insert(name, Value::Array(nested));
					}
				}
			}
		}

		let mut result = Map::new();
		result.insert("_links".to_string(), Value::Object(links));
		result.extend(document);
		if !embedded.is_empty() {
			result.insert("_embedded".to_string(), Value::Object(embedded));
		}
		Ok(Value::Object(result))
	}

	fn normalize_collection(
		&self,
		collection: &CollectionData,
		context: &NormalizationContext,
	) -> Result<Value> {
		let iri = self.items.iri_converter().iri_from_class(
			&context.resource_class,
			context.operation.as_ref(),
			context.reference_type,
		)?;
		let member = context.member();
		let items = collection
			.iter()
			.map(|item| self.normalize_item(item, &member))
			.collect::<Result<Vec<_>>>()?;

		let mut links = Map::new();
		let path = context.request_path.clone().unwrap_or_else(|| iri.clone());
		match PageLinks::new(collection, &path, &context.filters, self.items.page_parameter()) {
			Some(page) => {
				links.insert("self".to_string(), href(page.current));
				links.insert("first".to_string(), href(page.first));
				if let Some(last) = page.last {
					links.insert("last".to_string(), href(last));
				}
				if let Some(previous) = page.previous {
					links.insert("prev".to_string(), href(previous));
				}
				if let Some(next) = page.next {
					links.insert("next".to_string(), href(next));
				}
			}
			None => {
				links.insert("self".to_string(), href(iri));
			}
		}
		let item_links: Vec<Value> = items
			.iter()
			.filter_map(|item| item["_links"]["self"].as_object().cloned().map(Value::Object))
			.collect();
		links.insert("item".to_string(), Value::Array(item_links));

		let mut document = Map::new();
		document.insert("_links".to_string(), Value::Object(links));
		if let Some(total) = collection.total_items {
			document.insert("totalItems".to_string(), Value::from(total));
		}
		if let Some(page) = collection.page {
			document.insert("itemsPerPage".to_string(), Value::from(page.items_per_page));
		}
		document.insert("_embedded".to_string(), json!({"item": items}));
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
