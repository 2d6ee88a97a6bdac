//! JSON:API (`application/vnd.api+json`)
//!
//! Resource objects use the item IRI as `id` and the short name as `type`.
//! An attribute named `id` would clash with the member of the same name and
//! is exposed as `_id`. Embedded relations become `included` resources.

use crate::context::NormalizationContext;
use crate::item::{Attribute, ItemNormalizer, Relation};
use crate::json::plain_object;
use crate::normalizer::{FormatNormalizer, body_object};
use crate::view::PageLinks;
use armature_core::{ApiResource, Error, Result};
use armature_state::{CollectionData, DenormalizationContext};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::sync::Arc;

pub const FORMAT: &str = "jsonapi";

const ID_ATTRIBUTE: &str = "_id";

pub struct JsonApiNormalizer {
	items: Arc<ItemNormalizer>,
}

impl JsonApiNormalizer {
	pub fn new(items: Arc<ItemNormalizer>) -> Self {
		Self { items }
	}

	fn linkage(&self, relation: &Relation) -> Result<Option<Value>> {
		let Some(iri) = &relation.iri else {
			return Ok(None);
		};
		Ok(Some(json!({
			"type": self.items.short_name(&relation.resource_class)?,
			"id": iri,
		})))
	}

	/// Queue an embedded relation for `included`, skipping duplicates
	fn include(
		&self,
		relation: &Relation,
		context: &NormalizationContext,
		included: &mut Vec<Value>,
	) -> Result<()> {
		let Some(embedded) = &relation.embedded else {
			return Ok(());
		};
		let object = self.resource_object(
			embedded.as_ref(),
			&context.embedded(&relation.resource_class),
			included,
		)?;
		let duplicate = included
			.iter()
			.any(|i| i["id"] == object["id"] && i["type"] == object["type"]);
		if !duplicate {
			included.push(object);
		}
		Ok(())
	}

	fn resource_object(
		&self,
		item: &dyn ApiResource,
		context: &NormalizationContext,
		included: &mut Vec<Value>,
	) -> Result<Value> {
		let mut attributes = Map::new();
		let mut relationships = Map::new();

		for (name, attribute) in self.items.attributes(item, context)? {
			let name = if name == "id" {
				ID_ATTRIBUTE.to_string()
			} else {
				name
			};
			match attribute {
				Attribute::Value(value) => {
					attributes.insert(name, value);
				}
				Attribute::Relation(relation) => match self.linkage(&relation)? {
					Some(data) => {
						self.include(&relation, context, included)?;
						relationships.insert(name, json!({"data": data}));
					}
					None => {
						let value = match &relation.embedded {
							Some(embedded) => plain_object(
								&self.items,
								embedded.as_ref(),
								&context.embedded(&relation.resource_class),
							)?,
							None => Value::Null,
						};
						attributes.insert(name, value);
					}
				},
				Attribute::Relations(relations) => {
					let mut data = Vec::with_capacity(relations.len());
					for relation in &relations {
						if let Some(linkage) = self.linkage(relation)? {
							self.include(relation, context, included)?;
							data.push(linkage);
						}
					}
					relationships.insert(name, json!({"data": data}));
				}
			}
		}

		let iri = self.items.item_iri(item, context)?;
		let mut object = Map::new();
		object.insert("id".to_string(), Value::String(iri));
		object.insert(
			"type".to_string(),
			Value::String(self.items.short_name(item.resource_class())?),
		);
		object.insert("attributes".to_string(), Value::Object(attributes));
		if !relationships.is_empty() {
			object.insert("relationships".to_string(), Value::Object(relationships));
		}
		Ok(Value::Object(object))
	}
}

/// Resource object of a request body flattened into plain attributes;
/// relationship linkages become IRIs
fn flatten(document: Map<String, Value>) -> Result<Map<String, Value>> {
	let Some(Value::Object(mut data)) = document.get("data").cloned() else {
		return Err(Error::Serialization(
			"The request body must contain a \"data\" object".to_string(),
		));
	};
	let mut flat = match data.remove("attributes") {
		Some(Value::Object(attributes)) => attributes,
		Some(_) => {
			return Err(Error::Serialization(
				"\"data.attributes\" must be an object".to_string(),
			));
		}
		None => Map::new(),
	};
	if let Some(id) = flat.remove(ID_ATTRIBUTE) {
		flat.insert("id".to_string(), id);
	}
	if let Some(Value::Object(relationships)) = data.remove("relationships") {
		for (name, relationship) in relationships {
			let linkage = match relationship.get("data") {
				Some(Value::Array(items)) => {
					Value::Array(items.iter().map(|i| i["id"].clone()).collect())
				}
				Some(Value::Object(item)) => item.get("id").cloned().unwrap_or(Value::Null),
				_ => Value::Null,
			};
			flat.insert(name, linkage);
		}
	}
	Ok(flat)
}

#[async_trait]
impl FormatNormalizer for JsonApiNormalizer {
	fn format(&self) -> &str {
		FORMAT
	}

	fn normalize_item(
		&self,
		item: &dyn ApiResource,
		context: &NormalizationContext,
	) -> Result<Value> {
		let mut included = Vec::new();
		let data = self.resource_object(item, context, &mut included)?;
		let mut document = Map::new();
		document.insert("data".to_string(), data);
		if !included.is_empty() {
			document.insert("included".to_string(), Value::Array(included));
		}
		Ok(Value::Object(document))
	}

	fn normalize_collection(
		&self,
		collection: &CollectionData,
		context: &NormalizationContext,
	) -> Result<Value> {
		let member = context.member();
		let mut included = Vec::new();
		let data = collection
			.iter()
			.map(|item| self.resource_object(item, &member, &mut included))
			.collect::<Result<Vec<_>>>()?;

		let iri = self.items.iri_converter().iri_from_class(
			&context.resource_class,
			context.operation.as_ref(),
			context.reference_type,
		)?;
		let path = context.request_path.clone().unwrap_or_else(|| iri.clone());
		let mut links = Map::new();
		let mut meta = Map::new();
		match PageLinks::new(collection, &path, &context.filters, self.items.page_parameter()) {
			Some(page) => {
				links.insert("self".to_string(), Value::String(page.current));
				links.insert("first".to_string(), Value::String(page.first));
				if let Some(last) = page.last {
					links.insert("last".to_string(), Value::String(last));
				}
				if let Some(previous) = page.previous {
					links.insert("prev".to_string(), Value::String(previous));
				}
				if let Some(next) = page.next {
					links.insert("next".to_string(), Value::String(next));
				}
			}
			None => {
				links.insert("self".to_string(), Value::String(iri));
			}
		}
		if let Some(total) = collection.total_items {
			meta.insert("totalItems".to_string(), Value::from(total));
		}
		if let Some(page) = collection.page {
			meta.insert("itemsPerPage".to_string(), Value::from(page.items_per_page));
			meta.insert("currentPage".to_string(), Value::from(page.current_page));
		}

		let mut document = Map::new();
		document.insert("links".to_string(), Value::Object(links));
		document.insert("meta".to_string(), Value::Object(meta));
		document.insert("data".to_string(), Value::Array(data));
		if !included.is_empty() {
			document.insert("included".to_string(), Value::Array(included));
		}
		Ok(Value::Object(document))
	}

	async fn denormalize(
		&self,
		body: Value,
		target: Box<dyn ApiResource>,
		context: &DenormalizationContext,
	) -> Result<Box<dyn ApiResource>> {
		let data = flatten(body_object(body)?)?;
		self.items
			.denormalize_attributes(data, target, context, &[])
			.await
	}
}
