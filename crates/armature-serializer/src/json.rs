//! Plain JSON: attributes only, related resources as IRIs

use crate::context::NormalizationContext;
use crate::item::{Attribute, ItemNormalizer, Relation};
use crate::normalizer::{FormatNormalizer, body_object};
use armature_core::{ApiResource, Result};
use armature_state::{CollectionData, DenormalizationContext};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

pub const FORMAT: &str = "json";

/// Attributes of `item` as a flat JSON object, recursing into embedded
/// relations
pub(crate) fn plain_object(
	items: &ItemNormalizer,
	item: &dyn ApiResource,
	context: &NormalizationContext,
) -> Result<Value> {
	let mut object = Map::new();
	for (name, attribute) in items.attributes(item, context)? {
		let value = match attribute {
			Attribute::Value(value) => value,
			Attribute::Relation(relation) => plain_relation(items, relation, context)?,
			Attribute::Relations(relations) => Value::Array(
				relations
					.into_iter()
					.map(|r| plain_relation(items, r, context))
					.collect::<Result<Vec<_>>>()?,
			),
		};
		object.insert(name, value);
	}
	Ok(Value::Object(object))
}

fn plain_relation(
	items: &ItemNormalizer,
	relation: Relation,
	context: &NormalizationContext,
) -> Result<Value> {
	match relation.embedded {
		Some(embedded) => plain_object(
			items,
			embedded.as_ref(),
			&context.embedded(&relation.resource_class),
		),
		None => Ok(relation.iri.map(Value::String).unwrap_or(Value::Null)),
	}
}

pub struct JsonNormalizer {
	items: Arc<ItemNormalizer>,
}

impl JsonNormalizer {
	pub fn new(items: Arc<ItemNormalizer>) -> Self {
		Self { items }
	}
}

#[async_trait]
impl FormatNormalizer for JsonNormalizer {
	fn format(&self) -> &str {
		FORMAT
	}

	fn normalize_item(
		&self,
		item: &dyn ApiResource,
		context: &NormalizationContext,
	) -> Result<Value> {
		plain_object(&self.items, item, context)
	}

	fn normalize_collection(
		&self,
		collection: &CollectionData,
		context: &NormalizationContext,
	) -> Result<Value> {
		let member = context.member();
		collection
			.iter()
			.map(|item| plain_object(&self.items, item, &member))
			.collect::<Result<Vec<_>>>()
			.map(Value::Array)
	}

	async fn denormalize(
		&self,
		body: Value,
		target: Box<dyn ApiResource>,
		context: &DenormalizationContext,
	) -> Result<Box<dyn ApiResource>> {
		let data = body_object(body)?;
		self.items
			.denormalize_attributes(data, target, context, &[])
			.await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::{Book, Fixture, book, collection};
	use armature_core::{Error, ResourceClass};
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	fn test_item() {
		// Arrange
		let fixture = Fixture::new();
		let normalizer = JsonNormalizer::new(fixture.normalizer.clone());

		// Act
		let document = normalizer
			.normalize_item(
				&book(1, "Dune", Some(7)),
				&NormalizationContext::new(Book::RESOURCE_CLASS),
			)
			.unwrap();

		// Assert
		assert_eq!(document, json!({"id": 1, "title": "Dune", "author": "/authors/7"}));
	}

	#[rstest]
	fn test_collection_is_an_array() {
		let fixture = Fixture::new();
		let normalizer = JsonNormalizer::new(fixture.normalizer.clone());
		let collection = collection(vec![book(1, "Dune", None), book(2, "Emma", None)]);

		let document = normalizer
			.normalize_collection(&collection, &NormalizationContext::new(Book::RESOURCE_CLASS))
			.unwrap();

		assert_eq!(
			document,
			json!([
				{"id": 1, "title": "Dune", "author": null},
				{"id": 2, "title": "Emma", "author": null},
			])
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_non_object_body_is_rejected() {
		let fixture = Fixture::new();
		let normalizer = JsonNormalizer::new(fixture.normalizer.clone());
		let context = DenormalizationContext::new(Book::RESOURCE_CLASS, FORMAT);

		let result = normalizer
			.denormalize(json!(["Dune"]), Box::new(Book::default()), &context)
			.await;

		assert!(matches!(result, Err(Error::Serialization(_))));
	}
}
