//! Format-independent (de)normalization of resource properties
//!
//! [`ItemNormalizer`] decides which properties of an item are exposed and
//! whether related resources are embedded or referenced by IRI. Each format
//! only arranges the resulting [`Attribute`]s into its document layout.

use crate::context::NormalizationContext;
use armature_conf::ApiSettings;
use armature_core::{
	ApiResource, ConstraintViolation, ConstraintViolationList, Error, PropertyValue,
	ResourceClassRegistry, Result,
};
use armature_iri::IriConverter;
use armature_metadata::{ClassMetadata, ClassMetadataFactory, MetadataOptions, PropertyMetadata};
use armature_state::{
	DenormalizationContext, OperationContext, ResourceAccessChecker, SecurityVariables,
};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A related resource as seen from the item that holds it
#[derive(Debug, Clone)]
pub struct Relation {
	/// `None` only for embedded resources that have no IRI
	pub iri: Option<String>,
	pub resource_class: String,
	/// Set when the related resource is embedded rather than referenced
	pub embedded: Option<Box<dyn ApiResource>>,
}

/// One exposed property value
#[derive(Debug, Clone)]
pub enum Attribute {
	Value(Value),
	Relation(Relation),
	Relations(Vec<Relation>),
}

/// Shared property selection, relation handling and body decoding
pub struct ItemNormalizer {
	classes: Arc<dyn ClassMetadataFactory>,
	iri_converter: Arc<dyn IriConverter>,
	access_checker: Arc<dyn ResourceAccessChecker>,
	registry: Arc<ResourceClassRegistry>,
	max_embed_depth: usize,
	page_parameter: String,
}

impl ItemNormalizer {
	pub fn new(
		classes: Arc<dyn ClassMetadataFactory>,
		iri_converter: Arc<dyn IriConverter>,
		access_checker: Arc<dyn ResourceAccessChecker>,
		registry: Arc<ResourceClassRegistry>,
	) -> Self {
		Self {
			classes,
			iri_converter,
			access_checker,
			registry,
			max_embed_depth: 1,
			page_parameter: "page".to_string(),
		}
	}

	pub fn from_settings(
		classes: Arc<dyn ClassMetadataFactory>,
		iri_converter: Arc<dyn IriConverter>,
		access_checker: Arc<dyn ResourceAccessChecker>,
		registry: Arc<ResourceClassRegistry>,
		settings: &ApiSettings,
	) -> Self {
		Self::new(classes, iri_converter, access_checker, registry)
			.with_max_embed_depth(settings.serializer.max_embed_depth)
			.with_page_parameter(settings.pagination.page_parameter_name.clone())
	}

	pub fn with_max_embed_depth(mut self, depth: usize) -> Self {
		self.max_embed_depth = depth;
		self
	}

	pub fn with_page_parameter(mut self, name: impl Into<String>) -> Self {
		self.page_parameter = name.into();
		self
	}

	/// Query parameter carrying the page number in pagination links
	pub fn page_parameter(&self) -> &str {
		&self.page_parameter
	}

	pub fn iri_converter(&self) -> &Arc<dyn IriConverter> {
		&self.iri_converter
	}

	/// Metadata of `class` as seen through normalization groups
	pub fn read_metadata(
		&self,
		class: &str,
		groups: Option<&[String]>,
	) -> Result<Arc<ClassMetadata>> {
		let mut options = MetadataOptions::new();
		if let Some(groups) = groups {
			options = options.with_normalization_groups(groups.iter().cloned());
		}
		self.classes.create(class, &options)
	}

	/// Metadata of `class` as seen through denormalization groups
	pub fn write_metadata(
		&self,
		class: &str,
		groups: Option<&[String]>,
	) -> Result<Arc<ClassMetadata>> {
		let mut options = MetadataOptions::new();
		if let Some(groups) = groups {
			options = options.with_denormalization_groups(groups.iter().cloned());
		}
		self.classes.create(class, &options)
	}

	/// Short name used as the type of `class` in documents
	pub fn short_name(&self, class: &str) -> Result<String> {
		Ok(self.classes.create(class, &MetadataOptions::new())?.short_name().to_string())
	}

	/// Declared type IRI of `class`, or its short name
	pub fn type_name(&self, class: &str) -> Result<String> {
		let metadata = self.classes.create(class, &MetadataOptions::new())?;
		Ok(metadata
			.iri()
			.map(str::to_string)
			.unwrap_or_else(|| metadata.short_name().to_string()))
	}

	/// IRI of the item being normalized
	pub fn item_iri(&self, item: &dyn ApiResource, context: &NormalizationContext) -> Result<String> {
		self.iri_converter
			.iri_from_item(item, context.operation.as_ref(), context.reference_type)
	}

	/// Readable properties of `item`, in declaration order
	pub fn attributes(
		&self,
		item: &dyn ApiResource,
		context: &NormalizationContext,
	) -> Result<IndexMap<String, Attribute>> {
		let metadata = self.read_metadata(item.resource_class(), context.groups.as_deref())?;
		let mut attributes = IndexMap::new();

		for property in metadata.properties() {
			if !property.is_readable() {
				continue;
			}
			if let Some(expression) = property.security() {
				let variables = SecurityVariables::new()
					.with_user(context.user.as_ref())
					.with_object(Some(item));
				if !self
					.access_checker
					.is_granted(metadata.class(), expression, &variables)?
				{
					tracing::debug!(
						resource_class = metadata.class(),
						property = property.name(),
						"Property hidden by its security expression"
					);
					continue;
				}
			}
			let Some(value) = item.get_property(property.name()) else {
				continue;
			};
			let attribute = match value {
				PropertyValue::Scalar(value) => Attribute::Value(value),
				PropertyValue::Resource(related) => {
					Attribute::Relation(self.relation(related, property, context)?)
				}
				PropertyValue::Resources(related) => Attribute::Relations(
					related
						.into_iter()
						.map(|r| self.relation(r, property, context))
						.collect::<Result<Vec<_>>>()?,
				),
			};
			attributes.insert(property.name().to_string(), attribute);
		}
		Ok(attributes)
	}

	fn is_resource(&self, class: &str) -> bool {
		self.registry
			.descriptor(class)
			.map(|d| d.is_resource())
			.unwrap_or(false)
	}

	fn relation(
		&self,
		related: Box<dyn ApiResource>,
		property: &PropertyMetadata,
		context: &NormalizationContext,
	) -> Result<Relation> {
		let resource_class = related.resource_class().to_string();
		if !self.is_resource(&resource_class) {
			// Value objects have no IRI and are always embedded
			return Ok(Relation {
				iri: None,
				resource_class,
				embedded: Some(related),
			});
		}

		let embed = property.is_readable_link() && context.depth() < self.max_embed_depth;
		let iri = self
			.iri_converter
			.iri_from_item(related.as_ref(), None, context.reference_type);
		if embed {
			Ok(Relation {
				iri: iri.ok(),
				resource_class,
				embedded: Some(related),
			})
		} else {
			Ok(Relation {
				iri: Some(iri?),
				resource_class,
				embedded: None,
			})
		}
	}

	/// Write `data` into `target`
	///
	/// Keys in `reserved` are skipped. Unknown keys, unresolvable IRIs and
	/// values the target rejects are collected into one
	/// [`Error::Validation`]; keys that are known but not writable are ignored.
	pub fn denormalize_attributes<'a>(
		&'a self,
		data: Map<String, Value>,
		target: Box<dyn ApiResource>,
		context: &'a DenormalizationContext,
		reserved: &'static [&'static str],
	) -> BoxFuture<'a, Result<Box<dyn ApiResource>>> {
		Box::pin(async move {
			let mut target = target;
			let metadata = self.write_metadata(target.resource_class(), context.groups.as_deref())?;
			let mut violations = ConstraintViolationList::new();

			for (key, value) in data {
				if reserved.contains(&key.as_str()) {
					continue;
				}
				let Some(property) = metadata.property(&key) else {
					violations.add(
						ConstraintViolation::new(
							&key,
							format!("Extra attribute \"{}\" is not allowed.", key),
						)
						.with_code("extra_attribute"),
					);
					continue;
				};
				if !property.is_writable() {
					tracing::debug!(
						resource_class = metadata.class(),
						property = key.as_str(),
						"Ignoring attribute that is not writable"
					);
					continue;
				}

				let converted = if property.is_link() {
					self.denormalize_relation(&key, value, property, context, reserved)
						.await
				} else {
					Ok(PropertyValue::Scalar(value))
				};
				match converted {
					Ok(value) => {
						if let Err(error) = target.set_property(&key, value) {
							violations.add(error.into_violation());
						}
					}
					Err(Error::Validation(nested)) => violations.extend(nested),
					Err(error) => return Err(error),
				}
			}

			violations.into_result()?;
			Ok(target)
		})
	}

	async fn denormalize_relation(
		&self,
		key: &str,
		value: Value,
		property: &PropertyMetadata,
		context: &DenormalizationContext,
		reserved: &'static [&'static str],
	) -> Result<PropertyValue> {
		let class = property.link_class().ok_or_else(|| {
			Error::Configuration(format!("Link property \"{}\" has no target class", key))
		})?;

		match value {
			Value::Null => Ok(PropertyValue::null()),
			Value::Array(items) if property.is_collection() => {
				let mut related = Vec::with_capacity(items.len());
				let mut violations = ConstraintViolationList::new();
				for (index, item) in items.into_iter().enumerate() {
					let path = format!("{}[{}]", key, index);
					match self
						.denormalize_related(&path, item, property, class, context, reserved)
						.await
					{
						Ok(item) => related.push(item),
						Err(Error::Validation(nested)) => violations.extend(nested),
						Err(error) => return Err(error),
					}
				}
				violations.into_result()?;
				Ok(PropertyValue::Resources(related))
			}
			_ if property.is_collection() => Err(violation(
				key,
				format!("The type of the \"{}\" attribute must be \"array\".", key),
			)),
			value => Ok(PropertyValue::Resource(
				self.denormalize_related(key, value, property, class, context, reserved)
					.await?,
			)),
		}
	}

	async fn denormalize_related(
		&self,
		path: &str,
		value: Value,
		property: &PropertyMetadata,
		class: &str,
		context: &DenormalizationContext,
		reserved: &'static [&'static str],
	) -> Result<Box<dyn ApiResource>> {
		match value {
			Value::String(iri) => self.load(path, &iri).await,
			Value::Object(map) if property.is_writable_link() => {
				let target = match map.get("@id").and_then(Value::as_str) {
					Some(iri) => self.load(path, iri).await?,
					None => self.registry.instantiate(class)?,
				};
				let nested = DenormalizationContext {
					resource_class: class.to_string(),
					operation_name: None,
					..context.clone()
				};
				self.denormalize_attributes(map, target, &nested, reserved)
					.await
					.map_err(|error| prefix_violations(error, path))
			}
			Value::Object(map) => match map.get("@id").and_then(Value::as_str) {
				Some(iri) => self.load(path, iri).await,
				None => Err(violation(
					path,
					format!(
						"Nested documents for attribute \"{}\" are not allowed. Use IRIs instead.",
						path
					),
				)),
			},
			other => Err(violation(
				path,
				format!(
					"Expected IRI or nested document for attribute \"{}\", \"{}\" given.",
					path,
					json_type(&other)
				),
			)),
		}
	}

	async fn load(&self, path: &str, iri: &str) -> Result<Box<dyn ApiResource>> {
		let mut context = OperationContext::new();
		match self.iri_converter.item_from_iri(iri, &mut context).await {
			Ok(item) => Ok(item),
			Err(Error::ItemNotFound(_) | Error::NotFound(_)) => Err(violation(
				path,
				format!("Item not found for \"{}\".", iri),
			)),
			Err(Error::InvalidArgument(_)) => {
				Err(violation(path, format!("Invalid IRI \"{}\".", iri)))
			}
			Err(error) => Err(error),
		}
	}
}

fn violation(path: &str, message: String) -> Error {
	Error::Validation(ConstraintViolationList::from(vec![ConstraintViolation::new(
		path, message,
	)]))
}

fn prefix_violations(error: Error, path: &str) -> Error {
	match error {
		Error::Validation(list) => Error::Validation(
			list.into_iter()
				.map(|mut v| {
					v.property_path = format!("{}.{}", path, v.property_path);
					v
				})
				.collect::<Vec<_>>()
				.into(),
		),
		other => other,
	}
}

fn json_type(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "bool",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "array",
		Value::Object(_) => "object",
	}
}
