//! Class metadata and the options that parameterize it

use crate::property::PropertyMetadata;
use armature_core::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Group sets a class metadata instance is built for
///
/// Part of the cache key: the same class built for different groups yields
/// distinct metadata instances.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetadataOptions {
	pub normalization_groups: Option<Vec<String>>,
	pub denormalization_groups: Option<Vec<String>>,
	pub validation_groups: Option<Vec<String>>,
}

impl MetadataOptions {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_normalization_groups<I, S>(mut self, groups: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.normalization_groups = Some(groups.into_iter().map(Into::into).collect());
		self
	}

	pub fn with_denormalization_groups<I, S>(mut self, groups: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.denormalization_groups = Some(groups.into_iter().map(Into::into).collect());
		self
	}

	pub fn with_validation_groups<I, S>(mut self, groups: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.validation_groups = Some(groups.into_iter().map(Into::into).collect());
		self
	}
}

/// Immutable description of one resource class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetadata {
	class: String,
	short_name: String,
	description: Option<String>,
	iri: Option<String>,
	properties: IndexMap<String, PropertyMetadata>,
	options: MetadataOptions,
}

impl ClassMetadata {
	pub fn new(class: impl Into<String>, short_name: impl Into<String>) -> Self {
		Self {
			class: class.into(),
			short_name: short_name.into(),
			description: None,
			iri: None,
			properties: IndexMap::new(),
			options: MetadataOptions::default(),
		}
	}

	pub fn class(&self) -> &str {
		&self.class
	}

	pub fn short_name(&self) -> &str {
		&self.short_name
	}

	pub fn description(&self) -> Option<&str> {
		self.description.as_deref()
	}

	pub fn iri(&self) -> Option<&str> {
		self.iri.as_deref()
	}

	pub fn options(&self) -> &MetadataOptions {
		&self.options
	}

	pub fn property(&self, name: &str) -> Option<&PropertyMetadata> {
		self.properties.get(name)
	}

	pub fn properties(&self) -> impl Iterator<Item = &PropertyMetadata> {
		self.properties.values()
	}

	pub fn property_names(&self) -> impl Iterator<Item = &str> {
		self.properties.keys().map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.properties.len()
	}

	pub fn is_empty(&self) -> bool {
		self.properties.is_empty()
	}

	/// Names of identifier properties, in declaration order
	pub fn identifiers(&self) -> Vec<String> {
		self.properties
			.values()
			.filter(|p| p.is_identifier())
			.map(|p| p.name().to_string())
			.collect()
	}

	/// Identifier properties, failing when the class declares none
	pub fn require_identifiers(&self) -> Result<Vec<String>> {
		let identifiers = self.identifiers();
		if identifiers.is_empty() {
			return Err(Error::Runtime(format!(
				"No identifier defined in \"{}\". You should add an identifier property",
				self.class
			)));
		}
		Ok(identifiers)
	}

	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}

	pub fn with_iri(mut self, iri: impl Into<String>) -> Self {
		self.iri = Some(iri.into());
		self
	}

	pub fn with_options(mut self, options: MetadataOptions) -> Self {
		self.options = options;
		self
	}

	/// Insert or replace a property
	pub fn with_property(mut self, property: PropertyMetadata) -> Self {
		self.properties.insert(property.name().to_string(), property);
		self
	}

	/// Rebuild every property through `f`
	pub fn map_properties<F>(mut self, mut f: F) -> Result<Self>
	where
		F: FnMut(PropertyMetadata) -> Result<PropertyMetadata>,
	{
		let properties = std::mem::take(&mut self.properties);
		for (name, property) in properties {
			self.properties.insert(name, f(property)?);
		}
		Ok(self)
	}
}
