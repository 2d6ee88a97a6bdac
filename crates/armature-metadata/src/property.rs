//! Property metadata value object

use armature_core::TypeInfo;
use serde::{Deserialize, Serialize};

/// Immutable description of one resource property
///
/// Every `with_*` method consumes the value and returns a modified copy;
/// holders of an earlier `Arc<PropertyMetadata>` never observe a change.
///
/// # Examples
///
/// ```
/// use armature_metadata::PropertyMetadata;
///
/// let title = PropertyMetadata::new("title").with_readable(true);
/// let writable = title.clone().with_writable(true);
///
/// assert!(!title.is_writable());
/// assert!(writable.is_writable());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyMetadata {
	name: String,
	builtin_types: Vec<TypeInfo>,
	/// Semantic types (RDF IRIs)
	types: Vec<String>,
	description: Option<String>,
	readable: bool,
	writable: bool,
	required: Option<bool>,
	identifier: Option<bool>,
	link: bool,
	link_class: Option<String>,
	readable_link: Option<bool>,
	writable_link: Option<bool>,
	iri: Option<String>,
	security: Option<String>,
	groups: Vec<String>,
}

impl PropertyMetadata {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			builtin_types: Vec::new(),
			types: Vec::new(),
			description: None,
			readable: false,
			writable: false,
			required: None,
			identifier: None,
			link: false,
			link_class: None,
			readable_link: None,
			writable_link: None,
			iri: None,
			security: None,
			groups: Vec::new(),
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn builtin_types(&self) -> &[TypeInfo] {
		&self.builtin_types
	}

	/// First builtin type, if any was discovered
	pub fn primary_type(&self) -> Option<&TypeInfo> {
		self.builtin_types.first()
	}

	pub fn types(&self) -> &[String] {
		&self.types
	}

	pub fn description(&self) -> Option<&str> {
		self.description.as_deref()
	}

	pub fn is_readable(&self) -> bool {
		self.readable
	}

	pub fn is_writable(&self) -> bool {
		self.writable
	}

	/// Explicit required flag; `None` when no factory decided
	pub fn required(&self) -> Option<bool> {
		self.required
	}

	pub fn is_required(&self) -> bool {
		self.required.unwrap_or(false)
	}

	pub fn identifier(&self) -> Option<bool> {
		self.identifier
	}

	pub fn is_identifier(&self) -> bool {
		self.identifier.unwrap_or(false)
	}

	/// Whether the property holds another resource
	pub fn is_link(&self) -> bool {
		self.link
	}

	pub fn link_class(&self) -> Option<&str> {
		self.link_class.as_deref()
	}

	/// Whether the related value is a collection of resources
	pub fn is_collection(&self) -> bool {
		self.builtin_types.iter().any(|t| t.collection)
	}

	pub fn readable_link(&self) -> Option<bool> {
		self.readable_link
	}

	/// Embed related resources when normalizing
	pub fn is_readable_link(&self) -> bool {
		self.readable_link.unwrap_or(false)
	}

	pub fn writable_link(&self) -> Option<bool> {
		self.writable_link
	}

	/// Accept nested documents instead of IRIs when denormalizing
	pub fn is_writable_link(&self) -> bool {
		self.writable_link.unwrap_or(false)
	}

	pub fn iri(&self) -> Option<&str> {
		self.iri.as_deref()
	}

	pub fn security(&self) -> Option<&str> {
		self.security.as_deref()
	}

	/// Serialization groups this property belongs to
	pub fn groups(&self) -> &[String] {
		&self.groups
	}

	pub fn with_builtin_types(mut self, types: Vec<TypeInfo>) -> Self {
		self.builtin_types = types;
		self
	}

	pub fn with_types(mut self, types: Vec<String>) -> Self {
		self.types = types;
		self
	}

	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}

	pub fn with_readable(mut self, readable: bool) -> Self {
		self.readable = readable;
		self
	}

	pub fn with_writable(mut self, writable: bool) -> Self {
		self.writable = writable;
		self
	}

	pub fn with_required(mut self, required: bool) -> Self {
		self.required = Some(required);
		self
	}

	pub fn with_identifier(mut self, identifier: bool) -> Self {
		self.identifier = Some(identifier);
		self
	}

	pub fn with_link(mut self, link: bool) -> Self {
		self.link = link;
		self
	}

	pub fn with_link_class(mut self, class: impl Into<String>) -> Self {
		self.link_class = Some(class.into());
		self
	}

	pub fn with_readable_link(mut self, readable_link: bool) -> Self {
		self.readable_link = Some(readable_link);
		self
	}

	pub fn with_writable_link(mut self, writable_link: bool) -> Self {
		self.writable_link = Some(writable_link);
		self
	}

	pub fn with_iri(mut self, iri: impl Into<String>) -> Self {
		self.iri = Some(iri.into());
		self
	}

	pub fn with_security(mut self, security: impl Into<String>) -> Self {
		self.security = Some(security.into());
		self
	}

	pub fn with_groups(mut self, groups: Vec<String>) -> Self {
		self.groups = groups;
		self
	}

	/// Combine two discoveries of the same property
	///
	/// Boolean flags are OR-ed; the first non-empty value wins for the rest.
	pub fn merge(mut self, other: PropertyMetadata) -> Self {
		self.readable |= other.readable;
		self.writable |= other.writable;
		self.link |= other.link;
		if self.builtin_types.is_empty() {
			self.builtin_types = other.builtin_types;
		}
		if self.types.is_empty() {
			self.types = other.types;
		}
		self.description = self.description.or(other.description);
		self.required = self.required.or(other.required);
		self.identifier = self.identifier.or(other.identifier);
		self.link_class = self.link_class.or(other.link_class);
		self.readable_link = self.readable_link.or(other.readable_link);
		self.writable_link = self.writable_link.or(other.writable_link);
		self.iri = self.iri.or(other.iri);
		self.security = self.security.or(other.security);
		if self.groups.is_empty() {
			self.groups = other.groups;
		}
		self
	}
}
