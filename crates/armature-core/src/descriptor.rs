//! Compile-time class descriptors
//!
//! A [`ClassDescriptor`] is the static table the derive macros emit for every
//! resource struct: its fields, accessor methods, declared API attributes and
//! validation constraints. Metadata factories read descriptors instead of
//! reflecting over live objects.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Visibility of a field or accessor method
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
	#[default]
	Public,
	Private,
}

/// Builtin type of a property value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuiltinType {
	String,
	Int,
	Float,
	Bool,
	DateTime,
	Object,
	Array,
	Mixed,
}

impl BuiltinType {
	pub fn as_str(&self) -> &'static str {
		match self {
			BuiltinType::String => "string",
			BuiltinType::Int => "int",
			BuiltinType::Float => "float",
			BuiltinType::Bool => "bool",
			BuiltinType::DateTime => "datetime",
			BuiltinType::Object => "object",
			BuiltinType::Array => "array",
			BuiltinType::Mixed => "mixed",
		}
	}
}

/// Type of a declared property, as seen by the derive macro
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeInfo {
	pub builtin: BuiltinType,
	pub nullable: bool,
	pub collection: bool,
	/// Target resource class for object-typed properties
	pub class: Option<String>,
}

impl TypeInfo {
	pub fn new(builtin: BuiltinType) -> Self {
		Self {
			builtin,
			nullable: false,
			collection: false,
			class: None,
		}
	}

	pub fn with_nullable(mut self, nullable: bool) -> Self {
		self.nullable = nullable;
		self
	}

	pub fn with_collection(mut self, collection: bool) -> Self {
		self.collection = collection;
		self
	}

	pub fn with_class(mut self, class: impl Into<String>) -> Self {
		self.class = Some(class.into());
		self
	}
}

/// Explicit `#[api(...)]` declaration on a field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiPropertyDeclaration {
	pub description: Option<String>,
	pub readable: Option<bool>,
	pub writable: Option<bool>,
	pub required: Option<bool>,
	pub identifier: Option<bool>,
	pub iri: Option<String>,
	pub readable_link: Option<bool>,
	pub writable_link: Option<bool>,
	pub security: Option<String>,
	pub groups: Vec<String>,
}

/// Validation constraint attached to a property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConstraintKind {
	NotBlank,
	NotNull,
	Email,
	Length {
		min: Option<usize>,
		max: Option<usize>,
	},
}

impl ConstraintKind {
	/// Stable identifier, used to configure the "required" constraint set
	pub fn name(&self) -> &'static str {
		match self {
			ConstraintKind::NotBlank => "not_blank",
			ConstraintKind::NotNull => "not_null",
			ConstraintKind::Email => "email",
			ConstraintKind::Length { .. } => "length",
		}
	}
}

/// Default validation group name
pub const DEFAULT_GROUP: &str = "Default";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintDeclaration {
	pub kind: ConstraintKind,
	/// Validation groups; empty means the default group
	#[serde(default)]
	pub groups: Vec<String>,
}

impl ConstraintDeclaration {
	pub fn new(kind: ConstraintKind) -> Self {
		Self {
			kind,
			groups: Vec::new(),
		}
	}

	pub fn with_groups(mut self, groups: Vec<String>) -> Self {
		self.groups = groups;
		self
	}

	/// Whether this constraint belongs to `group`
	pub fn in_group(&self, group: &str) -> bool {
		if self.groups.is_empty() {
			group == DEFAULT_GROUP
		} else {
			self.groups.iter().any(|g| g == group)
		}
	}
}

/// One field of a resource struct
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
	pub name: String,
	pub visibility: Visibility,
	pub type_info: TypeInfo,
	pub attribute: Option<ApiPropertyDeclaration>,
	#[serde(default)]
	pub constraints: Vec<ConstraintDeclaration>,
}

impl PropertyDescriptor {
	pub fn new(name: impl Into<String>, type_info: TypeInfo) -> Self {
		Self {
			name: name.into(),
			visibility: Visibility::Public,
			type_info,
			attribute: None,
			constraints: Vec::new(),
		}
	}

	pub fn with_visibility(mut self, visibility: Visibility) -> Self {
		self.visibility = visibility;
		self
	}

	pub fn with_attribute(mut self, attribute: ApiPropertyDeclaration) -> Self {
		self.attribute = Some(attribute);
		self
	}

	pub fn with_constraint(mut self, constraint: ConstraintDeclaration) -> Self {
		self.constraints.push(constraint);
		self
	}
}

/// One inherent method recorded by `#[api_accessors]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDescriptor {
	pub name: String,
	/// Total parameter count, receiver excluded
	pub parameters: usize,
	/// Parameters that are not `Option<_>`
	pub required_parameters: usize,
	pub visibility: Visibility,
}

impl MethodDescriptor {
	pub fn new(name: impl Into<String>, parameters: usize, required_parameters: usize) -> Self {
		Self {
			name: name.into(),
			parameters,
			required_parameters,
			visibility: Visibility::Public,
		}
	}
}

/// Declared parameter of an operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterDeclaration {
	pub key: String,
	/// `query`, `header` or `path`
	pub location: Option<String>,
	pub required: bool,
	pub default: Option<Value>,
	pub security: Option<String>,
	pub security_message: Option<String>,
	pub provider: Option<String>,
	pub property: Option<String>,
	pub description: Option<String>,
}

/// Declared operation on a resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationDeclaration {
	pub name: Option<String>,
	pub method: String,
	pub collection: bool,
	pub uri_template: Option<String>,
	pub security: Option<String>,
	pub security_message: Option<String>,
	pub security_post_denormalize: Option<String>,
	pub security_post_denormalize_message: Option<String>,
	pub normalization_groups: Option<Vec<String>>,
	pub denormalization_groups: Option<Vec<String>>,
	pub validation_groups: Option<Vec<String>>,
	pub filters: Option<Vec<String>>,
	pub paginated: Option<bool>,
	pub items_per_page: Option<u64>,
	pub input_formats: Option<IndexMap<String, Vec<String>>>,
	pub output_formats: Option<IndexMap<String, Vec<String>>>,
	pub allow_create: Option<bool>,
	pub status: Option<u16>,
	pub read: Option<bool>,
	pub deserialize: Option<bool>,
	pub validate: Option<bool>,
	pub write: Option<bool>,
	pub input: Option<String>,
	pub output: Option<String>,
	pub provider: Option<String>,
	pub processor: Option<String>,
	pub parameters: Vec<ParameterDeclaration>,
}

impl OperationDeclaration {
	pub fn new(method: impl Into<String>, collection: bool) -> Self {
		Self {
			method: method.into(),
			collection,
			..Default::default()
		}
	}

	pub fn get() -> Self {
		Self::new("GET", false)
	}

	pub fn get_collection() -> Self {
		Self::new("GET", true)
	}

	pub fn post() -> Self {
		Self::new("POST", true)
	}

	pub fn put() -> Self {
		Self::new("PUT", false)
	}

	pub fn patch() -> Self {
		Self::new("PATCH", false)
	}

	pub fn delete() -> Self {
		Self::new("DELETE", false)
	}

	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	pub fn with_uri_template(mut self, template: impl Into<String>) -> Self {
		self.uri_template = Some(template.into());
		self
	}

	pub fn with_security(mut self, expression: impl Into<String>) -> Self {
		self.security = Some(expression.into());
		self
	}

	pub fn with_security_post_denormalize(mut self, expression: impl Into<String>) -> Self {
		self.security_post_denormalize = Some(expression.into());
		self
	}

	pub fn with_parameter(mut self, parameter: ParameterDeclaration) -> Self {
		self.parameters.push(parameter);
		self
	}
}

/// Resource-level declaration (`#[api(...)]` on the struct, or user configuration)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceDeclaration {
	pub short_name: Option<String>,
	pub description: Option<String>,
	pub iri: Option<String>,
	pub uri_template: Option<String>,
	/// `None` means the default CRUD set
	pub operations: Option<Vec<OperationDeclaration>>,
	pub normalization_groups: Option<Vec<String>>,
	pub denormalization_groups: Option<Vec<String>>,
	pub validation_groups: Option<Vec<String>>,
	pub filters: Vec<String>,
	pub security: Option<String>,
	pub security_message: Option<String>,
	pub security_post_denormalize: Option<String>,
	pub paginated: Option<bool>,
	pub items_per_page: Option<u64>,
	pub formats: Option<IndexMap<String, Vec<String>>>,
	pub provider: Option<String>,
	pub processor: Option<String>,
}

impl ResourceDeclaration {
	/// Overlay `other` on top of `self`; set fields in `other` win
	pub fn merge(mut self, other: &ResourceDeclaration) -> Self {
		macro_rules! overlay {
			($($field:ident),*) => {
				$(if other.$field.is_some() {
					self.$field = other.$field.clone();
				})*
			};
		}
		overlay!(
			short_name,
			description,
			iri,
			uri_template,
			operations,
			normalization_groups,
			denormalization_groups,
			validation_groups,
			security,
			security_message,
			security_post_denormalize,
			paginated,
			items_per_page,
			formats,
			provider,
			processor
		);
		for filter in &other.filters {
			if !self.filters.contains(filter) {
				self.filters.push(filter.clone());
			}
		}
		self
	}
}

/// Static description of a resource struct
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDescriptor {
	/// Fully qualified class name (`module::path::Book`)
	pub name: String,
	pub short_name: String,
	pub description: Option<String>,
	pub iri: Option<String>,
	pub properties: Vec<PropertyDescriptor>,
	pub methods: Vec<MethodDescriptor>,
	/// `None` for plain classes that are not exposed as resources
	pub resource: Option<ResourceDeclaration>,
}

impl ClassDescriptor {
	pub fn new(name: impl Into<String>, short_name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			short_name: short_name.into(),
			description: None,
			iri: None,
			properties: Vec::new(),
			methods: Vec::new(),
			resource: None,
		}
	}

	pub fn with_property(mut self, property: PropertyDescriptor) -> Self {
		self.properties.push(property);
		self
	}

	pub fn with_method(mut self, method: MethodDescriptor) -> Self {
		self.methods.push(method);
		self
	}

	pub fn with_resource(mut self, resource: ResourceDeclaration) -> Self {
		self.resource = Some(resource);
		self
	}

	pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
		self.properties.iter().find(|p| p.name == name)
	}

	pub fn is_resource(&self) -> bool {
		self.resource.is_some()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_constraint_default_group_membership() {
		let implicit = ConstraintDeclaration::new(ConstraintKind::NotBlank);
		let explicit = ConstraintDeclaration::new(ConstraintKind::NotBlank)
			.with_groups(vec!["create".to_string()]);

		assert!(implicit.in_group(DEFAULT_GROUP));
		assert!(!implicit.in_group("create"));
		assert!(explicit.in_group("create"));
		assert!(!explicit.in_group(DEFAULT_GROUP));
	}

	#[rstest]
	fn test_resource_declaration_merge_overlays_set_fields() {
		// Arrange
		let declared = ResourceDeclaration {
			short_name: Some("Book".to_string()),
			description: Some("A book".to_string()),
			filters: vec!["book.search".to_string()],
			..Default::default()
		};
		let configured = ResourceDeclaration {
			description: Some("Configured".to_string()),
			filters: vec!["book.search".to_string(), "book.order".to_string()],
			..Default::default()
		};

		// Act
		let merged = declared.merge(&configured);

		// Assert
		assert_eq!(merged.short_name.as_deref(), Some("Book"));
		assert_eq!(merged.description.as_deref(), Some("Configured"));
		assert_eq!(merged.filters, vec!["book.search", "book.order"]);
	}

	#[rstest]
	fn test_operation_declaration_deserializes_from_config() {
		let json = serde_json::json!({
			"method": "GET",
			"collection": true,
			"filters": ["book.search"]
		});

		let op: OperationDeclaration = serde_json::from_value(json).unwrap();

		assert_eq!(op.method, "GET");
		assert!(op.collection);
		assert_eq!(op.filters, Some(vec!["book.search".to_string()]));
		assert!(op.parameters.is_empty());
	}
}
