//! Operations, URI variable links and parameters

use armature_conf::FormatMap;
use armature_core::{Error, ParameterDeclaration, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// HTTP method of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
	Get,
	Post,
	Put,
	Patch,
	Delete,
}

impl HttpMethod {
	pub fn as_str(&self) -> &'static str {
		match self {
			HttpMethod::Get => "GET",
			HttpMethod::Post => "POST",
			HttpMethod::Put => "PUT",
			HttpMethod::Patch => "PATCH",
			HttpMethod::Delete => "DELETE",
		}
	}

	/// Safe methods never write
	pub fn is_safe(&self) -> bool {
		matches!(self, HttpMethod::Get)
	}

	/// Methods whose request carries a body to deserialize
	pub fn has_body(&self) -> bool {
		matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
	}
}

impl fmt::Display for HttpMethod {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for HttpMethod {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		match s.to_ascii_uppercase().as_str() {
			"GET" => Ok(HttpMethod::Get),
			"POST" => Ok(HttpMethod::Post),
			"PUT" => Ok(HttpMethod::Put),
			"PATCH" => Ok(HttpMethod::Patch),
			"DELETE" => Ok(HttpMethod::Delete),
			other => Err(Error::InvalidArgument(format!(
				"Unsupported HTTP method \"{}\"",
				other
			))),
		}
	}
}

/// Binding of one URI variable to identifier properties of a class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
	pub parameter_name: String,
	pub from_class: String,
	/// Identifier properties addressed by this variable
	pub identifiers: Vec<String>,
	/// The variable holds `k=v;k=v` for several identifiers
	pub composite_identifier: bool,
}

impl Link {
	pub fn new(parameter_name: impl Into<String>, from_class: impl Into<String>) -> Self {
		Self {
			parameter_name: parameter_name.into(),
			from_class: from_class.into(),
			identifiers: Vec::new(),
			composite_identifier: false,
		}
	}

	pub fn with_identifiers(mut self, identifiers: Vec<String>) -> Self {
		self.composite_identifier = identifiers.len() > 1;
		self.identifiers = identifiers;
		self
	}
}

/// Where a parameter is read from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
	#[default]
	Query,
	Header,
	Path,
}

impl FromStr for ParameterLocation {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		match s {
			"query" => Ok(ParameterLocation::Query),
			"header" => Ok(ParameterLocation::Header),
			"path" => Ok(ParameterLocation::Path),
			other => Err(Error::InvalidArgument(format!(
				"Unknown parameter location \"{}\"",
				other
			))),
		}
	}
}

/// Request-scoped value of a parameter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum ParameterValue {
	/// The request did not carry the parameter and no default applies
	#[default]
	NotFound,
	Value(Value),
}

impl ParameterValue {
	pub fn is_found(&self) -> bool {
		matches!(self, ParameterValue::Value(_))
	}

	pub fn as_value(&self) -> Option<&Value> {
		match self {
			ParameterValue::Value(v) => Some(v),
			ParameterValue::NotFound => None,
		}
	}
}

/// A query, header or path input declared on an operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
	pub key: String,
	pub location: ParameterLocation,
	pub required: bool,
	pub default: Option<Value>,
	pub security: Option<String>,
	pub security_message: Option<String>,
	/// Name of a registered parameter provider
	pub provider: Option<String>,
	/// Property the parameter refers to, if any
	pub property: Option<String>,
	pub description: Option<String>,
	pub value: ParameterValue,
	/// Values stashed by providers for later stages
	pub extra_properties: IndexMap<String, Value>,
}

impl Parameter {
	pub fn new(key: impl Into<String>, location: ParameterLocation) -> Self {
		Self {
			key: key.into(),
			location,
			required: false,
			default: None,
			security: None,
			security_message: None,
			provider: None,
			property: None,
			description: None,
			value: ParameterValue::NotFound,
			extra_properties: IndexMap::new(),
		}
	}

	pub fn query(key: impl Into<String>) -> Self {
		Self::new(key, ParameterLocation::Query)
	}

	pub fn header(key: impl Into<String>) -> Self {
		Self::new(key, ParameterLocation::Header)
	}

	pub fn with_required(mut self, required: bool) -> Self {
		self.required = required;
		self
	}

	pub fn with_default(mut self, default: Value) -> Self {
		self.default = Some(default);
		self
	}

	pub fn with_security(mut self, expression: impl Into<String>) -> Self {
		self.security = Some(expression.into());
		self
	}

	pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
		self.provider = Some(provider.into());
		self
	}

	pub fn with_property(mut self, property: impl Into<String>) -> Self {
		self.property = Some(property.into());
		self
	}

	pub fn with_value(mut self, value: ParameterValue) -> Self {
		self.value = value;
		self
	}

	pub fn with_extra_property(mut self, key: impl Into<String>, value: Value) -> Self {
		self.extra_properties.insert(key.into(), value);
		self
	}

	pub(crate) fn from_declaration(declaration: &ParameterDeclaration) -> Result<Self> {
		let location = match &declaration.location {
			Some(location) => location.parse()?,
			None => ParameterLocation::Query,
		};
		Ok(Self {
			key: declaration.key.clone(),
			location,
			required: declaration.required,
			default: declaration.default.clone(),
			security: declaration.security.clone(),
			security_message: declaration.security_message.clone(),
			provider: declaration.provider.clone(),
			property: declaration.property.clone(),
			description: declaration.description.clone(),
			value: ParameterValue::NotFound,
			extra_properties: IndexMap::new(),
		})
	}
}

/// One named, addressable action on a resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
	/// Unique name; doubles as route name
	pub name: String,
	pub method: HttpMethod,
	/// Targets a collection rather than one item
	pub collection: bool,
	pub class: String,
	pub short_name: String,
	pub description: Option<String>,
	pub uri_template: Option<String>,
	pub uri_variables: IndexMap<String, Link>,
	pub security: Option<String>,
	pub security_message: Option<String>,
	pub security_post_denormalize: Option<String>,
	pub security_post_denormalize_message: Option<String>,
	pub normalization_groups: Option<Vec<String>>,
	pub denormalization_groups: Option<Vec<String>>,
	pub validation_groups: Option<Vec<String>>,
	/// Filter service identifiers
	pub filters: Vec<String>,
	pub paginated: Option<bool>,
	pub items_per_page: Option<u64>,
	pub input_formats: FormatMap,
	pub output_formats: FormatMap,
	/// PUT may create a missing item
	pub allow_create: bool,
	pub status: Option<u16>,
	pub read: bool,
	pub deserialize: bool,
	pub validate: bool,
	pub write: bool,
	/// Input and output class overrides
	pub input: Option<String>,
	pub output: Option<String>,
	pub provider: Option<String>,
	pub processor: Option<String>,
	pub parameters: IndexMap<String, Parameter>,
	/// Free-form attribute bag
	pub extra: IndexMap<String, Value>,
}

impl Operation {
	pub fn new(method: HttpMethod, collection: bool) -> Self {
		Self {
			name: String::new(),
			method,
			collection,
			class: String::new(),
			short_name: String::new(),
			description: None,
			uri_template: None,
			uri_variables: IndexMap::new(),
			security: None,
			security_message: None,
			security_post_denormalize: None,
			security_post_denormalize_message: None,
			normalization_groups: None,
			denormalization_groups: None,
			validation_groups: None,
			filters: Vec::new(),
			paginated: None,
			items_per_page: None,
			input_formats: FormatMap::new(),
			output_formats: FormatMap::new(),
			allow_create: false,
			status: None,
			read: !(method == HttpMethod::Post && collection),
			deserialize: method.has_body(),
			validate: method.has_body(),
			write: !method.is_safe(),
			input: None,
			output: None,
			provider: None,
			processor: None,
			parameters: IndexMap::new(),
			extra: IndexMap::new(),
		}
	}

	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = name.into();
		self
	}

	pub fn with_class(mut self, class: impl Into<String>, short_name: impl Into<String>) -> Self {
		self.class = class.into();
		self.short_name = short_name.into();
		self
	}

	pub fn with_uri_template(mut self, template: impl Into<String>) -> Self {
		self.uri_template = Some(template.into());
		self
	}

	pub fn with_uri_variable(mut self, link: Link) -> Self {
		self.uri_variables.insert(link.parameter_name.clone(), link);
		self
	}

	pub fn with_security(mut self, expression: impl Into<String>) -> Self {
		self.security = Some(expression.into());
		self
	}

	pub fn with_parameter(mut self, parameter: Parameter) -> Self {
		self.parameters.insert(parameter.key.clone(), parameter);
		self
	}

	pub fn with_filter(mut self, id: impl Into<String>) -> Self {
		self.filters.push(id.into());
		self
	}

	pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
		self.extra.insert(key.into(), value);
		self
	}

	/// A POST, or a PUT allowed to create, may find nothing to read
	pub fn may_create(&self) -> bool {
		self.method == HttpMethod::Post || (self.method == HttpMethod::Put && self.allow_create)
	}

	/// Status of a successful response
	pub fn success_status(&self) -> u16 {
		self.status.unwrap_or(match self.method {
			HttpMethod::Post => 201,
			HttpMethod::Delete => 204,
			_ => 200,
		})
	}

	/// Build an operation from its declaration; names and templates are
	/// filled in later by the resource factories
	pub fn from_declaration(declaration: &armature_core::OperationDeclaration) -> Result<Self> {
		let method: HttpMethod = declaration.method.parse()?;
		let mut operation = Operation::new(method, declaration.collection);
		operation.name = declaration.name.clone().unwrap_or_default();
		operation.uri_template = declaration.uri_template.clone();
		operation.security = declaration.security.clone();
		operation.security_message = declaration.security_message.clone();
		operation.security_post_denormalize = declaration.security_post_denormalize.clone();
		operation.security_post_denormalize_message =
			declaration.security_post_denormalize_message.clone();
		operation.normalization_groups = declaration.normalization_groups.clone();
		operation.denormalization_groups = declaration.denormalization_groups.clone();
		operation.validation_groups = declaration.validation_groups.clone();
		if let Some(filters) = &declaration.filters {
			operation.filters = filters.clone();
		}
		operation.paginated = declaration.paginated;
		operation.items_per_page = declaration.items_per_page;
		if let Some(formats) = &declaration.input_formats {
			operation.input_formats = formats.clone();
		}
		if let Some(formats) = &declaration.output_formats {
			operation.output_formats = formats.clone();
		}
		operation.allow_create = declaration.allow_create.unwrap_or(false);
		operation.status = declaration.status;
		// A POST without URI variables has nothing to read
		operation.read = declaration
			.read
			.unwrap_or(!(method == HttpMethod::Post && declaration.collection));
		operation.deserialize = declaration.deserialize.unwrap_or(method.has_body());
		operation.validate = declaration.validate.unwrap_or(method.has_body());
		operation.write = declaration.write.unwrap_or(!method.is_safe());
		operation.input = declaration.input.clone();
		operation.output = declaration.output.clone();
		operation.provider = declaration.provider.clone();
		operation.processor = declaration.processor.clone();
		for parameter in &declaration.parameters {
			let parameter = Parameter::from_declaration(parameter)?;
			operation.parameters.insert(parameter.key.clone(), parameter);
		}
		Ok(operation)
	}
}
