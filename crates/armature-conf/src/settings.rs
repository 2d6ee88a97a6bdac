//! Typed API settings
//!
//! Every section carries serde defaults, so a partial TOML file or a handful
//! of environment variables is enough to build a complete [`ApiSettings`].

use armature_core::ResourceDeclaration;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Format name to the MIME types it is served under
pub type FormatMap = IndexMap<String, Vec<String>>;

fn format_map(entries: &[(&str, &[&str])]) -> FormatMap {
	entries
		.iter()
		.map(|(name, mimes)| {
			(
				name.to_string(),
				mimes.iter().map(|m| m.to_string()).collect(),
			)
		})
		.collect()
}

/// Default response formats, in preference order
pub fn default_formats() -> FormatMap {
	format_map(&[
		("jsonld", &["application/ld+json"]),
		("json", &["application/json"]),
		("jsonhal", &["application/hal+json"]),
		("jsonapi", &["application/vnd.api+json"]),
	])
}

fn default_patch_formats() -> FormatMap {
	format_map(&[
		("json", &["application/merge-patch+json"]),
		("jsonapi", &["application/vnd.api+json"]),
	])
}

fn default_error_formats() -> FormatMap {
	format_map(&[
		("jsonproblem", &["application/problem+json"]),
		("jsonld", &["application/ld+json"]),
		("jsonapi", &["application/vnd.api+json"]),
	])
}

/// Root settings object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
	pub title: String,
	pub description: String,
	pub version: String,
	/// Expose internal error details in 5xx responses
	pub debug: bool,
	pub formats: FormatMap,
	pub patch_formats: FormatMap,
	pub error_formats: FormatMap,
	pub pagination: PaginationSettings,
	pub serializer: SerializerSettings,
	pub validator: ValidatorSettings,
	pub metadata: MetadataSettings,
	pub logging: LoggingSettings,
	/// Per-class resource configuration, keyed by class name or short name
	pub resources: IndexMap<String, ResourceDeclaration>,
}

impl Default for ApiSettings {
	fn default() -> Self {
		Self {
			title: "API".to_string(),
			description: String::new(),
			version: "0.0.0".to_string(),
			debug: false,
			formats: default_formats(),
			patch_formats: default_patch_formats(),
			error_formats: default_error_formats(),
			pagination: PaginationSettings::default(),
			serializer: SerializerSettings::default(),
			validator: ValidatorSettings::default(),
			metadata: MetadataSettings::default(),
			logging: LoggingSettings::default(),
			resources: IndexMap::new(),
		}
	}
}

impl ApiSettings {
	/// Resource configuration for `class`, looked up by full or short name
	pub fn resource_config(&self, class: &str, short_name: &str) -> Option<&ResourceDeclaration> {
		self.resources
			.get(class)
			.or_else(|| self.resources.get(short_name))
	}

	pub fn with_resource(mut self, key: impl Into<String>, resource: ResourceDeclaration) -> Self {
		self.resources.insert(key.into(), resource);
		self
	}

	pub fn with_debug(mut self, debug: bool) -> Self {
		self.debug = debug;
		self
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationSettings {
	pub enabled: bool,
	pub items_per_page: u64,
	/// Upper bound for client-requested page sizes
	pub maximum_items_per_page: Option<u64>,
	/// Let clients disable pagination with `?pagination=false`
	pub client_enabled: bool,
	/// Let clients pick the page size with `?itemsPerPage=`
	pub client_items_per_page: bool,
	pub page_parameter_name: String,
	pub enabled_parameter_name: String,
	pub items_per_page_parameter_name: String,
	/// Skip counting the total number of items
	pub partial: bool,
}

impl Default for PaginationSettings {
	fn default() -> Self {
		Self {
			enabled: true,
			items_per_page: 30,
			maximum_items_per_page: None,
			client_enabled: false,
			client_items_per_page: false,
			page_parameter_name: "page".to_string(),
			enabled_parameter_name: "pagination".to_string(),
			items_per_page_parameter_name: "itemsPerPage".to_string(),
			partial: false,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializerSettings {
	/// How many levels of related resources may be embedded
	pub max_embed_depth: usize,
}

impl Default for SerializerSettings {
	fn default() -> Self {
		Self { max_embed_depth: 1 }
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorSettings {
	/// Constraint names that mark a property as required
	pub required_constraints: Vec<String>,
	/// Status code used for validation failures (422 or 400)
	pub validation_error_status: u16,
}

impl Default for ValidatorSettings {
	fn default() -> Self {
		Self {
			required_constraints: vec!["not_blank".to_string(), "not_null".to_string()],
			validation_error_status: 422,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataSettings {
	pub cache_enabled: bool,
}

impl Default for MetadataSettings {
	fn default() -> Self {
		Self {
			cache_enabled: true,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
	/// Default filter directive, overridden by `RUST_LOG`
	pub level: String,
	pub json: bool,
}

impl Default for LoggingSettings {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
			json: false,
		}
	}
}
