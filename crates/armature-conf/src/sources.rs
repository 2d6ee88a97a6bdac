//! Configuration sources for layered settings
//!
//! Sources are merged in priority order (environment variables > config
//! files > defaults). Each source yields a JSON object; nested sections are
//! nested objects.

use indexmap::IndexMap;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Trait for configuration sources
pub trait ConfigSource: Send + Sync {
	/// Load configuration from this source
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError>;

	/// Get the priority of this source (higher = more important)
	fn priority(&self) -> u8;

	/// Get a description of this source
	fn description(&self) -> String;
}

/// Error type for configuration sources
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Parse error: {0}")]
	Parse(String),

	#[error("TOML error: {0}")]
	Toml(#[from] toml::de::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("Invalid source: {0}")]
	InvalidSource(String),
}

/// Environment variable configuration source
///
/// `PREFIX_PAGINATION__ITEMS_PER_PAGE=10` becomes
/// `{"pagination": {"items_per_page": 10}}`.
pub struct EnvSource {
	prefix: String,
	separator: String,
	vars: Option<Vec<(String, String)>>,
}

impl EnvSource {
	/// Create a source reading variables that start with `ARMATURE_`
	///
	/// # Examples
	///
	/// ```
	/// use armature_conf::sources::{ConfigSource, EnvSource};
	///
	/// let source = EnvSource::new();
	/// assert_eq!(source.priority(), 100);
	/// ```
	pub fn new() -> Self {
		Self {
			prefix: "ARMATURE_".to_string(),
			separator: "__".to_string(),
			vars: None,
		}
	}

	/// Set the prefix filter for environment variables
	pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.prefix = prefix.into();
		self
	}

	/// Read from a fixed list instead of the process environment
	pub fn with_vars<I, K, V>(mut self, vars: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		self.vars = Some(
			vars.into_iter()
				.map(|(k, v)| (k.into(), v.into()))
				.collect(),
		);
		self
	}
}

impl Default for EnvSource {
	fn default() -> Self {
		Self::new()
	}
}

/// Parse an environment string into the most specific JSON value
fn parse_env_value(raw: &str) -> Value {
	let trimmed = raw.trim();
	if (trimmed.starts_with('[') && trimmed.ends_with(']'))
		|| (trimmed.starts_with('{') && trimmed.ends_with('}'))
	{
		if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
			return value;
		}
	}
	match trimmed.to_lowercase().as_str() {
		"true" | "yes" | "on" => return Value::Bool(true),
		"false" | "no" | "off" => return Value::Bool(false),
		_ => {}
	}
	if let Ok(num) = trimmed.parse::<i64>() {
		return Value::Number(num.into());
	}
	if let Ok(num) = trimmed.parse::<f64>()
		&& let Some(number) = serde_json::Number::from_f64(num)
	{
		return Value::Number(number);
	}
	Value::String(raw.to_string())
}

/// Insert `value` at the nested `path`, creating intermediate objects
fn insert_nested(config: &mut IndexMap<String, Value>, path: &[String], value: Value) {
	let Some((first, rest)) = path.split_first() else {
		return;
	};
	if rest.is_empty() {
		config.insert(first.clone(), value);
		return;
	}
	let entry = config
		.entry(first.clone())
		.or_insert_with(|| Value::Object(serde_json::Map::new()));
	insert_into_value(entry, rest, value);
}

fn insert_into_value(target: &mut Value, path: &[String], value: Value) {
	if !target.is_object() {
		*target = Value::Object(serde_json::Map::new());
	}
	let (Value::Object(map), Some((first, rest))) = (target, path.split_first()) else {
		return;
	};
	if rest.is_empty() {
		map.insert(first.clone(), value);
	} else {
		let child = map
			.entry(first.clone())
			.or_insert_with(|| Value::Object(serde_json::Map::new()));
		insert_into_value(child, rest, value);
	}
}

impl ConfigSource for EnvSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		let vars: Vec<(String, String)> = match &self.vars {
			Some(vars) => vars.clone(),
			None => std::env::vars().collect(),
		};

		let mut config = IndexMap::new();
		for (key, value) in vars {
			let Some(clean_key) = key.strip_prefix(&self.prefix) else {
				continue;
			};
			let path: Vec<String> = clean_key
				.split(self.separator.as_str())
				.map(|segment| segment.to_lowercase())
				.filter(|segment| !segment.is_empty())
				.collect();
			if path.is_empty() {
				continue;
			}
			insert_nested(&mut config, &path, parse_env_value(&value));
		}

		Ok(config)
	}

	fn priority(&self) -> u8 {
		100 // Highest priority
	}

	fn description(&self) -> String {
		format!("Environment variables (prefix: {})", self.prefix)
	}
}

/// TOML file configuration source
pub struct TomlFileSource {
	path: PathBuf,
}

impl TomlFileSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

impl ConfigSource for TomlFileSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		if !self.path.exists() {
			return Ok(IndexMap::new());
		}

		let content = fs::read_to_string(&self.path)?;
		let toml_value: toml::Value = toml::from_str(&content)?;

		// Convert TOML value to JSON value
		let json_value = serde_json::to_value(&toml_value)?;

		let map = json_value
			.as_object()
			.ok_or_else(|| SourceError::Parse("Expected table at root".to_string()))?;

		Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
	}

	fn priority(&self) -> u8 {
		50 // Medium priority
	}

	fn description(&self) -> String {
		format!("TOML file: {}", self.path.display())
	}
}

/// JSON file configuration source
pub struct JsonFileSource {
	path: PathBuf,
}

impl JsonFileSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

impl ConfigSource for JsonFileSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		if !self.path.exists() {
			return Ok(IndexMap::new());
		}

		let content = fs::read_to_string(&self.path)?;
		let json_value: Value = serde_json::from_str(&content)?;

		let map = json_value
			.as_object()
			.ok_or_else(|| SourceError::Parse("Expected object at root".to_string()))?;

		Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
	}

	fn priority(&self) -> u8 {
		50 // Medium priority
	}

	fn description(&self) -> String {
		format!("JSON file: {}", self.path.display())
	}
}

/// Default values configuration source
#[derive(Default)]
pub struct DefaultSource {
	values: IndexMap<String, Value>,
}

impl DefaultSource {
	pub fn new() -> Self {
		Self::default()
	}

	/// Add a default value for a top-level key
	///
	/// # Examples
	///
	/// ```
	/// use armature_conf::sources::{ConfigSource, DefaultSource};
	/// use serde_json::json;
	///
	/// let source = DefaultSource::new().with_value("title", json!("Library"));
	/// assert_eq!(source.load().unwrap()["title"], json!("Library"));
	/// ```
	pub fn with_value(mut self, key: impl Into<String>, value: Value) -> Self {
		self.values.insert(key.into(), value);
		self
	}
}

impl ConfigSource for DefaultSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		Ok(self.values.clone())
	}

	fn priority(&self) -> u8 {
		0 // Lowest priority
	}

	fn description(&self) -> String {
		"Default values".to_string()
	}
}

/// Auto-detect a file source from the extension
pub fn auto_source(path: impl AsRef<Path>) -> Result<Box<dyn ConfigSource>, SourceError> {
	let path = path.as_ref();
	let ext = path
		.extension()
		.and_then(|e| e.to_str())
		.ok_or_else(|| SourceError::InvalidSource("No file extension".to_string()))?;

	match ext {
		"toml" => Ok(Box::new(TomlFileSource::new(path))),
		"json" => Ok(Box::new(JsonFileSource::new(path))),
		_ => Err(SourceError::InvalidSource(format!(
			"Unsupported file extension: {}",
			ext
		))),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;
	use std::io::Write;
	use tempfile::TempDir;

	#[rstest]
	fn test_env_source_nests_double_underscore_keys() {
		// Arrange
		let source = EnvSource::new().with_vars([
			("ARMATURE_TITLE", "Library"),
			("ARMATURE_PAGINATION__ITEMS_PER_PAGE", "10"),
			("ARMATURE_PAGINATION__ENABLED", "false"),
			("ARMATURE_FORMATS", r#"{"json": ["application/json"]}"#),
			("OTHER_TITLE", "ignored"),
		]);

		// Act
		let config = source.load().unwrap();

		// Assert
		assert_eq!(config["title"], json!("Library"));
		assert_eq!(config["pagination"], json!({"items_per_page": 10, "enabled": false}));
		assert_eq!(config["formats"], json!({"json": ["application/json"]}));
		assert_eq!(config.len(), 3);
	}

	#[rstest]
	#[case("42", json!(42))]
	#[case("1.5", json!(1.5))]
	#[case("on", json!(true))]
	#[case("[1, 2]", json!([1, 2]))]
	#[case("hello, world", json!("hello, world"))]
	fn test_parse_env_value(#[case] raw: &str, #[case] expected: Value) {
		assert_eq!(parse_env_value(raw), expected);
	}

	#[rstest]
	fn test_toml_source() {
		let temp_dir = TempDir::new().unwrap();
		let config_path = temp_dir.path().join("armature.toml");
		let mut file = fs::File::create(&config_path).unwrap();
		writeln!(
			file,
			r#"
title = "Library"

[pagination]
items_per_page = 5
"#
		)
		.unwrap();

		let config = TomlFileSource::new(&config_path).load().unwrap();

		assert_eq!(config["title"], json!("Library"));
		assert_eq!(config["pagination"]["items_per_page"], json!(5));
	}

	#[rstest]
	fn test_missing_file_is_empty() {
		let config = TomlFileSource::new("/nonexistent/armature.toml").load().unwrap();

		assert!(config.is_empty());
	}

	#[rstest]
	fn test_source_priority() {
		assert_eq!(EnvSource::new().priority(), 100);
		assert_eq!(TomlFileSource::new("a.toml").priority(), 50);
		assert_eq!(DefaultSource::new().priority(), 0);
		assert!(auto_source("settings.yaml").is_err());
	}
}
