//! Settings builder merging layered sources

use crate::settings::ApiSettings;
use crate::sources::{ConfigSource, EnvSource, SourceError, TomlFileSource};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Errors raised while assembling settings
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
	#[error("Failed to load {source_description}: {error}")]
	Source {
		source_description: String,
		#[source]
		error: SourceError,
	},

	#[error("Invalid settings: {0}")]
	Invalid(String),
}

impl From<SettingsError> for armature_core::Error {
	fn from(error: SettingsError) -> Self {
		armature_core::Error::Configuration(error.to_string())
	}
}

/// Deep-merge `overlay` into `base`; objects merge key by key, anything else replaces
pub fn merge_values(base: &mut Value, overlay: Value) {
	match (base, overlay) {
		(Value::Object(base_map), Value::Object(overlay_map)) => {
			for (key, value) in overlay_map {
				match base_map.get_mut(&key) {
					Some(existing) => merge_values(existing, value),
					None => {
						base_map.insert(key, value);
					}
				}
			}
		}
		(base, overlay) => *base = overlay,
	}
}

/// Builder that layers configuration sources by priority
///
/// # Examples
///
/// ```
/// use armature_conf::builder::SettingsBuilder;
/// use armature_conf::sources::DefaultSource;
/// use serde_json::json;
///
/// let settings = SettingsBuilder::new()
///     .add_source(DefaultSource::new().with_value("title", json!("Library")))
///     .build()
///     .unwrap();
/// assert_eq!(settings.title, "Library");
/// ```
#[derive(Default)]
pub struct SettingsBuilder {
	sources: Vec<Box<dyn ConfigSource>>,
}

impl SettingsBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Standard layering: `armature.toml` (if present) then `ARMATURE_*` variables
	pub fn standard(path: impl Into<PathBuf>) -> Self {
		Self::new()
			.add_source(TomlFileSource::new(path))
			.add_source(EnvSource::new())
	}

	pub fn add_source<S: ConfigSource + 'static>(mut self, source: S) -> Self {
		self.sources.push(Box::new(source));
		self
	}

	pub fn add_boxed_source(mut self, source: Box<dyn ConfigSource>) -> Self {
		self.sources.push(source);
		self
	}

	/// Load every source, merge them by ascending priority and deserialize
	pub fn build(mut self) -> Result<ApiSettings, SettingsError> {
		// Stable sort keeps insertion order among equal priorities
		self.sources.sort_by_key(|s| s.priority());

		let mut merged = Value::Object(Map::new());
		for source in &self.sources {
			let loaded = source.load().map_err(|error| SettingsError::Source {
				source_description: source.description(),
				error,
			})?;
			tracing::debug!(
				source = %source.description(),
				keys = loaded.len(),
				"settings source loaded"
			);
			let overlay: Map<String, Value> = loaded.into_iter().collect();
			merge_values(&mut merged, Value::Object(overlay));
		}

		let settings: ApiSettings =
			serde_json::from_value(merged).map_err(|e| SettingsError::Invalid(e.to_string()))?;
		if !matches!(settings.validator.validation_error_status, 400 | 422) {
			return Err(SettingsError::Invalid(format!(
				"validator.validation_error_status must be 400 or 422, got {}",
				settings.validator.validation_error_status
			)));
		}
		if settings.pagination.items_per_page == 0 {
			return Err(SettingsError::Invalid(
				"pagination.items_per_page must be greater than zero".to_string(),
			));
		}
		Ok(settings)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::sources::DefaultSource;
	use rstest::rstest;
	use serde_json::json;
	use serial_test::serial;
	use std::io::Write;

	#[rstest]
	fn test_merge_values_is_deep() {
		let mut base = json!({"pagination": {"enabled": true, "items_per_page": 30}});

		merge_values(&mut base, json!({"pagination": {"items_per_page": 10}}));

		assert_eq!(base, json!({"pagination": {"enabled": true, "items_per_page": 10}}));
	}

	#[rstest]
	fn test_higher_priority_wins_regardless_of_order() {
		// Arrange
		let temp_dir = tempfile::TempDir::new().unwrap();
		let path = temp_dir.path().join("armature.toml");
		let mut file = std::fs::File::create(&path).unwrap();
		writeln!(file, "title = \"From file\"\n[pagination]\nitems_per_page = 5").unwrap();

		// Act
		let settings = SettingsBuilder::new()
			.add_source(
				EnvSource::new().with_vars([("ARMATURE_PAGINATION__ITEMS_PER_PAGE", "7")]),
			)
			.add_source(TomlFileSource::new(&path))
			.add_source(DefaultSource::new().with_value("title", json!("Default")))
			.build()
			.unwrap();

		// Assert
		assert_eq!(settings.title, "From file");
		assert_eq!(settings.pagination.items_per_page, 7);
		assert!(settings.pagination.enabled);
	}

	#[rstest]
	#[serial(armature_env)]
	fn test_process_environment_source() {
		// SAFETY: environment mutation is serialized by #[serial]
		unsafe {
			std::env::set_var("ARMATURE_SERIALIZER__MAX_EMBED_DEPTH", "3");
		}

		let settings = SettingsBuilder::new().add_source(EnvSource::new()).build();

		// SAFETY: environment mutation is serialized by #[serial]
		unsafe {
			std::env::remove_var("ARMATURE_SERIALIZER__MAX_EMBED_DEPTH");
		}
		assert_eq!(settings.unwrap().serializer.max_embed_depth, 3);
	}

	#[rstest]
	fn test_invalid_validation_status_is_rejected() {
		let result = SettingsBuilder::new()
			.add_source(
				DefaultSource::new().with_value("validator", json!({"validation_error_status": 418})),
			)
			.build();

		assert!(matches!(result, Err(SettingsError::Invalid(_))));
	}
}
