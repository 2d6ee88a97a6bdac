//! # armature-conf
//!
//! Layered configuration for armature applications.
//!
//! Settings are assembled from [`sources::ConfigSource`]s merged by priority:
//! defaults (0), configuration files (50) and `ARMATURE_*` environment
//! variables (100). Nested sections use `__` in variable names, e.g.
//! `ARMATURE_PAGINATION__ITEMS_PER_PAGE=10`.

pub mod builder;
pub mod settings;
pub mod sources;

pub use builder::{SettingsBuilder, SettingsError};
pub use settings::{
	ApiSettings, FormatMap, LoggingSettings, MetadataSettings, PaginationSettings,
	SerializerSettings, ValidatorSettings, default_formats,
};
pub use sources::{ConfigSource, DefaultSource, EnvSource, JsonFileSource, SourceError, TomlFileSource};
