//! Tracing subscriber bootstrap
//!
//! ```no_run
//! use armature::conf::LoggingSettings;
//!
//! armature::logging::init(&LoggingSettings::default()).unwrap();
//! tracing::info!("API starting");
//! ```

use armature_conf::LoggingSettings;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
	#[error("Invalid log filter \"{directive}\": {source}")]
	InvalidFilter {
		directive: String,
		#[source]
		source: tracing_subscriber::filter::ParseError,
	},
}

/// Filter from `RUST_LOG` when set, otherwise from the configured level
fn build_filter(level: &str, env: Option<String>) -> Result<EnvFilter, LoggingError> {
	let directive = env
		.filter(|value| !value.trim().is_empty())
		.unwrap_or_else(|| level.to_string());
	EnvFilter::try_new(&directive).map_err(|source| LoggingError::InvalidFilter {
		directive,
		source,
	})
}

/// Install the global subscriber described by `settings`
///
/// Returns `false` when a global subscriber was already installed; calling
/// this more than once is harmless.
pub fn init(settings: &LoggingSettings) -> Result<bool, LoggingError> {
	let filter = build_filter(&settings.level, std::env::var("RUST_LOG").ok())?;
	let registry = tracing_subscriber::registry().with(filter);
	let installed = if settings.json {
		registry.with(fmt::layer().json()).try_init().is_ok()
	} else {
		registry.with(fmt::layer()).try_init().is_ok()
	};
	if !installed {
		tracing::debug!("A global tracing subscriber is already installed");
	}
	Ok(installed)
}
