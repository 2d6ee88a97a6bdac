//! State providers and the provider pipeline
//!
//! A [`Provider`] supplies the data an operation works on. Pipeline stages are
//! providers too: each wraps an inner provider, does one job before or after
//! delegating to it, and passes operations it does not handle straight through.
//!
//! ```text
//! Parameters -> SecurityParameters -> ContentNegotiation -> Validate
//!   -> PostDenormalizeAccessCheck -> Deserialize -> AccessCheck -> Read -> backend
//! ```

pub mod access_checker;
pub mod deserialize;
pub mod negotiation;
pub mod parameter;
pub mod read;
pub mod security_parameter;
pub mod validate;

pub use access_checker::{AccessCheckEvent, AccessCheckerProvider};
pub use deserialize::DeserializeProvider;
pub use negotiation::ContentNegotiationProvider;
pub use parameter::{
	API_VALUES_KEY, ParameterProvider, ParameterProviderLocator, ParameterValueProvider,
};
pub use read::ReadProvider;
pub use security_parameter::SecurityParameterProvider;
pub use validate::ValidateProvider;

use crate::context::{OperationContext, UriVariables};
use crate::data::StateData;
use crate::denormalizer::ResourceDenormalizer;
use crate::locator::ServiceLocator;
use crate::security::ResourceAccessChecker;
use crate::validator::Validator;
use armature_conf::ApiSettings;
use armature_core::{Error, ResourceClassRegistry, Result};
use armature_metadata::Operation;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Supplies data for an operation
#[async_trait]
pub trait Provider: Send + Sync {
	async fn provide(
		&self,
		operation: &Operation,
		uri_variables: &UriVariables,
		context: &mut OperationContext,
	) -> Result<StateData>;
}

#[async_trait]
impl<T: Provider + ?Sized> Provider for Arc<T> {
	async fn provide(
		&self,
		operation: &Operation,
		uri_variables: &UriVariables,
		context: &mut OperationContext,
	) -> Result<StateData> {
		(**self).provide(operation, uri_variables, context).await
	}
}

/// Backend providers addressed by `Operation::provider` or resource class
pub type ProviderLocator = ServiceLocator<dyn Provider>;

#[async_trait]
impl Provider for ServiceLocator<dyn Provider> {
	async fn provide(
		&self,
		operation: &Operation,
		uri_variables: &UriVariables,
		context: &mut OperationContext,
	) -> Result<StateData> {
		let provider = self.resolve(operation.provider.as_deref(), &operation.class)?;
		provider.provide(operation, uri_variables, context).await
	}
}

/// One pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
	Parameters,
	SecurityParameters,
	ContentNegotiation,
	Validate,
	PostDenormalizeAccessCheck,
	Deserialize,
	AccessCheck,
	Read,
}

impl Stage {
	/// Stages outermost first
	pub const DEFAULT_ORDER: [Stage; 8] = [
		Stage::Parameters,
		Stage::SecurityParameters,
		Stage::ContentNegotiation,
		Stage::Validate,
		Stage::PostDenormalizeAccessCheck,
		Stage::Deserialize,
		Stage::AccessCheck,
		Stage::Read,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			Stage::Parameters => "parameters",
			Stage::SecurityParameters => "security_parameters",
			Stage::ContentNegotiation => "content_negotiation",
			Stage::Validate => "validate",
			Stage::PostDenormalizeAccessCheck => "post_denormalize_access_check",
			Stage::Deserialize => "deserialize",
			Stage::AccessCheck => "access_check",
			Stage::Read => "read",
		}
	}
}

impl fmt::Display for Stage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Stage {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		Stage::DEFAULT_ORDER
			.into_iter()
			.find(|stage| stage.as_str() == s)
			.ok_or_else(|| Error::Configuration(format!("Unknown pipeline stage \"{}\"", s)))
	}
}

/// Collaborators the pipeline stages are built from
#[derive(Clone)]
pub struct PipelineServices {
	pub registry: Arc<ResourceClassRegistry>,
	pub settings: Arc<ApiSettings>,
	pub access_checker: Arc<dyn ResourceAccessChecker>,
	pub validator: Arc<dyn Validator>,
	pub denormalizer: Arc<dyn ResourceDenormalizer>,
	pub parameter_providers: Arc<ParameterProviderLocator>,
}

/// Wrap `base` in `stages`, listed outermost first
///
/// A stage listed twice is built twice; a stage left out is simply absent.
pub fn build_provider_pipeline(
	base: Arc<dyn Provider>,
	stages: &[Stage],
	services: &PipelineServices,
) -> Arc<dyn Provider> {
	stages.iter().rev().fold(base, |inner, stage| {
		tracing::trace!(stage = %stage, "Adding pipeline stage");
		let provider: Arc<dyn Provider> = match stage {
			Stage::Parameters => Arc::new(ParameterProvider::new(
				inner,
				Arc::clone(&services.parameter_providers),
			)),
			Stage::SecurityParameters => Arc::new(SecurityParameterProvider::new(
				inner,
				Arc::clone(&services.access_checker),
			)),
			Stage::ContentNegotiation => Arc::new(ContentNegotiationProvider::new(
				inner,
				Arc::clone(&services.settings),
			)),
			Stage::Validate => Arc::new(ValidateProvider::new(
				inner,
				Arc::clone(&services.validator),
			)),
			Stage::PostDenormalizeAccessCheck => Arc::new(AccessCheckerProvider::new(
				inner,
				Arc::clone(&services.access_checker),
				AccessCheckEvent::PostDenormalize,
			)),
			Stage::Deserialize => Arc::new(DeserializeProvider::new(
				inner,
				Arc::clone(&services.denormalizer),
				Arc::clone(&services.registry),
				Arc::clone(&services.settings),
			)),
			Stage::AccessCheck => Arc::new(AccessCheckerProvider::new(
				inner,
				Arc::clone(&services.access_checker),
				AccessCheckEvent::Security,
			)),
			Stage::Read => Arc::new(ReadProvider::new(inner)),
		};
		provider
	})
}

#[cfg(test)]
pub(crate) mod test_support {
	//! Shared fixtures for stage tests

	use super::*;
	use armature_core::ApiResource;
	use parking_lot::Mutex;

	/// Provider returning a fixed value and recording what it saw
	#[derive(Default)]
	pub struct StubProvider {
		pub data: Mutex<StateData>,
		pub calls: Mutex<Vec<(String, UriVariables)>>,
	}

	impl StubProvider {
		pub fn returning(data: StateData) -> Arc<Self> {
			Arc::new(Self {
				data: Mutex::new(data),
				calls: Mutex::new(Vec::new()),
			})
		}

		pub fn item(item: impl ApiResource) -> Arc<Self> {
			Self::returning(StateData::Item(Box::new(item)))
		}

		pub fn call_count(&self) -> usize {
			self.calls.lock().len()
		}
	}

	#[async_trait]
	impl Provider for StubProvider {
		async fn provide(
			&self,
			operation: &Operation,
			uri_variables: &UriVariables,
			_context: &mut OperationContext,
		) -> Result<StateData> {
			self.calls
				.lock()
				.push((operation.name.clone(), uri_variables.clone()));
			Ok(self.data.lock().clone())
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("parameters", Stage::Parameters)]
	#[case("post_denormalize_access_check", Stage::PostDenormalizeAccessCheck)]
	#[case("read", Stage::Read)]
	fn test_stage_from_str(#[case] raw: &str, #[case] expected: Stage) {
		assert_eq!(raw.parse::<Stage>().unwrap(), expected);
	}

	#[rstest]
	fn test_unknown_stage() {
		assert!(matches!("persist".parse::<Stage>(), Err(Error::Configuration(_))));
	}

	#[rstest]
	fn test_stage_serde_names_match_display() {
		for stage in Stage::DEFAULT_ORDER {
			let json = serde_json::to_value(stage).unwrap();
			assert_eq!(json, stage.as_str());
		}
	}
}
