//! # armature-state
//!
//! Everything that runs per request once an operation has been selected:
//!
//! - [`request`]: the inbound request model and query string parsing
//! - [`context`]: the typed [`OperationContext`] shared by the stages
//! - [`provider`]: the [`Provider`] contract and the pipeline stages
//! - [`processor`]: the [`Processor`] contract and persistence dispatch
//! - [`negotiation`]: media types and format selection
//! - [`security`]: the security expression language and access checking
//! - [`validator`]: constraint validation
//! - [`pagination`]: page resolution from settings, operation and query
//!
//! ## Example
//!
//! ```
//! use armature_state::provider::Stage;
//!
//! let order: Vec<&str> = Stage::DEFAULT_ORDER.iter().map(Stage::as_str).collect();
//! assert_eq!(order.first(), Some(&"parameters"));
//! assert_eq!(order.last(), Some(&"read"));
//! ```

pub mod context;
pub mod data;
pub mod denormalizer;
pub mod locator;
pub mod negotiation;
pub mod pagination;
pub mod processor;
pub mod provider;
pub mod request;
pub mod security;
pub mod user;
pub mod validator;

pub use context::{OperationContext, UriVariables};
pub use data::{CollectionData, StateData};
pub use denormalizer::{DenormalizationContext, ResourceDenormalizer};
pub use locator::ServiceLocator;
pub use pagination::{PageInfo, Pagination};
pub use processor::{Persister, PersisterLocator, Processor, WriteProcessor};
pub use provider::{
	PipelineServices, Provider, ProviderLocator, Stage, build_provider_pipeline,
};
pub use request::{ApiRequest, QueryParams, parse_query};
pub use security::{ExpressionAccessChecker, ResourceAccessChecker, SecurityVariables};
pub use user::UserToken;
pub use validator::{ConstraintValidator, Validator};
