//! # Armature
//!
//! A metadata-driven hypermedia API framework. Resource structs derive
//! [`ApiResource`](prelude::ApiResource); the framework derives their
//! metadata, routes, CRUD operations and JSON-LD/Hydra, HAL, JSON:API or
//! plain JSON representations from it.
//!
//! ## Crates
//!
//! - [`core`]: resource object model, class registry, error taxonomy
//! - [`conf`]: layered settings
//! - [`metadata`]: property, class and resource metadata factories
//! - [`state`]: requests, the provider pipeline and write processors
//! - [`iri`]: router and IRI conversion
//! - [`filters`]: search, date and order filters over a query fragment
//! - [`serializer`]: format normalizers and error documents
//! - [`memory`]: in-memory persistence backend (feature `memory`, default)
//!
//! ## Quick Example
//!
//! ```
//! use armature::prelude::*;
//!
//! #[derive(Debug, Clone, Default, ApiResource)]
//! struct Book {
//! 	pub id: i64,
//! 	#[api(not_blank)]
//! 	pub title: String,
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let kernel = ApiKernel::builder(ApiSettings::default())
//! 	.with_resource::<Book>()
//! 	.build()
//! 	.unwrap();
//!
//! let request = ApiRequest::post("/books")
//! 	.with_header(http::header::CONTENT_TYPE, http::HeaderValue::from_static("application/ld+json"))
//! 	.with_body(r#"{"title": "Foundation"}"#);
//! let response = kernel.handle(request).await;
//!
//! assert_eq!(response.status, http::StatusCode::CREATED);
//! assert_eq!(response.json().unwrap()["@id"], "/books/1");
//! # });
//! ```

extern crate self as armature;

pub use armature_conf as conf;
pub use armature_core as core;
pub use armature_filters as filters;
#[cfg(feature = "memory")]
pub use armature_memory as memory;
pub use armature_metadata as metadata;
pub use armature_serializer as serializer;
pub use armature_state as state;
pub use armature_iri as iri;

pub mod builder;
pub mod entrypoint;
pub mod kernel;
pub mod logging;
pub mod response;

pub use builder::{ApiKernelBuilder, FilterServices};
pub use kernel::ApiKernel;
pub use response::ApiResponse;

/// Everything a typical application imports
pub mod prelude {
	pub use crate::builder::{ApiKernelBuilder, FilterServices};
	pub use crate::kernel::ApiKernel;
	pub use crate::response::ApiResponse;
	pub use armature_conf::ApiSettings;
	pub use armature_core::{ApiResource, Error, PropertyValue, ResourceClass, Result};
	pub use armature_macros::{ApiResource, api_accessors};
	pub use armature_state::{
		ApiRequest, OperationContext, Persister, Processor, Provider, StateData, UriVariables,
		UserToken,
	};
	pub use async_trait::async_trait;
}
