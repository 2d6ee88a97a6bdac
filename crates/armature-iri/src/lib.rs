//! # armature-iri
//!
//! Addressing of resources:
//!
//! - [`router`]: URI templates, path matching and IRI generation
//! - [`extractor`]: identifier values read off resource instances
//! - [`converter`]: the [`IriConverter`] mapping items and classes to IRIs
//!
//! ## Example
//!
//! ```
//! use armature_iri::router::UriTemplate;
//! use indexmap::IndexMap;
//!
//! let template = UriTemplate::parse("/editions/{id}").unwrap();
//! let mut parameters = IndexMap::new();
//! parameters.insert("id".to_string(), "isbn=978;number=2".to_string());
//! assert_eq!(template.expand(&parameters).unwrap(), "/editions/isbn=978;number=2");
//! ```

pub mod converter;
pub mod extractor;
pub mod router;

pub use converter::{DefaultIriConverter, IriConverter, UrlReferenceType};
pub use extractor::IdentifiersExtractor;
pub use router::{Route, RouteMatch, Router, UriTemplate};
