//! # armature-serializer
//!
//! Conversion between resources and response documents.
//!
//! [`ItemNormalizer`] holds the shared algorithm: which properties are
//! readable (groups, per-object `security`), whether a related resource is
//! embedded or replaced by its IRI, and how a request body is written back
//! onto a resource. Format normalizers wrap its output in their envelope:
//!
//! - [`json`]: plain attributes
//! - [`jsonld`]: JSON-LD / Hydra, plus context documents
//! - [`hal`]: `_links` and `_embedded`
//! - [`jsonapi`]: `data`, `relationships` and `included`
//!
//! [`ResourceSerializer`] dispatches on the negotiated format and is the
//! [`armature_state::ResourceDenormalizer`] of the provider pipeline.

pub mod context;
pub mod error;
pub mod hal;
pub mod item;
pub mod json;
pub mod jsonapi;
pub mod jsonld;
pub mod normalizer;
pub mod serializer;
pub mod view;

#[cfg(test)]
mod test_support;

pub use context::NormalizationContext;
pub use error::normalize_error;
pub use item::{Attribute, ItemNormalizer, Relation};
pub use jsonld::ContextBuilder;
pub use normalizer::FormatNormalizer;
pub use serializer::ResourceSerializer;
pub use view::PageLinks;
