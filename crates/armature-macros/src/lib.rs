//! Procedural macros for armature
//!
//! - `#[derive(ApiResource)]`: dynamic property access, the static class
//!   descriptor and link-time registration of a resource struct
//! - `#[api_accessors]`: accessor-method discovery on an inherent impl block
//!
//! # Example
//!
//! ```rust,ignore
//! use armature::prelude::*;
//!
//! #[derive(Debug, Clone, Default, ApiResource)]
//! #[api(short_name = "Book", operations(get, get_collection, post))]
//! pub struct Book {
//!     #[api(identifier)]
//!     pub id: i64,
//!     #[api(not_blank)]
//!     pub title: String,
//!     #[api(link)]
//!     pub author: Option<Author>,
//! }
//! ```

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemImpl, parse_macro_input};

mod api_accessors;
mod api_resource_derive;
mod attrs;
mod crate_paths;
mod type_info;

/// Derive `ApiResource` and `ResourceClass` for a struct with named fields
///
/// The struct must also implement `Debug`, `Clone` and `Default`. Non-link
/// fields must be `Serialize + DeserializeOwned`; link fields (`#[api(link)]`)
/// must be `Option<T>` or `Vec<T>` of another resource.
#[proc_macro_derive(ApiResource, attributes(api))]
pub fn derive_api_resource(input: TokenStream) -> TokenStream {
	let input = parse_macro_input!(input as DeriveInput);
	api_resource_derive::api_resource_derive_impl(input)
		.unwrap_or_else(|e| e.to_compile_error())
		.into()
}

/// Record accessor methods of an inherent impl block
///
/// Pair with `#[api(accessors)]` on the struct so the derived `ApiResource`
/// falls back to the generated dispatch.
#[proc_macro_attribute]
pub fn api_accessors(_args: TokenStream, input: TokenStream) -> TokenStream {
	let item = parse_macro_input!(input as ItemImpl);
	api_accessors::api_accessors_impl(item)
		.unwrap_or_else(|e| e.to_compile_error())
		.into()
}
