//! Helper functions for dynamic crate path resolution using proc_macro_crate

use proc_macro2::TokenStream;
use quote::quote;

/// Resolves the path to the armature core types.
///
/// Crates depending on `armature-core` directly get `::armature_core`; crates
/// depending on the facade get `::armature::core` (or the renamed facade).
pub(crate) fn get_armature_core_crate() -> syn::Result<TokenStream> {
	use proc_macro_crate::{FoundCrate, crate_name};

	match crate_name("armature-core") {
		Ok(FoundCrate::Itself) => return Ok(quote!(crate)),
		Ok(FoundCrate::Name(name)) => {
			let ident = syn::Ident::new(&name, proc_macro2::Span::call_site());
			return Ok(quote!(::#ident));
		}
		Err(_) => {}
	}

	match crate_name("armature-web") {
		Ok(FoundCrate::Itself) => Ok(quote!(::armature::core)),
		Ok(FoundCrate::Name(name)) => {
			let ident = syn::Ident::new(&name, proc_macro2::Span::call_site());
			Ok(quote!(::#ident::core))
		}
		Err(e) => Err(syn::Error::new(
			proc_macro2::Span::call_site(),
			format!(
				"failed to resolve `armature-core` or `armature-web` crate: {}. Ensure one of them is listed in Cargo.toml dependencies.",
				e
			),
		)),
	}
}
