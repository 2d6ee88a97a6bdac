//! `#[api_accessors]` attribute macro
//!
//! Applied to an inherent impl block, records every method taking `self` so
//! metadata factories can discover readable/writable properties, and generates
//! the `AccessorDispatch` implementation used by `ApiResource`.
//!
//! ```rust,ignore
//! #[api_accessors]
//! impl Book {
//!     pub fn get_summary(&self) -> String { ... }
//!     pub fn set_summary(&mut self, summary: String) { ... }
//! }
//! ```

use crate::crate_paths::get_armature_core_crate;
use crate::type_info::{AccessorKind, accessor_property, option_inner};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{FnArg, ImplItem, ItemImpl, Pat};

struct MethodSpec {
	ident: syn::Ident,
	public: bool,
	mutable_receiver: bool,
	/// (binding type, optional)
	params: Vec<(syn::Type, bool)>,
}

impl MethodSpec {
	fn required(&self) -> usize {
		self.params.iter().filter(|(_, optional)| !optional).count()
	}
}

pub(crate) fn api_accessors_impl(item: ItemImpl) -> syn::Result<TokenStream> {
	if item.trait_.is_some() {
		return Err(syn::Error::new_spanned(
			&item.self_ty,
			"#[api_accessors] must be applied to an inherent impl block",
		));
	}
	let core = get_armature_core_crate()?;
	let self_ty = &item.self_ty;

	let mut methods = Vec::new();
	for impl_item in &item.items {
		let ImplItem::Fn(method) = impl_item else {
			continue;
		};
		let mut receiver = None;
		let mut params = Vec::new();
		for input in &method.sig.inputs {
			match input {
				FnArg::Receiver(r) => receiver = Some(r.mutability.is_some()),
				FnArg::Typed(typed) => {
					if !matches!(*typed.pat, Pat::Ident(_) | Pat::Wild(_)) {
						return Err(syn::Error::new_spanned(
							&typed.pat,
							"#[api_accessors] methods must bind parameters to plain identifiers",
						));
					}
					let optional = option_inner(&typed.ty).is_some();
					params.push(((*typed.ty).clone(), optional));
				}
			}
		}
		// Associated functions without a receiver are not accessors
		let Some(mutable_receiver) = receiver else {
			continue;
		};
		methods.push(MethodSpec {
			ident: method.sig.ident.clone(),
			public: matches!(method.vis, syn::Visibility::Public(_)),
			mutable_receiver,
			params,
		});
	}

	let descriptors = methods.iter().map(|m| {
		let name = m.ident.to_string();
		let total = m.params.len();
		let required = m.required();
		let visibility = if m.public {
			quote!(#core::Visibility::Public)
		} else {
			quote!(#core::Visibility::Private)
		};
		quote! {
			{
				let mut method = #core::MethodDescriptor::new(#name, #total, #required);
				method.visibility = #visibility;
				method
			}
		}
	});

	let mut getter_arms = Vec::new();
	let mut setter_arms = Vec::new();
	for m in methods.iter().filter(|m| m.public) {
		let Some((kind, property)) = accessor_property(&m.ident.to_string()) else {
			continue;
		};
		let ident = &m.ident;
		match kind {
			AccessorKind::Getter if m.params.is_empty() && !m.mutable_receiver => {
				getter_arms.push(quote! {
					#property => ::std::option::Option::Some(#core::resource::to_scalar_value(&self.#ident())),
				});
			}
			AccessorKind::Setter if m.mutable_receiver && m.required() == 1 && !m.params[0].1 => {
				let value_ty = &m.params[0].0;
				let rest = m.params[1..]
					.iter()
					.map(|_| quote!(::std::option::Option::None));
				setter_arms.push(quote! {
					#property => ::std::option::Option::Some(
						<#value_ty as #core::ScalarField>::from_property_value(property, value)
							.map(|converted| {
								self.#ident(converted #(, #rest)*);
							}),
					),
				});
			}
			_ => {}
		}
	}

	Ok(quote! {
		#item

		impl #core::AccessorDispatch for #self_ty {
			fn accessor_methods() -> ::std::vec::Vec<#core::MethodDescriptor> {
				::std::vec![#(#descriptors),*]
			}

			fn get_via_accessor(&self, property: &str) -> ::std::option::Option<#core::PropertyValue> {
				match property {
					#(#getter_arms)*
					_ => ::std::option::Option::None,
				}
			}

			fn set_via_accessor(
				&mut self,
				property: &str,
				value: #core::PropertyValue,
			) -> ::std::option::Option<::std::result::Result<(), #core::PropertyAccessError>> {
				match property {
					#(#setter_arms)*
					_ => {
						let _ = value;
						::std::option::Option::None
					}
				}
			}
		}
	})
}
