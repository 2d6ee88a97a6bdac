//! Derive macro for the ApiResource trait
//!
//! Generates the dynamic property access of `ApiResource`, the static
//! `ResourceClass` descriptor and an `inventory` registration for a struct
//! with named fields.

use crate::attrs::{ConstraintAttr, FieldAttr, ResourceAttr};
use crate::crate_paths::get_armature_core_crate;
use crate::type_info::analyze;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Fields};

struct FieldSpec<'a> {
	ident: &'a syn::Ident,
	ty: &'a syn::Type,
	public: bool,
	attr: FieldAttr,
}

/// Implementation of the ApiResource derive macro
pub(crate) fn api_resource_derive_impl(input: DeriveInput) -> syn::Result<TokenStream> {
	let struct_name = &input.ident;
	if !input.generics.params.is_empty() {
		return Err(syn::Error::new_spanned(
			&input.generics,
			"ApiResource cannot be derived for generic structs",
		));
	}

	let named = match &input.data {
		Data::Struct(data) => match &data.fields {
			Fields::Named(fields) => &fields.named,
			_ => {
				return Err(syn::Error::new_spanned(
					struct_name,
					"ApiResource can only be derived for structs with named fields",
				));
			}
		},
		_ => {
			return Err(syn::Error::new_spanned(
				struct_name,
				"ApiResource can only be derived for structs",
			));
		}
	};

	let core = get_armature_core_crate()?;
	let resource_attr = ResourceAttr::parse(&input.attrs)?;

	let mut fields = Vec::new();
	for field in named {
		let attr = FieldAttr::parse(&field.attrs)?;
		if attr.skip {
			continue;
		}
		let Some(ident) = field.ident.as_ref() else {
			continue;
		};
		fields.push(FieldSpec {
			ident,
			ty: &field.ty,
			public: matches!(field.vis, syn::Visibility::Public(_)),
			attr,
		});
	}

	let get_arms = fields.iter().map(|f| {
		let ident = f.ident;
		let ty = f.ty;
		let name = ident.to_string();
		let conversion = if f.attr.link {
			quote!(<#ty as #core::LinkField>::to_property_value(&self.#ident))
		} else {
			quote!(<#ty as #core::ScalarField>::to_property_value(&self.#ident))
		};
		quote! { #name => ::std::option::Option::Some(#conversion), }
	});

	let set_arms = fields.iter().map(|f| {
		let ident = f.ident;
		let ty = f.ty;
		let name = ident.to_string();
		let conversion = if f.attr.link {
			quote!(<#ty as #core::LinkField>::from_property_value(name, value)?)
		} else {
			quote!(<#ty as #core::ScalarField>::from_property_value(name, value)?)
		};
		quote! {
			#name => {
				self.#ident = #conversion;
				::std::result::Result::Ok(())
			}
		}
	});

	let (get_fallback, set_fallback, methods) = if resource_attr.accessors {
		(
			quote!(<Self as #core::AccessorDispatch>::get_via_accessor(self, name)),
			quote! {
				match <Self as #core::AccessorDispatch>::set_via_accessor(self, name, value) {
					::std::option::Option::Some(result) => result,
					::std::option::Option::None => ::std::result::Result::Err(
						#core::PropertyAccessError::NoSuchProperty(name.to_string()),
					),
				}
			},
			quote!(<Self as #core::AccessorDispatch>::accessor_methods()),
		)
	} else {
		(
			quote!(::std::option::Option::None),
			quote! {
				{
					let _ = value;
					::std::result::Result::Err(#core::PropertyAccessError::NoSuchProperty(name.to_string()))
				}
			},
			quote!(::std::vec::Vec::new()),
		)
	};

	let property_descriptors: Vec<TokenStream> = fields
		.iter()
		.map(|f| property_descriptor(f, &core))
		.collect();

	let short_name = resource_attr
		.short_name
		.clone()
		.unwrap_or_else(|| struct_name.to_string());
	let description = option_string(&resource_attr.description);
	let iri = option_string(&resource_attr.iri);
	let resource_declaration = resource_declaration(&resource_attr, &short_name, &core);
	let register_fn = format_ident!("__armature_register_{}", struct_name);

	Ok(quote! {
		impl #core::ApiResource for #struct_name {
			fn resource_class(&self) -> &'static str {
				<Self as #core::ResourceClass>::RESOURCE_CLASS
			}

			fn get_property(&self, name: &str) -> ::std::option::Option<#core::PropertyValue> {
				match name {
					#(#get_arms)*
					_ => #get_fallback,
				}
			}

			fn set_property(
				&mut self,
				name: &str,
				value: #core::PropertyValue,
			) -> ::std::result::Result<(), #core::PropertyAccessError> {
				match name {
					#(#set_arms)*
					_ => #set_fallback,
				}
			}

			fn clone_resource(&self) -> ::std::boxed::Box<dyn #core::ApiResource> {
				::std::boxed::Box::new(::std::clone::Clone::clone(self))
			}

			fn as_any(&self) -> &dyn ::std::any::Any {
				self
			}

			fn into_any(self: ::std::boxed::Box<Self>) -> ::std::boxed::Box<dyn ::std::any::Any> {
				self
			}
		}

		impl #core::ResourceClass for #struct_name {
			const RESOURCE_CLASS: &'static str = concat!(module_path!(), "::", stringify!(#struct_name));

			fn descriptor() -> #core::ClassDescriptor {
				let mut descriptor = #core::ClassDescriptor::new(
					<Self as #core::ResourceClass>::RESOURCE_CLASS,
					#short_name,
				);
				descriptor.description = #description;
				descriptor.iri = #iri;
				descriptor.properties = ::std::vec![#(#property_descriptors),*];
				descriptor.methods = #methods;
				descriptor.resource = #resource_declaration;
				descriptor
			}
		}

		// Allow unsafe attributes used by inventory::submit! (#[link_section])
		#[allow(unsafe_attr_outside_unsafe, non_snake_case)]
		const _: () = {
			fn #register_fn() -> ::std::boxed::Box<dyn #core::ApiResource> {
				<#struct_name as #core::ResourceClass>::instantiate()
			}

			#core::inventory::submit! {
				#core::ResourceRegistration {
					class: <#struct_name as #core::ResourceClass>::RESOURCE_CLASS,
					descriptor: <#struct_name as #core::ResourceClass>::descriptor,
					instantiate: #register_fn,
				}
			}
		};
	})
}

fn option_string(value: &Option<String>) -> TokenStream {
	match value {
		Some(v) => quote!(::std::option::Option::Some(::std::string::String::from(#v))),
		None => quote!(::std::option::Option::None),
	}
}

fn option_bool(value: Option<bool>) -> TokenStream {
	match value {
		Some(v) => quote!(::std::option::Option::Some(#v)),
		None => quote!(::std::option::Option::None),
	}
}

fn string_vec(values: &[String]) -> TokenStream {
	quote!(::std::vec![#(::std::string::String::from(#values)),*])
}

fn option_string_vec(values: &Option<Vec<String>>) -> TokenStream {
	match values {
		Some(v) => {
			let list = string_vec(v);
			quote!(::std::option::Option::Some(#list))
		}
		None => quote!(::std::option::Option::None),
	}
}

fn property_descriptor(field: &FieldSpec<'_>, core: &TokenStream) -> TokenStream {
	let name = field.ident.to_string();
	let ty = field.ty;

	let type_info = if field.attr.link {
		quote! {
			#core::TypeInfo::new(#core::BuiltinType::Object)
				.with_collection(<#ty as #core::LinkField>::is_collection())
				.with_nullable(!<#ty as #core::LinkField>::is_collection())
				.with_class(<#ty as #core::LinkField>::target_class())
		}
	} else {
		let analyzed = analyze(ty);
		let builtin = format_ident!("{}", analyzed.builtin.variant_name());
		let nullable = analyzed.nullable;
		let collection = analyzed.collection;
		quote! {
			#core::TypeInfo::new(#core::BuiltinType::#builtin)
				.with_nullable(#nullable)
				.with_collection(#collection)
		}
	};

	let visibility = if field.public {
		quote!(#core::Visibility::Public)
	} else {
		quote!(#core::Visibility::Private)
	};

	let attribute = if field.attr.declared {
		let a = &field.attr;
		let description = option_string(&a.description);
		let readable = option_bool(a.readable);
		let writable = option_bool(a.writable);
		let required = option_bool(a.required);
		let identifier = option_bool(a.identifier);
		let iri = option_string(&a.iri);
		let readable_link = option_bool(a.readable_link);
		let writable_link = option_bool(a.writable_link);
		let security = option_string(&a.security);
		let groups = string_vec(&a.groups);
		quote! {
			.with_attribute(#core::ApiPropertyDeclaration {
				description: #description,
				readable: #readable,
				writable: #writable,
				required: #required,
				identifier: #identifier,
				iri: #iri,
				readable_link: #readable_link,
				writable_link: #writable_link,
				security: #security,
				groups: #groups,
			})
		}
	} else {
		quote!()
	};

	let constraints = field.attr.constraints.iter().map(|(kind, groups)| {
		let kind = match kind {
			ConstraintAttr::NotBlank => quote!(#core::ConstraintKind::NotBlank),
			ConstraintAttr::NotNull => quote!(#core::ConstraintKind::NotNull),
			ConstraintAttr::Email => quote!(#core::ConstraintKind::Email),
			ConstraintAttr::Length { min, max } => {
				let min = match min {
					Some(v) => quote!(::std::option::Option::Some(#v)),
					None => quote!(::std::option::Option::None),
				};
				let max = match max {
					Some(v) => quote!(::std::option::Option::Some(#v)),
					None => quote!(::std::option::Option::None),
				};
				quote!(#core::ConstraintKind::Length { min: #min, max: #max })
			}
		};
		let groups = string_vec(groups);
		quote! {
			.with_constraint(#core::ConstraintDeclaration::new(#kind).with_groups(#groups))
		}
	});

	quote! {
		#core::PropertyDescriptor::new(#name, #type_info)
			.with_visibility(#visibility)
			#attribute
			#(#constraints)*
	}
}

fn resource_declaration(attr: &ResourceAttr, short_name: &str, core: &TokenStream) -> TokenStream {
	if !attr.resource {
		return quote!(::std::option::Option::None);
	}
	let description = option_string(&attr.description);
	let iri = option_string(&attr.iri);
	let uri_template = option_string(&attr.uri_template);
	let security = option_string(&attr.security);
	let security_post_denormalize = option_string(&attr.security_post_denormalize);
	let normalization_groups = option_string_vec(&attr.normalization_groups);
	let denormalization_groups = option_string_vec(&attr.denormalization_groups);
	let filters = string_vec(&attr.filters);
	let paginated = option_bool(attr.paginated);
	let items_per_page = match attr.items_per_page {
		Some(v) => quote!(::std::option::Option::Some(#v)),
		None => quote!(::std::option::Option::None),
	};
	let operations = match &attr.operations {
		Some(ops) => {
			let ctors = ops.iter().map(|op| {
				let ctor = format_ident!("{}", op);
				quote!(#core::OperationDeclaration::#ctor())
			});
			quote!(::std::option::Option::Some(::std::vec![#(#ctors),*]))
		}
		None => quote!(::std::option::Option::None),
	};

	quote! {
		::std::option::Option::Some(#core::ResourceDeclaration {
			short_name: ::std::option::Option::Some(::std::string::String::from(#short_name)),
			description: #description,
			iri: #iri,
			uri_template: #uri_template,
			operations: #operations,
			normalization_groups: #normalization_groups,
			denormalization_groups: #denormalization_groups,
			filters: #filters,
			security: #security,
			security_post_denormalize: #security_post_denormalize,
			paginated: #paginated,
			items_per_page: #items_per_page,
			..::std::default::Default::default()
		})
	}
}
