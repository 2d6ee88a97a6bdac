//! Parsing of `#[api(...)]` attributes

use syn::meta::ParseNestedMeta;
use syn::punctuated::Punctuated;
use syn::{LitBool, LitInt, LitStr, Token};

/// Struct-level `#[api(...)]`
#[derive(Debug, Default)]
pub(crate) struct ResourceAttr {
	pub short_name: Option<String>,
	pub description: Option<String>,
	pub iri: Option<String>,
	pub uri_template: Option<String>,
	pub operations: Option<Vec<String>>,
	pub normalization_groups: Option<Vec<String>>,
	pub denormalization_groups: Option<Vec<String>>,
	pub filters: Vec<String>,
	pub security: Option<String>,
	pub security_post_denormalize: Option<String>,
	pub paginated: Option<bool>,
	pub items_per_page: Option<u64>,
	pub accessors: bool,
	pub resource: bool,
}

/// A constraint declared on a field
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ConstraintAttr {
	NotBlank,
	NotNull,
	Email,
	Length { min: Option<usize>, max: Option<usize> },
}

/// Field-level `#[api(...)]`
#[derive(Debug, Default)]
pub(crate) struct FieldAttr {
	pub skip: bool,
	pub link: bool,
	pub declared: bool,
	pub identifier: Option<bool>,
	pub readable: Option<bool>,
	pub writable: Option<bool>,
	pub required: Option<bool>,
	pub description: Option<String>,
	pub iri: Option<String>,
	pub groups: Vec<String>,
	pub security: Option<String>,
	pub readable_link: Option<bool>,
	pub writable_link: Option<bool>,
	pub constraints: Vec<(ConstraintAttr, Vec<String>)>,
}

pub(crate) const OPERATION_NAMES: [&str; 6] =
	["get", "get_collection", "post", "put", "patch", "delete"];

fn parse_string(meta: &ParseNestedMeta<'_>) -> syn::Result<String> {
	let lit: LitStr = meta.value()?.parse()?;
	Ok(lit.value())
}

/// `flag` or `flag = true|false`
fn parse_flag(meta: &ParseNestedMeta<'_>) -> syn::Result<bool> {
	if meta.input.peek(Token![=]) {
		let lit: LitBool = meta.value()?.parse()?;
		Ok(lit.value)
	} else {
		Ok(true)
	}
}

/// `name("a", "b")`
fn parse_string_list(meta: &ParseNestedMeta<'_>) -> syn::Result<Vec<String>> {
	let content;
	syn::parenthesized!(content in meta.input);
	let items = Punctuated::<LitStr, Token![,]>::parse_terminated(&content)?;
	Ok(items.into_iter().map(|lit| lit.value()).collect())
}

impl ResourceAttr {
	pub(crate) fn parse(attrs: &[syn::Attribute]) -> syn::Result<Self> {
		let mut parsed = ResourceAttr {
			resource: true,
			..Default::default()
		};
		for attr in attrs.iter().filter(|a| a.path().is_ident("api")) {
			attr.parse_nested_meta(|meta| {
				if meta.path.is_ident("short_name") {
					parsed.short_name = Some(parse_string(&meta)?);
				} else if meta.path.is_ident("description") {
					parsed.description = Some(parse_string(&meta)?);
				} else if meta.path.is_ident("iri") {
					parsed.iri = Some(parse_string(&meta)?);
				} else if meta.path.is_ident("uri_template") {
					parsed.uri_template = Some(parse_string(&meta)?);
				} else if meta.path.is_ident("security") {
					parsed.security = Some(parse_string(&meta)?);
				} else if meta.path.is_ident("security_post_denormalize") {
					parsed.security_post_denormalize = Some(parse_string(&meta)?);
				} else if meta.path.is_ident("normalization_groups") {
					parsed.normalization_groups = Some(parse_string_list(&meta)?);
				} else if meta.path.is_ident("denormalization_groups") {
					parsed.denormalization_groups = Some(parse_string_list(&meta)?);
				} else if meta.path.is_ident("filters") {
					parsed.filters = parse_string_list(&meta)?;
				} else if meta.path.is_ident("paginated") {
					parsed.paginated = Some(parse_flag(&meta)?);
				} else if meta.path.is_ident("items_per_page") {
					let lit: LitInt = meta.value()?.parse()?;
					parsed.items_per_page = Some(lit.base10_parse()?);
				} else if meta.path.is_ident("accessors") {
					parsed.accessors = parse_flag(&meta)?;
				} else if meta.path.is_ident("resource") {
					parsed.resource = parse_flag(&meta)?;
				} else if meta.path.is_ident("operations") {
					let mut operations = Vec::new();
					meta.parse_nested_meta(|op| {
						let name = op
							.path
							.get_ident()
							.map(|i| i.to_string())
							.unwrap_or_default();
						if !OPERATION_NAMES.contains(&name.as_str()) {
							return Err(op.error(format!(
								"unknown operation `{}`, expected one of: {}",
								name,
								OPERATION_NAMES.join(", ")
							)));
						}
						operations.push(name);
						Ok(())
					})?;
					parsed.operations = Some(operations);
				} else {
					return Err(meta.error("unsupported `api` resource attribute"));
				}
				Ok(())
			})?;
		}
		Ok(parsed)
	}
}

fn parse_constraint_groups(meta: &ParseNestedMeta<'_>) -> syn::Result<Vec<String>> {
	let mut groups = Vec::new();
	if meta.input.peek(syn::token::Paren) {
		meta.parse_nested_meta(|inner| {
			if inner.path.is_ident("groups") {
				groups = parse_string_list(&inner)?;
				Ok(())
			} else {
				Err(inner.error("expected `groups(...)`"))
			}
		})?;
	}
	Ok(groups)
}

impl FieldAttr {
	pub(crate) fn parse(attrs: &[syn::Attribute]) -> syn::Result<Self> {
		let mut parsed = FieldAttr::default();
		for attr in attrs.iter().filter(|a| a.path().is_ident("api")) {
			attr.parse_nested_meta(|meta| {
				if meta.path.is_ident("skip") {
					parsed.skip = parse_flag(&meta)?;
					return Ok(());
				}
				if meta.path.is_ident("link") {
					parsed.link = parse_flag(&meta)?;
					return Ok(());
				}
				if meta.path.is_ident("not_blank") {
					let groups = parse_constraint_groups(&meta)?;
					parsed.constraints.push((ConstraintAttr::NotBlank, groups));
					return Ok(());
				}
				if meta.path.is_ident("not_null") {
					let groups = parse_constraint_groups(&meta)?;
					parsed.constraints.push((ConstraintAttr::NotNull, groups));
					return Ok(());
				}
				if meta.path.is_ident("email") {
					let groups = parse_constraint_groups(&meta)?;
					parsed.constraints.push((ConstraintAttr::Email, groups));
					return Ok(());
				}
				if meta.path.is_ident("length") {
					let (mut min, mut max, mut groups) = (None, None, Vec::new());
					meta.parse_nested_meta(|inner| {
						if inner.path.is_ident("min") {
							let lit: LitInt = inner.value()?.parse()?;
							min = Some(lit.base10_parse()?);
						} else if inner.path.is_ident("max") {
							let lit: LitInt = inner.value()?.parse()?;
							max = Some(lit.base10_parse()?);
						} else if inner.path.is_ident("groups") {
							groups = parse_string_list(&inner)?;
						} else {
							return Err(inner.error("expected `min`, `max` or `groups(...)`"));
						}
						Ok(())
					})?;
					parsed.constraints.push((ConstraintAttr::Length { min, max }, groups));
					return Ok(());
				}

				// Everything below is part of the API property declaration
				parsed.declared = true;
				if meta.path.is_ident("identifier") {
					parsed.identifier = Some(parse_flag(&meta)?);
				} else if meta.path.is_ident("readable") {
					parsed.readable = Some(parse_flag(&meta)?);
				} else if meta.path.is_ident("writable") {
					parsed.writable = Some(parse_flag(&meta)?);
				} else if meta.path.is_ident("required") {
					parsed.required = Some(parse_flag(&meta)?);
				} else if meta.path.is_ident("readable_link") {
					parsed.readable_link = Some(parse_flag(&meta)?);
				} else if meta.path.is_ident("writable_link") {
					parsed.writable_link = Some(parse_flag(&meta)?);
				} else if meta.path.is_ident("description") {
					parsed.description = Some(parse_string(&meta)?);
				} else if meta.path.is_ident("iri") {
					parsed.iri = Some(parse_string(&meta)?);
				} else if meta.path.is_ident("security") {
					parsed.security = Some(parse_string(&meta)?);
				} else if meta.path.is_ident("groups") {
					parsed.groups = parse_string_list(&meta)?;
				} else {
					return Err(meta.error("unsupported `api` field attribute"));
				}
				Ok(())
			})?;
		}
		Ok(parsed)
	}
}
