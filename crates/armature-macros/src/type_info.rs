//! Type inference for resource fields and accessor names

use syn::{GenericArgument, PathArguments, Type};

/// Builtin classification of a Rust type, mirrored by `armature_core::BuiltinType`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Builtin {
	String,
	Int,
	Float,
	Bool,
	DateTime,
	Object,
	Mixed,
}

impl Builtin {
	pub(crate) fn variant_name(&self) -> &'static str {
		match self {
			Builtin::String => "String",
			Builtin::Int => "Int",
			Builtin::Float => "Float",
			Builtin::Bool => "Bool",
			Builtin::DateTime => "DateTime",
			Builtin::Object => "Object",
			Builtin::Mixed => "Mixed",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldType {
	pub builtin: Builtin,
	pub nullable: bool,
	pub collection: bool,
}

fn last_segment(ty: &Type) -> Option<&syn::PathSegment> {
	match ty {
		Type::Path(type_path) => type_path.path.segments.last(),
		Type::Reference(reference) => last_segment(&reference.elem),
		_ => None,
	}
}

fn first_generic(segment: &syn::PathSegment) -> Option<&Type> {
	if let PathArguments::AngleBracketed(args) = &segment.arguments
		&& let Some(GenericArgument::Type(inner)) = args.args.first()
	{
		return Some(inner);
	}
	None
}

/// Inner type of `Option<T>`, if `ty` is an option
pub(crate) fn option_inner(ty: &Type) -> Option<&Type> {
	let segment = last_segment(ty)?;
	if segment.ident == "Option" {
		first_generic(segment)
	} else {
		None
	}
}

fn classify(name: &str) -> Builtin {
	match name {
		"String" | "str" | "char" | "Uuid" | "Cow" => Builtin::String,
		"i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32" | "u64"
		| "u128" | "usize" => Builtin::Int,
		"f32" | "f64" => Builtin::Float,
		"bool" => Builtin::Bool,
		"DateTime" | "NaiveDateTime" | "NaiveDate" | "SystemTime" => Builtin::DateTime,
		"Value" => Builtin::Mixed,
		_ => Builtin::Object,
	}
}

/// Infer the builtin type of a field
///
/// `Option<T>` marks the field nullable and `Vec<T>` marks it a collection,
/// `Box<T>` is transparent; the builtin is taken from the innermost type.
pub(crate) fn analyze(ty: &Type) -> FieldType {
	let mut nullable = false;
	let mut collection = false;
	let mut current = ty;
	loop {
		let Some(segment) = last_segment(current) else {
			return FieldType {
				builtin: Builtin::Mixed,
				nullable,
				collection,
			};
		};
		let name = segment.ident.to_string();
		match (name.as_str(), first_generic(segment)) {
			("Option", Some(inner)) => {
				nullable = true;
				current = inner;
			}
			("Vec" | "HashSet" | "BTreeSet", Some(inner)) => {
				collection = true;
				current = inner;
			}
			("Box" | "Arc" | "Rc", Some(inner)) => current = inner,
			_ => {
				return FieldType {
					builtin: classify(&name),
					nullable,
					collection,
				};
			}
		}
	}
}

/// Kind of accessor recognised by method name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AccessorKind {
	Getter,
	Setter,
}

/// Split an accessor method name into its kind and property name
///
/// Supports `get_title`/`getTitle`, `is_published`, `has_cover` and
/// `set_title`; the property name has its first letter lowercased.
pub(crate) fn accessor_property(method: &str) -> Option<(AccessorKind, String)> {
	const PREFIXES: [(&str, AccessorKind); 4] = [
		("get", AccessorKind::Getter),
		("is", AccessorKind::Getter),
		("has", AccessorKind::Getter),
		("set", AccessorKind::Setter),
	];
	for (prefix, kind) in PREFIXES {
		let Some(rest) = method.strip_prefix(prefix) else {
			continue;
		};
		let rest = match rest.strip_prefix('_') {
			Some(snake) => snake,
			None if rest.chars().next().is_some_and(|c| c.is_uppercase()) => rest,
			None => continue,
		};
		let mut chars = rest.chars();
		let Some(first) = chars.next() else {
			continue;
		};
		return Some((kind, first.to_lowercase().chain(chars).collect()));
	}
	None
}
