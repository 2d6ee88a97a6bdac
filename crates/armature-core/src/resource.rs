//! Dynamic resource object model
//!
//! Every struct exposed through the API implements [`ApiResource`], usually via
//! `#[derive(ApiResource)]`. The trait is object safe so the pipeline can carry
//! heterogeneous resources as `Box<dyn ApiResource>` and address their
//! properties by name.

use crate::descriptor::{ClassDescriptor, MethodDescriptor};
use crate::exception::PropertyAccessError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::Any;
use std::fmt;

/// A value read from, or written to, a resource property
#[derive(Debug, Clone)]
pub enum PropertyValue {
	/// Any non-resource value
	Scalar(Value),
	/// A single related resource
	Resource(Box<dyn ApiResource>),
	/// A collection of related resources
	Resources(Vec<Box<dyn ApiResource>>),
}

impl PropertyValue {
	pub fn null() -> Self {
		PropertyValue::Scalar(Value::Null)
	}

	pub fn is_null(&self) -> bool {
		matches!(self, PropertyValue::Scalar(Value::Null))
	}

	pub fn as_scalar(&self) -> Option<&Value> {
		match self {
			PropertyValue::Scalar(v) => Some(v),
			_ => None,
		}
	}

	pub fn as_resource(&self) -> Option<&dyn ApiResource> {
		match self {
			PropertyValue::Resource(r) => Some(r.as_ref()),
			_ => None,
		}
	}

	/// Scalar view of the value; related resources collapse to `null`
	pub fn to_scalar_lossy(&self) -> Value {
		match self {
			PropertyValue::Scalar(v) => v.clone(),
			PropertyValue::Resource(_) => Value::Null,
			PropertyValue::Resources(items) => Value::Array(vec![Value::Null; items.len()]),
		}
	}
}

impl From<Value> for PropertyValue {
	fn from(value: Value) -> Self {
		PropertyValue::Scalar(value)
	}
}

/// Scalar property value from anything serializable (accessor return values)
pub fn to_scalar_value<T: Serialize + ?Sized>(value: &T) -> PropertyValue {
	PropertyValue::Scalar(serde_json::to_value(value).unwrap_or(Value::Null))
}

/// An object exposed as an API resource
pub trait ApiResource: Any + Send + Sync + fmt::Debug {
	/// Fully qualified class name of this resource
	fn resource_class(&self) -> &'static str;

	/// Read a property by name; `None` when the class has no such property
	fn get_property(&self, name: &str) -> Option<PropertyValue>;

	/// Write a property by name
	fn set_property(&mut self, name: &str, value: PropertyValue)
	-> Result<(), PropertyAccessError>;

	fn clone_resource(&self) -> Box<dyn ApiResource>;

	fn as_any(&self) -> &dyn Any;

	fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl Clone for Box<dyn ApiResource> {
	fn clone(&self) -> Self {
		self.clone_resource()
	}
}

impl dyn ApiResource {
	pub fn downcast_ref<T: ApiResource>(&self) -> Option<&T> {
		self.as_any().downcast_ref::<T>()
	}

	/// Consume the box and recover the concrete type
	pub fn downcast<T: ApiResource>(self: Box<Self>) -> Result<Box<T>, Box<dyn Any>> {
		self.into_any().downcast::<T>()
	}
}

/// Static side of a resource struct
pub trait ResourceClass: ApiResource + Default + Sized {
	const RESOURCE_CLASS: &'static str;

	fn descriptor() -> ClassDescriptor;

	fn instantiate() -> Box<dyn ApiResource> {
		Box::new(Self::default())
	}
}

/// Accessor-method dispatch generated by `#[api_accessors]`
///
/// `get_*`, `is_*` and `has_*` methods become readable properties,
/// single-argument `set_*` methods writable ones.
pub trait AccessorDispatch {
	fn accessor_methods() -> Vec<MethodDescriptor>;

	fn get_via_accessor(&self, property: &str) -> Option<PropertyValue>;

	/// `None` when no setter exists for `property`
	fn set_via_accessor(
		&mut self,
		property: &str,
		value: PropertyValue,
	) -> Option<Result<(), PropertyAccessError>>;
}

/// Conversion for plain (non-link) fields
pub trait ScalarField: Sized {
	fn to_property_value(&self) -> PropertyValue;

	fn from_property_value(property: &str, value: PropertyValue)
	-> Result<Self, PropertyAccessError>;
}

impl<T> ScalarField for T
where
	T: Serialize + DeserializeOwned,
{
	fn to_property_value(&self) -> PropertyValue {
		PropertyValue::Scalar(serde_json::to_value(self).unwrap_or(Value::Null))
	}

	fn from_property_value(
		property: &str,
		value: PropertyValue,
	) -> Result<Self, PropertyAccessError> {
		match value {
			PropertyValue::Scalar(v) => {
				serde_json::from_value(v).map_err(|e| PropertyAccessError::TypeMismatch {
					property: property.to_string(),
					expected: short_type_name::<T>(),
					message: e.to_string(),
				})
			}
			_ => Err(PropertyAccessError::TypeMismatch {
				property: property.to_string(),
				expected: short_type_name::<T>(),
				message: "a related resource was given".to_string(),
			}),
		}
	}
}

/// Conversion for fields holding related resources
pub trait LinkField: Sized {
	fn target_class() -> &'static str;

	fn is_collection() -> bool;

	fn to_property_value(&self) -> PropertyValue;

	fn from_property_value(property: &str, value: PropertyValue)
	-> Result<Self, PropertyAccessError>;
}

fn downcast_link<T: ResourceClass>(
	property: &str,
	resource: Box<dyn ApiResource>,
) -> Result<T, PropertyAccessError> {
	let actual = resource.resource_class();
	resource
		.downcast::<T>()
		.map(|boxed| *boxed)
		.map_err(|_| PropertyAccessError::TypeMismatch {
			property: property.to_string(),
			expected: T::RESOURCE_CLASS.to_string(),
			message: format!("got an instance of \"{}\"", actual),
		})
}

fn link_mismatch(property: &str, expected: &str, message: &str) -> PropertyAccessError {
	PropertyAccessError::TypeMismatch {
		property: property.to_string(),
		expected: expected.to_string(),
		message: message.to_string(),
	}
}

impl<T> LinkField for Option<T>
where
	T: ResourceClass + Clone,
{
	fn target_class() -> &'static str {
		T::RESOURCE_CLASS
	}

	fn is_collection() -> bool {
		false
	}

	fn to_property_value(&self) -> PropertyValue {
		match self {
			Some(item) => PropertyValue::Resource(Box::new(item.clone())),
			None => PropertyValue::null(),
		}
	}

	fn from_property_value(
		property: &str,
		value: PropertyValue,
	) -> Result<Self, PropertyAccessError> {
		match value {
			PropertyValue::Scalar(Value::Null) => Ok(None),
			PropertyValue::Resource(resource) => downcast_link::<T>(property, resource).map(Some),
			_ => Err(link_mismatch(
				property,
				T::RESOURCE_CLASS,
				"expected a single related resource",
			)),
		}
	}
}

impl<T> LinkField for Vec<T>
where
	T: ResourceClass + Clone,
{
	fn target_class() -> &'static str {
		T::RESOURCE_CLASS
	}

	fn is_collection() -> bool {
		true
	}

	fn to_property_value(&self) -> PropertyValue {
		PropertyValue::Resources(
			self.iter()
				.map(|item| Box::new(item.clone()) as Box<dyn ApiResource>)
				.collect(),
		)
	}

	fn from_property_value(
		property: &str,
		value: PropertyValue,
	) -> Result<Self, PropertyAccessError> {
		match value {
			PropertyValue::Scalar(Value::Null) => Ok(Vec::new()),
			PropertyValue::Resources(items) => items
				.into_iter()
				.map(|item| downcast_link::<T>(property, item))
				.collect(),
			_ => Err(link_mismatch(
				property,
				T::RESOURCE_CLASS,
				"expected a collection of related resources",
			)),
		}
	}
}

fn short_type_name<T>() -> String {
	let full = std::any::type_name::<T>();
	// `alloc::string::String` -> `String`, generics kept as-is
	match full.find('<') {
		Some(idx) => {
			let (head, tail) = full.split_at(idx);
			format!("{}{}", head.rsplit("::").next().unwrap_or(head), tail)
		}
		None => full.rsplit("::").next().unwrap_or(full).to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::descriptor::{BuiltinType, PropertyDescriptor, TypeInfo};
	use rstest::rstest;

	#[derive(Debug, Clone, Default)]
	struct Tag {
		label: String,
	}

	impl ApiResource for Tag {
		fn resource_class(&self) -> &'static str {
			Self::RESOURCE_CLASS
		}

		fn get_property(&self, name: &str) -> Option<PropertyValue> {
			match name {
				"label" => Some(ScalarField::to_property_value(&self.label)),
				_ => None,
			}
		}

		fn set_property(
			&mut self,
			name: &str,
			value: PropertyValue,
		) -> Result<(), PropertyAccessError> {
			match name {
				"label" => {
					self.label = <String as ScalarField>::from_property_value(name, value)?;
					Ok(())
				}
				_ => Err(PropertyAccessError::NoSuchProperty(name.to_string())),
			}
		}

		fn clone_resource(&self) -> Box<dyn ApiResource> {
			Box::new(self.clone())
		}

		fn as_any(&self) -> &dyn Any {
			self
		}

		fn into_any(self: Box<Self>) -> Box<dyn Any> {
			self
		}
	}

	impl ResourceClass for Tag {
		const RESOURCE_CLASS: &'static str = "tests::Tag";

		fn descriptor() -> ClassDescriptor {
			ClassDescriptor::new(Self::RESOURCE_CLASS, "Tag")
				.with_property(PropertyDescriptor::new("label", TypeInfo::new(BuiltinType::String)))
		}
	}

	#[rstest]
	fn test_scalar_field_type_mismatch() {
		let err = <i64 as ScalarField>::from_property_value(
			"pages",
			PropertyValue::Scalar(Value::String("many".into())),
		)
		.unwrap_err();

		assert!(matches!(
			err,
			PropertyAccessError::TypeMismatch { ref property, ref expected, .. }
				if property == "pages" && expected == "i64"
		));
	}

	#[rstest]
	fn test_option_link_round_trips_through_dyn_resource() {
		// Arrange
		let tag = Some(Tag {
			label: "scifi".to_string(),
		});

		// Act
		let value = LinkField::to_property_value(&tag);
		let restored = <Option<Tag> as LinkField>::from_property_value("tag", value).unwrap();

		// Assert
		assert_eq!(restored.map(|t| t.label), Some("scifi".to_string()));
		assert_eq!(<Option<Tag> as LinkField>::target_class(), "tests::Tag");
	}

	#[rstest]
	fn test_vec_link_from_null_is_empty() {
		let restored =
			<Vec<Tag> as LinkField>::from_property_value("tags", PropertyValue::null()).unwrap();

		assert!(restored.is_empty());
		assert!(<Vec<Tag> as LinkField>::is_collection());
	}

	#[rstest]
	fn test_boxed_resource_clone_and_downcast() {
		let boxed: Box<dyn ApiResource> = Box::new(Tag {
			label: "a".to_string(),
		});

		let copy = boxed.clone();

		assert_eq!(copy.downcast_ref::<Tag>().map(|t| t.label.as_str()), Some("a"));
		assert_eq!(copy.resource_class(), "tests::Tag");
	}
}
