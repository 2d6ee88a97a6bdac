//! # armature-core
//!
//! Foundation types shared by every armature crate:
//!
//! - [`resource`]: the object-safe [`ApiResource`] trait and property values
//! - [`descriptor`]: static class descriptors emitted by the derive macros
//! - [`registry`]: the explicitly constructed class registry
//! - [`exception`]: the error taxonomy and constraint violations
//! - [`identifier`]: composite identifier encoding

pub mod descriptor;
pub mod exception;
pub mod identifier;
pub mod registry;
pub mod resource;

pub use descriptor::{
	ApiPropertyDeclaration, BuiltinType, ClassDescriptor, ConstraintDeclaration, ConstraintKind,
	MethodDescriptor, OperationDeclaration, ParameterDeclaration, PropertyDescriptor,
	ResourceDeclaration, TypeInfo, Visibility,
};
pub use exception::{
	ConstraintViolation, ConstraintViolationList, Error, PropertyAccessError, Result,
};
pub use registry::{ResourceClassRegistry, ResourceRegistration};
pub use resource::{
	AccessorDispatch, ApiResource, LinkField, PropertyValue, ResourceClass, ScalarField,
};

// Re-exported for code generated by armature-macros
pub use inventory;
#[doc(hidden)]
pub use serde_json;
