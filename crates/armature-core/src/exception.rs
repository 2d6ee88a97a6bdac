//! Error taxonomy shared by every armature crate
//!
//! Each variant maps to one HTTP status class. Metadata and security failures
//! propagate unchanged up to the kernel, which renders them in the negotiated
//! error format.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors raised while resolving metadata or running the operation pipeline
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// Malformed input: unknown class, bad IRI, bad filter configuration
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),

	/// An internal invariant was violated (missing collaborator, bad wiring)
	#[error("Runtime error: {0}")]
	Runtime(String),

	/// The IRI resolved to a route but the provider returned nothing
	#[error("Item not found: {0}")]
	ItemNotFound(String),

	#[error("Not found: {0}")]
	NotFound(String),

	/// A security expression evaluated to false
	#[error("Access denied: {0}")]
	AccessDenied(String),

	#[error("Unsupported media type: {0}")]
	UnsupportedMediaType(String),

	#[error("Not acceptable: {0}")]
	NotAcceptable(String),

	#[error("Method not allowed: {0}")]
	MethodNotAllowed(String),

	/// Constraint or type-coercion failures, aggregated
	#[error("Validation failed: {0}")]
	Validation(ConstraintViolationList),

	/// The request body could not be decoded
	#[error("Serialization error: {0}")]
	Serialization(String),

	#[error("Configuration error: {0}")]
	Configuration(String),
}

impl Error {
	/// HTTP status code for this error
	///
	/// Validation errors default to 422; the kernel may remap them to 400
	/// through `validator.validation_error_status`.
	///
	/// # Examples
	///
	/// ```
	/// use armature_core::exception::Error;
	///
	/// assert_eq!(Error::AccessDenied("nope".into()).status_code(), 403);
	/// assert_eq!(Error::ItemNotFound("/books/1".into()).status_code(), 404);
	/// ```
	pub fn status_code(&self) -> u16 {
		match self {
			Error::InvalidArgument(_) => 400,
			Error::Runtime(_) => 500,
			Error::ItemNotFound(_) | Error::NotFound(_) => 404,
			Error::AccessDenied(_) => 403,
			Error::UnsupportedMediaType(_) => 415,
			Error::NotAcceptable(_) => 406,
			Error::MethodNotAllowed(_) => 405,
			Error::Validation(_) => 422,
			Error::Serialization(_) => 400,
			Error::Configuration(_) => 500,
		}
	}

	/// Short human title used by problem documents
	pub fn title(&self) -> &'static str {
		match self {
			Error::InvalidArgument(_) | Error::Serialization(_) => "Bad Request",
			Error::Runtime(_) | Error::Configuration(_) => "Internal Server Error",
			Error::ItemNotFound(_) | Error::NotFound(_) => "Not Found",
			Error::AccessDenied(_) => "Forbidden",
			Error::UnsupportedMediaType(_) => "Unsupported Media Type",
			Error::NotAcceptable(_) => "Not Acceptable",
			Error::MethodNotAllowed(_) => "Method Not Allowed",
			Error::Validation(_) => "An error occurred",
		}
	}

	/// Message without the variant prefix
	pub fn detail(&self) -> String {
		match self {
			Error::InvalidArgument(m)
			| Error::Runtime(m)
			| Error::ItemNotFound(m)
			| Error::NotFound(m)
			| Error::AccessDenied(m)
			| Error::UnsupportedMediaType(m)
			| Error::NotAcceptable(m)
			| Error::MethodNotAllowed(m)
			| Error::Serialization(m)
			| Error::Configuration(m) => m.clone(),
			Error::Validation(violations) => violations.to_string(),
		}
	}

	/// Whether this error is caused by the server rather than the client
	pub fn is_server_error(&self) -> bool {
		self.status_code() >= 500
	}
}

impl From<serde_json::Error> for Error {
	fn from(error: serde_json::Error) -> Self {
		Error::Serialization(error.to_string())
	}
}

/// Result type alias for armature operations
pub type Result<T> = std::result::Result<T, Error>;

/// One failed constraint on one property path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintViolation {
	#[serde(rename = "propertyPath")]
	pub property_path: String,
	pub message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub code: Option<String>,
}

impl ConstraintViolation {
	pub fn new(property_path: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			property_path: property_path.into(),
			message: message.into(),
			code: None,
		}
	}

	pub fn with_code(mut self, code: impl Into<String>) -> Self {
		self.code = Some(code.into());
		self
	}
}

/// Ordered list of constraint violations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConstraintViolationList {
	violations: Vec<ConstraintViolation>,
}

impl ConstraintViolationList {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add(&mut self, violation: ConstraintViolation) {
		self.violations.push(violation);
	}

	pub fn extend(&mut self, other: ConstraintViolationList) {
		self.violations.extend(other.violations);
	}

	pub fn is_empty(&self) -> bool {
		self.violations.is_empty()
	}

	pub fn len(&self) -> usize {
		self.violations.len()
	}

	pub fn iter(&self) -> impl Iterator<Item = &ConstraintViolation> {
		self.violations.iter()
	}

	/// Violations recorded for one property path
	pub fn for_property<'a>(
		&'a self,
		property_path: &'a str,
	) -> impl Iterator<Item = &'a ConstraintViolation> + 'a {
		self.violations
			.iter()
			.filter(move |v| v.property_path == property_path)
	}

	/// `Ok(())` when empty, otherwise `Err(Error::Validation(self))`
	pub fn into_result(self) -> Result<()> {
		if self.is_empty() {
			Ok(())
		} else {
			Err(Error::Validation(self))
		}
	}
}

impl From<Vec<ConstraintViolation>> for ConstraintViolationList {
	fn from(violations: Vec<ConstraintViolation>) -> Self {
		Self { violations }
	}
}

impl IntoIterator for ConstraintViolationList {
	type Item = ConstraintViolation;
	type IntoIter = std::vec::IntoIter<ConstraintViolation>;

	fn into_iter(self) -> Self::IntoIter {
		self.violations.into_iter()
	}
}

impl fmt::Display for ConstraintViolationList {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let rendered: Vec<String> = self
			.violations
			.iter()
			.map(|v| {
				if v.property_path.is_empty() {
					v.message.clone()
				} else {
					format!("{}: {}", v.property_path, v.message)
				}
			})
			.collect();
		write!(f, "{}", rendered.join("\n"))
	}
}

/// Errors raised when reading or writing a resource property by name
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PropertyAccessError {
	#[error("Property \"{0}\" does not exist")]
	NoSuchProperty(String),

	#[error("The type of the \"{property}\" attribute must be \"{expected}\": {message}")]
	TypeMismatch {
		property: String,
		expected: String,
		message: String,
	},

	#[error("Property \"{0}\" is read-only")]
	ReadOnly(String),
}

impl PropertyAccessError {
	/// Convert into a violation on the offending property
	pub fn into_violation(self) -> ConstraintViolation {
		match &self {
			PropertyAccessError::NoSuchProperty(p) | PropertyAccessError::ReadOnly(p) => {
				ConstraintViolation::new(p.clone(), self.to_string())
			}
			PropertyAccessError::TypeMismatch { property, .. } => {
				ConstraintViolation::new(property.clone(), self.to_string())
					.with_code("type_mismatch")
			}
		}
	}
}
