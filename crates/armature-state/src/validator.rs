//! Constraint validation

use armature_core::descriptor::DEFAULT_GROUP;
use armature_core::{
	ApiResource, ConstraintKind, ConstraintViolation, ConstraintViolationList, Error,
	PropertyValue, ResourceClassRegistry, Result,
};
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;

/// Validates a resource against its declared constraints
pub trait Validator: Send + Sync {
	/// `groups` of `None` means the default group
	fn validate(&self, data: &dyn ApiResource, groups: Option<&[String]>) -> Result<()>;
}

/// Validator for the constraints declared with `#[api(...)]` field attributes
pub struct ConstraintValidator {
	registry: Arc<ResourceClassRegistry>,
	email: Regex,
}

impl ConstraintValidator {
	pub fn new(registry: Arc<ResourceClassRegistry>) -> Result<Self> {
		let email = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
			.map_err(|e| Error::Runtime(format!("Invalid email pattern: {}", e)))?;
		Ok(Self { registry, email })
	}

	fn check(&self, kind: &ConstraintKind, value: &Value) -> Option<(String, &'static str)> {
		match kind {
			ConstraintKind::NotNull if value.is_null() => Some((
				"This value should not be null.".to_string(),
				"not_null",
			)),
			ConstraintKind::NotBlank if is_blank(value) => Some((
				"This value should not be blank.".to_string(),
				"not_blank",
			)),
			ConstraintKind::Email => match value {
				Value::Null => None,
				Value::String(s) if self.email.is_match(s) => None,
				_ => Some((
					"This value is not a valid email address.".to_string(),
					"email",
				)),
			},
			ConstraintKind::Length { min, max } => {
				let length = match value {
					Value::Null => return None,
					Value::String(s) => s.chars().count(),
					other => other.to_string().chars().count(),
				};
				if let Some(min) = min
					&& length < *min
				{
					return Some((
						format!(
							"This value is too short. It should have {} characters or more.",
							min
						),
						"length_too_short",
					));
				}
				if let Some(max) = max
					&& length > *max
				{
					return Some((
						format!(
							"This value is too long. It should have {} characters or less.",
							max
						),
						"length_too_long",
					));
				}
				None
			}
			_ => None,
		}
	}
}

fn is_blank(value: &Value) -> bool {
	match value {
		Value::Null => true,
		Value::Bool(b) => !b,
		Value::String(s) => s.trim().is_empty(),
		Value::Array(items) => items.is_empty(),
		Value::Object(map) => map.is_empty(),
		Value::Number(_) => false,
	}
}

fn property_value(data: &dyn ApiResource, property: &str) -> Value {
	match data.get_property(property) {
		None => Value::Null,
		Some(PropertyValue::Scalar(value)) => value,
		Some(PropertyValue::Resource(_)) => Value::Bool(true),
		Some(PropertyValue::Resources(items)) => {
			Value::Array(items.iter().map(|_| Value::Bool(true)).collect())
		}
	}
}

impl Validator for ConstraintValidator {
	fn validate(&self, data: &dyn ApiResource, groups: Option<&[String]>) -> Result<()> {
		let descriptor = self.registry.descriptor(data.resource_class())?;
		let default_groups = [DEFAULT_GROUP.to_string()];
		let groups = groups.filter(|g| !g.is_empty()).unwrap_or(&default_groups);

		let mut violations = ConstraintViolationList::new();
		for property in &descriptor.properties {
			let active: Vec<_> = property
				.constraints
				.iter()
				.filter(|c| groups.iter().any(|g| c.in_group(g)))
				.collect();
			if active.is_empty() {
				continue;
			}
			let value = property_value(data, &property.name);
			for constraint in active {
				if let Some((message, code)) = self.check(&constraint.kind, &value) {
					violations.add(ConstraintViolation::new(&property.name, message).with_code(code));
				}
			}
		}

		if !violations.is_empty() {
			tracing::debug!(
				resource_class = data.resource_class(),
				violations = violations.len(),
				"Validation failed"
			);
		}
		violations.into_result()
	}
}
