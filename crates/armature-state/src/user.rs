//! Authenticated user, as supplied by the host application

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Roles every authenticated user holds
pub const AUTHENTICATED_ATTRIBUTES: &[&str] = &["IS_AUTHENTICATED", "IS_AUTHENTICATED_FULLY"];

/// The user a request is made on behalf of
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserToken {
	pub identifier: String,
	pub roles: Vec<String>,
	/// Application-defined values reachable from security expressions as `user.<key>`
	#[serde(default)]
	pub attributes: Map<String, Value>,
}

impl UserToken {
	pub fn new(identifier: impl Into<String>) -> Self {
		Self {
			identifier: identifier.into(),
			..Default::default()
		}
	}

	pub fn with_role(mut self, role: impl Into<String>) -> Self {
		self.roles.push(role.into());
		self
	}

	pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
		self.attributes.insert(key.into(), value);
		self
	}

	/// Whether the user holds `attribute`, either a role or an authentication level
	pub fn is_granted(&self, attribute: &str) -> bool {
		AUTHENTICATED_ATTRIBUTES.contains(&attribute) || self.roles.iter().any(|r| r == attribute)
	}

	/// Value of `user.<property>` in security expressions
	pub fn property(&self, property: &str) -> Value {
		match property {
			"identifier" | "username" => Value::String(self.identifier.clone()),
			"roles" => Value::Array(self.roles.iter().cloned().map(Value::String).collect()),
			other => self.attributes.get(other).cloned().unwrap_or(Value::Null),
		}
	}
}
