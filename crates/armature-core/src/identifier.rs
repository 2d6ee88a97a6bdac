//! Composite identifier encoding
//!
//! Resources with more than one identifier property address an item through a
//! single path segment of the form `k1=v1;k2=v2`.

use crate::exception::{Error, Result};
use indexmap::IndexMap;

/// Serialize a multi-key identifier map into one path segment
///
/// # Examples
///
/// ```
/// use armature_core::identifier::stringify_composite;
/// use indexmap::IndexMap;
///
/// let mut ids = IndexMap::new();
/// ids.insert("isbn".to_string(), "123".to_string());
/// ids.insert("edition".to_string(), "2".to_string());
/// assert_eq!(stringify_composite(&ids), "isbn=123;edition=2");
/// ```
pub fn stringify_composite(identifiers: &IndexMap<String, String>) -> String {
	identifiers
		.iter()
		.map(|(k, v)| format!("{}={}", k, v))
		.collect::<Vec<_>>()
		.join(";")
}

/// Whether `rest` opens a new `key=` pair
fn starts_pair(rest: &str) -> bool {
	match rest.find('=') {
		Some(end) if end > 0 => rest[..end]
			.chars()
			.all(|c| c.is_alphanumeric() || c == '_'),
		_ => false,
	}
}

/// Split `segment` on the `;` that precede a `key=` pair
fn split_pairs(segment: &str) -> Vec<&str> {
	let mut pairs = Vec::new();
	let mut start = 0;
	for (index, _) in segment.match_indices(';') {
		if starts_pair(&segment[index + 1..]) {
			pairs.push(&segment[start..index]);
			start = index + 1;
		}
	}
	pairs.push(&segment[start..]);
	pairs
}

/// Parse a `k=v;k=v` segment back into an ordered identifier map
///
/// A `;` only separates two pairs when a `key=` follows it, so values may
/// themselves contain `;`. Fails with `InvalidArgument` on a pair that has no
/// `=` or an empty key.
pub fn parse_composite(segment: &str) -> Result<IndexMap<String, String>> {
	let mut identifiers = IndexMap::new();
	for pair in split_pairs(segment).into_iter().filter(|p| !p.is_empty()) {
		let (key, value) = pair.split_once('=').ok_or_else(|| {
			Error::InvalidArgument(format!(
				"Composite identifier \"{}\" is malformed: expected \"key=value\" pairs",
				segment
			))
		})?;
		if key.is_empty() {
			return Err(Error::InvalidArgument(format!(
				"Composite identifier \"{}\" contains an empty key",
				segment
			)));
		}
		identifiers.insert(key.to_string(), value.to_string());
	}
	Ok(identifiers)
}

/// Render an identifier value as it appears in a URI
pub fn identifier_to_string(value: &serde_json::Value) -> Option<String> {
	match value {
		serde_json::Value::Null => None,
		serde_json::Value::String(s) if s.is_empty() => None,
		serde_json::Value::String(s) => Some(s.clone()),
		serde_json::Value::Number(n) => Some(n.to_string()),
		serde_json::Value::Bool(b) => Some(b.to_string()),
		other => Some(other.to_string()),
	}
}
