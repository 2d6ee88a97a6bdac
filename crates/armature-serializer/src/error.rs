//! Error documents
//!
//! - `jsonproblem`: RFC 7807 `application/problem+json`
//! - `jsonld`: `hydra:Error`, or `ConstraintViolationList` for validation errors
//! - `jsonapi`: an `errors` array, one entry per violation
//!
//! Server errors only expose their detail in debug mode.

use crate::jsonld::{self, context_iri};
use armature_core::{ConstraintViolation, ConstraintViolationList, Error};
use serde_json::{Map, Value, json};

pub const PROBLEM_FORMAT: &str = "jsonproblem";

fn detail(error: &Error, debug: bool) -> String {
	if error.is_server_error() && !debug {
		error.title().to_string()
	} else {
		error.detail()
	}
}

fn violations(list: &ConstraintViolationList) -> Value {
	Value::Array(
		list.iter()
			.map(|v| serde_json::to_value(v).unwrap_or(Value::Null))
			.collect(),
	)
}

fn pointer(violation: &ConstraintViolation) -> String {
	format!(
		"data/attributes/{}",
		violation.property_path.replace(['.', '['], "/").replace(']', "")
	)
}

fn problem(error: &Error, debug: bool) -> Value {
	let status = error.status_code();
	let mut document = Map::new();
	document.insert("type".to_string(), Value::String(format!("/errors/{}", status)));
	document.insert("title".to_string(), Value::String(error.title().to_string()));
	document.insert("status".to_string(), Value::from(status));
	document.insert("detail".to_string(), Value::String(detail(error, debug)));
	if let Error::Validation(list) = error {
		document.insert("violations".to_string(), violations(list));
	}
	Value::Object(document)
}

fn hydra(error: &Error, debug: bool) -> Value {
	match error {
		Error::Validation(list) => json!({
			"@context": context_iri("ConstraintViolationList"),
			"@type": "ConstraintViolationList",
			"hydra:title": error.title(),
			"hydra:description": detail(error, debug),
			"violations": violations(list),
		}),
		_ => json!({
			"@context": context_iri("Error"),
			"@type": "hydra:Error",
			"hydra:title": error.title(),
			"hydra:description": detail(error, debug),
		}),
	}
}

fn json_api(error: &Error, debug: bool) -> Value {
	let status = error.status_code().to_string();
	let errors: Vec<Value> = match error {
		Error::Validation(list) => list
			.iter()
			.map(|v| {
				let mut entry = json!({
					"status": status,
					"title": error.title(),
					"detail": v.message,
					"source": {"pointer": pointer(v)},
				});
				if let Some(code) = &v.code {
					entry["code"] = Value::String(code.clone());
				}
				entry
			})
			.collect(),
		_ => vec![json!({
			"status": status,
			"title": error.title(),
			"detail": detail(error, debug),
		})],
	};
	json!({"errors": errors})
}

/// Render `error` as a document of `format`; unknown formats fall back to
/// a problem document
///
/// # Examples
///
/// ```
/// use armature_core::Error;
/// use armature_serializer::error::normalize_error;
///
/// let document = normalize_error(&Error::NotFound("/books/999".into()), "jsonproblem", false);
/// assert_eq!(document["status"], 404);
/// assert_eq!(document["detail"], "/books/999");
/// ```
pub fn normalize_error(error: &Error, format: &str, debug: bool) -> Value {
	match format {
		jsonld::FORMAT => hydra(error, debug),
		crate::jsonapi::FORMAT => json_api(error, debug),
		_ => problem(error, debug),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn invalid_title() -> Error {
		Error::Validation(ConstraintViolationList::from(vec![
			ConstraintViolation::new("title", "This value should not be blank.")
				.with_code("not_blank"),
		]))
	}

	#[rstest]
	fn test_problem_with_violations() {
		// Act
		let document = normalize_error(&invalid_title(), PROBLEM_FORMAT, false);

		// Assert
		assert_eq!(document["status"], 422);
		assert_eq!(document["type"], "/errors/422");
		assert_eq!(
			document["violations"],
			json!([{"propertyPath": "title", "message": "This value should not be blank.", "code": "not_blank"}])
		);
	}

	#[rstest]
	#[case(false, "Internal Server Error")]
	#[case(true, "database unreachable")]
	fn test_server_error_detail(#[case] debug: bool, #[case] expected: &str) {
		let error = Error::Runtime("database unreachable".to_string());

		let document = normalize_error(&error, jsonld::FORMAT, debug);

		assert_eq!(document["@type"], "hydra:Error");
		assert_eq!(document["hydra:description"], expected);
	}

	#[rstest]
	fn test_hydra_violation_list() {
		let document = normalize_error(&invalid_title(), jsonld::FORMAT, false);

		assert_eq!(document["@type"], "ConstraintViolationList");
		assert_eq!(document["@context"], "/contexts/ConstraintViolationList");
		assert_eq!(document["violations"][0]["propertyPath"], "title");
	}

	#[rstest]
	fn test_json_api_errors() {
		let nested = Error::Validation(ConstraintViolationList::from(vec![
			ConstraintViolation::new("author.name", "Too short."),
		]));

		let document = normalize_error(&nested, crate::jsonapi::FORMAT, false);

		assert_eq!(document["errors"][0]["status"], "422");
		assert_eq!(document["errors"][0]["source"]["pointer"], "data/attributes/author/name");
	}
}
