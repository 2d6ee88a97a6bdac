//! Response produced by the kernel

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderName};
use http::{HeaderMap, HeaderValue, StatusCode};
use serde_json::Value;

/// Status, headers and serialized body of an answered request
#[derive(Debug, Clone)]
pub struct ApiResponse {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub body: Bytes,
}

impl ApiResponse {
	/// Unknown status codes become 500
	///
	/// # Examples
	///
	/// ```
	/// use armature::ApiResponse;
	/// use http::StatusCode;
	///
	/// let response = ApiResponse::new(201);
	/// assert_eq!(response.status, StatusCode::CREATED);
	/// assert!(response.body.is_empty());
	/// ```
	pub fn new(status: u16) -> Self {
		Self {
			status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
			headers: HeaderMap::new(),
			body: Bytes::new(),
		}
	}

	pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	/// Set a header; values that are not valid header text are dropped
	pub fn with_header(mut self, name: HeaderName, value: &str) -> Self {
		match HeaderValue::from_str(value) {
			Ok(value) => {
				self.headers.insert(name, value);
			}
			Err(_) => {
				tracing::warn!(header = %name, "Dropping header with an invalid value");
			}
		}
		self
	}

	pub fn header(&self, name: impl http::header::AsHeaderName) -> Option<&str> {
		self.headers.get(name).and_then(|v| v.to_str().ok())
	}

	pub fn content_type(&self) -> Option<&str> {
		self.header(CONTENT_TYPE)
	}

	/// The body parsed as JSON; `null` for an empty body
	pub fn json(&self) -> serde_json::Result<Value> {
		if self.body.is_empty() {
			return Ok(Value::Null);
		}
		serde_json::from_slice(&self.body)
	}
}
