//! Inbound request model

use crate::user::UserToken;
use bytes::Bytes;
use http::header::{ACCEPT, CONTENT_TYPE};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use percent_encoding::percent_decode_str;
use serde_json::{Map, Value};

/// Parsed query string; bracketed keys (`a[b]=c`, `a[]=c`) become nested values
pub type QueryParams = Map<String, Value>;

/// Request as seen by the operation pipeline
///
/// # Examples
///
/// ```
/// use armature_state::ApiRequest;
/// use http::Method;
///
/// let request = ApiRequest::new(Method::GET, "/books?title=Dune&order[title]=desc");
/// assert_eq!(request.path, "/books");
/// assert_eq!(request.query["title"], "Dune");
/// assert_eq!(request.query["order"]["title"], "desc");
/// ```
#[derive(Debug, Clone)]
pub struct ApiRequest {
	pub method: Method,
	pub path: String,
	pub query: QueryParams,
	pub headers: HeaderMap,
	pub body: Bytes,
	pub user: Option<UserToken>,
	/// Format forced by the route, e.g. `jsonld` for `/books/1.jsonld`
	pub route_format: Option<String>,
}

impl ApiRequest {
	/// Build a request from a method and a path with an optional query string
	pub fn new(method: Method, uri: &str) -> Self {
		let (path, query) = match uri.split_once('?') {
			Some((path, query)) => (path, parse_query(query)),
			None => (uri, QueryParams::new()),
		};
		Self {
			method,
			path: path.to_string(),
			query,
			headers: HeaderMap::new(),
			body: Bytes::new(),
			user: None,
			route_format: None,
		}
	}

	pub fn get(uri: &str) -> Self {
		Self::new(Method::GET, uri)
	}

	pub fn post(uri: &str) -> Self {
		Self::new(Method::POST, uri)
	}

	pub fn put(uri: &str) -> Self {
		Self::new(Method::PUT, uri)
	}

	pub fn patch(uri: &str) -> Self {
		Self::new(Method::PATCH, uri)
	}

	pub fn delete(uri: &str) -> Self {
		Self::new(Method::DELETE, uri)
	}

	pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);
		self
	}

	pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	pub fn with_user(mut self, user: UserToken) -> Self {
		self.user = Some(user);
		self
	}

	pub fn with_route_format(mut self, format: impl Into<String>) -> Self {
		self.route_format = Some(format.into());
		self
	}

	/// Header value as a string; `None` when absent or not visible ASCII
	pub fn header(&self, name: impl http::header::AsHeaderName) -> Option<&str> {
		self.headers.get(name).and_then(|v| v.to_str().ok())
	}

	pub fn content_type(&self) -> Option<&str> {
		self.header(CONTENT_TYPE)
	}

	pub fn accept(&self) -> Option<&str> {
		self.header(ACCEPT)
	}
}

fn decode(raw: &str) -> String {
	percent_decode_str(&raw.replace('+', " "))
		.decode_utf8_lossy()
		.into_owned()
}

/// `a[b][c]` -> (`a`, [`b`, `c`]); `a[]` -> (`a`, [``])
fn split_key(key: &str) -> (String, Vec<String>) {
	match key.find('[') {
		Some(idx) if idx > 0 && key.ends_with(']') => {
			let segments = key[idx + 1..key.len() - 1]
				.split("][")
				.map(str::to_string)
				.collect();
			(key[..idx].to_string(), segments)
		}
		_ => (key.to_string(), Vec::new()),
	}
}

fn empty_container(segment: &str) -> Value {
	if segment.is_empty() {
		Value::Array(Vec::new())
	} else {
		Value::Object(Map::new())
	}
}

fn insert(target: &mut Map<String, Value>, key: String, segments: &[String], value: Value) {
	match segments.split_first() {
		None => {
			target.insert(key, value);
		}
		Some((first, rest)) => {
			let slot = target
				.entry(key)
				.or_insert_with(|| empty_container(first));
			insert_nested(slot, first, rest, value);
		}
	}
}

fn insert_nested(slot: &mut Value, segment: &str, rest: &[String], value: Value) {
	if segment.is_empty() {
		if !slot.is_array() {
			*slot = Value::Array(Vec::new());
		}
		if let Value::Array(items) = slot {
			match rest.split_first() {
				None => items.push(value),
				Some((next, tail)) => {
					let mut child = empty_container(next);
					insert_nested(&mut child, next, tail, value);
					items.push(child);
				}
			}
		}
	} else {
		if !slot.is_object() {
			*slot = Value::Object(Map::new());
		}
		if let Value::Object(map) = slot {
			insert(map, segment.to_string(), rest, value);
		}
	}
}

/// Parse a query string into nested values
///
/// Repeated plain keys keep the last value; `key[]` collects a list.
pub fn parse_query(query: &str) -> QueryParams {
	let mut params = QueryParams::new();
	for pair in query.split('&').filter(|p| !p.is_empty()) {
		let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
		let (head, segments) = split_key(&decode(raw_key));
		if head.is_empty() {
			continue;
		}
		insert(&mut params, head, &segments, Value::String(decode(raw_value)));
	}
	params
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	#[case("title=Dune", json!({"title": "Dune"}))]
	#[case("title=The+Left%20Hand", json!({"title": "The Left Hand"}))]
	#[case("id[]=1&id[]=2", json!({"id": ["1", "2"]}))]
	#[case("date[after]=2020-01-01&date[before]=2021-01-01", json!({"date": {"after": "2020-01-01", "before": "2021-01-01"}}))]
	#[case("order[author.name]=asc", json!({"order": {"author.name": "asc"}}))]
	#[case("flag&=orphan", json!({"flag": ""}))]
	#[case("page=1&page=2", json!({"page": "2"}))]
	fn test_parse_query(#[case] query: &str, #[case] expected: Value) {
		let parsed = parse_query(query);

		assert_eq!(Value::Object(parsed), expected);
	}

	#[rstest]
	fn test_request_headers() {
		// Arrange
		let request = ApiRequest::post("/books")
			.with_header(CONTENT_TYPE, HeaderValue::from_static("application/ld+json"))
			.with_body(r#"{"title":"Dune"}"#);

		// Act
		let content_type = request.content_type();

		// Assert
		assert_eq!(content_type, Some("application/ld+json"));
		assert_eq!(request.accept(), None);
		assert_eq!(request.method, Method::POST);
		assert_eq!(&request.body[..], br#"{"title":"Dune"}"#);
	}
}
