//! URI template routing
//!
//! Every operation carries a URI template such as `/books/{id}`. The router
//! matches inbound paths against those templates and expands them back into
//! paths for IRI generation.

use armature_core::{Error, Result};
use armature_metadata::{
	HttpMethod, Operation, ResourceMetadataCollectionFactory, ResourceNameCollectionFactory,
};
use armature_state::UriVariables;
use indexmap::IndexMap;
use nom::{
	IResult, Parser,
	branch::alt,
	bytes::complete::take_while1,
	character::complete::char,
	combinator::{all_consuming, map},
	multi::many0,
	sequence::delimited,
};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Characters escaped in an expanded variable; `=` and `;` stay readable for
/// composite identifiers
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
	.remove(b'-')
	.remove(b'_')
	.remove(b'.')
	.remove(b'~')
	.remove(b'=')
	.remove(b';');

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
	Literal(String),
	Variable(String),
}

/// A parsed URI template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
	raw: String,
	segments: Vec<Segment>,
}

fn variable(input: &str) -> IResult<&str, Option<Segment>> {
	map(
		delimited(
			char('{'),
			take_while1(|c: char| c.is_alphanumeric() || c == '_' || c == '.'),
			char('}'),
		),
		|name: &str| {
			// `{._format}` placeholders are handled by the router itself
			if name.starts_with('.') {
				None
			} else {
				Some(Segment::Variable(name.to_string()))
			}
		},
	)
	.parse(input)
}

fn literal(input: &str) -> IResult<&str, Option<Segment>> {
	map(take_while1(|c: char| c != '{' && c != '}'), |text: &str| {
		Some(Segment::Literal(text.to_string()))
	})
	.parse(input)
}

impl UriTemplate {
	/// Parse a template
	///
	/// # Examples
	///
	/// ```
	/// use armature_iri::router::UriTemplate;
	///
	/// let template = UriTemplate::parse("/authors/{authorId}/books/{id}").unwrap();
	/// assert_eq!(template.variables().collect::<Vec<_>>(), vec!["authorId", "id"]);
	/// ```
	pub fn parse(raw: &str) -> Result<Self> {
		let (_, segments) = all_consuming(many0(alt((variable, literal))))
			.parse(raw)
			.map_err(|e| {
				Error::Configuration(format!("Invalid URI template \"{}\": {}", raw, e))
			})?;
		let mut merged: Vec<Segment> = Vec::new();
		for segment in segments.into_iter().flatten() {
			match (merged.last_mut(), segment) {
				(Some(Segment::Literal(previous)), Segment::Literal(text)) => previous.push_str(&text),
				(Some(Segment::Variable(previous)), Segment::Variable(name)) => {
					return Err(Error::Configuration(format!(
						"Invalid URI template \"{}\": variables \"{}\" and \"{}\" are not separated",
						raw, previous, name
					)));
				}
				(_, segment) => merged.push(segment),
			}
		}
		Ok(Self {
			raw: raw.to_string(),
			segments: merged,
		})
	}

	pub fn as_str(&self) -> &str {
		&self.raw
	}

	pub fn variables(&self) -> impl Iterator<Item = &str> {
		self.segments.iter().filter_map(|s| match s {
			Segment::Variable(name) => Some(name.as_str()),
			Segment::Literal(_) => None,
		})
	}

	/// Match a path, returning the percent-decoded variable values
	///
	/// A variable spans one or more characters of a single path segment.
	pub fn matches(&self, path: &str) -> Option<IndexMap<String, String>> {
		let mut captured = Vec::new();
		if !capture(&self.segments, path, &mut captured) {
			return None;
		}
		captured
			.into_iter()
			.map(|(name, raw)| {
				percent_decode_str(raw)
					.decode_utf8()
					.ok()
					.map(|value| (name.to_string(), value.into_owned()))
			})
			.collect()
	}

	/// Substitute every variable with its percent-encoded value
	pub fn expand(&self, parameters: &IndexMap<String, String>) -> Result<String> {
		let mut path = String::new();
		for segment in &self.segments {
			match segment {
				Segment::Literal(text) => path.push_str(text),
				Segment::Variable(name) => {
					let value = parameters
						.get(name)
						.filter(|v| !v.is_empty())
						.ok_or_else(|| {
							Error::InvalidArgument(format!(
								"Missing value for variable \"{}\" of URI template \"{}\"",
								name, self.raw
							))
						})?;
					path.extend(utf8_percent_encode(value, SEGMENT));
				}
			}
		}
		Ok(path)
	}
}

fn capture<'t, 'p>(
	segments: &'t [Segment],
	input: &'p str,
	captured: &mut Vec<(&'t str, &'p str)>,
) -> bool {
	match segments.split_first() {
		None => input.is_empty(),
		Some((Segment::Literal(text), rest)) => input
			.strip_prefix(text.as_str())
			.is_some_and(|tail| capture(rest, tail, captured)),
		Some((Segment::Variable(name), rest)) => {
			let limit = input.find('/').unwrap_or(input.len());
			for end in (1..=limit).rev().filter(|end| input.is_char_boundary(*end)) {
				captured.push((name.as_str(), &input[..end]));
				if capture(rest, &input[end..], captured) {
					return true;
				}
				captured.pop();
			}
			false
		}
	}
}

/// One routable operation
#[derive(Debug, Clone)]
pub struct Route {
	pub operation: Arc<Operation>,
	pub template: UriTemplate,
}

/// Result of a successful path match
#[derive(Debug, Clone)]
pub struct RouteMatch {
	pub operation: Arc<Operation>,
	pub uri_variables: UriVariables,
	/// Format forced by a `.{format}` path suffix
	pub format: Option<String>,
}

/// Routes of every operation of every resource
#[derive(Debug, Clone, Default)]
pub struct Router {
	routes: Vec<Route>,
	by_name: HashMap<String, usize>,
}

impl Router {
	pub fn new() -> Self {
		Self::default()
	}

	/// Route every operation the metadata factories know about
	pub fn from_resources(
		names: &dyn ResourceNameCollectionFactory,
		resources: &dyn ResourceMetadataCollectionFactory,
	) -> Result<Self> {
		let mut router = Self::new();
		for class in names.create()? {
			let collection = resources.create(&class)?;
			for operation in collection.operations() {
				router.add(operation.clone())?;
			}
		}
		tracing::debug!(routes = router.len(), "Router built");
		Ok(router)
	}

	pub fn add(&mut self, operation: Operation) -> Result<()> {
		if self.by_name.contains_key(&operation.name) {
			return Err(Error::Configuration(format!(
				"Route \"{}\" is declared twice",
				operation.name
			)));
		}
		let raw = operation.uri_template.as_deref().ok_or_else(|| {
			Error::Configuration(format!(
				"Operation \"{}\" of \"{}\" has no URI template",
				operation.name, operation.class
			))
		})?;
		let template = UriTemplate::parse(raw)?;
		self.by_name.insert(operation.name.clone(), self.routes.len());
		self.routes.push(Route {
			operation: Arc::new(operation),
			template,
		});
		Ok(())
	}

	pub fn with_operation(mut self, operation: Operation) -> Result<Self> {
		self.add(operation)?;
		Ok(self)
	}

	pub fn route(&self, name: &str) -> Option<&Route> {
		self.by_name.get(name).and_then(|idx| self.routes.get(*idx))
	}

	pub fn routes(&self) -> impl Iterator<Item = &Route> {
		self.routes.iter()
	}

	pub fn len(&self) -> usize {
		self.routes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.routes.is_empty()
	}

	/// Find the operation serving `method` on `path`
	///
	/// A trailing `.{format}` suffix is tried as a forced format first. A path
	/// that matches only under other methods fails with `MethodNotAllowed`.
	pub fn match_path(&self, method: HttpMethod, path: &str) -> Result<RouteMatch> {
		let path = path.split(['?', '#']).next().unwrap_or(path);
		let path = match path.trim_end_matches('/') {
			"" => "/",
			trimmed => trimmed,
		};

		let mut candidates = Vec::with_capacity(2);
		if let Some((stem, format)) = split_format(path) {
			candidates.push((stem, Some(format)));
		}
		candidates.push((path, None));

		let mut allowed: Vec<&'static str> = Vec::new();
		for (candidate, format) in candidates {
			for route in &self.routes {
				let Some(variables) = route.template.matches(candidate) else {
					continue;
				};
				if route.operation.method != method {
					let name = route.operation.method.as_str();
					if !allowed.contains(&name) {
						allowed.push(name);
					}
					continue;
				}
				return Ok(RouteMatch {
					operation: Arc::clone(&route.operation),
					uri_variables: variables
						.into_iter()
						.map(|(k, v)| (k, Value::String(v)))
						.collect(),
					format: format.map(str::to_string),
				});
			}
		}

		if allowed.is_empty() {
			Err(Error::NotFound(format!(
				"No route found for \"{} {}\"",
				method, path
			)))
		} else {
			Err(Error::MethodNotAllowed(format!(
				"No route found for \"{} {}\": Method Not Allowed (Allow: {})",
				method,
				path,
				allowed.join(", ")
			)))
		}
	}

	/// Expand the template of the named route
	pub fn generate(&self, name: &str, parameters: &IndexMap<String, String>) -> Result<String> {
		let route = self
			.route(name)
			.ok_or_else(|| Error::InvalidArgument(format!("No route named \"{}\"", name)))?;
		route.template.expand(parameters)
	}
}

/// `/books/1.jsonld` splits into `/books/1` and `jsonld`
fn split_format(path: &str) -> Option<(&str, &str)> {
	let last = path.rfind('/').map_or(0, |idx| idx + 1);
	let dot = path[last..].rfind('.')? + last;
	let (stem, format) = (&path[..dot], &path[dot + 1..]);
	let valid = dot > last
		&& !format.is_empty()
		&& format.chars().all(|c| c.is_ascii_alphanumeric());
	valid.then_some((stem, format))
}

#[cfg(test)]
mod tests {
	use super::*;
	use armature_metadata::Link;
	use rstest::{fixture, rstest};

	fn operation(name: &str, method: HttpMethod, collection: bool, template: &str) -> Operation {
		let mut operation = Operation::new(method, collection)
			.with_name(name)
			.with_class("app::Book", "Book")
			.with_uri_template(template);
		for variable in UriTemplate::parse(template).unwrap().variables() {
			operation = operation.with_uri_variable(
				Link::new(variable, "app::Book").with_identifiers(vec!["id".to_string()]),
			);
		}
		operation
	}

	#[fixture]
	fn router() -> Router {
		Router::new()
			.with_operation(operation("book_list", HttpMethod::Get, true, "/books"))
			.unwrap()
			.with_operation(operation("book_create", HttpMethod::Post, true, "/books"))
			.unwrap()
			.with_operation(operation("book_show", HttpMethod::Get, false, "/books/{id}"))
			.unwrap()
			.with_operation(operation("book_delete", HttpMethod::Delete, false, "/books/{id}"))
			.unwrap()
			.with_operation(operation(
				"author_books",
				HttpMethod::Get,
				true,
				"/authors/{authorId}/books",
			))
			.unwrap()
	}

	#[rstest]
	#[case("/authors/{authorId}/books/{id}", vec!["authorId", "id"])]
	#[case("/books{._format}", vec![])]
	#[case("/books/{id}", vec!["id"])]
	fn test_template_variables(#[case] raw: &str, #[case] expected: Vec<&str>) {
		let template = UriTemplate::parse(raw).unwrap();

		assert_eq!(template.variables().collect::<Vec<_>>(), expected);
	}

	#[rstest]
	#[case("/books/{id")]
	#[case("/books/{a}{b}")]
	fn test_malformed_template(#[case] raw: &str) {
		assert!(matches!(UriTemplate::parse(raw), Err(Error::Configuration(_))));
	}

	#[rstest]
	#[case(HttpMethod::Get, "/books", "book_list", None)]
	#[case(HttpMethod::Post, "/books/", "book_create", None)]
	#[case(HttpMethod::Get, "/books/42", "book_show", None)]
	#[case(HttpMethod::Get, "/books/42.jsonld", "book_show", Some("jsonld"))]
	#[case(HttpMethod::Get, "/books.json?page=2", "book_list", Some("json"))]
	#[case(HttpMethod::Delete, "/books/42", "book_delete", None)]
	fn test_match_path(
		router: Router,
		#[case] method: HttpMethod,
		#[case] path: &str,
		#[case] expected: &str,
		#[case] format: Option<&str>,
	) {
		let matched = router.match_path(method, path).unwrap();

		assert_eq!(matched.operation.name, expected);
		assert_eq!(matched.format.as_deref(), format);
	}

	#[rstest]
	fn test_variables_are_decoded(router: Router) {
		// Act
		let matched = router
			.match_path(HttpMethod::Get, "/books/isbn%3D978;number=2")
			.unwrap();

		// Assert
		assert_eq!(matched.uri_variables["id"], "isbn=978;number=2");
	}

	#[rstest]
	fn test_wrong_method_is_not_allowed(router: Router) {
		let result = router.match_path(HttpMethod::Put, "/books/1");

		let Err(Error::MethodNotAllowed(message)) = result else {
			panic!("expected MethodNotAllowed");
		};
		assert!(message.ends_with("(Allow: GET, DELETE)"));
	}

	#[rstest]
	#[case("/magazines")]
	#[case("/books/1/chapters")]
	fn test_unknown_path(router: Router, #[case] path: &str) {
		assert!(matches!(router.match_path(HttpMethod::Get, path), Err(Error::NotFound(_))));
	}

	#[rstest]
	fn test_generate_encodes_values(router: Router) {
		// Arrange
		let mut parameters = IndexMap::new();
		parameters.insert("id".to_string(), "a b=1;c/2".to_string());

		// Act
		let path = router.generate("book_show", &parameters).unwrap();

		// Assert
		assert_eq!(path, "/books/a%20b=1;c%2F2");
		let matched = router.match_path(HttpMethod::Get, &path).unwrap();
		assert_eq!(matched.uri_variables["id"], "a b=1;c/2");
	}

	#[rstest]
	fn test_generate_requires_variables(router: Router) {
		let result = router.generate("book_show", &IndexMap::new());

		assert!(matches!(result, Err(Error::InvalidArgument(_))));
	}

	#[rstest]
	fn test_duplicate_route_name(router: Router) {
		let result = router.with_operation(operation("book_list", HttpMethod::Get, true, "/tomes"));

		assert!(matches!(result, Err(Error::Configuration(_))));
	}
}
