//! Media types, `Accept` parsing and format selection

use armature_conf::FormatMap;
use std::cmp::Ordering;
use std::fmt;

/// A parsed media type such as `application/ld+json; q=0.8`
#[derive(Debug, Clone, PartialEq)]
pub struct MediaType {
	pub main_type: String,
	pub subtype: String,
	pub quality: f32,
	pub parameters: Vec<(String, String)>,
}

impl MediaType {
	pub fn new(main_type: impl Into<String>, subtype: impl Into<String>) -> Self {
		Self {
			main_type: main_type.into(),
			subtype: subtype.into(),
			quality: 1.0,
			parameters: Vec::new(),
		}
	}

	/// Parse one media range; `None` when it is not of the form `type/subtype`
	///
	/// # Examples
	///
	/// ```
	/// use armature_state::negotiation::MediaType;
	///
	/// let media = MediaType::parse("application/json; charset=utf-8; q=0.5").unwrap();
	/// assert_eq!(media.essence(), "application/json");
	/// assert_eq!(media.quality, 0.5);
	/// assert!(MediaType::parse("json").is_none());
	/// ```
	pub fn parse(raw: &str) -> Option<Self> {
		let mut parts = raw.split(';').map(str::trim);
		let (main_type, subtype) = parts.next()?.split_once('/')?;
		if main_type.is_empty() || subtype.is_empty() {
			return None;
		}
		let mut media = MediaType::new(main_type.to_ascii_lowercase(), subtype.to_ascii_lowercase());
		for parameter in parts {
			let Some((key, value)) = parameter.split_once('=') else {
				continue;
			};
			let (key, value) = (key.trim(), value.trim().trim_matches('"'));
			if key.eq_ignore_ascii_case("q") {
				media.quality = value.parse().unwrap_or(1.0);
			} else {
				media.parameters.push((key.to_ascii_lowercase(), value.to_string()));
			}
		}
		Some(media)
	}

	/// `type/subtype` without parameters
	pub fn essence(&self) -> String {
		format!("{}/{}", self.main_type, self.subtype)
	}

	/// Whether this (possibly wildcard) range accepts `other`
	pub fn matches(&self, other: &MediaType) -> bool {
		let main = self.main_type == "*" || self.main_type == other.main_type;
		let sub = self.subtype == "*" || self.subtype == other.subtype;
		main && sub
	}
}

impl fmt::Display for MediaType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.essence())
	}
}

/// A parsed `Accept` header, best ranges first
#[derive(Debug, Clone)]
pub struct AcceptHeader {
	pub media_types: Vec<MediaType>,
}

impl AcceptHeader {
	/// Parse an `Accept` header; ties keep their header order
	///
	/// # Examples
	///
	/// ```
	/// use armature_state::negotiation::AcceptHeader;
	///
	/// let accept = AcceptHeader::parse("text/html;q=0.9, application/ld+json");
	/// assert_eq!(accept.media_types[0].subtype, "ld+json");
	/// ```
	pub fn parse(header: &str) -> Self {
		let mut media_types: Vec<MediaType> = header
			.split(',')
			.filter_map(|s| MediaType::parse(s.trim()))
			.collect();
		media_types.sort_by(|a, b| b.quality.partial_cmp(&a.quality).unwrap_or(Ordering::Equal));
		Self { media_types }
	}

	/// First available type accepted with a non-zero quality
	pub fn find_best_match(&self, available: &[MediaType]) -> Option<MediaType> {
		self.media_types
			.iter()
			.filter(|accepted| accepted.quality > 0.0)
			.find_map(|accepted| available.iter().find(|a| accepted.matches(a)).cloned())
	}
}

/// Pick a response format for an `Accept` header
///
/// Returns the format name and the MIME type to answer with.
pub fn negotiate(formats: &FormatMap, accept: &str) -> Option<(String, String)> {
	let available: Vec<MediaType> = formats
		.values()
		.flatten()
		.filter_map(|mime| MediaType::parse(mime))
		.collect();
	let best = AcceptHeader::parse(accept).find_best_match(&available)?;
	let essence = best.essence();
	formats.iter().find_map(|(format, mimes)| {
		mimes
			.iter()
			.find(|m| mime_essence(m) == essence)
			.map(|m| (format.clone(), m.clone()))
	})
}

/// Format serving `mime`, ignoring MIME parameters
///
/// # Examples
///
/// ```
/// use armature_conf::default_formats;
/// use armature_state::negotiation::format_for_mime;
///
/// let formats = default_formats();
/// assert_eq!(format_for_mime(&formats, "application/json; charset=utf-8").as_deref(), Some("json"));
/// assert_eq!(format_for_mime(&formats, "text/plain"), None);
/// ```
pub fn format_for_mime(formats: &FormatMap, mime: &str) -> Option<String> {
	let wanted = mime_essence(mime);
	formats
		.iter()
		.find(|(_, mimes)| mimes.iter().any(|m| mime_essence(m) == wanted))
		.map(|(format, _)| format.clone())
}

/// Every MIME type of `formats`, in order
pub fn mime_types(formats: &FormatMap) -> Vec<String> {
	formats.values().flatten().cloned().collect()
}

fn mime_essence(mime: &str) -> String {
	mime.split(';')
		.next()
		.unwrap_or_default()
		.trim()
		.to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
	use super::*;
	use armature_conf::default_formats;
	use rstest::rstest;

	#[rstest]
	fn test_parse_accept_header() {
		let accept = AcceptHeader::parse("application/json, text/html; q=0.9");

		assert_eq!(accept.media_types.len(), 2);
		assert_eq!(accept.media_types[0].quality, 1.0);
	}

	#[rstest]
	fn test_find_best_match() {
		let accept = AcceptHeader::parse("application/json, text/html");
		let available = vec![
			MediaType::new("text", "html"),
			MediaType::new("application", "xml"),
		];

		let best = accept.find_best_match(&available);

		assert_eq!(best.map(|m| m.subtype), Some("html".to_string()));
	}

	#[rstest]
	#[case("application/ld+json", Some(("jsonld", "application/ld+json")))]
	#[case("application/hal+json, application/json;q=0.5", Some(("jsonhal", "application/hal+json")))]
	#[case("application/json;q=0.5, application/vnd.api+json", Some(("jsonapi", "application/vnd.api+json")))]
	#[case("*/*", Some(("jsonld", "application/ld+json")))]
	#[case("application/*", Some(("jsonld", "application/ld+json")))]
	#[case("text/csv", None)]
	#[case("application/json;q=0", None)]
	fn test_negotiate(#[case] accept: &str, #[case] expected: Option<(&str, &str)>) {
		let formats = default_formats();

		let negotiated = negotiate(&formats, accept);

		assert_eq!(
			negotiated,
			expected.map(|(f, m)| (f.to_string(), m.to_string()))
		);
	}
}
