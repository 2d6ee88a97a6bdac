//! Pagination links of a collection page

use armature_state::{CollectionData, QueryParams};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::Value;

/// Characters left as-is in query keys and values
const QUERY: &AsciiSet = &NON_ALPHANUMERIC
	.remove(b'-')
	.remove(b'_')
	.remove(b'.')
	.remove(b'~')
	.remove(b'/')
	.remove(b':');

/// Links between the pages of a paginated collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLinks {
	pub current: String,
	pub first: String,
	/// Unknown for partial pagination
	pub last: Option<String>,
	pub previous: Option<String>,
	pub next: Option<String>,
}

impl PageLinks {
	/// `None` when the collection is not paginated
	pub fn new(
		collection: &CollectionData,
		path: &str,
		filters: &QueryParams,
		page_parameter: &str,
	) -> Option<Self> {
		let page = collection.page?;
		let url = |number: u64| {
			let mut query = filters.clone();
			query.insert(page_parameter.to_string(), Value::String(number.to_string()));
			format!("{}?{}", path, encode_query(&query))
		};
		let last = match collection.total_items {
			Some(total) if !page.partial => Some(url(page.last_page(total))),
			_ => None,
		};
		Some(Self {
			current: url(page.current_page),
			first: url(1),
			last,
			previous: page.previous_page().map(url),
			next: page
				.next_page(collection.total_items, collection.len())
				.map(url),
		})
	}
}

fn encode(raw: &str) -> String {
	utf8_percent_encode(raw, QUERY).to_string()
}

fn encode_pairs(key: &str, value: &Value, pairs: &mut Vec<String>) {
	match value {
		Value::Object(map) => {
			for (sub, inner) in map {
				encode_pairs(&format!("{}[{}]", key, sub), inner, pairs);
			}
		}
		Value::Array(items) => {
			for item in items {
				encode_pairs(&format!("{}[]", key), item, pairs);
			}
		}
		Value::Null => pairs.push(encode(key)),
		Value::String(s) => pairs.push(format!("{}={}", encode(key), encode(s))),
		other => pairs.push(format!("{}={}", encode(key), encode(&other.to_string()))),
	}
}

/// Inverse of [`armature_state::parse_query`]
///
/// # Examples
///
/// ```
/// use armature_serializer::view::encode_query;
/// use armature_state::parse_query;
///
/// let query = parse_query("title=Dune&date[after]=2020-01-01&id[]=1&id[]=2");
/// assert_eq!(
///     encode_query(&query),
///     "title=Dune&date%5Bafter%5D=2020-01-01&id%5B%5D=1&id%5B%5D=2"
/// );
/// ```
pub fn encode_query(query: &QueryParams) -> String {
	let mut pairs = Vec::new();
	for (key, value) in query {
		encode_pairs(key, value, &mut pairs);
	}
	pairs.join("&")
}
