//! Path segment inflection for resource short names

use convert_case::{Case, Casing};

const IRREGULAR: [(&str, &str); 6] = [
	("person", "people"),
	("child", "children"),
	("man", "men"),
	("woman", "women"),
	("mouse", "mice"),
	("datum", "data"),
];

const UNCOUNTABLE: [&str; 5] = ["equipment", "information", "money", "series", "species"];

/// English plural of a single lowercase word
pub fn pluralize(word: &str) -> String {
	if UNCOUNTABLE.contains(&word) {
		return word.to_string();
	}
	if let Some((_, plural)) = IRREGULAR.iter().find(|(singular, _)| *singular == word) {
		return plural.to_string();
	}
	if let Some(stem) = word.strip_suffix('y')
		&& !stem.ends_with(['a', 'e', 'i', 'o', 'u'])
		&& !stem.is_empty()
	{
		return format!("{}ies", stem);
	}
	if word.ends_with(['s', 'x', 'z']) || word.ends_with("ch") || word.ends_with("sh") {
		return format!("{}es", word);
	}
	format!("{}s", word)
}

/// Collection path segment for a short name
///
/// # Examples
///
/// ```
/// use armature_metadata::inflector::path_segment;
///
/// assert_eq!(path_segment("Book"), "books");
/// assert_eq!(path_segment("BookReview"), "book_reviews");
/// assert_eq!(path_segment("Category"), "categories");
/// ```
pub fn path_segment(short_name: &str) -> String {
	let snake = short_name.to_case(Case::Snake);
	match snake.rsplit_once('_') {
		Some((head, last)) => format!("{}_{}", head, pluralize(last)),
		None => pluralize(&snake),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("book", "books")]
	#[case("box", "boxes")]
	#[case("match", "matches")]
	#[case("day", "days")]
	#[case("category", "categories")]
	#[case("person", "people")]
	#[case("series", "series")]
	fn test_pluralize(#[case] word: &str, #[case] expected: &str) {
		assert_eq!(pluralize(word), expected);
	}

	#[rstest]
	#[case("DummyPerson", "dummy_people")]
	#[case("Address", "addresses")]
	fn test_path_segment(#[case] short_name: &str, #[case] expected: &str) {
		assert_eq!(path_segment(short_name), expected);
	}
}
