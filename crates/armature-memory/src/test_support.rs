//! Fixtures shared by the in-memory backend tests

use crate::store::InMemoryStore;
use armature_conf::ApiSettings;
use armature_core::ResourceClassRegistry;
use armature_macros::ApiResource;
use armature_metadata::property_factory::default_class_metadata_factory;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;

#[derive(Debug, Clone, Default, ApiResource)]
pub(crate) struct Author {
	pub id: i64,
	pub name: String,
}

#[derive(Debug, Clone, Default, ApiResource)]
pub(crate) struct Book {
	pub id: i64,
	pub title: String,
	pub published_at: Option<DateTime<Utc>>,
	#[api(link)]
	pub author: Option<Author>,
}

#[derive(Debug, Clone, Default, ApiResource)]
pub(crate) struct Edition {
	#[api(identifier)]
	pub isbn: String,
	#[api(identifier)]
	pub number: i64,
	pub pages: i64,
}

pub(crate) fn book(id: i64, title: &str) -> Book {
	Book {
		id,
		title: title.to_string(),
		..Default::default()
	}
}

pub(crate) fn store() -> InMemoryStore {
	let registry = Arc::new(
		ResourceClassRegistry::new()
			.with::<Author>()
			.with::<Book>()
			.with::<Edition>(),
	);
	InMemoryStore::new(default_class_metadata_factory(
		registry,
		&ApiSettings::default(),
		None,
	))
}

/// Four books by three authors; "Persuasion" has no publication date
pub(crate) fn library() -> InMemoryStore {
	let store = store();
	let author = |id: i64, name: &str| Author {
		id,
		name: name.to_string(),
	};
	let published = |year: i32| Some(Utc.with_ymd_and_hms(year, 8, 1, 0, 0, 0).unwrap());
	let books = [
		("Dune", Some(1965), author(1, "Frank Herbert")),
		("Emma", Some(1815), author(2, "Jane Austen")),
		("Foundation", Some(1951), author(3, "Isaac Asimov")),
		("Persuasion", None, author(2, "Jane Austen")),
	];
	for (title, year, author) in books {
		let book = Book {
			published_at: year.and_then(published),
			author: Some(author),
			..book(0, title)
		};
		store.save(Box::new(book)).unwrap();
	}
	store
}
