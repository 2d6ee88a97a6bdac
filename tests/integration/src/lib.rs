//! Shared fixtures for the cross-crate scenarios
//!
//! A small library: three authors, four books. "Persuasion" has no
//! publication date, which the date and order filters treat as null.

use armature::filters::{DateFilter, OrderFilter, SearchFilter};
use armature::prelude::*;
use chrono::{DateTime, TimeZone, Utc};
use http::HeaderValue;
use http::header::{ACCEPT, CONTENT_TYPE};
use std::sync::Arc;

#[derive(Debug, Clone, Default, ApiResource)]
pub struct Author {
	pub id: i64,
	#[api(not_blank)]
	pub name: String,
}

#[derive(Debug, Clone, Default, ApiResource)]
#[api(filters("book.search", "book.date", "book.order"))]
pub struct Book {
	pub id: i64,
	#[api(not_blank)]
	pub title: String,
	pub published_at: Option<DateTime<Utc>>,
	#[api(link)]
	pub author: Option<Author>,
}

pub const LD_JSON: &str = "application/ld+json";

/// Builder with both resources and the book filters registered
pub fn kernel_builder(settings: ApiSettings) -> ApiKernelBuilder {
	ApiKernel::builder(settings)
		.with_resource::<Author>()
		.with_resource::<Book>()
		.with_filter("book.search", |services: &FilterServices| {
			Arc::new(
				SearchFilter::new(Arc::clone(&services.resolver))
					.with_strategy("title", "ipartial")
					.with_property("author")
					.with_router(Arc::clone(&services.router)),
			)
		})
		.with_filter("book.date", |services: &FilterServices| {
			Arc::new(DateFilter::new(Arc::clone(&services.resolver)).with_property("published_at"))
		})
		.with_filter("book.order", |services: &FilterServices| {
			Arc::new(
				OrderFilter::new(Arc::clone(&services.resolver))
					.with_property("title")
					.with_property("published_at"),
			)
		})
}

pub fn author(id: i64, name: &str) -> Author {
	Author {
		id,
		name: name.to_string(),
	}
}

pub fn published(year: i32) -> Option<DateTime<Utc>> {
	Utc.with_ymd_and_hms(year, 8, 1, 0, 0, 0).single()
}

/// Kernel over the in-memory backend, seeded with the library
pub fn library(settings: ApiSettings) -> ApiKernel {
	let kernel = kernel_builder(settings).build().unwrap();
	let store = kernel.memory_store().unwrap();

	let authors = [
		author(1, "Frank Herbert"),
		author(2, "Jane Austen"),
		author(3, "Isaac Asimov"),
	];
	for author in &authors {
		store.save(Box::new(author.clone())).unwrap();
	}
	let books = [
		("Dune", published(1965), &authors[0]),
		("Emma", published(1815), &authors[1]),
		("Foundation", published(1951), &authors[2]),
		("Persuasion", None, &authors[1]),
	];
	for (title, published_at, author) in books {
		let book = Book {
			title: title.to_string(),
			published_at,
			author: Some(author.clone()),
			..Default::default()
		};
		store.save(Box::new(book)).unwrap();
	}
	kernel
}

pub fn get(uri: &str, accept: &'static str) -> ApiRequest {
	ApiRequest::get(uri).with_header(ACCEPT, HeaderValue::from_static(accept))
}

pub fn post(uri: &str, content_type: &'static str, body: &str) -> ApiRequest {
	ApiRequest::post(uri)
		.with_header(CONTENT_TYPE, HeaderValue::from_static(content_type))
		.with_body(body.to_string())
}

/// Titles of a JSON-LD collection document, in order
pub fn member_titles(document: &serde_json::Value) -> Vec<String> {
	document["hydra:member"]
		.as_array()
		.map(|members| {
			members
				.iter()
				.filter_map(|m| m["title"].as_str().map(str::to_string))
				.collect()
		})
		.unwrap_or_default()
}
