//! Fixtures shared by the filter tests

use crate::property::PropertyResolver;
use armature_conf::ApiSettings;
use armature_core::{ResourceClass, ResourceClassRegistry};
use armature_macros::ApiResource;
use armature_metadata::property_factory::default_class_metadata_factory;
use armature_metadata::{HttpMethod, Link, Operation};
use armature_state::{OperationContext, parse_query};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use tracing_subscriber::layer::SubscriberExt as _;

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

pub(crate) fn resolver() -> Arc<PropertyResolver> {
	let registry = Arc::new(ResourceClassRegistry::new().with::<Author>().with::<Book>());
	Arc::new(PropertyResolver::new(default_class_metadata_factory(
		registry,
		&ApiSettings::default(),
		None,
	)))
}

pub(crate) fn book_list() -> Operation {
	Operation::new(HttpMethod::Get, true)
		.with_name("_api_Book_get_collection")
		.with_class(Book::RESOURCE_CLASS, "Book")
		.with_uri_template("/books")
}

pub(crate) fn author_item() -> Operation {
	Operation::new(HttpMethod::Get, false)
		.with_name("_api_Author_get")
		.with_class(Author::RESOURCE_CLASS, "Author")
		.with_uri_template("/authors/{id}")
		.with_uri_variable(
			Link::new("id", Author::RESOURCE_CLASS).with_identifiers(vec!["id".to_string()]),
		)
}

pub(crate) fn query(raw: &str) -> OperationContext {
	OperationContext::new().with_filters(parse_query(raw))
}

/// A tracing layer that records `[LEVEL] message` lines
#[derive(Clone, Default)]
pub(crate) struct LogCapture {
	logs: Arc<Mutex<Vec<String>>>,
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for LogCapture {
	fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
		struct MessageVisitor {
			message: String,
		}

		impl tracing::field::Visit for MessageVisitor {
			fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
				if field.name() == "message" {
					self.message = format!("{:?}", value);
				}
			}
		}

		let mut visitor = MessageVisitor {
			message: String::new(),
		};
		event.record(&mut visitor);
		self.logs
			.lock()
			.unwrap()
			.push(format!("[{}] {}", event.metadata().level(), visitor.message));
	}
}

impl LogCapture {
	/// Run `f` with this layer installed as the thread's subscriber
	pub(crate) fn capture<R>(&self, f: impl FnOnce() -> R) -> R {
		let subscriber = tracing_subscriber::registry().with(self.clone());
		tracing::subscriber::with_default(subscriber, f)
	}

	pub(crate) fn lines(&self) -> Vec<String> {
		self.logs.lock().unwrap().clone()
	}
}
