//! Backend provider reading from an [`InMemoryStore`]

use crate::evaluator::QueryEvaluator;
use crate::store::InMemoryStore;
use armature_core::Result;
use armature_filters::{FilterLocator, QueryBuilder, apply_filters};
use armature_metadata::Operation;
use armature_state::{
	CollectionData, OperationContext, Pagination, Provider, StateData, UriVariables,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Items by identifier; collections filtered, ordered and paginated
///
/// Collections run the operation's filters over a fresh [`QueryBuilder`],
/// then page it the way [`Pagination`] resolves for the request. Partial
/// pagination skips the total.
pub struct InMemoryProvider {
	store: Arc<InMemoryStore>,
	filters: Arc<FilterLocator>,
	pagination: Pagination,
}

impl InMemoryProvider {
	pub fn new(store: Arc<InMemoryStore>, pagination: Pagination) -> Self {
		Self {
			store,
			filters: Arc::new(FilterLocator::new("filter")),
			pagination,
		}
	}

	pub fn with_filters(mut self, filters: Arc<FilterLocator>) -> Self {
		self.filters = filters;
		self
	}

	pub fn store(&self) -> &Arc<InMemoryStore> {
		&self.store
	}

	fn collection(
		&self,
		operation: &Operation,
		context: &OperationContext,
	) -> Result<StateData> {
		let query = apply_filters(
			&self.filters,
			QueryBuilder::new(&operation.class),
			operation,
			context,
		)?;
		let page = self.pagination.page_info(operation, &context.filters)?;
		let query = match &page {
			Some(page) => query.paginate(page.offset(), page.items_per_page),
			None => query,
		};

		let result =
			QueryEvaluator::new(&self.store).execute(&query, self.store.all(&operation.class))?;
		tracing::debug!(
			resource_class = %operation.class,
			operation = %operation.name,
			total_items = result.total_items,
			"Queried in-memory collection"
		);

		let mut collection = CollectionData::new(result.items);
		match page {
			Some(page) => {
				let total = (!page.partial).then_some(result.total_items);
				collection = collection.with_total_items(total).with_page(page);
			}
			None => collection = collection.with_total_items(Some(result.total_items)),
		}
		Ok(StateData::Collection(collection))
	}
}

#[async_trait]
impl Provider for InMemoryProvider {
	async fn provide(
		&self,
		operation: &Operation,
		uri_variables: &UriVariables,
		context: &mut OperationContext,
	) -> Result<StateData> {
		let context = &*context;
		let operation = context.resolved_operation(operation);
		if operation.collection {
			return self.collection(operation, context);
		}

		let item = self.store.get(&operation.class, uri_variables)?;
		tracing::debug!(
			resource_class = %operation.class,
			operation = %operation.name,
			found = item.is_some(),
			"Looked up in-memory item"
		);
		Ok(item.map(StateData::Item).unwrap_or_default())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::{Book, library};
	use armature_conf::PaginationSettings;
	use armature_core::ResourceClass;
	use armature_filters::{Condition, Filter, FilterDescription, MatchStrategy};
	use armature_metadata::HttpMethod;
	use armature_state::parse_query;
	use indexmap::IndexMap;
	use rstest::rstest;
	use serde_json::{Value, json};

	/// Keeps titles containing the `q` query parameter
	struct TitleFilter;

	impl Filter for TitleFilter {
		fn apply(
			&self,
			query: QueryBuilder,
			_resource_class: &str,
			_operation: &Operation,
			context: &OperationContext,
		) -> Result<QueryBuilder> {
			let Some(Value::String(q)) = context.filters.get("q") else {
				return Ok(query);
			};
			Ok(query.and_where(Condition::Matches {
				property: "title".to_string(),
				strategy: MatchStrategy::Partial,
				value: q.clone(),
				case_insensitive: true,
			}))
		}

		fn description(&self, _resource_class: &str) -> Result<IndexMap<String, FilterDescription>> {
			Ok(IndexMap::new())
		}
	}

	fn provider(settings: PaginationSettings) -> InMemoryProvider {
		let filters = FilterLocator::new("filter").with_named("title", Arc::new(TitleFilter));
		InMemoryProvider::new(Arc::new(library()), Pagination::new(settings))
			.with_filters(Arc::new(filters))
	}

	fn book_list() -> Operation {
		Operation::new(HttpMethod::Get, true)
			.with_name("_api_Book_get_collection")
			.with_class(Book::RESOURCE_CLASS, "Book")
			.with_filter("title")
	}

	fn book_get() -> Operation {
		Operation::new(HttpMethod::Get, false)
			.with_name("_api_Book_get")
			.with_class(Book::RESOURCE_CLASS, "Book")
	}

	fn titles(data: &StateData) -> Vec<String> {
		data.as_collection()
			.unwrap()
			.iter()
			.map(|i| i.downcast_ref::<Book>().unwrap().title.clone())
			.collect()
	}

	#[rstest]
	#[tokio::test]
	async fn test_item_lookup() {
		// Arrange
		let provider = provider(PaginationSettings::default());
		let mut uri_variables = UriVariables::new();
		uri_variables.insert("id".to_string(), json!("3"));

		// Act
		let data = provider
			.provide(&book_get(), &uri_variables, &mut OperationContext::new())
			.await
			.unwrap();

		// Assert
		let book = data.as_item().unwrap().downcast_ref::<Book>().unwrap();
		assert_eq!(book.title, "Foundation");
	}

	#[rstest]
	#[tokio::test]
	async fn test_missing_item_is_empty() {
		let provider = provider(PaginationSettings::default());
		let mut uri_variables = UriVariables::new();
		uri_variables.insert("id".to_string(), json!("999"));

		let data = provider
			.provide(&book_get(), &uri_variables, &mut OperationContext::new())
			.await
			.unwrap();

		assert!(data.is_empty());
	}

	#[rstest]
	#[tokio::test]
	async fn test_collection_is_filtered_and_paginated() {
		// Arrange
		let provider = provider(PaginationSettings {
			items_per_page: 1,
			..Default::default()
		});
		let mut context = OperationContext::new().with_filters(parse_query("q=ON&page=2"));

		// Act
		let data = provider
			.provide(&book_list(), &UriVariables::new(), &mut context)
			.await
			.unwrap();

		// Assert
		assert_eq!(titles(&data), ["Persuasion"]);
		let collection = data.as_collection().unwrap();
		assert_eq!(collection.total_items, Some(2));
		assert_eq!(collection.page.map(|p| p.current_page), Some(2));
	}

	#[rstest]
	#[tokio::test]
	async fn test_partial_pagination_has_no_total() {
		let provider = provider(PaginationSettings {
			items_per_page: 3,
			partial: true,
			..Default::default()
		});
		let mut context = OperationContext::new();

		let data = provider
			.provide(&book_list(), &UriVariables::new(), &mut context)
			.await
			.unwrap();

		assert_eq!(titles(&data), ["Dune", "Emma", "Foundation"]);
		assert_eq!(data.as_collection().unwrap().total_items, None);
	}

	#[rstest]
	#[tokio::test]
	async fn test_unpaginated_collection() {
		let provider = provider(PaginationSettings {
			enabled: false,
			..Default::default()
		});

		let data = provider
			.provide(&book_list(), &UriVariables::new(), &mut OperationContext::new())
			.await
			.unwrap();

		let collection = data.as_collection().unwrap();
		assert_eq!(collection.len(), 4);
		assert_eq!(collection.total_items, Some(4));
		assert!(collection.page.is_none());
	}
}
