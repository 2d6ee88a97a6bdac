//! Values flowing between providers, processors and serializers

use crate::pagination::PageInfo;
use armature_core::ApiResource;

/// Result of a provider or processor
#[derive(Debug, Clone, Default)]
pub enum StateData {
	/// Nothing was read, or the item was removed
	#[default]
	Empty,
	Item(Box<dyn ApiResource>),
	Collection(CollectionData),
}

impl StateData {
	pub fn is_empty(&self) -> bool {
		matches!(self, StateData::Empty)
	}

	pub fn as_item(&self) -> Option<&dyn ApiResource> {
		match self {
			StateData::Item(item) => Some(item.as_ref()),
			_ => None,
		}
	}

	pub fn into_item(self) -> Option<Box<dyn ApiResource>> {
		match self {
			StateData::Item(item) => Some(item),
			_ => None,
		}
	}

	pub fn as_collection(&self) -> Option<&CollectionData> {
		match self {
			StateData::Collection(collection) => Some(collection),
			_ => None,
		}
	}
}

impl From<Box<dyn ApiResource>> for StateData {
	fn from(item: Box<dyn ApiResource>) -> Self {
		StateData::Item(item)
	}
}

impl From<CollectionData> for StateData {
	fn from(collection: CollectionData) -> Self {
		StateData::Collection(collection)
	}
}

/// One page (or all) of a collection
#[derive(Debug, Clone, Default)]
pub struct CollectionData {
	pub items: Vec<Box<dyn ApiResource>>,
	/// Number of items across all pages; `None` for partial pagination
	pub total_items: Option<u64>,
	pub page: Option<PageInfo>,
}

impl CollectionData {
	pub fn new(items: Vec<Box<dyn ApiResource>>) -> Self {
		let total = items.len() as u64;
		Self {
			items,
			total_items: Some(total),
			page: None,
		}
	}

	pub fn with_total_items(mut self, total_items: Option<u64>) -> Self {
		self.total_items = total_items;
		self
	}

	pub fn with_page(mut self, page: PageInfo) -> Self {
		self.page = Some(page);
		self
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &dyn ApiResource> {
		self.items.iter().map(|item| item.as_ref())
	}
}
