//! Page-number pagination
//!
//! Settings provide the defaults; an operation may override `paginated` and
//! `items_per_page`; when the settings allow it, clients may override both
//! through query parameters.

use crate::request::QueryParams;
use armature_conf::PaginationSettings;
use armature_core::{Error, Result};
use armature_metadata::Operation;
use serde_json::Value;

/// Position of one page inside a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
	/// 1-based
	pub current_page: u64,
	pub items_per_page: u64,
	/// `true` when the total is not counted
	pub partial: bool,
}

impl PageInfo {
	pub fn new(current_page: u64, items_per_page: u64) -> Self {
		Self {
			current_page,
			items_per_page,
			partial: false,
		}
	}

	pub fn with_partial(mut self, partial: bool) -> Self {
		self.partial = partial;
		self
	}

	/// Number of items skipped before this page
	///
	/// # Examples
	///
	/// ```
	/// use armature_state::PageInfo;
	///
	/// assert_eq!(PageInfo::new(3, 10).offset(), 20);
	/// assert_eq!(PageInfo::new(2, 10).last_page(45), 5);
	/// assert_eq!(PageInfo::new(1, 10).last_page(0), 1);
	/// ```
	pub fn offset(&self) -> u64 {
		(self.current_page.saturating_sub(1)).saturating_mul(self.items_per_page)
	}

	pub fn last_page(&self, total_items: u64) -> u64 {
		if self.items_per_page == 0 {
			return 1;
		}
		total_items.div_ceil(self.items_per_page).max(1)
	}

	pub fn previous_page(&self) -> Option<u64> {
		(self.current_page > 1).then(|| self.current_page - 1)
	}

	/// Next page number; partial pages only know there is one when the page is full
	pub fn next_page(&self, total_items: Option<u64>, items_on_page: usize) -> Option<u64> {
		let has_next = match total_items {
			Some(total) if !self.partial => self.current_page < self.last_page(total),
			_ => items_on_page as u64 >= self.items_per_page && self.items_per_page > 0,
		};
		has_next.then(|| self.current_page + 1)
	}
}

fn as_u64(value: &Value) -> Option<u64> {
	match value {
		Value::Number(n) => n.as_u64(),
		Value::String(s) => s.trim().parse().ok(),
		_ => None,
	}
}

fn as_i64(value: &Value) -> Option<i64> {
	match value {
		Value::Number(n) => n.as_i64(),
		Value::String(s) => s.trim().parse().ok(),
		_ => None,
	}
}

fn as_bool(value: &Value) -> Option<bool> {
	match value {
		Value::Bool(b) => Some(*b),
		Value::String(s) => match s.as_str() {
			"1" | "true" | "on" | "yes" => Some(true),
			"0" | "false" | "off" | "no" => Some(false),
			_ => None,
		},
		_ => None,
	}
}

/// Resolves pagination for one operation and request
#[derive(Debug, Clone, Default)]
pub struct Pagination {
	settings: PaginationSettings,
}

impl Pagination {
	pub fn new(settings: PaginationSettings) -> Self {
		Self { settings }
	}

	pub fn settings(&self) -> &PaginationSettings {
		&self.settings
	}

	pub fn is_enabled(&self, operation: &Operation, filters: &QueryParams) -> bool {
		let enabled = operation.paginated.unwrap_or(self.settings.enabled);
		if self.settings.client_enabled
			&& let Some(requested) = filters
				.get(&self.settings.enabled_parameter_name)
				.and_then(as_bool)
		{
			return requested;
		}
		enabled
	}

	pub fn is_partial(&self) -> bool {
		self.settings.partial
	}

	/// Page size, after client override and the configured maximum
	pub fn limit(&self, operation: &Operation, filters: &QueryParams) -> Result<u64> {
		let mut limit = operation
			.items_per_page
			.unwrap_or(self.settings.items_per_page);
		if self.settings.client_items_per_page
			&& let Some(raw) = filters.get(&self.settings.items_per_page_parameter_name)
		{
			limit = as_u64(raw).ok_or_else(|| {
				Error::InvalidArgument(format!(
					"\"{}\" must be a positive integer",
					self.settings.items_per_page_parameter_name
				))
			})?;
		}
		if let Some(maximum) = self.settings.maximum_items_per_page {
			limit = limit.min(maximum);
		}
		if limit == 0 {
			return Err(Error::InvalidArgument(
				"Limit should not be less than 1".to_string(),
			));
		}
		Ok(limit)
	}

	pub fn page(&self, filters: &QueryParams) -> Result<u64> {
		let Some(raw) = filters.get(&self.settings.page_parameter_name) else {
			return Ok(1);
		};
		match as_i64(raw) {
			Some(page) if page >= 1 => Ok(page as u64),
			Some(_) => Err(Error::InvalidArgument(
				"Page should not be less than 1".to_string(),
			)),
			None => Err(Error::InvalidArgument(format!(
				"\"{}\" must be an integer",
				self.settings.page_parameter_name
			))),
		}
	}

	/// `None` when the operation is not paginated
	pub fn page_info(&self, operation: &Operation, filters: &QueryParams) -> Result<Option<PageInfo>> {
		if !operation.collection || !self.is_enabled(operation, filters) {
			return Ok(None);
		}
		let page = PageInfo::new(self.page(filters)?, self.limit(operation, filters)?)
			.with_partial(self.is_partial());
		Ok(Some(page))
	}
}
