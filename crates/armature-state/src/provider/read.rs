//! Read stage

use super::Provider;
use crate::context::{OperationContext, UriVariables};
use crate::data::StateData;
use armature_core::identifier::parse_composite;
use armature_core::{Error, Result};
use armature_metadata::{Link, Operation};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Fetches the operation's data from the backend provider
///
/// URI variables are rewritten to identifier properties before the backend
/// sees them: `{id}` bound to `isbn` becomes `isbn`, a composite `a=1;b=2`
/// becomes `a` and `b`.
pub struct ReadProvider {
	inner: Arc<dyn Provider>,
}

impl ReadProvider {
	pub fn new(inner: Arc<dyn Provider>) -> Self {
		Self { inner }
	}
}

fn invalid_uri_variables() -> Error {
	Error::NotFound("Invalid uri variables.".to_string())
}

fn bind_link(link: &Link, value: &Value, resolved: &mut UriVariables) -> Result<()> {
	if link.composite_identifier {
		let raw = value.as_str().ok_or_else(invalid_uri_variables)?;
		let parsed = parse_composite(raw).map_err(|_| invalid_uri_variables())?;
		for identifier in &link.identifiers {
			let part = parsed.get(identifier).ok_or_else(invalid_uri_variables)?;
			resolved.insert(identifier.clone(), Value::String(part.clone()));
		}
		return Ok(());
	}
	let key = link
		.identifiers
		.first()
		.cloned()
		.unwrap_or_else(|| link.parameter_name.clone());
	resolved.insert(key, value.clone());
	Ok(())
}

/// Map template variables onto identifier properties
pub fn resolve_identifiers(operation: &Operation, uri_variables: &UriVariables) -> Result<UriVariables> {
	let mut resolved = UriVariables::new();
	for (name, value) in uri_variables {
		match operation.uri_variables.get(name) {
			Some(link) => bind_link(link, value, &mut resolved)?,
			None => {
				resolved.insert(name.clone(), value.clone());
			}
		}
	}
	Ok(resolved)
}

#[async_trait]
impl Provider for ReadProvider {
	async fn provide(
		&self,
		operation: &Operation,
		uri_variables: &UriVariables,
		context: &mut OperationContext,
	) -> Result<StateData> {
		if !operation.read {
			return Ok(StateData::Empty);
		}

		let identifiers = resolve_identifiers(operation, uri_variables)?;
		let data = self.inner.provide(operation, &identifiers, context).await?;

		if operation.collection {
			return Ok(data);
		}
		match data {
			StateData::Item(item) => {
				context.previous_data = Some(item.clone());
				Ok(StateData::Item(item))
			}
			StateData::Empty if operation.may_create() => Ok(StateData::Empty),
			StateData::Empty => {
				tracing::debug!(
					resource_class = %operation.class,
					operation = %operation.name,
					"Item not found"
				);
				Err(Error::ItemNotFound("Not Found".to_string()))
			}
			other => Ok(other),
		}
	}
}
