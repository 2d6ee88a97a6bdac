//! Content negotiation stage

use super::Provider;
use crate::context::{OperationContext, UriVariables};
use crate::data::StateData;
use crate::negotiation::{format_for_mime, mime_types, negotiate};
use crate::request::ApiRequest;
use armature_conf::{ApiSettings, FormatMap};
use armature_core::{Error, Result};
use armature_metadata::Operation;
use async_trait::async_trait;
use std::sync::Arc;

/// Picks the response format and records the request body format
///
/// Precedence: the route's forced format, then the `Accept` header, then the
/// request's own `Content-Type`, then the first configured format.
pub struct ContentNegotiationProvider {
	inner: Arc<dyn Provider>,
	settings: Arc<ApiSettings>,
}

impl ContentNegotiationProvider {
	pub fn new(inner: Arc<dyn Provider>, settings: Arc<ApiSettings>) -> Self {
		Self { inner, settings }
	}

	fn output_formats<'a>(&'a self, operation: &'a Operation, context: &OperationContext) -> &'a FormatMap {
		if context.is_error_operation {
			&self.settings.error_formats
		} else if operation.output_formats.is_empty() {
			&self.settings.formats
		} else {
			&operation.output_formats
		}
	}

	fn input_formats<'a>(&'a self, operation: &'a Operation) -> &'a FormatMap {
		if operation.input_formats.is_empty() {
			&self.settings.formats
		} else {
			&operation.input_formats
		}
	}

	/// Response format and MIME type for `request`
	pub fn negotiate(
		&self,
		operation: &Operation,
		request: &ApiRequest,
		context: &OperationContext,
	) -> Result<(String, String)> {
		let formats = self.output_formats(operation, context);
		let throw = context.throw_on_not_acceptable;

		if let Some(route_format) = request.route_format.as_deref() {
			if let Some(mime) = formats.get(route_format).and_then(|mimes| mimes.first()) {
				return Ok((route_format.to_string(), mime.clone()));
			}
			if throw {
				return Err(Error::NotFound(format!(
					"Format \"{}\" is not supported",
					route_format
				)));
			}
		} else if let Some(accept) = request.accept() {
			if let Some(negotiated) = negotiate(formats, accept) {
				return Ok(negotiated);
			}
			if throw {
				return Err(Error::NotAcceptable(format!(
					"Requested format \"{}\" is not supported. Supported MIME types are \"{}\".",
					accept,
					mime_types(formats).join("\", \"")
				)));
			}
		} else if let Some(content_type) = request.content_type()
			&& let Some(format) = format_for_mime(formats, content_type)
			&& let Some(mime) = formats.get(&format).and_then(|mimes| mimes.first())
		{
			return Ok((format, mime.clone()));
		}

		formats
			.first()
			.and_then(|(format, mimes)| Some((format.clone(), mimes.first()?.clone())))
			.ok_or_else(|| {
				Error::Configuration(format!(
					"No output format configured for operation \"{}\"",
					operation.name
				))
			})
	}
}

#[async_trait]
impl Provider for ContentNegotiationProvider {
	async fn provide(
		&self,
		operation: &Operation,
		uri_variables: &UriVariables,
		context: &mut OperationContext,
	) -> Result<StateData> {
		let Some(request) = context.request.clone() else {
			return self.inner.provide(operation, uri_variables, context).await;
		};

		let (format, mime_type) = self.negotiate(operation, &request, context)?;
		tracing::debug!(format = %format, mime_type = %mime_type, "Negotiated response format");
		context.format = Some(format);
		context.mime_type = Some(mime_type);
		context.input_format = request
			.content_type()
			.and_then(|content_type| format_for_mime(self.input_formats(operation), content_type));

		self.inner.provide(operation, uri_variables, context).await
	}
}
