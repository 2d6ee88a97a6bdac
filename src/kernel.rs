//! Request handling: routing, the provider pipeline, writes and responses

use crate::builder::ApiKernelBuilder;
use crate::entrypoint::{collect_entries, entrypoint_document};
use crate::response::ApiResponse;
use armature_conf::ApiSettings;
use armature_core::{Error, ResourceClassRegistry, Result};
use armature_filters::FilterLocator;
use armature_iri::{IriConverter, Router, UrlReferenceType};
use armature_metadata::{
	HttpMethod, Operation, ResourceMetadataCollectionFactory, ResourceNameCollectionFactory,
};
use armature_serializer::error::PROBLEM_FORMAT;
use armature_serializer::jsonld::context_builder::ENTRYPOINT;
use armature_serializer::{ContextBuilder, NormalizationContext, ResourceSerializer, jsonld};
use armature_state::negotiation::negotiate;
use armature_state::{ApiRequest, OperationContext, Processor, Provider, StateData};
use http::StatusCode;
use http::header::{CONTENT_LOCATION, CONTENT_TYPE, LOCATION, VARY};
use serde_json::Value;
use std::sync::Arc;

const CONTEXTS_PREFIX: &str = "/contexts/";
const JSONLD_MIME: &str = "application/ld+json";
const PROBLEM_MIME: &str = "application/problem+json";

/// Everything [`ApiKernelBuilder::build`] wires together
pub(crate) struct KernelParts {
	pub settings: Arc<ApiSettings>,
	pub registry: Arc<ResourceClassRegistry>,
	pub names: Arc<dyn ResourceNameCollectionFactory>,
	pub resources: Arc<dyn ResourceMetadataCollectionFactory>,
	pub router: Arc<Router>,
	pub provider: Arc<dyn Provider>,
	pub processor: Arc<dyn Processor>,
	pub iri_converter: Arc<dyn IriConverter>,
	pub serializer: ResourceSerializer,
	pub contexts: ContextBuilder,
	pub filters: Arc<FilterLocator>,
	#[cfg(feature = "memory")]
	pub memory_store: Option<Arc<armature_memory::InMemoryStore>>,
}

/// Answers [`ApiRequest`]s for every registered resource
///
/// `GET /` serves the entrypoint and `GET /contexts/{ShortName}` the JSON-LD
/// contexts; every other path is routed to an operation. Failures never
/// escape [`ApiKernel::handle`]: they are rendered as error documents in the
/// negotiated error format.
pub struct ApiKernel {
	settings: Arc<ApiSettings>,
	registry: Arc<ResourceClassRegistry>,
	names: Arc<dyn ResourceNameCollectionFactory>,
	resources: Arc<dyn ResourceMetadataCollectionFactory>,
	router: Arc<Router>,
	provider: Arc<dyn Provider>,
	processor: Arc<dyn Processor>,
	iri_converter: Arc<dyn IriConverter>,
	serializer: ResourceSerializer,
	contexts: ContextBuilder,
	filters: Arc<FilterLocator>,
	#[cfg(feature = "memory")]
	memory_store: Option<Arc<armature_memory::InMemoryStore>>,
}

impl ApiKernel {
	pub fn builder(settings: ApiSettings) -> ApiKernelBuilder {
		ApiKernelBuilder::new(settings)
	}

	pub(crate) fn from_parts(parts: KernelParts) -> Self {
		Self {
			settings: parts.settings,
			registry: parts.registry,
			names: parts.names,
			resources: parts.resources,
			router: parts.router,
			provider: parts.provider,
			processor: parts.processor,
			iri_converter: parts.iri_converter,
			serializer: parts.serializer,
			contexts: parts.contexts,
			filters: parts.filters,
			#[cfg(feature = "memory")]
			memory_store: parts.memory_store,
		}
	}

	pub fn settings(&self) -> &ApiSettings {
		&self.settings
	}

	pub fn registry(&self) -> &Arc<ResourceClassRegistry> {
		&self.registry
	}

	pub fn resource_metadata_factory(&self) -> &Arc<dyn ResourceMetadataCollectionFactory> {
		&self.resources
	}

	pub fn router(&self) -> &Router {
		&self.router
	}

	pub fn iri_converter(&self) -> &Arc<dyn IriConverter> {
		&self.iri_converter
	}

	pub fn serializer(&self) -> &ResourceSerializer {
		&self.serializer
	}

	pub fn filters(&self) -> &FilterLocator {
		&self.filters
	}

	/// Store behind the in-memory backend, when it is enabled
	#[cfg(feature = "memory")]
	pub fn memory_store(&self) -> Option<&Arc<armature_memory::InMemoryStore>> {
		self.memory_store.as_ref()
	}

	/// Answer one request
	pub async fn handle(&self, request: ApiRequest) -> ApiResponse {
		let accept = request.accept().map(str::to_string);
		let mut route_format = request.route_format.clone();
		let method = request.method.clone();
		let path = request.path.clone();

		match self.dispatch(request, &mut route_format).await {
			Ok(response) => {
				tracing::debug!(
					method = %method,
					path = path.as_str(),
					status = response.status.as_u16(),
					"Request handled"
				);
				response
			}
			Err(error) => {
				if error.is_server_error() {
					tracing::error!(method = %method, path = path.as_str(), error = %error, "Request failed");
				} else {
					tracing::debug!(method = %method, path = path.as_str(), error = %error, "Request rejected");
				}
				self.error_response(&error, accept.as_deref(), route_format.as_deref())
			}
		}
	}

	async fn dispatch(
		&self,
		mut request: ApiRequest,
		route_format: &mut Option<String>,
	) -> Result<ApiResponse> {
		let method: HttpMethod = request.method.as_str().parse().map_err(|_| {
			Error::MethodNotAllowed(format!("Method \"{}\" is not supported", request.method))
		})?;
		if method == HttpMethod::Get
			&& let Some(response) = self.documentation(&request)?
		{
			return Ok(response);
		}

		let route = self.router.match_path(method, &request.path)?;
		if route_format.is_none() {
			*route_format = route.format.clone();
		}
		request.route_format = route_format.clone();
		tracing::debug!(
			operation = %route.operation.name,
			resource_class = %route.operation.class,
			"Route matched"
		);

		let mut context = OperationContext::new().with_request(request);
		let data = self
			.provider
			.provide(&route.operation, &route.uri_variables, &mut context)
			.await?;
		let operation = context.resolved_operation(&route.operation).clone();
		let data = self
			.processor
			.process(data, &operation, &route.uri_variables, &mut context)
			.await?;
		self.respond(&operation, &data, &context)
	}

	fn respond(
		&self,
		operation: &Operation,
		data: &StateData,
		context: &OperationContext,
	) -> Result<ApiResponse> {
		let response = ApiResponse::new(operation.success_status()).with_header(VARY, "Accept");
		if data.is_empty() {
			return Ok(response);
		}

		let format = context
			.format
			.clone()
			.or_else(|| self.settings.formats.keys().next().cloned())
			.unwrap_or_else(|| jsonld::FORMAT.to_string());
		let mime_type = context
			.mime_type
			.clone()
			.or_else(|| self.first_mime(&format))
			.unwrap_or_else(|| JSONLD_MIME.to_string());
		let normalization = NormalizationContext::for_operation(operation, context);
		let body = self.serializer.serialize(data, &format, &normalization)?;
		let mut response = response
			.with_body(body)
			.with_header(CONTENT_TYPE, &mime_type);

		if let Some(item) = data.as_item() {
			match self
				.iri_converter
				.iri_from_item(item, Some(operation), UrlReferenceType::AbsolutePath)
			{
				Ok(iri) => {
					response = response.with_header(CONTENT_LOCATION, &iri);
					if response.status == StatusCode::CREATED {
						response = response.with_header(LOCATION, &iri);
					}
				}
				Err(error) => {
					tracing::debug!(
						operation = %operation.name,
						error = %error,
						"Responding without a Content-Location"
					);
				}
			}
		}
		Ok(response)
	}

	fn first_mime(&self, format: &str) -> Option<String> {
		self.settings
			.formats
			.get(format)
			.and_then(|mimes| mimes.first())
			.cloned()
	}

	/// Entrypoint and context documents; `None` for any other path
	fn documentation(&self, request: &ApiRequest) -> Result<Option<ApiResponse>> {
		let path = request.path.as_str();
		if path == "/" {
			let (format, mime_type) = self.entrypoint_format(request);
			let entries = collect_entries(
				self.names.as_ref(),
				self.resources.as_ref(),
				self.iri_converter.as_ref(),
			)?;
			let document = entrypoint_document(&entries, &format);
			return Ok(Some(json_response(&document, &mime_type)?));
		}

		let Some(short_name) = path.strip_prefix(CONTEXTS_PREFIX) else {
			return Ok(None);
		};
		let document = if short_name == ENTRYPOINT {
			let entries = collect_entries(
				self.names.as_ref(),
				self.resources.as_ref(),
				self.iri_converter.as_ref(),
			)?;
			self.contexts
				.entrypoint_context(entries.iter().map(|e| e.short_name.as_str()))
		} else {
			let class = self.class_by_short_name(short_name)?;
			self.contexts.resource_context(&class, None)?
		};
		Ok(Some(json_response(&document, JSONLD_MIME)?))
	}

	fn entrypoint_format(&self, request: &ApiRequest) -> (String, String) {
		let formats = &self.settings.formats;
		if let Some(format) = &request.route_format
			&& let Some(mime_type) = self.first_mime(format)
		{
			return (format.clone(), mime_type);
		}
		request
			.accept()
			.and_then(|accept| negotiate(formats, accept))
			.or_else(|| {
				formats
					.iter()
					.next()
					.and_then(|(format, mimes)| mimes.first().map(|m| (format.clone(), m.clone())))
			})
			.unwrap_or_else(|| (jsonld::FORMAT.to_string(), JSONLD_MIME.to_string()))
	}

	fn class_by_short_name(&self, short_name: &str) -> Result<String> {
		for class in self.names.create()? {
			let collection = self.resources.create(&class)?;
			if collection
				.resources()
				.iter()
				.any(|resource| resource.short_name == short_name)
			{
				return Ok(class);
			}
		}
		Err(Error::NotFound(format!(
			"No resource is exposed under the short name \"{}\"",
			short_name
		)))
	}

	/// Render `error` in the first error format the client can use
	fn error_response(
		&self,
		error: &Error,
		accept: Option<&str>,
		route_format: Option<&str>,
	) -> ApiResponse {
		let formats = &self.settings.error_formats;
		let (format, mime_type) = route_format
			.and_then(|format| {
				formats
					.get(format)
					.and_then(|mimes| mimes.first())
					.map(|mime| (format.to_string(), mime.clone()))
			})
			.or_else(|| accept.and_then(|accept| negotiate(formats, accept)))
			.or_else(|| {
				formats
					.iter()
					.next()
					.and_then(|(format, mimes)| mimes.first().map(|m| (format.clone(), m.clone())))
			})
			.unwrap_or_else(|| (PROBLEM_FORMAT.to_string(), PROBLEM_MIME.to_string()));

		let mut document = armature_serializer::normalize_error(error, &format, self.settings.debug);
		let status = match error {
			Error::Validation(_) => {
				let status = self.settings.validator.validation_error_status;
				override_status(&mut document, status);
				status
			}
			_ => error.status_code(),
		};

		let body = serde_json::to_vec(&document).unwrap_or_default();
		ApiResponse::new(status)
			.with_body(body)
			.with_header(CONTENT_TYPE, &mime_type)
			.with_header(VARY, "Accept")
	}
}

fn json_response(document: &Value, mime_type: &str) -> Result<ApiResponse> {
	Ok(ApiResponse::new(200)
		.with_body(serde_json::to_vec(document)?)
		.with_header(CONTENT_TYPE, mime_type)
		.with_header(VARY, "Accept"))
}

/// Rewrite the status carried inside an error document
fn override_status(document: &mut Value, status: u16) {
	if let Some(object) = document.as_object_mut()
		&& object.contains_key("status")
	{
		object.insert("status".to_string(), Value::from(status));
		object.insert("type".to_string(), Value::String(format!("/errors/{}", status)));
	}
	if let Some(errors) = document.get_mut("errors").and_then(Value::as_array_mut) {
		for entry in errors.iter_mut().filter_map(Value::as_object_mut) {
			entry.insert("status".to_string(), Value::String(status.to_string()));
		}
	}
}
