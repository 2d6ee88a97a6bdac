//! Assembly of an [`ApiKernel`] from resources, settings and backends

use crate::kernel::{ApiKernel, KernelParts};
use armature_conf::ApiSettings;
use armature_core::{ResourceClass, ResourceClassRegistry, Result};
use armature_filters::{Filter, FilterLocator, PropertyResolver};
use armature_iri::converter::DEFAULT_BASE_URL;
use armature_iri::{DefaultIriConverter, IdentifiersExtractor, IriConverter, Router};
use armature_metadata::property_factory::default_class_metadata_factory;
use armature_metadata::resource_factory::{
	RegistryResourceNameCollectionFactory, default_resource_metadata_factory,
};
use armature_metadata::{MetadataCacheStore, ResourceNameCollectionFactory};
use armature_serializer::{ContextBuilder, ItemNormalizer, ResourceSerializer};
use armature_state::provider::ParameterProviderLocator;
use armature_state::{
	ConstraintValidator, ExpressionAccessChecker, Persister, PersisterLocator, PipelineServices,
	Provider, ProviderLocator, ResourceAccessChecker, Stage, Validator, WriteProcessor,
	build_provider_pipeline,
};
use std::sync::Arc;

/// Shared services handed to filter factories
pub struct FilterServices {
	pub resolver: Arc<PropertyResolver>,
	pub router: Arc<Router>,
}

/// Builds a filter once the metadata and routes exist
pub type FilterFactory = Box<dyn FnOnce(&FilterServices) -> Arc<dyn Filter> + Send>;

/// Builder for [`ApiKernel`]
///
/// ```
/// use armature::prelude::*;
///
/// #[derive(Debug, Clone, Default, ApiResource)]
/// struct Book {
/// 	id: i64,
/// 	title: String,
/// }
///
/// let kernel = ApiKernelBuilder::new(ApiSettings::default())
/// 	.with_resource::<Book>()
/// 	.build()
/// 	.unwrap();
/// assert!(kernel.router().len() > 0);
/// ```
pub struct ApiKernelBuilder {
	settings: ApiSettings,
	registry: ResourceClassRegistry,
	stages: Vec<Stage>,
	base_url: String,
	providers: ProviderLocator,
	persisters: PersisterLocator,
	default_provider: Option<Arc<dyn Provider>>,
	default_persister: Option<Arc<dyn Persister>>,
	filters: Vec<(String, FilterFactory)>,
	access_checker: Arc<dyn ResourceAccessChecker>,
	validator: Option<Arc<dyn Validator>>,
	parameter_providers: ParameterProviderLocator,
	cache_store: Option<Arc<dyn MetadataCacheStore>>,
	#[cfg(feature = "memory")]
	memory: bool,
}

impl ApiKernelBuilder {
	pub fn new(settings: ApiSettings) -> Self {
		Self {
			settings,
			registry: ResourceClassRegistry::new(),
			stages: Stage::DEFAULT_ORDER.to_vec(),
			base_url: DEFAULT_BASE_URL.to_string(),
			providers: ProviderLocator::new("provider"),
			persisters: PersisterLocator::new("persister"),
			default_provider: None,
			default_persister: None,
			filters: Vec::new(),
			access_checker: Arc::new(ExpressionAccessChecker::new()),
			validator: None,
			parameter_providers: ParameterProviderLocator::new("parameter provider"),
			cache_store: None,
			#[cfg(feature = "memory")]
			memory: true,
		}
	}

	/// Expose `T` as an API resource
	pub fn with_resource<T: ResourceClass>(mut self) -> Self {
		self.registry = self.registry.with::<T>();
		self
	}

	/// Replace the class registry, e.g. with one collected from inventory
	pub fn with_registry(mut self, registry: ResourceClassRegistry) -> Self {
		self.registry = registry;
		self
	}

	/// Pipeline stages, outermost first
	pub fn with_stages(mut self, stages: impl IntoIterator<Item = Stage>) -> Self {
		self.stages = stages.into_iter().collect();
		self
	}

	/// Origin of absolute URLs
	pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
		self.base_url = base_url.into();
		self
	}

	/// Provider addressed by name from `Operation::provider`
	pub fn with_provider(mut self, name: impl Into<String>, provider: Arc<dyn Provider>) -> Self {
		self.providers = self.providers.with_named(name, provider);
		self
	}

	pub fn with_class_provider(
		mut self,
		resource_class: impl Into<String>,
		provider: Arc<dyn Provider>,
	) -> Self {
		self.providers = self.providers.with_class(resource_class, provider);
		self
	}

	/// Provider of every class without a more specific one
	pub fn with_default_provider(mut self, provider: Arc<dyn Provider>) -> Self {
		self.default_provider = Some(provider);
		self
	}

	pub fn with_persister(mut self, name: impl Into<String>, persister: Arc<dyn Persister>) -> Self {
		self.persisters = self.persisters.with_named(name, persister);
		self
	}

	pub fn with_class_persister(
		mut self,
		resource_class: impl Into<String>,
		persister: Arc<dyn Persister>,
	) -> Self {
		self.persisters = self.persisters.with_class(resource_class, persister);
		self
	}

	pub fn with_default_persister(mut self, persister: Arc<dyn Persister>) -> Self {
		self.default_persister = Some(persister);
		self
	}

	/// Register a filter under the id operations list in `filters`
	///
	/// ```
	/// use armature::prelude::*;
	/// use armature::filters::SearchFilter;
	/// use std::sync::Arc;
	///
	/// let builder = ApiKernelBuilder::new(ApiSettings::default()).with_filter(
	/// 	"book.search",
	/// 	|services: &FilterServices| {
	/// 		Arc::new(SearchFilter::new(Arc::clone(&services.resolver)).with_property("title"))
	/// 	},
	/// );
	/// ```
	pub fn with_filter<F>(mut self, id: impl Into<String>, factory: F) -> Self
	where
		F: FnOnce(&FilterServices) -> Arc<dyn Filter> + Send + 'static,
	{
		self.filters.push((id.into(), Box::new(factory)));
		self
	}

	pub fn with_access_checker(mut self, access_checker: Arc<dyn ResourceAccessChecker>) -> Self {
		self.access_checker = access_checker;
		self
	}

	/// Replace the constraint validator
	pub fn with_validator(mut self, validator: Arc<dyn Validator>) -> Self {
		self.validator = Some(validator);
		self
	}

	pub fn with_parameter_provider(
		mut self,
		name: impl Into<String>,
		provider: Arc<dyn armature_state::provider::ParameterValueProvider>,
	) -> Self {
		self.parameter_providers = self.parameter_providers.with_named(name, provider);
		self
	}

	/// Shared store for computed class and resource metadata
	pub fn with_cache_store(mut self, store: Arc<dyn MetadataCacheStore>) -> Self {
		self.cache_store = Some(store);
		self
	}

	/// Serve classes without a provider or persister from memory (default on)
	#[cfg(feature = "memory")]
	pub fn with_memory_backend(mut self, enabled: bool) -> Self {
		self.memory = enabled;
		self
	}

	/// Build the metadata, routes, pipeline and serializers
	pub fn build(self) -> Result<ApiKernel> {
		let settings = Arc::new(self.settings);
		let registry = Arc::new(self.registry);

		let classes =
			default_class_metadata_factory(Arc::clone(&registry), &settings, self.cache_store);
		let resources = default_resource_metadata_factory(
			Arc::clone(&registry),
			Arc::clone(&classes),
			Arc::clone(&settings),
		);
		let names: Arc<dyn ResourceNameCollectionFactory> = Arc::new(
			RegistryResourceNameCollectionFactory::new(Arc::clone(&registry), Arc::clone(&settings)),
		);
		let router = Arc::new(Router::from_resources(names.as_ref(), resources.as_ref())?);

		let services = FilterServices {
			resolver: Arc::new(PropertyResolver::new(Arc::clone(&classes))),
			router: Arc::clone(&router),
		};
		let mut filters = FilterLocator::new("filter");
		for (id, factory) in self.filters {
			filters = filters.with_named(id, factory(&services));
		}
		let filters = Arc::new(filters);

		let mut providers = self.providers;
		let mut persisters = self.persisters;
		#[cfg(feature = "memory")]
		let memory_store = if self.memory {
			let store = Arc::new(armature_memory::InMemoryStore::new(Arc::clone(&classes)));
			if self.default_provider.is_none() {
				let provider = armature_memory::InMemoryProvider::new(
					Arc::clone(&store),
					armature_state::Pagination::new(settings.pagination.clone()),
				)
				.with_filters(Arc::clone(&filters));
				providers = providers.with_fallback(Arc::new(provider));
			}
			if self.default_persister.is_none() {
				persisters = persisters
					.with_fallback(Arc::new(armature_memory::InMemoryPersister::new(Arc::clone(&store))));
			}
			Some(store)
		} else {
			None
		};
		if let Some(provider) = self.default_provider {
			providers = providers.with_fallback(provider);
		}
		if let Some(persister) = self.default_persister {
			persisters = persisters.with_fallback(persister);
		}
		let providers = Arc::new(providers);

		let iri_converter: Arc<dyn IriConverter> = Arc::new(
			DefaultIriConverter::new(
				Arc::clone(&router),
				Arc::clone(&resources),
				IdentifiersExtractor::new(Arc::clone(&classes)),
				Arc::clone(&providers) as Arc<dyn Provider>,
			)
			.with_base_url(self.base_url.clone()),
		);
		let items = Arc::new(ItemNormalizer::from_settings(
			Arc::clone(&classes),
			Arc::clone(&iri_converter),
			Arc::clone(&self.access_checker),
			Arc::clone(&registry),
			&settings,
		));
		let serializer = ResourceSerializer::with_defaults(Arc::clone(&items));
		let contexts = ContextBuilder::new(items).with_base_url(self.base_url);

		let validator = match self.validator {
			Some(validator) => validator,
			None => Arc::new(ConstraintValidator::new(Arc::clone(&registry))?),
		};
		let pipeline = PipelineServices {
			registry: Arc::clone(&registry),
			settings: Arc::clone(&settings),
			access_checker: self.access_checker,
			validator,
			denormalizer: Arc::new(serializer.clone()),
			parameter_providers: Arc::new(self.parameter_providers),
		};
		let provider =
			build_provider_pipeline(Arc::clone(&providers) as Arc<dyn Provider>, &self.stages, &pipeline);
		let processor = Arc::new(WriteProcessor::new(Arc::new(persisters)));

		tracing::info!(
			resources = registry.resource_class_names().len(),
			routes = router.len(),
			stages = self.stages.len(),
			"API kernel built"
		);
		Ok(ApiKernel::from_parts(KernelParts {
			settings,
			registry,
			names,
			resources,
			router,
			provider,
			processor,
			iri_converter,
			serializer,
			contexts,
			filters,
			#[cfg(feature = "memory")]
			memory_store,
		}))
	}
}
