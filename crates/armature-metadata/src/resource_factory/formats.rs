//! Input and output formats per operation

use super::ResourceMetadataCollectionFactory;
use crate::operation::HttpMethod;
use crate::resource::ResourceMetadataCollection;
use armature_conf::ApiSettings;
use armature_core::Result;
use std::sync::Arc;

/// Fills formats the operation does not declare
///
/// Output formats fall back to the resource formats, then to the global
/// formats. PATCH accepts the patch formats; other methods accept the same
/// formats they produce.
pub struct FormatsResourceMetadataCollectionFactory {
	inner: Arc<dyn ResourceMetadataCollectionFactory>,
	settings: Arc<ApiSettings>,
}

impl FormatsResourceMetadataCollectionFactory {
	pub fn new(inner: Arc<dyn ResourceMetadataCollectionFactory>, settings: Arc<ApiSettings>) -> Self {
		Self { inner, settings }
	}
}

impl ResourceMetadataCollectionFactory for FormatsResourceMetadataCollectionFactory {
	fn create(&self, resource_class: &str) -> Result<Arc<ResourceMetadataCollection>> {
		let collection = Arc::unwrap_or_clone(self.inner.create(resource_class)?);

		let collection = collection.map_resources(|mut resource| {
			let formats = resource
				.formats
				.clone()
				.unwrap_or_else(|| self.settings.formats.clone());
			if let Some(operations) = resource.operations.as_mut() {
				for operation in operations.iter_mut() {
					if operation.output_formats.is_empty() {
						operation.output_formats = formats.clone();
					}
					if operation.input_formats.is_empty() {
						operation.input_formats = if operation.method == HttpMethod::Patch {
							self.settings.patch_formats.clone()
						} else {
							formats.clone()
						};
					}
				}
			}
			Ok(resource)
		})?;

		Ok(Arc::new(collection))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::operation::Operation;
	use crate::resource::ApiResourceMetadata;
	use armature_conf::FormatMap;
	use rstest::rstest;

	struct Fixed(ResourceMetadataCollection);

	impl ResourceMetadataCollectionFactory for Fixed {
		fn create(&self, _resource_class: &str) -> Result<Arc<ResourceMetadataCollection>> {
			Ok(Arc::new(self.0.clone()))
		}
	}

	#[rstest]
	fn test_formats_fall_back_to_settings() {
		// Arrange
		let mut resource = ApiResourceMetadata::new("app::Book", "Book");
		let mut json_only = FormatMap::new();
		json_only.insert("json".to_string(), vec!["application/json".to_string()]);
		resource.operations = Some(vec![
			Operation::new(HttpMethod::Get, false).with_name("get"),
			Operation::new(HttpMethod::Patch, false).with_name("patch"),
			{
				let mut post = Operation::new(HttpMethod::Post, true).with_name("post");
				post.input_formats = json_only.clone();
				post
			},
		]);
		let settings = Arc::new(ApiSettings::default());
		let factory = FormatsResourceMetadataCollectionFactory::new(
			Arc::new(Fixed(ResourceMetadataCollection::new("app::Book").with_resource(resource))),
			Arc::clone(&settings),
		);

		// Act
		let collection = factory.create("app::Book").unwrap();

		// Assert
		let get = collection.operation(Some("get"), false, false).unwrap();
		assert_eq!(get.output_formats, settings.formats);
		let patch = collection.operation(Some("patch"), false, false).unwrap();
		assert_eq!(patch.input_formats, settings.patch_formats);
		let post = collection.operation(Some("post"), true, false).unwrap();
		assert_eq!(post.input_formats, json_only);
	}
}
