//! Derives `required` from validation constraints

use super::ClassMetadataFactory;
use crate::class::{ClassMetadata, MetadataOptions};
use armature_core::descriptor::DEFAULT_GROUP;
use armature_core::{ConstraintDeclaration, ConstraintKind, ResourceClassRegistry, Result};
use std::sync::Arc;

const EMAIL_IRI: &str = "https://schema.org/email";

/// Marks a property required when a "required" constraint applies to it
///
/// Constraints are looked up in the explicit validation groups of the
/// options, or in the default group when none are given. A required flag
/// that is already decided (declared on the field) is left untouched.
pub struct ValidatorClassMetadataFactory {
	inner: Arc<dyn ClassMetadataFactory>,
	registry: Arc<ResourceClassRegistry>,
	required_constraints: Vec<String>,
}

impl ValidatorClassMetadataFactory {
	pub fn new(inner: Arc<dyn ClassMetadataFactory>, registry: Arc<ResourceClassRegistry>) -> Self {
		Self {
			inner,
			registry,
			required_constraints: vec![
				ConstraintKind::NotBlank.name().to_string(),
				ConstraintKind::NotNull.name().to_string(),
			],
		}
	}

	/// Replace the constraint names that imply `required`
	pub fn with_required_constraints(mut self, names: Vec<String>) -> Self {
		self.required_constraints = names;
		self
	}

	fn is_required_constraint(&self, constraint: &ConstraintDeclaration) -> bool {
		self.required_constraints
			.iter()
			.any(|name| name == constraint.kind.name())
	}

	fn is_required(&self, constraints: &[ConstraintDeclaration], groups: Option<&[String]>) -> bool {
		match groups {
			None => constraints
				.iter()
				.filter(|c| c.in_group(DEFAULT_GROUP))
				.any(|c| self.is_required_constraint(c)),
			Some(groups) => groups.iter().any(|group| {
				constraints
					.iter()
					.filter(|c| c.in_group(group))
					.any(|c| self.is_required_constraint(c))
			}),
		}
	}
}

impl ClassMetadataFactory for ValidatorClassMetadataFactory {
	fn create(
		&self,
		resource_class: &str,
		options: &MetadataOptions,
	) -> Result<Arc<ClassMetadata>> {
		let metadata = Arc::unwrap_or_clone(self.inner.create(resource_class, options)?);
		let descriptor = self.registry.descriptor(resource_class)?;
		let groups = options.validation_groups.as_deref();

		let metadata = metadata.map_properties(|mut property| {
			let Some(field) = descriptor.property(property.name()) else {
				return Ok(property);
			};
			if property.types().is_empty()
				&& field
					.constraints
					.iter()
					.any(|c| c.kind == ConstraintKind::Email)
			{
				property = property.with_types(vec![EMAIL_IRI.to_string()]);
			}
			if property.required().is_none() {
				let required = self.is_required(&field.constraints, groups);
				property = property.with_required(required);
			}
			Ok(property)
		})?;

		Ok(Arc::new(metadata))
	}
}
