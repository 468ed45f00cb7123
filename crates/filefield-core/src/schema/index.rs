use std::collections::HashMap;
use std::sync::Arc;

use crate::error::FormError;
use crate::models::FieldConstraint;

/// Lookup tables derived from one schema's constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaIndex {
    type_name: String,
    property_keys: Vec<String>,
    by_property: HashMap<String, Arc<FieldConstraint>>,
    by_field_name: HashMap<String, Arc<FieldConstraint>>,
    max_declared_file_size: u64,
}

impl SchemaIndex {
    /// Build the index, rejecting declarations that cannot be matched unambiguously.
    pub fn build(
        type_name: impl Into<String>,
        constraints: Vec<FieldConstraint>,
    ) -> Result<Self, FormError> {
        let type_name = type_name.into();
        let mut property_keys = Vec::with_capacity(constraints.len());
        let mut by_property = HashMap::with_capacity(constraints.len());
        let mut by_field_name = HashMap::with_capacity(constraints.len());
        let mut max_declared_file_size: u64 = 0;

        for constraint in constraints {
            if constraint.field_name().is_empty() {
                return Err(FormError::Schema(format!(
                    "{}: property '{}' has an empty field name",
                    type_name,
                    constraint.property_key()
                )));
            }

            if constraint.max_files() == 0 {
                return Err(FormError::Schema(format!(
                    "{}: field '{}' must accept at least one file",
                    type_name,
                    constraint.field_name()
                )));
            }

            if by_property.contains_key(constraint.property_key()) {
                return Err(FormError::Schema(format!(
                    "{}: property '{}' is declared twice",
                    type_name,
                    constraint.property_key()
                )));
            }

            if by_field_name.contains_key(constraint.field_name()) {
                return Err(FormError::Schema(format!(
                    "{}: field name '{}' is used by more than one property",
                    type_name,
                    constraint.field_name()
                )));
            }

            max_declared_file_size =
                max_declared_file_size.max(constraint.max_size().unwrap_or(0));

            let constraint = Arc::new(constraint);
            property_keys.push(constraint.property_key().to_string());
            by_property.insert(constraint.property_key().to_string(), constraint.clone());
            by_field_name.insert(constraint.field_name().to_string(), constraint);
        }

        Ok(Self {
            type_name,
            property_keys,
            by_property,
            by_field_name,
            max_declared_file_size,
        })
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Declared property keys, in declaration order.
    pub fn property_keys(&self) -> &[String] {
        &self.property_keys
    }

    pub fn constraint_for_property(&self, property_key: &str) -> Option<&Arc<FieldConstraint>> {
        self.by_property.get(property_key)
    }

    /// Constraint matching a normalized part name.
    pub fn constraint_for_field(&self, field_name: &str) -> Option<&Arc<FieldConstraint>> {
        self.by_field_name.get(field_name)
    }

    /// Largest per-file ceiling across the schema; 0 when no field is capped.
    pub fn max_declared_file_size(&self) -> u64 {
        self.max_declared_file_size
    }

    pub fn has_file_fields(&self) -> bool {
        !self.property_keys.is_empty()
    }

    /// Constraints in declaration order.
    pub fn constraints(&self) -> impl Iterator<Item = &Arc<FieldConstraint>> {
        self.property_keys
            .iter()
            .filter_map(|key| self.by_property.get(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload_photo_constraints() -> Vec<FieldConstraint> {
        vec![
            FieldConstraint::new("photo")
                .with_allowed_media_types(["image/jpeg", "image/png", "image/webp"])
                .with_max_size(5 * 1000 * 1000),
            FieldConstraint::new("thumbnail").with_allowed_media_types(["image/webp"]),
            FieldConstraint::new("additional_assets")
                .with_field_name("additionalAssets")
                .with_allowed_media_types(["text/markdown"])
                .with_max_files(10),
        ]
    }

    #[test]
    fn build_indexes_by_property_and_field_name() {
        let index = SchemaIndex::build("UploadPhoto", upload_photo_constraints()).unwrap();

        assert_eq!(
            index.property_keys(),
            ["photo", "thumbnail", "additional_assets"]
        );
        assert!(index.constraint_for_field("additionalAssets").is_some());
        assert!(index.constraint_for_field("additional_assets").is_none());
        assert_eq!(
            index
                .constraint_for_property("additional_assets")
                .unwrap()
                .field_name(),
            "additionalAssets"
        );
        assert_eq!(index.max_declared_file_size(), 5 * 1000 * 1000);
        assert!(index.has_file_fields());
        assert_eq!(index.constraints().count(), 3);
    }

    #[test]
    fn empty_schema_has_no_ceiling() {
        let index = SchemaIndex::build("Plain", Vec::new()).unwrap();
        assert!(!index.has_file_fields());
        assert_eq!(index.max_declared_file_size(), 0);
    }

    #[test]
    fn duplicate_field_name_is_schema_error() {
        let result = SchemaIndex::build(
            "Clash",
            vec![
                FieldConstraint::new("a").with_field_name("file"),
                FieldConstraint::new("b").with_field_name("file"),
            ],
        );
        assert!(matches!(result, Err(FormError::Schema(msg)) if msg.contains("'file'")));
    }

    #[test]
    fn zero_max_files_is_schema_error() {
        let result = SchemaIndex::build("Zero", vec![FieldConstraint::new("a").with_max_files(0)]);
        assert!(matches!(result, Err(FormError::Schema(_))));
    }
}
