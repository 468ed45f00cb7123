use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, RwLock};

use crate::error::FormError;
use crate::models::FieldConstraint;

use super::index::SchemaIndex;

/// Static declaration of a target type's file-capable properties.
///
/// ```
/// use filefield_core::{FieldConstraint, FileFieldSchema};
///
/// struct UploadPhoto;
///
/// impl FileFieldSchema for UploadPhoto {
///     fn file_fields() -> Vec<FieldConstraint> {
///         vec![FieldConstraint::new("photo").with_allowed_media_types(["image/png"])]
///     }
/// }
/// ```
pub trait FileFieldSchema: 'static {
    fn file_fields() -> Vec<FieldConstraint>;
}

static GLOBAL_REGISTRY: LazyLock<SchemaRegistry> = LazyLock::new(SchemaRegistry::new);

/// Cache of schema indexes keyed by target type.
///
/// Each index is built once, outside the lock, and never changes afterwards. When two
/// callers race to build the same index, the first insert wins and both get it.
#[derive(Clone, Default)]
pub struct SchemaRegistry {
    indexes: Arc<RwLock<HashMap<TypeId, Arc<SchemaIndex>>>>,
}

impl SchemaRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry shared by every decoder that does not bring its own.
    pub fn global() -> &'static SchemaRegistry {
        &GLOBAL_REGISTRY
    }

    /// Index for `T`, built on first use.
    pub fn resolve<T: FileFieldSchema>(&self) -> Result<Arc<SchemaIndex>, FormError> {
        let key = TypeId::of::<T>();

        if let Some(index) = self
            .indexes
            .read()
            .map_err(|_| FormError::Schema("schema registry lock poisoned".to_string()))?
            .get(&key)
        {
            return Ok(index.clone());
        }

        let built = Arc::new(SchemaIndex::build(type_name::<T>(), T::file_fields())?);
        tracing::debug!(
            schema = %built.type_name(),
            file_fields = built.property_keys().len(),
            max_declared_file_size = built.max_declared_file_size(),
            "Registered file field schema"
        );

        let mut indexes = self
            .indexes
            .write()
            .map_err(|_| FormError::Schema("schema registry lock poisoned".to_string()))?;
        Ok(indexes.entry(key).or_insert(built).clone())
    }

    /// Largest declared per-file ceiling for `T`; 0 when `T` declares no capped field.
    pub fn max_declared_file_size<T: FileFieldSchema>(&self) -> Result<u64, FormError> {
        Ok(self.resolve::<T>()?.max_declared_file_size())
    }

    /// Check if an index for `T` has been built
    pub fn contains<T: FileFieldSchema>(&self) -> bool {
        self.indexes
            .read()
            .map(|indexes| indexes.contains_key(&TypeId::of::<T>()))
            .unwrap_or(false)
    }
}
