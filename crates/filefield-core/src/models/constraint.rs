use serde::Serialize;

/// Upload rules for one file-capable property of a schema.
///
/// ```
/// use filefield_core::FieldConstraint;
///
/// let photo = FieldConstraint::new("photo")
///     .with_allowed_media_types(["image/jpeg", "image/png"])
///     .with_max_size(5 * 1000 * 1000);
/// assert_eq!(photo.field_name(), "photo");
/// assert_eq!(photo.max_files(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldConstraint {
    property_key: String,
    field_name: String,
    allowed_media_types: Vec<String>,
    max_size: Option<u64>,
    max_files: usize,
}

impl FieldConstraint {
    /// Constraint for `property_key`, matched on the wire under the same name.
    pub fn new(property_key: impl Into<String>) -> Self {
        let property_key = property_key.into();
        Self {
            field_name: property_key.clone(),
            property_key,
            allowed_media_types: Vec::new(),
            max_size: None,
            max_files: 1,
        }
    }

    /// Match incoming parts under a different name than the property key.
    pub fn with_field_name(mut self, field_name: impl Into<String>) -> Self {
        self.field_name = field_name.into();
        self
    }

    pub fn with_allowed_media_types<I, S>(mut self, media_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_media_types = media_types.into_iter().map(Into::into).collect();
        self
    }

    /// Per-file byte ceiling. Zero means unbounded.
    pub fn with_max_size(mut self, bytes: u64) -> Self {
        self.max_size = (bytes > 0).then_some(bytes);
        self
    }

    /// Maximum number of parts accepted for this field.
    pub fn with_max_files(mut self, count: usize) -> Self {
        self.max_files = count;
        self
    }

    pub fn property_key(&self) -> &str {
        &self.property_key
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn allowed_media_types(&self) -> &[String] {
        &self.allowed_media_types
    }

    pub fn max_size(&self) -> Option<u64> {
        self.max_size
    }

    pub fn max_files(&self) -> usize {
        self.max_files
    }

    /// Fields accepting more than one file are always collected as a sequence.
    pub fn collects_sequence(&self) -> bool {
        self.max_files > 1
    }
}
