//! Fixed defensive ceilings applied to every multipart body.
//!
//! These are deliberately not configurable; per-field caps come from the schema.

/// Maximum number of parts (scalar fields and files) in one body.
pub const MAX_PARTS: usize = 1000;

/// Maximum length of a part name, in bytes.
pub const MAX_FIELD_NAME_BYTES: usize = 100;

/// Maximum length of a scalar field value, in bytes.
pub const MAX_FIELD_VALUE_BYTES: usize = 1024 * 1024;

/// Media type assumed for a file part that carries no `Content-Type`.
pub const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";

/// Encoding assumed for a file part that carries no `Content-Transfer-Encoding`.
pub const DEFAULT_TRANSFER_ENCODING: &str = "7bit";

/// Wire suffix marking an array-style field name.
pub const ARRAY_SUFFIX: &str = "[]";

/// Content type prefix a body must carry to be decoded at all.
pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";
