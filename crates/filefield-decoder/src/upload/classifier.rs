use std::sync::Arc;

use filefield_core::limits::{DEFAULT_MEDIA_TYPE, DEFAULT_TRANSFER_ENCODING, MAX_FIELD_NAME_BYTES};
use filefield_core::validation::{is_reserved_field_name, normalize_field_name, normalize_media_type};
use filefield_core::{FieldConstraint, FormError, MalformedReason, SchemaIndex};
use multer::Field;

const CONTENT_TRANSFER_ENCODING: &str = "content-transfer-encoding";

/// Header data of one multipart part, detached from the tokenizer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPart {
    pub name: Option<String>,
    pub filename: Option<String>,
    pub media_type: Option<String>,
    pub transfer_encoding: Option<String>,
}

impl RawPart {
    pub fn from_field(field: &Field<'_>) -> Self {
        Self {
            name: field.name().map(str::to_string),
            filename: field.file_name().map(str::to_string),
            media_type: field.content_type().map(|mime| mime.essence_str().to_string()),
            transfer_encoding: field
                .headers()
                .get(CONTENT_TRANSFER_ENCODING)
                .and_then(|value| value.to_str().ok())
                .map(|value| value.trim().to_ascii_lowercase()),
        }
    }

    /// A scalar part with the given name.
    pub fn scalar(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// A file part with the given name, filename and media type.
    pub fn file(
        name: impl Into<String>,
        filename: impl Into<String>,
        media_type: impl Into<String>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            filename: Some(filename.into()),
            media_type: Some(media_type.into()),
            transfer_encoding: None,
        }
    }
}

/// A file part matched to a declared field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    /// Name as sent on the wire.
    pub name: String,
    /// Record key: the name without its array marker.
    pub key: String,
    pub filename: String,
    pub media_type: String,
    pub encoding: String,
    pub constraint: Arc<FieldConstraint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Name collides with a reserved object property.
    Reserved,
    /// File part for a field the schema does not declare.
    Undeclared,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartKind {
    Scalar { name: String },
    File(FilePart),
    Skip { name: String, reason: SkipReason },
}

/// Decide how a part is handled.
///
/// Parts without a name are malformed. Reserved names are skipped whatever the part
/// carries, scalar parts are always kept, and a file part is kept only when its
/// normalized name is declared by `index`.
pub fn classify(part: RawPart, index: &SchemaIndex) -> Result<PartKind, FormError> {
    let name = match part.name {
        Some(name) if !name.is_empty() => name,
        _ => return Err(FormError::malformed(None, MalformedReason::MissingName)),
    };

    if name.len() > MAX_FIELD_NAME_BYTES {
        return Err(FormError::malformed(
            Some(name.as_str()),
            MalformedReason::NameTruncated,
        ));
    }

    if is_reserved_field_name(&name) {
        return Ok(PartKind::Skip {
            name,
            reason: SkipReason::Reserved,
        });
    }

    let key = normalize_field_name(&name);
    if key.is_empty() {
        return Err(FormError::malformed(
            Some(name.as_str()),
            MalformedReason::MissingName,
        ));
    }

    let Some(filename) = part.filename else {
        return Ok(PartKind::Scalar { name });
    };

    let Some(constraint) = index.constraint_for_field(key) else {
        return Ok(PartKind::Skip {
            name,
            reason: SkipReason::Undeclared,
        });
    };

    let media_type = part
        .media_type
        .as_deref()
        .map(normalize_media_type)
        .filter(|media_type| !media_type.is_empty())
        .unwrap_or_else(|| DEFAULT_MEDIA_TYPE.to_string());

    let encoding = part
        .transfer_encoding
        .filter(|encoding| !encoding.is_empty())
        .unwrap_or_else(|| DEFAULT_TRANSFER_ENCODING.to_string());

    Ok(PartKind::File(FilePart {
        key: key.to_string(),
        name,
        filename,
        media_type,
        encoding,
        constraint: constraint.clone(),
    }))
}
