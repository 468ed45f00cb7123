//! Photo upload handler
//!
//! Demonstrates a schema with a capped single image, an optional thumbnail and a
//! multi-file attachment field.

use axum::Json;
use filefield_core::{FieldConstraint, FileFieldSchema, FileValue};
use serde::Serialize;

use crate::extract::Files;

pub const PHOTO_MAX_BYTES: u64 = 5 * 1000 * 1000;
pub const MAX_ADDITIONAL_ASSETS: usize = 10;

/// Form accepted by `POST /photo`.
pub struct UploadPhoto;

impl FileFieldSchema for UploadPhoto {
    fn file_fields() -> Vec<FieldConstraint> {
        vec![
            FieldConstraint::new("photo")
                .with_allowed_media_types(["image/jpeg", "image/png", "image/webp"])
                .with_max_size(PHOTO_MAX_BYTES),
            FieldConstraint::new("thumbnail").with_allowed_media_types(["image/webp"]),
            FieldConstraint::new("additional_assets")
                .with_field_name("additionalAssets")
                .with_allowed_media_types(["text/markdown"])
                .with_max_files(MAX_ADDITIONAL_ASSETS),
        ]
    }
}

#[derive(Debug, Serialize)]
pub struct FileSummary {
    pub field_name: String,
    pub filename: String,
    pub media_type: String,
    pub size: usize,
}

impl From<&FileValue> for FileSummary {
    fn from(file: &FileValue) -> Self {
        Self {
            field_name: file.field_name.clone(),
            filename: file.filename.clone(),
            media_type: file.media_type.clone(),
            size: file.size(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PhotoUploadResponse {
    pub name: Option<String>,
    pub photo: Option<FileSummary>,
    pub thumbnail: Option<FileSummary>,
    pub additional_assets: Vec<FileSummary>,
}

pub async fn upload_photo(Files(record): Files) -> Json<PhotoUploadResponse> {
    let response = PhotoUploadResponse {
        name: record.text("name").map(str::to_string),
        photo: record.file("photo").map(FileSummary::from),
        thumbnail: record.file("thumbnail").map(FileSummary::from),
        additional_assets: record
            .files("additionalAssets")
            .into_iter()
            .map(FileSummary::from)
            .collect(),
    };

    tracing::info!(
        photo = response.photo.is_some(),
        thumbnail = response.thumbnail.is_some(),
        additional_assets = response.additional_assets.len(),
        "Photo upload received"
    );

    Json(response)
}
