//! File injection middleware

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::header::CONTENT_TYPE,
    middleware::Next,
    response::Response,
};
use filefield_core::FileFieldSchema;
use filefield_decoder::{is_multipart_form_data, DecodeOutcome, MultipartDecoder};

use crate::error::HttpFormError;

/// Decode a `multipart/form-data` body against `T` and hand the record to the handler.
///
/// The decoded record goes into the request extensions and the body is replaced by an
/// empty one. Requests with any other content type, or whose schema has nothing to
/// decode, pass through with their body untouched.
///
/// ```ignore
/// let route = post(upload_photo).layer(axum::middleware::from_fn_with_state(
///     decoder,
///     inject_files::<UploadPhoto>,
/// ));
/// ```
pub async fn inject_files<T: FileFieldSchema>(
    State(decoder): State<Arc<MultipartDecoder>>,
    request: Request,
    next: Next,
) -> Result<Response, HttpFormError> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();

    if !is_multipart_form_data(&content_type) {
        return Ok(next.run(request).await);
    }

    let (mut parts, body) = request.into_parts();
    let request = match decoder
        .decode::<T, _, _, _>(&content_type, body.into_data_stream())
        .await?
    {
        DecodeOutcome::Decoded(record) => {
            tracing::debug!(
                method = %parts.method,
                uri = %parts.uri,
                fields = record.len(),
                "Injected decoded multipart fields"
            );
            parts.extensions.insert(record);
            Request::from_parts(parts, Body::empty())
        }
        DecodeOutcome::Untouched(stream) => Request::from_parts(parts, Body::from_stream(stream)),
    };

    Ok(next.run(request).await)
}
