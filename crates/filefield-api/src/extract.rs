use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use filefield_core::ResultRecord;

/// The record decoded by [`crate::inject_files`].
///
/// Empty when the middleware let the request through without decoding it.
#[derive(Debug, Clone, Default)]
pub struct Files(pub ResultRecord);

impl<S> FromRequestParts<S> for Files
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Files(
            parts
                .extensions
                .remove::<ResultRecord>()
                .unwrap_or_default(),
        ))
    }
}
