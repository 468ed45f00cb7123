//! HTTP error response conversion
//!
//! Handlers and middleware return `Result<_, HttpFormError>` so decode failures render
//! consistently: status from [`ErrorMetadata`], a JSON [`ErrorResponse`] body, and a log
//! line at the error's own level.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use filefield_core::{ErrorMetadata, FormError, LogLevel};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Whether this error is recoverable (can be retried)
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

impl ErrorResponse {
    fn from_form_error(error: &FormError, with_details: bool) -> Self {
        Self {
            error: error.client_message(),
            details: with_details.then(|| error.detailed_message()),
            error_type: with_details.then(|| error.error_type().to_string()),
            code: error.error_code().to_string(),
            recoverable: error.is_recoverable(),
            suggested_action: error.suggested_action().map(String::from),
        }
    }
}

/// Wrapper type for FormError to implement IntoResponse
#[derive(Debug)]
pub struct HttpFormError(pub FormError);

impl From<FormError> for HttpFormError {
    fn from(err: FormError) -> Self {
        HttpFormError(err)
    }
}

fn log_error(error: &FormError) {
    let error_type = error.error_type();
    let field_name = error.field_name().unwrap_or_default();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type, field_name, "Multipart decode rejected");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type, field_name, "Multipart decode rejected");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type, field_name, "Multipart decode failed");
        }
    }
}

fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .map(|env| env.to_lowercase() == "production" || env.to_lowercase() == "prod")
        .unwrap_or(false)
}

impl IntoResponse for HttpFormError {
    fn into_response(self) -> Response {
        let form_error = &self.0;

        let status = StatusCode::from_u16(form_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(form_error);

        // Details stay hidden in production and for sensitive errors.
        let with_details = !is_production_env() && !form_error.is_sensitive();
        let body = ErrorResponse::from_form_error(form_error, with_details);

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filefield_core::{MalformedReason, SizeLimitScope};

    #[test]
    fn test_status_follows_error_kind() {
        let cases = [
            (FormError::Schema("dup".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
            (
                FormError::malformed(None, MalformedReason::MissingName),
                StatusCode::BAD_REQUEST,
            ),
            (
                FormError::malformed(Some("bio"), MalformedReason::ValueTruncated),
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (
                FormError::UnsupportedMediaType {
                    field_name: "photo".to_string(),
                    received: "image/gif".to_string(),
                    allowed: vec!["image/png".to_string()],
                },
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ),
            (
                FormError::OccurrenceLimit {
                    field_name: "photo".to_string(),
                    limit: 1,
                    observed: 2,
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                FormError::SizeLimit {
                    scope: SizeLimitScope::PartCount,
                    field_name: None,
                    limit: 1000,
                    observed: 1001,
                },
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (
                FormError::transport_message("reset"),
                StatusCode::BAD_REQUEST,
            ),
            (
                FormError::Internal("join".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            let response = HttpFormError(error).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn test_sensitive_error_hides_details() {
        let body = ErrorResponse::from_form_error(&FormError::Internal("boom".to_string()), false);
        assert_eq!(body.error, "Internal server error");
        assert!(body.details.is_none());
        assert!(body.error_type.is_none());
        assert_eq!(body.code, "INTERNAL_ERROR");
    }

    #[test]
    fn test_client_error_carries_details() {
        let error = FormError::file_too_large("thumbnail", 100, 150);
        let body = ErrorResponse::from_form_error(&error, true);
        assert_eq!(
            body.error,
            "File 'thumbnail' is too large. Max allow size is 100 bytes."
        );
        assert_eq!(body.error_type.as_deref(), Some("SizeLimit"));
        assert_eq!(body.code, "PAYLOAD_TOO_LARGE");
        assert!(!body.recoverable);
    }
}
