//! Error types module
//!
//! Every failure of a decode is reported as a single `FormError`. Variants carry the
//! field name, limit and observed value needed to render a client-facing response, and
//! `FormError::kind()` exposes the coarse error kind so it survives any boundary intact.

use std::fmt;

/// Boxed error used for transport failures coming from the byte stream or tokenizer.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like resource limits
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
/// This trait allows errors to self-describe their HTTP response characteristics
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "UNSUPPORTED_MEDIA_TYPE")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Coarse classification of a decode failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Schema,
    MalformedPart,
    MediaType,
    OccurrenceLimit,
    SizeLimit,
    Transport,
    Internal,
}

/// Why a part was considered malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedReason {
    MissingName,
    NameTruncated,
    ValueTruncated,
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedReason::MissingName => f.write_str("Field name missing"),
            MalformedReason::NameTruncated => f.write_str("Field name truncated"),
            MalformedReason::ValueTruncated => f.write_str("Field value truncated"),
        }
    }
}

/// Which ceiling a `SizeLimit` error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeLimitScope {
    /// The field's own `maxSize`.
    File,
    /// The tokenizer-level cap (largest `maxSize` declared by the schema).
    Transport,
    /// Too many parts in one body.
    PartCount,
}

#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Malformed part: {reason}")]
    MalformedPart {
        field_name: Option<String>,
        reason: MalformedReason,
    },

    #[error(
        "File '{field_name}' has unsupported media type '{received}'. Supported media types: '{}'",
        .allowed.join(", ")
    )]
    UnsupportedMediaType {
        field_name: String,
        received: String,
        allowed: Vec<String>,
    },

    #[error("Expected maximum {limit} file(s) for field '{field_name}'")]
    OccurrenceLimit {
        field_name: String,
        limit: usize,
        observed: usize,
    },

    #[error("{}", size_limit_message(.scope, .field_name, .limit))]
    SizeLimit {
        scope: SizeLimitScope,
        field_name: Option<String>,
        limit: u64,
        observed: u64,
    },

    #[error("Transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

fn size_limit_message(scope: &SizeLimitScope, field_name: &Option<String>, limit: &u64) -> String {
    match (scope, field_name) {
        (SizeLimitScope::PartCount, _) => {
            format!("Too many parts in multipart body. Maximum is {}.", limit)
        }
        (_, Some(name)) => format!(
            "File '{}' is too large. Max allow size is {} bytes.",
            name, limit
        ),
        (_, None) => format!("Payload too large. Max allow size is {} bytes.", limit),
    }
}

impl FormError {
    /// Wrap a failure of the underlying byte stream or tokenizer.
    pub fn transport(err: impl Into<BoxError>) -> Self {
        let source = err.into();
        FormError::Transport {
            message: source.to_string(),
            source: Some(source),
        }
    }

    pub fn transport_message(message: impl Into<String>) -> Self {
        FormError::Transport {
            message: message.into(),
            source: None,
        }
    }

    pub fn malformed(field_name: Option<&str>, reason: MalformedReason) -> Self {
        FormError::MalformedPart {
            field_name: field_name.map(str::to_string),
            reason,
        }
    }

    /// Per-field byte ceiling exceeded.
    pub fn file_too_large(field_name: &str, limit: u64, observed: u64) -> Self {
        FormError::SizeLimit {
            scope: SizeLimitScope::File,
            field_name: Some(field_name.to_string()),
            limit,
            observed,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FormError::Schema(_) => ErrorKind::Schema,
            FormError::MalformedPart { .. } => ErrorKind::MalformedPart,
            FormError::UnsupportedMediaType { .. } => ErrorKind::MediaType,
            FormError::OccurrenceLimit { .. } => ErrorKind::OccurrenceLimit,
            FormError::SizeLimit { .. } => ErrorKind::SizeLimit,
            FormError::Transport { .. } => ErrorKind::Transport,
            FormError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Field the error refers to, when there is one.
    pub fn field_name(&self) -> Option<&str> {
        match self {
            FormError::MalformedPart { field_name, .. } => field_name.as_deref(),
            FormError::UnsupportedMediaType { field_name, .. } => Some(field_name),
            FormError::OccurrenceLimit { field_name, .. } => Some(field_name),
            FormError::SizeLimit { field_name, .. } => field_name.as_deref(),
            FormError::Schema(_) | FormError::Transport { .. } | FormError::Internal(_) => None,
        }
    }

    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            FormError::Schema(_) => "Schema",
            FormError::MalformedPart { .. } => "MalformedPart",
            FormError::UnsupportedMediaType { .. } => "UnsupportedMediaType",
            FormError::OccurrenceLimit { .. } => "OccurrenceLimit",
            FormError::SizeLimit { .. } => "SizeLimit",
            FormError::Transport { .. } => "Transport",
            FormError::Internal(_) => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
fn form_error_static_metadata(
    err: &FormError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        FormError::Schema(_) => (
            500,
            "SCHEMA_ERROR",
            false,
            Some("Contact support if this error persists"),
            true,
            LogLevel::Error,
        ),
        FormError::MalformedPart {
            reason: MalformedReason::MissingName,
            ..
        } => (
            400,
            "MALFORMED_PART",
            false,
            Some("Give every form part a non-empty name"),
            false,
            LogLevel::Debug,
        ),
        FormError::MalformedPart { .. } => (
            413,
            "FIELD_TRUNCATED",
            false,
            Some("Shorten field names and values"),
            false,
            LogLevel::Debug,
        ),
        FormError::UnsupportedMediaType { .. } => (
            415,
            "UNSUPPORTED_MEDIA_TYPE",
            false,
            Some("Upload a file with one of the supported media types"),
            false,
            LogLevel::Debug,
        ),
        FormError::OccurrenceLimit { .. } => (
            400,
            "TOO_MANY_FILES",
            false,
            Some("Reduce the number of files sent for this field"),
            false,
            LogLevel::Debug,
        ),
        FormError::SizeLimit { .. } => (
            413,
            "PAYLOAD_TOO_LARGE",
            false,
            Some("Reduce file size or the number of parts"),
            false,
            LogLevel::Debug,
        ),
        FormError::Transport { .. } => (
            400,
            "TRANSPORT_ERROR",
            true,
            Some("Retry the upload"),
            false,
            LogLevel::Warn,
        ),
        FormError::Internal(_) => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl ErrorMetadata for FormError {
    fn http_status_code(&self) -> u16 {
        form_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        form_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        form_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        form_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        form_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        form_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            FormError::Schema(_) => "Upload schema is misconfigured".to_string(),
            FormError::MalformedPart { reason, .. } => reason.to_string(),
            FormError::Transport { .. } => "Failed to read multipart body".to_string(),
            FormError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}
