//! Filefield Core Library
//!
//! This crate provides the data model, schema registry, error types, configuration,
//! and field-name validation shared by the multipart decoder and its HTTP boundary.

pub mod config;
pub mod error;
pub mod limits;
pub mod models;
pub mod schema;
pub mod validation;

// Re-export commonly used types
pub use config::DecoderConfig;
pub use error::{ErrorKind, ErrorMetadata, FormError, LogLevel, MalformedReason, SizeLimitScope};
pub use models::{FieldConstraint, FieldValue, FileValue, ResultRecord};
pub use schema::{FileFieldSchema, SchemaIndex, SchemaRegistry};
