//! HTTP boundary for the multipart decoder
//!
//! [`middleware::inject_files`] decodes `multipart/form-data` request bodies against a
//! schema and leaves the record in the request extensions, where handlers pick it up
//! through the [`extract::Files`] extractor.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod setup;
pub mod telemetry;

pub use error::{ErrorResponse, HttpFormError};
pub use extract::Files;
pub use middleware::inject_files;
