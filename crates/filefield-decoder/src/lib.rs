//! Streaming `multipart/form-data` decoder.
//!
//! Parts are tokenized by `multer`, classified against a schema, checked against their
//! field's constraints while bytes are still arriving, and merged into a
//! [`filefield_core::ResultRecord`].

pub mod upload;
pub mod validator;

pub use upload::{is_multipart_form_data, DecodeOutcome, MultipartDecoder};
pub use validator::ConstraintEnforcer;
