//! Data models
//!
//! Field constraints declared by a schema, and the values a decode produces.

mod constraint;
mod file;
mod record;

pub use constraint::FieldConstraint;
pub use file::FileValue;
pub use record::{FieldValue, ResultRecord};
