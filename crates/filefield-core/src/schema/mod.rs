//! Schema registry
//!
//! A target type declares its file-capable properties once through [`FileFieldSchema`];
//! the registry turns that declaration into an immutable [`SchemaIndex`] and caches it
//! for the life of the process.

mod index;
mod registry;

pub use index::SchemaIndex;
pub use registry::{FileFieldSchema, SchemaRegistry};
