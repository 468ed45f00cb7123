//! Validation modules

pub mod field_name;
pub mod media_type;

pub use field_name::{
    has_array_suffix, is_reserved_field_name, normalize_field_name, RESERVED_FIELD_NAMES,
};
pub use media_type::{media_type_allowed, normalize_media_type};
