use filefield_core::validation::{media_type_allowed, normalize_media_type};
use filefield_core::{FieldConstraint, FormError};

/// Constraint checks for one declared file field.
///
/// Every check is cheap and synchronous so it can run on each incoming chunk.
pub struct ConstraintEnforcer<'a> {
    constraint: &'a FieldConstraint,
}

impl<'a> ConstraintEnforcer<'a> {
    pub fn new(constraint: &'a FieldConstraint) -> Self {
        Self { constraint }
    }

    /// Reject a media type outside a non-empty allow-list.
    pub fn check_media_type(&self, media_type: &str) -> Result<(), FormError> {
        let allowed = self.constraint.allowed_media_types();
        if media_type_allowed(media_type, allowed) {
            return Ok(());
        }

        Err(FormError::UnsupportedMediaType {
            field_name: self.constraint.field_name().to_string(),
            received: normalize_media_type(media_type),
            allowed: allowed.to_vec(),
        })
    }

    /// Reject a part when `current` values are already stored for the field and one
    /// more would exceed `max_files`.
    pub fn check_occurrence(&self, current: usize) -> Result<(), FormError> {
        let limit = self.constraint.max_files();
        if current < limit {
            return Ok(());
        }

        Err(FormError::OccurrenceLimit {
            field_name: self.constraint.field_name().to_string(),
            limit,
            observed: current + 1,
        })
    }

    /// Reject as soon as `accumulated + incoming` would exceed `max_size`.
    pub fn check_byte_budget(&self, accumulated: u64, incoming: usize) -> Result<(), FormError> {
        let Some(limit) = self.constraint.max_size() else {
            return Ok(());
        };

        let total = accumulated.saturating_add(incoming as u64);
        if total <= limit {
            return Ok(());
        }

        Err(FormError::file_too_large(
            self.constraint.field_name(),
            limit,
            total,
        ))
    }
}
