//! Validation errors for identifiers and transmission content
//!
//! These are domain-level failures, kept apart from codec errors: a message
//! that decodes perfectly can still be rejected here. Every variant maps to a
//! stable localization key so the instigator can be shown a translated message
//! instead of a system fault.

use thiserror::Error;

/// Errors raised when a value or a whole transmission fails a consistency check
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// ID value is null/zero when non-null required
    #[error("ID cannot be null/zero")]
    NullId,

    /// ID value is below minimum allowed value
    #[error("ID value {value} is below minimum allowed value {min}")]
    ValueTooSmall { value: u64, min: u64 },

    /// ID value exceeds maximum allowed value
    #[error("ID value {value} exceeds maximum allowed value {max}")]
    ValueTooLarge { value: u64, max: u64 },

    /// Reserved ID value that should not be used for ordinary objects
    #[error("ID value {value} is reserved and cannot be used")]
    ReservedValue { value: u64 },

    /// A link of an address chain carries the "no id" sentinel
    #[error("Address link '{level}' is not assigned")]
    NullAddressLink { level: &'static str },

    /// The same external identifier appears more than once in one update
    #[error("External id '{external_id}' appears more than once in the same update")]
    DuplicateExternalId { external_id: String },

    /// A required field was left empty
    #[error("Field '{field}' must not be empty")]
    EmptyField { field: &'static str },

    /// A time interval ends at or before its start
    #[error("Interval end {end} must be after start {start}")]
    InvertedInterval { start: i64, end: i64 },

    /// A quantity, rate or price that must not be negative
    #[error("Field '{field}' must not be negative")]
    NegativeValue { field: &'static str },

    /// Custom validation failure with message
    #[error("Validation failed: {message}")]
    Custom { message: String },
}

impl ValidationError {
    /// Stable key used to look up the end-user text for this failure
    pub fn localization_key(&self) -> &'static str {
        match self {
            ValidationError::NullId => "validation.id.null",
            ValidationError::ValueTooSmall { .. } => "validation.id.too_small",
            ValidationError::ValueTooLarge { .. } => "validation.id.too_large",
            ValidationError::ReservedValue { .. } => "validation.id.reserved",
            ValidationError::NullAddressLink { .. } => "validation.address.null_link",
            ValidationError::DuplicateExternalId { .. } => "validation.external_id.duplicate",
            ValidationError::EmptyField { .. } => "validation.field.empty",
            ValidationError::InvertedInterval { .. } => "validation.interval.inverted",
            ValidationError::NegativeValue { .. } => "validation.field.negative",
            ValidationError::Custom { .. } => "validation.custom",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_localization_keys_are_distinct() {
        let errors = [
            ValidationError::NullId,
            ValidationError::ValueTooSmall { value: 1, min: 2 },
            ValidationError::ValueTooLarge { value: 3, max: 2 },
            ValidationError::ReservedValue { value: u64::MAX },
            ValidationError::NullAddressLink { level: "plant" },
            ValidationError::DuplicateExternalId {
                external_id: "R-1".to_string(),
            },
            ValidationError::EmptyField { field: "name" },
            ValidationError::InvertedInterval { start: 5, end: 1 },
            ValidationError::NegativeValue { field: "speed" },
            ValidationError::Custom {
                message: "x".to_string(),
            },
        ];

        let mut keys: Vec<_> = errors.iter().map(|e| e.localization_key()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), errors.len());
    }

    #[test]
    fn test_duplicate_external_id_display() {
        let error = ValidationError::DuplicateExternalId {
            external_id: "LATHE-04".to_string(),
        };
        assert!(error.to_string().contains("LATHE-04"));
        assert_eq!(error.localization_key(), "validation.external_id.duplicate");
    }
}
