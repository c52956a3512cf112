//! Validation failures for state construction and fragment assignment.
use super::Phase;
use thiserror::Error;

/// Input validation errors.
///
/// These are raised at construction or assignment time and are fatal to the
/// operation that produced them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    #[error("invalid severity {0:?} (expected high, medium, or low)")]
    InvalidSeverity(String),

    #[error("invalid priority {0:?} (expected high, medium, or low)")]
    InvalidPriority(String),

    #[error("unknown phase {0:?}")]
    UnknownPhase(String),

    #[error("cost amount cannot be negative (got {0})")]
    NegativeAmount(f64),

    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },

    #[error("implementation step order must be positive (got {0})")]
    NonPositiveOrder(i64),

    #[error("implementation step {0} cannot depend on itself")]
    SelfDependency(i64),

    #[error("critical path item {0:?} not found in implementation steps")]
    UnknownCriticalPathItem(String),

    #[error("component names must be unique (duplicate {0:?})")]
    DuplicateComponent(String),

    #[error("recommended licensing {0:?} does not name a listed option")]
    UnknownLicensingOption(String),

    #[error("{fragment} fragment cannot be applied while the assessment is at {current}")]
    PhaseMismatch { fragment: Phase, current: Phase },

    #[error("unsupported state version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("completed phases are inconsistent: {0}")]
    InconsistentPhases(String),
}

impl ValidationError {
    pub(crate) fn empty(field: &'static str) -> Self {
        ValidationError::Empty { field }
    }
}

/// Reject blank text for a required field.
pub(crate) fn require_text(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::empty(field));
    }
    Ok(())
}

/// Reject blank text for an optional field when it is present.
pub(crate) fn optional_text(
    value: Option<&str>,
    field: &'static str,
) -> Result<(), ValidationError> {
    match value {
        Some(text) => require_text(text, field),
        None => Ok(()),
    }
}

/// Reject an empty list for a required field.
pub(crate) fn require_items<T>(items: &[T], field: &'static str) -> Result<(), ValidationError> {
    if items.is_empty() {
        return Err(ValidationError::empty(field));
    }
    Ok(())
}
