//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// invariants, missing references). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A required field was absent or empty.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// A foreign reference points at a row that does not exist.
    #[error("bad reference: {0}")]
    BadReference(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested resource was not found (domain-level).
    #[error("not found")]
    NotFound,

    /// A conflict occurred (e.g. deleting a row other rows depend on).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn bad_reference(msg: impl Into<String>) -> Self {
        Self::BadReference(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    /// Reject empty or whitespace-only required string fields.
    pub fn require_field(name: &'static str, value: &str) -> DomainResult<()> {
        if value.trim().is_empty() {
            return Err(Self::MissingField(name));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_field_rejects_blank_values() {
        assert!(DomainError::require_field("phone", "  ").is_err());
        assert!(DomainError::require_field("phone", "+7 900 000-00-00").is_ok());
    }
}
