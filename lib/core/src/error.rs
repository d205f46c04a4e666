use thiserror::Error;

// ── Error codes ─────────────────────────────────────────────────────
//
// Stable, machine-readable identifiers. Clients match on these —
// never on the human-readable message string.

/// Stable error code constants.
///
/// Callers should match on `error_code()`. Codes never change; messages
/// may be reworded.
pub mod error_code {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";
    pub const DUPLICATE_SCAN: &str = "DUPLICATE_SCAN";
    pub const CORRUPT_PAYLOAD: &str = "CORRUPT_PAYLOAD";
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
    pub const INTERNAL: &str = "INTERNAL";
}

// ── ServiceError ────────────────────────────────────────────────────

/// Unified service error type used across all modules.
///
/// Each variant maps to a stable error code (see [`error_code`]).
/// "Nothing pending to confirm" and "nothing to undo" are *not* errors —
/// those operations return `Ok(None)` instead.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Resource does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Input data is invalid. Rejected before storage is touched.
    #[error("{0}")]
    Validation(String),

    /// A scan repeated within the duplicate-suppression window.
    /// Rejected before storage is touched.
    #[error("{0}")]
    DuplicateScan(String),

    /// A snapshot payload failed structural validation. Raised before
    /// any destructive truncation.
    #[error("{0}")]
    Corrupt(String),

    /// Storage backend failure.
    #[error("{0}")]
    Storage(String),

    /// Unexpected internal error.
    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    /// Stable, machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => error_code::NOT_FOUND,
            ServiceError::Validation(_) => error_code::VALIDATION_FAILED,
            ServiceError::DuplicateScan(_) => error_code::DUPLICATE_SCAN,
            ServiceError::Corrupt(_) => error_code::CORRUPT_PAYLOAD,
            ServiceError::Storage(_) => error_code::STORAGE_ERROR,
            ServiceError::Internal(_) => error_code::INTERNAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_mapping() {
        assert_eq!(ServiceError::NotFound("x".into()).error_code(), "NOT_FOUND");
        assert_eq!(ServiceError::Validation("x".into()).error_code(), "VALIDATION_FAILED");
        assert_eq!(ServiceError::DuplicateScan("x".into()).error_code(), "DUPLICATE_SCAN");
        assert_eq!(ServiceError::Corrupt("x".into()).error_code(), "CORRUPT_PAYLOAD");
        assert_eq!(ServiceError::Storage("x".into()).error_code(), "STORAGE_ERROR");
        assert_eq!(ServiceError::Internal("x".into()).error_code(), "INTERNAL");
    }

    #[test]
    fn error_display_is_just_message() {
        assert_eq!(ServiceError::NotFound("pallet P-009".into()).to_string(), "pallet P-009");
        assert_eq!(ServiceError::Validation("bad input".into()).to_string(), "bad input");
        assert_eq!(ServiceError::DuplicateScan("P-001".into()).to_string(), "P-001");
    }
}
