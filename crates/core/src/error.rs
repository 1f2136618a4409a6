//! Error types for the listing engine
//!
//! The engine distinguishes two failure classes:
//! - invalid criteria, detected before any store call and never retried
//! - backend communication failures, which abort the whole listing
//!
//! A dangling relationship target (referenced sample missing from the store)
//! is deliberately NOT an error: concurrent deletes are expected in a live
//! system, so the reference is left unresolved instead.

use thiserror::Error;

/// Result type alias for listing operations
pub type ListResult<T> = std::result::Result<T, ListError>;

/// Error type for listing operations
#[derive(Debug, Error)]
pub enum ListError {
    /// Caller-supplied criteria are malformed.
    ///
    /// Detected before any backend call is issued.
    #[error("invalid listing criteria: {reason}")]
    InvalidCriteria {
        /// What was wrong with the criteria
        reason: String,
    },

    /// A backend-access call failed.
    ///
    /// Propagated immediately; the listing returns no partial graph.
    #[error("backend communication failed: {detail}")]
    Backend {
        /// Description of the failed store call
        detail: String,
    },
}

impl ListError {
    /// Create an invalid-criteria error.
    pub fn invalid_criteria(reason: impl Into<String>) -> Self {
        ListError::InvalidCriteria {
            reason: reason.into(),
        }
    }

    /// Create a backend-communication error.
    pub fn backend(detail: impl Into<String>) -> Self {
        ListError::Backend {
            detail: detail.into(),
        }
    }

    /// True if this is an invalid-criteria error.
    pub fn is_invalid_criteria(&self) -> bool {
        matches!(self, ListError::InvalidCriteria { .. })
    }

    /// True if this is a backend-communication error.
    pub fn is_backend(&self) -> bool {
        matches!(self, ListError::Backend { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_criteria_display_names_the_reason() {
        let err = ListError::invalid_criteria("empty id set");
        assert!(err.to_string().contains("invalid listing criteria"));
        assert!(err.to_string().contains("empty id set"));
        assert!(err.is_invalid_criteria());
        assert!(!err.is_backend());
    }

    #[test]
    fn backend_display_names_the_detail() {
        let err = ListError::backend("connection reset");
        assert!(err.to_string().contains("backend communication failed"));
        assert!(err.to_string().contains("connection reset"));
        assert!(err.is_backend());
        assert!(!err.is_invalid_criteria());
    }

    #[test]
    fn result_alias_works_with_question_mark() {
        fn inner() -> ListResult<u32> {
            Err(ListError::backend("boom"))
        }
        fn outer() -> ListResult<u32> {
            let v = inner()?;
            Ok(v)
        }
        assert!(outer().is_err());
    }
}
