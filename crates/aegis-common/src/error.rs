//! Aegis Error - Unified Error Types
//!
//! Error handling for all Aegis metrics operations. Categorizes errors by
//! domain (request decoding, table access, deletion, configuration) and
//! provides classification helpers for the transport layer.
//!
//! Key Features:
//! - Domain-specific error variants carrying the failing query or app id
//! - User vs system error classification
//! - Seamless integration with std::io::Error
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

/// Unified error type for all Aegis metrics operations.
#[derive(Error, Debug)]
pub enum AegisError {
    // Request errors
    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("unsupported resolution: {0}")]
    UnsupportedResolution(u32),

    // Table errors
    #[error("storage error: {0}")]
    Storage(String),

    #[error("failed to create {table} table: {reason}")]
    TableCreation { table: String, reason: String },

    #[error("failed to delete metrics of application '{app_id}' from {store}: {reason}")]
    Deletion {
        store: String,
        app_id: String,
        reason: String,
    },

    #[error("query '{path}' failed: {source}")]
    Query {
        path: String,
        #[source]
        source: Box<AegisError>,
    },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),

    // Internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

// =============================================================================
// Type Aliases
// =============================================================================

/// Result type alias for Aegis operations.
pub type Result<T> = std::result::Result<T, AegisError>;

// =============================================================================
// Error Classification
// =============================================================================

impl AegisError {
    /// Attach the path of the query that produced this error.
    pub fn for_query(self, path: impl Into<String>) -> Self {
        AegisError::Query {
            path: path.into(),
            source: Box::new(self),
        }
    }

    /// Returns true if this is a user error (vs system error).
    pub fn is_user_error(&self) -> bool {
        match self {
            AegisError::Parse(_)
            | AegisError::InvalidQuery(_)
            | AegisError::UnsupportedResolution(_) => true,
            AegisError::Query { source, .. } => source.is_user_error(),
            _ => false,
        }
    }

    /// Returns true if the error originated in a metrics table.
    pub fn is_storage_error(&self) -> bool {
        match self {
            AegisError::Storage(_)
            | AegisError::TableCreation { .. }
            | AegisError::Deletion { .. } => true,
            AegisError::Query { source, .. } => source.is_storage_error(),
            _ => false,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(AegisError::Parse("bad".into()).is_user_error());
        assert!(AegisError::UnsupportedResolution(7).is_user_error());
        assert!(!AegisError::Storage("disk".into()).is_user_error());
        assert!(AegisError::Storage("disk".into()).is_storage_error());
    }

    #[test]
    fn test_query_context() {
        let err = AegisError::Storage("scan failed".into()).for_query("/app/flow/reads");
        assert!(err.is_storage_error());
        assert_eq!(
            err.to_string(),
            "query '/app/flow/reads' failed: storage error: scan failed"
        );
    }

    #[test]
    fn test_deletion_message() {
        let err = AegisError::Deletion {
            store: "aggregates".into(),
            app_id: "WordCount".into(),
            reason: "locked".into(),
        };
        assert_eq!(
            err.to_string(),
            "failed to delete metrics of application 'WordCount' from aggregates: locked"
        );
    }
}
