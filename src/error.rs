//! Custom error types for aksver.

use thiserror::Error;

/// Errors that can occur while resolving cluster versions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AksverError {
    #[error("Malformed version: {0:?}")]
    MalformedVersion(String),

    #[error("Mismatched version arity: {left} vs {right}")]
    MismatchedArity { left: String, right: String },

    #[error("No version catalog found for region: {0}")]
    CatalogNotFound(String),

    #[error("Version catalog is empty: {0}")]
    EmptyCatalog(String),

    #[error("Source path does not exist: {0}")]
    SourceNotFound(String),

    #[error("Resolution task failed: {0}")]
    TaskFailed(String),
}

impl AksverError {
    /// True for both ways a version can be unusable: it does not parse,
    /// or it cannot be compared with its counterpart.
    pub fn is_malformed_version(&self) -> bool {
        matches!(
            self,
            AksverError::MalformedVersion(_) | AksverError::MismatchedArity { .. }
        )
    }
}
