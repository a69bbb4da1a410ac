//! Errors raised by the synchronization engine

use crate::mt::MtError;
use thiserror::Error;

/// Errors from document bookkeeping and translation rounds
///
/// Merge ambiguity is never an error: conflicts are reported as annotated
/// content. These variants cover broken invariants and backend failures.
#[derive(Error, Debug)]
pub enum SyncError {
    /// A caller broke a structural invariant (mismatched documents, bad history)
    #[error("Structural assumption violated: {0}")]
    Structure(String),

    /// A transaction does not fit the document it is committed to
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error(transparent)]
    Translation(#[from] MtError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SyncError {
    pub fn structure(msg: impl Into<String>) -> Self {
        SyncError::Structure(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        SyncError::InvalidTransaction(msg.into())
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
