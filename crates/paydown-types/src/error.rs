use thiserror::Error;

use crate::loan::LoanId;

/// Errors from repository operations (used by the persistence ports in paydown-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors surfaced by ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Rejected input; nothing was written.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Storage failed; the unit of work was rolled back.
    #[error("persistence error: {0}")]
    Persistence(RepositoryError),

    /// Stored state contradicts a ledger invariant.
    #[error("ledger inconsistency: {0}")]
    Consistency(String),

    #[error("loan {0} not found")]
    LoanNotFound(LoanId),
}

impl From<RepositoryError> for LedgerError {
    fn from(err: RepositoryError) -> Self {
        match err {
            // A uniqueness conflict means the fetch-or-create contract was broken.
            RepositoryError::Conflict(msg) => LedgerError::Consistency(msg),
            other => LedgerError::Persistence(other),
        }
    }
}

/// Errors from delivering a daily reminder.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error("recipient rejected: {0}")]
    Rejected(String),
}
