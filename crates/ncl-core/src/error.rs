//! Error types for the consequence ledger.

use crate::consequence::ConsequenceId;

/// Alias for `Result<T, NclError>`.
pub type NclResult<T> = Result<T, NclError>;

/// Errors that can occur while recording, scoring, or settling consequences.
#[derive(Debug, thiserror::Error)]
pub enum NclError {
    /// No consequence with this ID exists in the ledger.
    #[error("consequence not found: {0}")]
    NotFound(ConsequenceId),

    /// A textual ID (or ID prefix) matched nothing in the ledger.
    #[error("no consequence matches id \"{0}\"")]
    UnknownId(String),

    /// A textual ID prefix matched more than one consequence.
    #[error("id prefix \"{0}\" is ambiguous")]
    AmbiguousId(String),

    /// The consequence was already resolved and can no longer change.
    #[error("consequence already resolved: {0}")]
    AlreadyResolved(ConsequenceId),

    /// A bet was placed before the consequence's market was opened.
    #[error("no open market for consequence {0}")]
    MarketNotOpen(ConsequenceId),

    /// The operation is not valid for the consequence's current lifecycle state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Caller-supplied input was malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A store adapter failed for a reason other than I/O or encoding.
    #[error("store error: {0}")]
    Store(String),

    /// Filesystem failure in a store adapter.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Ledger state could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl NclError {
    /// Whether this error means the referenced consequence does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::UnknownId(_))
    }

    /// Whether this error is a lifecycle violation (e.g. touching a resolved record).
    pub fn is_invalid_state(&self) -> bool {
        matches!(
            self,
            Self::AlreadyResolved(_) | Self::MarketNotOpen(_) | Self::InvalidState(_)
        )
    }
}
