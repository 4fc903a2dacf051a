//! Error types for host integration

use bookguard_core::GuardError;
use thiserror::Error;

/// Errors raised by the host item and event API
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("Page {page} out of range: book has {count} pages")]
    PageOutOfRange { page: usize, count: usize },

    #[error("Metadata rejected by host: {0}")]
    MetaRejected(String),

    #[error("Item is not a book")]
    NotABook,

    #[error(transparent)]
    Guard(#[from] GuardError),
}

/// Result type for host operations
pub type HostResult<T> = Result<T, HostError>;
