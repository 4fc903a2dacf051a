//! Error types for Bookguard policy

use thiserror::Error;

use crate::TextEncoding;

/// Core Bookguard errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GuardError {
    #[error("Payload size overflowed while measuring as {encoding}")]
    MeasureOverflow { encoding: TextEncoding },

    #[error(
        "Placeholder too large: {placeholder_bytes} bytes over {max_pages} pages exceeds threshold {threshold}"
    )]
    PlaceholderTooLarge {
        placeholder_bytes: usize,
        max_pages: usize,
        threshold: usize,
    },

    #[error("Placeholder page is empty")]
    EmptyPlaceholder,
}

/// Result type for Bookguard operations
pub type GuardResult<T> = Result<T, GuardError>;
