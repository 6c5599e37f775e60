//! Error types for AnchorKV
//!
//! Provides a unified error type for all operations. Every failure carries a
//! classified [`ErrorKind`] so callers can branch on it (retry on durability
//! failures, skip on missing keys) without matching individual variants.

use thiserror::Error;

/// Result type alias using AnchorError
pub type Result<T> = std::result::Result<T, AnchorError>;

/// Unified error type for AnchorKV operations
#[derive(Debug, Error)]
pub enum AnchorError {
    // -------------------------------------------------------------------------
    // Validation Errors
    // -------------------------------------------------------------------------
    #[error("key is malformed or empty")]
    InvalidKey,

    #[error("record field too large: {field} is {len} bytes (max {max})")]
    RecordTooLarge {
        field: &'static str,
        len: usize,
        max: usize,
    },

    // -------------------------------------------------------------------------
    // Lifecycle / Lookup Errors
    // -------------------------------------------------------------------------
    #[error("store is closed")]
    StoreClosed,

    #[error("key not found")]
    KeyNotFound,

    // -------------------------------------------------------------------------
    // WAL Errors
    // -------------------------------------------------------------------------
    #[error("WAL write failed, update aborted: {0}")]
    Durability(#[source] std::io::Error),

    #[error("WAL writer is closed")]
    WalClosed,

    #[error("WAL corruption detected at offset {offset} (checksum mismatch)")]
    Corruption { offset: u64 },

    #[error("WAL corruption detected at offset {offset}: unknown operation code {code}")]
    UnknownOperation { code: u8, offset: u64 },

    #[error("WAL truncated at offset {offset}: expected {expected} bytes, found {found}")]
    Truncation {
        offset: u64,
        expected: usize,
        found: usize,
    },

    // -------------------------------------------------------------------------
    // Cancellation Errors
    // -------------------------------------------------------------------------
    #[error("operation cancelled")]
    Cancelled,

    #[error("operation deadline exceeded")]
    DeadlineExceeded,

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of an [`AnchorError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input (empty key, oversized record)
    Validation,
    /// Operation on a closed store
    Lifecycle,
    /// Key absent
    Lookup,
    /// Log write/flush/sync failed; in-memory state untouched
    Durability,
    /// Checksum or content mismatch while reading the log
    Corruption,
    /// Log ends in the middle of a record
    Truncation,
    /// Caller cancelled or deadline passed
    Cancellation,
    /// Any other I/O failure (open, metadata)
    Io,
}

impl AnchorError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnchorError::InvalidKey | AnchorError::RecordTooLarge { .. } => ErrorKind::Validation,
            AnchorError::StoreClosed => ErrorKind::Lifecycle,
            AnchorError::KeyNotFound => ErrorKind::Lookup,
            AnchorError::Durability(_) | AnchorError::WalClosed => ErrorKind::Durability,
            AnchorError::Corruption { .. } | AnchorError::UnknownOperation { .. } => {
                ErrorKind::Corruption
            }
            AnchorError::Truncation { .. } => ErrorKind::Truncation,
            AnchorError::Cancelled | AnchorError::DeadlineExceeded => ErrorKind::Cancellation,
            AnchorError::Io(_) => ErrorKind::Io,
        }
    }

    /// Whether repeating the same call may succeed.
    ///
    /// A durability failure leaves the map untouched, so a retry is safe.
    /// A closed writer stays closed.
    pub fn is_retryable(&self) -> bool {
        match self {
            AnchorError::WalClosed => false,
            _ => matches!(self.kind(), ErrorKind::Durability | ErrorKind::Cancellation),
        }
    }

    /// Byte offset of the offending record, for log read failures
    pub fn offset(&self) -> Option<u64> {
        match self {
            AnchorError::Corruption { offset }
            | AnchorError::UnknownOperation { offset, .. }
            | AnchorError::Truncation { offset, .. } => Some(*offset),
            _ => None,
        }
    }
}
