//! Write-Ahead Log (WAL) Module
//!
//! Provides durability guarantees through append-only logging.
//!
//! ## Responsibilities
//! - Append log records before any mutation
//! - CRC32 checksums for corruption detection
//! - Truncation detection for incomplete tail writes
//! - Crash recovery and replay
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Record 1                                                     │
//! │ ┌─────────┬────────┬────────┬──────────┬──────────┬────────┐ │
//! │ │ CRC (4) │ TS (8) │ Op (1) │ KLen (4) │ VLen (4) │ K + V  │ │
//! │ └─────────┴────────┴────────┴──────────┴──────────┴────────┘ │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Record 2                                                     │
//! │ ...                                                          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! All integers are little-endian. The CRC covers every byte of the record
//! after the CRC field itself. There is no file header, trailer or index.

mod reader;
mod record;
mod recovery;
mod writer;

pub use reader::{WalIterator, WalReader};
pub use record::{
    compute_checksum, decode_header, now_nanos, LogRecord, Operation, RecordHeader, HEADER_SIZE,
    MAX_FIELD_LEN,
};
pub use recovery::{replay, verify, LogStatus, ReplayStats, VerifyReport};
pub use writer::{WalWriter, DEFAULT_BUFFER_SIZE};

use crate::context::Context;
use crate::error::Result;

/// Append-only sink the store logs mutations to.
///
/// Implementations must serialize concurrent calls so records are never
/// interleaved, and must check `ctx` before and after acquiring their lock.
pub trait LogWriter: Send + Sync {
    /// Append a record without any durability guarantee
    fn write(&self, ctx: &Context, record: &LogRecord) -> Result<()>;

    /// Append a record and return only once it is on stable storage.
    ///
    /// On failure the record must be treated as not written.
    fn sync_write(&self, ctx: &Context, record: &LogRecord) -> Result<()>;
}
