//! Store Module
//!
//! The key-value store contract and its WAL-backed implementation.
//!
//! ## Responsibilities
//! - Define the backend-agnostic [`KvStore`] contract
//! - Validate keys uniformly across backends
//! - Durable in-memory store: log first, then apply
//!
//! ## Concurrency Model
//! ```text
//!   put/delete:  [WAL mutex: encode + flush + fsync] ──release──▶ [map write lock: apply]
//!   get:                                                          [map read lock: copy out]
//! ```
//! The WAL lock and the map lock are never held at the same time.

mod durable;

pub use durable::DurableStore;

use crate::context::Context;
use crate::error::{AnchorError, Result};

/// Standard behavior for a key-value storage backend.
///
/// Every operation takes the caller's [`Context`]; a cancelled or expired
/// context fails the call with a cancellation error.
pub trait KvStore: Send + Sync {
    /// Insert or update the value for `key`.
    ///
    /// Fails with `InvalidKey` for an empty or whitespace-only key and with
    /// `StoreClosed` once the store is closed.
    fn put(&self, ctx: &Context, key: &str, value: &[u8]) -> Result<()>;

    /// Return a copy of the value for `key`, or `KeyNotFound`.
    fn get(&self, ctx: &Context, key: &str) -> Result<Vec<u8>>;

    /// Remove `key`. Removing an absent key succeeds.
    fn delete(&self, ctx: &Context, key: &str) -> Result<()>;

    /// Shut the store down. Every later call, including a second close,
    /// fails with `StoreClosed`.
    fn close(&self, ctx: &Context) -> Result<()>;
}

/// Reject keys that are empty after trimming whitespace
pub fn validate_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(AnchorError::InvalidKey);
    }
    Ok(())
}
