//! # AnchorKV
//!
//! A durable, crash-recoverable key-value store with:
//! - Write-Ahead Logging (WAL) with CRC32-checked records
//! - Durability before visibility: every mutation is fsynced before it is applied
//! - Crash recovery that refuses to serve from a truncated or corrupt log
//! - Concurrent readers, exclusive writers, cancellation at every lock
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    KvStore (trait)                          │
//! │             put / get / delete / close + Context            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                    DurableStore                             │
//! │        (1) log durably  ──▶  (2) apply to map               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  WalWriter  │          │   HashMap   │
//!   │   (Mutex)   │          │  (RwLock)   │
//!   └──────┬──────┘          └──────▲──────┘
//!          │                        │
//!          ▼                        │ replay on open
//!   ┌─────────────┐          ┌──────┴──────┐
//!   │   wal.log   │─────────▶│  WalReader  │
//!   └─────────────┘          └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod context;
pub mod error;

pub mod engine;
pub mod store;
pub mod wal;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::Config;
pub use context::Context;
pub use engine::Engine;
pub use error::{AnchorError, ErrorKind, Result};
pub use store::{DurableStore, KvStore};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of AnchorKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
