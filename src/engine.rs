//! Engine Module
//!
//! Wires the WAL writer and the durable store together.
//!
//! ## Responsibilities
//! - Create the data directory
//! - Replay the WAL before serving any request
//! - Own the lifetimes of both the writer and the store
//! - Close them in order: store first, then writer (flush + fsync)

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::context::Context;
use crate::error::Result;
use crate::store::{DurableStore, KvStore};
use crate::wal::{ReplayStats, WalWriter};

/// A store together with the WAL writer it logs to
pub struct Engine {
    config: Config,

    /// Shared with `store`; closed here, never by the store
    writer: Arc<WalWriter>,

    store: DurableStore,

    /// What recovery found on open
    recovery: ReplayStats,
}

impl Engine {
    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Create data directory if missing
    /// 2. Replay the WAL if it exists (corruption or truncation aborts open)
    /// 3. Open the WAL writer for appending
    /// 4. Ready to serve requests
    pub fn open(config: Config) -> Result<Self> {
        fs::create_dir_all(&config.data_dir)?;
        let wal_path = config.wal_path();

        // Replay before the writer opens so the scan never races an append
        let (data, recovery) = crate::wal::replay(&wal_path)?;

        let writer = Arc::new(WalWriter::with_buffer_size(
            &wal_path,
            config.write_buffer_size,
        )?);
        let store = DurableStore::with_data(writer.clone(), data);

        info!(
            data_dir = %config.data_dir.display(),
            records = recovery.records,
            keys = store.len(),
            "engine opened"
        );

        Ok(Self {
            config,
            writer,
            store,
            recovery,
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().data_dir(path).build())
    }

    pub fn store(&self) -> &DurableStore {
        &self.store
    }

    pub fn writer(&self) -> &Arc<WalWriter> {
        &self.writer
    }

    pub fn recovery_stats(&self) -> &ReplayStats {
        &self.recovery
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Close the store, then flush, sync and close the writer.
    ///
    /// The writer is closed even if the store was already closed.
    pub fn close(self, ctx: &Context) -> Result<()> {
        let store_result = if self.store.is_closed() {
            Ok(())
        } else {
            self.store.close(ctx)
        };
        self.writer.close()?;
        store_result
    }
}
