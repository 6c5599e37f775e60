//! Configuration for AnchorKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::context::Context;

/// Main configuration for an AnchorKV instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all data files
    /// Internal structure:
    ///   {data_dir}/
    ///     └── wal.log          (write-ahead log)
    pub data_dir: PathBuf,

    // -------------------------------------------------------------------------
    // WAL Configuration
    // -------------------------------------------------------------------------
    /// Capacity of the writer's in-memory buffer (in bytes).
    /// Buffered writes spill to the OS once this is exceeded.
    pub write_buffer_size: usize,

    // -------------------------------------------------------------------------
    // Operation Configuration
    // -------------------------------------------------------------------------
    /// Per-operation timeout used by [`Config::context`]; `None` means no deadline
    pub op_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./anchorkv_data"),
            write_buffer_size: 64 * 1024, // 64 KB
            op_timeout: None,
        }
    }
}

impl Config {
    const WAL_FILENAME: &'static str = "wal.log";

    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Path of the write-ahead log inside the data directory
    pub fn wal_path(&self) -> PathBuf {
        self.data_dir.join(Self::WAL_FILENAME)
    }

    /// Build a fresh per-operation context honoring `op_timeout`
    pub fn context(&self) -> Context {
        match self.op_timeout {
            Some(timeout) => Context::with_timeout(timeout),
            None => Context::background(),
        }
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the WAL write buffer capacity (in bytes)
    pub fn write_buffer_size(mut self, size: usize) -> Self {
        self.config.write_buffer_size = size;
        self
    }

    /// Set the per-operation timeout
    pub fn op_timeout(mut self, timeout: Duration) -> Self {
        self.config.op_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
