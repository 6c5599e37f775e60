//! Durable in-memory store
//!
//! HashMap behind an RwLock, fronted by a write-ahead log.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use super::{validate_key, KvStore};
use crate::context::Context;
use crate::error::{AnchorError, Result};
use crate::wal::{self, LogRecord, LogWriter, ReplayStats};

type Map = HashMap<Vec<u8>, Vec<u8>>;

/// In-memory key-value store whose every mutation is durably logged first.
///
/// The WAL writer is injected and shared: the store never closes it, so
/// whoever built the writer must close it after closing the store.
pub struct DurableStore {
    /// Live data; `None` once the store is closed and the map released
    data: RwLock<Option<Map>>,

    /// Mirrors `data.is_none()` for lock-free pre-checks
    closed: AtomicBool,

    wal: Arc<dyn LogWriter>,
}

impl DurableStore {
    /// Create an empty store logging to `wal`
    pub fn new(wal: Arc<dyn LogWriter>) -> Self {
        Self::with_data(wal, HashMap::new())
    }

    /// Create a store over an already-rebuilt map
    pub fn with_data(wal: Arc<dyn LogWriter>, data: Map) -> Self {
        Self {
            data: RwLock::new(Some(data)),
            closed: AtomicBool::new(false),
            wal,
        }
    }

    /// Replay the log at `path`, then serve from the rebuilt map.
    ///
    /// Fails if the log is truncated or corrupt; nothing is served from a
    /// log that could not be fully replayed.
    pub fn recover(wal: Arc<dyn LogWriter>, path: &Path) -> Result<(Self, ReplayStats)> {
        let (data, stats) = wal::replay(path)?;
        Ok((Self::with_data(wal, data), stats))
    }

    /// Number of live keys (zero once closed)
    pub fn len(&self) -> usize {
        self.data.read().as_ref().map_or(0, HashMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(AnchorError::StoreClosed);
        }
        Ok(())
    }

    /// Durably log `record`, then apply it under the write lock.
    ///
    /// The WAL lock is released before the map lock is taken. Once the
    /// record is durable the mutation is applied even if `ctx` has since
    /// been cancelled, since a durable write cannot be taken back.
    fn log_then_apply<F>(&self, ctx: &Context, record: LogRecord, apply: F) -> Result<()>
    where
        F: FnOnce(&mut Map, LogRecord),
    {
        ctx.check()?;
        self.ensure_open()?;

        self.wal.sync_write(ctx, &record)?;

        let mut data = self.data.write();
        match data.as_mut() {
            Some(map) => {
                apply(map, record);
                Ok(())
            }
            None => {
                warn!(
                    op = ?record.operation,
                    "store closed after WAL write; record applies on next recovery"
                );
                Err(AnchorError::StoreClosed)
            }
        }
    }
}

impl KvStore for DurableStore {
    fn get(&self, ctx: &Context, key: &str) -> Result<Vec<u8>> {
        validate_key(key)?;
        ctx.check()?;

        let data = self.data.read();
        ctx.check()?;

        let map = data.as_ref().ok_or(AnchorError::StoreClosed)?;
        map.get(key.as_bytes())
            .cloned()
            .ok_or(AnchorError::KeyNotFound)
    }

    fn put(&self, ctx: &Context, key: &str, value: &[u8]) -> Result<()> {
        validate_key(key)?;

        let record = LogRecord::put(key.as_bytes(), value);
        self.log_then_apply(ctx, record, |map, record| {
            map.insert(record.key, record.value);
        })
    }

    fn delete(&self, ctx: &Context, key: &str) -> Result<()> {
        validate_key(key)?;

        let record = LogRecord::delete(key.as_bytes());
        self.log_then_apply(ctx, record, |map, record| {
            map.remove(&record.key);
        })
    }

    fn close(&self, ctx: &Context) -> Result<()> {
        ctx.check()?;
        let mut data = self.data.write();
        ctx.check()?;

        let Some(map) = data.take() else {
            return Err(AnchorError::StoreClosed);
        };
        self.closed.store(true, Ordering::Release);
        info!(keys = map.len(), "store closed");
        Ok(())
    }
}
