//! WAL Writer
//!
//! Handles appending records to the WAL file.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use bytes::{Buf, BytesMut};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::{LogRecord, LogWriter};
use crate::context::Context;
use crate::error::{AnchorError, Result};

/// Default capacity of the in-memory write buffer
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Appends records to a WAL file.
///
/// One mutex guards both the file handle and the buffer, so records from
/// concurrent callers are never interleaved.
pub struct WalWriter {
    path: PathBuf,
    inner: Mutex<Option<WriterState>>,
}

/// Resources owned by an open writer; `None` once closed
struct WriterState {
    file: File,
    buffer: BytesMut,
    capacity: usize,
}

impl WalWriter {
    /// Open or create a WAL file for appending
    pub fn open(path: &Path) -> Result<Self> {
        Self::with_buffer_size(path, DEFAULT_BUFFER_SIZE)
    }

    /// Open or create a WAL file with a custom buffer capacity
    pub fn with_buffer_size(path: &Path, capacity: usize) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        info!(path = %path.display(), capacity, "opened WAL writer");

        Ok(Self {
            path: path.to_path_buf(),
            inner: Mutex::new(Some(WriterState {
                file,
                buffer: BytesMut::with_capacity(capacity),
                capacity,
            })),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush buffered bytes to the OS and force them to disk
    pub fn sync(&self) -> Result<()> {
        let mut guard = self.inner.lock();
        let state = guard.as_mut().ok_or(AnchorError::WalClosed)?;
        state.flush_and_sync().map_err(AnchorError::Durability)
    }

    /// Number of bytes appended but not yet handed to the OS
    pub fn buffered_len(&self) -> usize {
        self.inner.lock().as_ref().map_or(0, |s| s.buffer.len())
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().is_none()
    }

    /// Flush, sync and release the file handle.
    ///
    /// Later writes fail with `WalClosed`; closing twice is a no-op. The
    /// handle is released even when the final flush fails.
    pub fn close(&self) -> Result<()> {
        let Some(mut state) = self.inner.lock().take() else {
            return Ok(());
        };
        let result = state.flush_and_sync().map_err(AnchorError::Durability);
        info!(path = %self.path.display(), ok = result.is_ok(), "closed WAL writer");
        result
    }

    /// Shared body of both write modes: two context checks around the lock,
    /// then encode into the buffer.
    fn append_locked<F>(&self, ctx: &Context, record: &LogRecord, finish: F) -> Result<()>
    where
        F: FnOnce(&mut WriterState) -> io::Result<()>,
    {
        ctx.check()?;
        let mut guard = self.inner.lock();
        ctx.check()?;

        let state = guard.as_mut().ok_or(AnchorError::WalClosed)?;
        record.encode_into(&mut state.buffer)?;
        finish(state).map_err(AnchorError::Durability)
    }
}

impl LogWriter for WalWriter {
    fn write(&self, ctx: &Context, record: &LogRecord) -> Result<()> {
        self.append_locked(ctx, record, |state| {
            if state.buffer.len() >= state.capacity {
                state.flush()?;
            }
            Ok(())
        })?;
        debug!(op = ?record.operation, bytes = record.encoded_len(), "buffered WAL write");
        Ok(())
    }

    fn sync_write(&self, ctx: &Context, record: &LogRecord) -> Result<()> {
        let len = record.encoded_len();
        self.append_locked(ctx, record, |state| {
            state.flush_and_sync().map_err(|e| {
                state.discard_unwritten_tail(len);
                e
            })
        })?;
        debug!(op = ?record.operation, bytes = record.encoded_len(), "durable WAL write");
        Ok(())
    }
}

impl WriterState {
    /// Hand buffered bytes to the OS. Bytes that could not be written stay
    /// buffered for the next attempt.
    fn flush(&mut self) -> io::Result<()> {
        while self.buffer.has_remaining() {
            match self.file.write(self.buffer.chunk()) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "failed to write buffered WAL bytes",
                    ))
                }
                Ok(n) => self.buffer.advance(n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        self.file.flush()
    }

    /// Drop the last `len` bytes if none of them reached the OS, so a failed
    /// durable write cannot be persisted by a later flush.
    fn discard_unwritten_tail(&mut self, len: usize) {
        if self.buffer.len() >= len {
            let keep = self.buffer.len() - len;
            self.buffer.truncate(keep);
        }
    }

    fn flush_and_sync(&mut self) -> io::Result<()> {
        self.flush()?;
        self.file.sync_data()
    }
}

impl Drop for WalWriter {
    fn drop(&mut self) {
        if let Some(mut state) = self.inner.get_mut().take() {
            if let Err(e) = state.flush_and_sync() {
                warn!(path = %self.path.display(), error = %e, "failed to flush WAL on drop");
            }
        }
    }
}
