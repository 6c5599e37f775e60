//! WAL Reader
//!
//! Sequential, read-only scan of a WAL file. Each call to
//! [`WalReader::next_record`] either yields one complete, checksum-verified
//! record, reports a clean end of log, or fails with a truncation or
//! corruption error. A record is never partially returned.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use tracing::warn;

use super::record::{checksummed_header, compute_checksum, decode_header, HEADER_SIZE};
use super::{LogRecord, Operation};
use crate::error::{AnchorError, Result};

/// Reads records from a WAL file
pub struct WalReader {
    reader: BufReader<File>,

    /// Byte offset just past the last fully read record
    offset: u64,
}

impl WalReader {
    /// Open a WAL file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
            offset: 0,
        })
    }

    /// Read the next record.
    ///
    /// Returns `Ok(None)` only when the log ends exactly on a record boundary.
    /// After an error the stream position is undefined; stop reading.
    pub fn next_record(&mut self) -> Result<Option<LogRecord>> {
        let start = self.offset;

        // Phase 1: fixed header
        let mut header_buf = [0u8; HEADER_SIZE];
        let read = read_full(&mut self.reader, &mut header_buf)?;
        if read == 0 {
            return Ok(None);
        }
        if read < HEADER_SIZE {
            return Err(self.truncated(start, HEADER_SIZE, read));
        }
        let header = decode_header(&header_buf);

        // Phase 2: payload, sized by the header. Reading through `take`
        // grows the buffer with the bytes actually present.
        let payload_len = header.payload_len();
        let mut payload = Vec::new();
        (&mut self.reader)
            .take(payload_len)
            .read_to_end(&mut payload)?;
        if (payload.len() as u64) < payload_len {
            return Err(self.truncated(
                start,
                HEADER_SIZE + payload_len as usize,
                HEADER_SIZE + payload.len(),
            ));
        }

        // Phase 3: integrity
        let actual = compute_checksum(&[checksummed_header(&header_buf), &payload[..]]);
        if actual != header.checksum {
            warn!(
                offset = start,
                expected = header.checksum,
                actual,
                "WAL checksum mismatch"
            );
            return Err(AnchorError::Corruption { offset: start });
        }

        let operation = Operation::from_code(header.op_code).ok_or_else(|| {
            warn!(offset = start, code = header.op_code, "unknown WAL operation code");
            AnchorError::UnknownOperation {
                code: header.op_code,
                offset: start,
            }
        })?;

        let value = payload.split_off(header.key_len as usize);
        self.offset = start + HEADER_SIZE as u64 + payload_len;

        Ok(Some(LogRecord {
            timestamp: header.timestamp,
            operation,
            key: payload,
            value,
        }))
    }

    /// Byte offset just past the last fully read record
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Iterate over records until end of log or the first error
    pub fn records(self) -> WalIterator {
        WalIterator {
            reader: self,
            done: false,
        }
    }

    /// Release the file descriptor
    pub fn close(self) {
        drop(self);
    }

    fn truncated(&self, offset: u64, expected: usize, found: usize) -> AnchorError {
        warn!(offset, expected, found, "WAL truncated mid-record");
        AnchorError::Truncation {
            offset,
            expected,
            found,
        }
    }
}

/// Iterator over WAL records
pub struct WalIterator {
    reader: WalReader,
    done: bool,
}

impl WalIterator {
    /// Byte offset just past the last record yielded
    pub fn offset(&self) -> u64 {
        self.reader.offset()
    }
}

impl Iterator for WalIterator {
    type Item = Result<LogRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Fill `buf` as far as the source allows; returns the number of bytes read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
