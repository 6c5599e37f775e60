//! WAL record codec
//!
//! Binary layout of a single log record and its checksum.

use std::time::{SystemTime, UNIX_EPOCH};

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{AnchorError, Result};

/// Fixed header: checksum(4) | timestamp(8) | op(1) | key_len(4) | value_len(4)
pub const HEADER_SIZE: usize = 21;

/// Largest key or value a record can describe (lengths are u32 on disk)
pub const MAX_FIELD_LEN: usize = u32::MAX as usize;

/// Width of the leading checksum field
const CHECKSUM_LEN: usize = 4;

/// Operations that can be logged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Upsert a key
    Put,

    /// Remove a key
    Delete,
}

impl Operation {
    /// On-disk operation code
    pub fn code(self) -> u8 {
        match self {
            Operation::Put => 0,
            Operation::Delete => 1,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Operation::Put),
            1 => Some(Operation::Delete),
            _ => None,
        }
    }
}

/// A single record in the WAL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Nanoseconds since the Unix epoch when the record was created
    pub timestamp: u64,

    /// The operation to perform
    pub operation: Operation,

    pub key: Vec<u8>,

    /// Empty for deletes
    pub value: Vec<u8>,
}

/// The fixed-size prefix of a record, parsed without touching the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub checksum: u32,
    pub timestamp: u64,
    /// Raw operation code; validated only once the checksum matches
    pub op_code: u8,
    pub key_len: u32,
    pub value_len: u32,
}

impl RecordHeader {
    /// Number of key + value bytes that follow the header
    pub fn payload_len(&self) -> u64 {
        self.key_len as u64 + self.value_len as u64
    }
}

impl LogRecord {
    /// Build a Put record stamped with the current time
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            timestamp: now_nanos(),
            operation: Operation::Put,
            key: key.into(),
            value: value.into(),
        }
    }

    /// Build a Delete record stamped with the current time
    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        Self {
            timestamp: now_nanos(),
            operation: Operation::Delete,
            key: key.into(),
            value: Vec::new(),
        }
    }

    /// Total on-disk size of this record
    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.key.len() + self.value.len()
    }

    /// Serialize into a standalone byte vector
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode_into(&mut buf)?;
        Ok(buf.to_vec())
    }

    /// Append the encoded record to `buf`.
    ///
    /// The checksum slot is written as zero first and patched once the rest
    /// of the record is in place. On error `buf` is left unchanged.
    pub fn encode_into(&self, buf: &mut BytesMut) -> Result<()> {
        let key_len = field_len("key", self.key.len())?;
        let value_len = field_len("value", self.value.len())?;

        let start = buf.len();
        buf.reserve(self.encoded_len());
        buf.put_u32_le(0);
        buf.put_u64_le(self.timestamp);
        buf.put_u8(self.operation.code());
        buf.put_u32_le(key_len);
        buf.put_u32_le(value_len);
        buf.put_slice(&self.key);
        buf.put_slice(&self.value);

        let crc = compute_checksum(&[&buf[start + CHECKSUM_LEN..]]);
        buf[start..start + CHECKSUM_LEN].copy_from_slice(&crc.to_le_bytes());
        Ok(())
    }

    /// The checksum this record carries once encoded.
    ///
    /// Fails with `RecordTooLarge` exactly when `encode_into` would.
    pub fn checksum(&self) -> Result<u32> {
        let key_len = field_len("key", self.key.len())?;
        let value_len = field_len("value", self.value.len())?;

        let mut tail = BytesMut::with_capacity(HEADER_SIZE - CHECKSUM_LEN);
        tail.put_u64_le(self.timestamp);
        tail.put_u8(self.operation.code());
        tail.put_u32_le(key_len);
        tail.put_u32_le(value_len);
        Ok(compute_checksum(&[&tail[..], &self.key[..], &self.value[..]]))
    }
}

/// Parse the fixed header prefix
pub fn decode_header(header: &[u8; HEADER_SIZE]) -> RecordHeader {
    let mut cursor = &header[..];
    RecordHeader {
        checksum: cursor.get_u32_le(),
        timestamp: cursor.get_u64_le(),
        op_code: cursor.get_u8(),
        key_len: cursor.get_u32_le(),
        value_len: cursor.get_u32_le(),
    }
}

/// CRC-32 (IEEE) over the concatenation of `parts`
pub fn compute_checksum(parts: &[&[u8]]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize()
}

/// The checksum-covered part of an encoded header
pub(crate) fn checksummed_header(header: &[u8; HEADER_SIZE]) -> &[u8] {
    &header[CHECKSUM_LEN..]
}

fn field_len(field: &'static str, len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| AnchorError::RecordTooLarge {
        field,
        len,
        max: MAX_FIELD_LEN,
    })
}

/// Current wall-clock time in nanoseconds since the Unix epoch
pub fn now_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
