//! Tests for WAL Recovery
//!
//! These tests verify:
//! - Replay of a clean WAL (puts upsert, deletes remove)
//! - Replay of an empty or missing WAL
//! - Replay refuses truncated or corrupted logs
//! - Verify mode (report only, never fails on integrity)

use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

use anchorkv::wal::{self, LogRecord, LogStatus, LogWriter, WalWriter};
use anchorkv::{Context, ErrorKind};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_wal() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let wal_path = temp_dir.path().join("test.wal");
    (temp_dir, wal_path)
}

/// Write records using WalWriter (produces a well-formed WAL)
fn write_records_via_writer(path: &PathBuf, records: &[LogRecord]) {
    let writer = WalWriter::open(path).unwrap();
    let ctx = Context::background();
    for record in records {
        writer.sync_write(&ctx, record).unwrap();
    }
    writer.close().unwrap();
}

fn numbered_puts(count: usize) -> Vec<LogRecord> {
    (0..count)
        .map(|i| LogRecord::put(format!("key{}", i), format!("value{}", i)))
        .collect()
}

fn file_len(path: &PathBuf) -> u64 {
    fs::metadata(path).unwrap().len()
}

// =============================================================================
// Replay: Clean WAL Tests
// =============================================================================

#[test]
fn test_replay_missing_file() {
    let (_temp, wal_path) = setup_temp_wal();

    let (map, stats) = wal::replay(&wal_path).unwrap();

    assert!(map.is_empty());
    assert_eq!(stats.records, 0);
    assert_eq!(stats.last_timestamp, None);
}

#[test]
fn test_replay_empty_file() {
    let (_temp, wal_path) = setup_temp_wal();
    File::create(&wal_path).unwrap();

    let (map, stats) = wal::replay(&wal_path).unwrap();

    assert!(map.is_empty());
    assert_eq!(stats.records, 0);
    assert_eq!(stats.bytes, 0);
}

#[test]
fn test_replay_multiple_records() {
    let (_temp, wal_path) = setup_temp_wal();
    write_records_via_writer(&wal_path, &numbered_puts(10));

    let (map, stats) = wal::replay(&wal_path).unwrap();

    assert_eq!(map.len(), 10);
    assert_eq!(stats.records, 10);
    assert_eq!(stats.puts, 10);
    assert_eq!(stats.deletes, 0);
    assert_eq!(stats.bytes, file_len(&wal_path));
    assert_eq!(map.get(b"key7".as_slice()), Some(&b"value7".to_vec()));
}

#[test]
fn test_replay_applies_in_order() {
    let (_temp, wal_path) = setup_temp_wal();
    let last = LogRecord::put("k2", "v2");
    write_records_via_writer(
        &wal_path,
        &[
            LogRecord::put("k1", "v1"),
            LogRecord::put("k1", "v1-updated"),
            LogRecord::delete("k1"),
            LogRecord::put("k2", "old"),
            last.clone(),
        ],
    );

    let (map, stats) = wal::replay(&wal_path).unwrap();

    assert_eq!(map.len(), 1);
    assert!(!map.contains_key(b"k1".as_slice()));
    assert_eq!(map.get(b"k2".as_slice()), Some(&b"v2".to_vec()));
    assert_eq!(stats.puts, 4);
    assert_eq!(stats.deletes, 1);
    assert_eq!(stats.last_timestamp, Some(last.timestamp));
}

#[test]
fn test_replay_delete_of_absent_key() {
    let (_temp, wal_path) = setup_temp_wal();
    write_records_via_writer(&wal_path, &[LogRecord::delete("never-written")]);

    let (map, stats) = wal::replay(&wal_path).unwrap();

    assert!(map.is_empty());
    assert_eq!(stats.deletes, 1);
}

// =============================================================================
// Replay: Damaged WAL Tests
// =============================================================================

#[test]
fn test_replay_truncated_tail_fails() {
    let (_temp, wal_path) = setup_temp_wal();
    write_records_via_writer(&wal_path, &numbered_puts(5));

    let mut file = fs::OpenOptions::new().append(true).open(&wal_path).unwrap();
    file.write_all(&[0u8; 10]).unwrap();

    let err = wal::replay(&wal_path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Truncation);
}

#[test]
fn test_replay_cut_mid_payload_fails() {
    let (_temp, wal_path) = setup_temp_wal();
    write_records_via_writer(&wal_path, &numbered_puts(3));

    let len = file_len(&wal_path);
    File::options()
        .write(true)
        .open(&wal_path)
        .unwrap()
        .set_len(len - 3)
        .unwrap();

    let err = wal::replay(&wal_path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Truncation);
}

#[test]
fn test_replay_corruption_fails_with_offset() {
    let (_temp, wal_path) = setup_temp_wal();
    let records = numbered_puts(3);
    write_records_via_writer(&wal_path, &records);

    let second_offset = records[0].encoded_len();
    let mut bytes = fs::read(&wal_path).unwrap();
    bytes[second_offset + 25] ^= 0x01;
    fs::write(&wal_path, &bytes).unwrap();

    let err = wal::replay(&wal_path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Corruption);
    assert_eq!(err.offset(), Some(second_offset as u64));
}

// =============================================================================
// Verify Tests
// =============================================================================

#[test]
fn test_verify_clean() {
    let (_temp, wal_path) = setup_temp_wal();
    write_records_via_writer(&wal_path, &numbered_puts(4));

    let report = wal::verify(&wal_path).unwrap();

    assert!(report.is_clean());
    assert_eq!(report.valid_records, 4);
    assert_eq!(report.valid_bytes, file_len(&wal_path));
}

#[test]
fn test_verify_truncated() {
    let (_temp, wal_path) = setup_temp_wal();
    let records = numbered_puts(2);
    write_records_via_writer(&wal_path, &records);
    let clean_len = file_len(&wal_path);

    let mut file = fs::OpenOptions::new().append(true).open(&wal_path).unwrap();
    file.write_all(&[1u8; 4]).unwrap();

    let report = wal::verify(&wal_path).unwrap();

    assert_eq!(report.status, LogStatus::Truncated { offset: clean_len });
    assert_eq!(report.valid_records, 2);
    assert_eq!(report.valid_bytes, clean_len);
    // Verify never modifies the file
    assert_eq!(file_len(&wal_path), clean_len + 4);
}

#[test]
fn test_verify_corrupt() {
    let (_temp, wal_path) = setup_temp_wal();
    write_records_via_writer(&wal_path, &numbered_puts(2));

    let mut bytes = fs::read(&wal_path).unwrap();
    bytes[0] ^= 0xFF;
    fs::write(&wal_path, &bytes).unwrap();

    let report = wal::verify(&wal_path).unwrap();

    assert_eq!(report.status, LogStatus::Corrupt { offset: 0 });
    assert_eq!(report.valid_records, 0);
    assert!(!report.is_clean());
}

#[test]
fn test_verify_missing_file_is_error() {
    let (_temp, wal_path) = setup_temp_wal();

    let err = wal::verify(&wal_path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}
