//! Tests for Engine
//!
//! These tests verify:
//! - Directory and WAL creation on open
//! - Crash recovery from the WAL on reopen
//! - Refusal to open over a damaged WAL
//! - Engine lifecycle (close order, idempotence against a closed store)

use std::fs;
use std::time::Duration;

use anchorkv::wal::{LogWriter, WalReader};
use anchorkv::{AnchorError, Config, Context, Engine, ErrorKind, KvStore};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn test_config(temp_dir: &TempDir) -> Config {
    Config::builder()
        .data_dir(temp_dir.path().join("db"))
        .write_buffer_size(4 * 1024)
        .build()
}

fn bg() -> Context {
    Context::background()
}

// =============================================================================
// Open Tests
// =============================================================================

#[test]
fn test_engine_open_creates_directories() {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(&temp_dir);

    let engine = Engine::open(config.clone()).unwrap();

    assert!(config.data_dir.exists());
    assert!(config.wal_path().exists());
    assert_eq!(engine.recovery_stats().records, 0);
    assert!(engine.store().is_empty());
}

#[test]
fn test_open_path_uses_default_config() {
    let temp_dir = TempDir::new().unwrap();

    let engine = Engine::open_path(temp_dir.path()).unwrap();

    assert_eq!(engine.config().data_dir, temp_dir.path());
    assert_eq!(engine.config().write_buffer_size, 64 * 1024);
    assert!(temp_dir.path().join("wal.log").exists());
}

#[test]
fn test_engine_put_get_delete() {
    let temp_dir = TempDir::new().unwrap();
    let engine = Engine::open(test_config(&temp_dir)).unwrap();
    let store = engine.store();

    store.put(&bg(), "hello", b"world").unwrap();
    assert_eq!(store.get(&bg(), "hello").unwrap(), b"world");

    store.delete(&bg(), "hello").unwrap();
    assert!(matches!(
        store.get(&bg(), "hello"),
        Err(AnchorError::KeyNotFound)
    ));
}

// =============================================================================
// Recovery Tests
// =============================================================================

#[test]
fn test_reopen_recovers_state() {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(&temp_dir);

    {
        let engine = Engine::open(config.clone()).unwrap();
        let store = engine.store();
        store.put(&bg(), "a", b"1").unwrap();
        store.put(&bg(), "b", b"2").unwrap();
        store.put(&bg(), "a", b"3").unwrap();
        store.delete(&bg(), "b").unwrap();
        engine.close(&bg()).unwrap();
    }

    let engine = Engine::open(config).unwrap();
    assert_eq!(engine.recovery_stats().records, 4);
    assert_eq!(engine.store().len(), 1);
    assert_eq!(engine.store().get(&bg(), "a").unwrap(), b"3");
}

#[test]
fn test_recovery_without_clean_close() {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(&temp_dir);

    {
        let engine = Engine::open(config.clone()).unwrap();
        engine.store().put(&bg(), "survivor", b"yes").unwrap();
        // Simulated crash: neither store nor writer is closed
        std::mem::forget(engine);
    }

    let engine = Engine::open(config).unwrap();
    assert_eq!(engine.store().get(&bg(), "survivor").unwrap(), b"yes");
}

#[test]
fn test_recovered_engine_keeps_appending() {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(&temp_dir);

    let engine = Engine::open(config.clone()).unwrap();
    engine.store().put(&bg(), "first", b"1").unwrap();
    engine.close(&bg()).unwrap();

    let engine = Engine::open(config.clone()).unwrap();
    engine.store().put(&bg(), "second", b"2").unwrap();
    engine.close(&bg()).unwrap();

    let count = WalReader::open(&config.wal_path()).unwrap().records().count();
    assert_eq!(count, 2);

    let engine = Engine::open(config).unwrap();
    assert_eq!(engine.store().len(), 2);
}

#[test]
fn test_open_refuses_truncated_wal() {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(&temp_dir);

    {
        let engine = Engine::open(config.clone()).unwrap();
        engine.store().put(&bg(), "k", b"some value").unwrap();
        engine.close(&bg()).unwrap();
    }
    let len = fs::metadata(config.wal_path()).unwrap().len();
    fs::OpenOptions::new()
        .write(true)
        .open(config.wal_path())
        .unwrap()
        .set_len(len - 4)
        .unwrap();

    let err = Engine::open(config).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Truncation);
}

#[test]
fn test_open_refuses_corrupt_wal() {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(&temp_dir);

    {
        let engine = Engine::open(config.clone()).unwrap();
        engine.store().put(&bg(), "k", b"some value").unwrap();
        engine.close(&bg()).unwrap();
    }
    let mut bytes = fs::read(config.wal_path()).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x80;
    fs::write(config.wal_path(), &bytes).unwrap();

    let err = Engine::open(config).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Corruption);
    assert_eq!(err.offset(), Some(0));
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_close_closes_writer() {
    let temp_dir = TempDir::new().unwrap();
    let engine = Engine::open(test_config(&temp_dir)).unwrap();
    let writer = engine.writer().clone();

    engine.close(&bg()).unwrap();

    assert!(writer.is_closed());
}

#[test]
fn test_close_after_store_closed() {
    let temp_dir = TempDir::new().unwrap();
    let engine = Engine::open(test_config(&temp_dir)).unwrap();
    let writer = engine.writer().clone();

    engine.store().close(&bg()).unwrap();
    engine.close(&bg()).unwrap();

    assert!(writer.is_closed());
}

#[test]
fn test_buffered_writes_persist_through_close() {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(&temp_dir);

    let engine = Engine::open(config.clone()).unwrap();
    engine
        .writer()
        .write(&bg(), &anchorkv::wal::LogRecord::put("raw", "buffered"))
        .unwrap();
    assert!(engine.writer().buffered_len() > 0);
    engine.close(&bg()).unwrap();

    let engine = Engine::open(config).unwrap();
    assert_eq!(engine.store().get(&bg(), "raw").unwrap(), b"buffered");
}

#[test]
fn test_config_context_honors_timeout() {
    let config = Config::builder().op_timeout(Duration::from_secs(30)).build();
    assert!(config.context().deadline().is_some());

    let config = Config::default();
    assert!(config.context().deadline().is_none());
}
