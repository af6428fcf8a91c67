// Integration tests for generation rotation and size accounting
// Rotation relies on renameat2(RENAME_EXCHANGE)
#![cfg(target_os = "linux")]

use std::fs;
use std::path::Path;
use tempfile::TempDir;
use twinlog::{LoggerConfig, OnOpen, RotatingLog, TwinlogError};

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

/// `init(path, 20, 0o666)` on a fresh logger: quota of 10 bytes per generation
fn init_small(temp_dir: &TempDir) -> RotatingLog {
    let log = RotatingLog::new();
    log.init(
        &LoggerConfig::new(temp_dir.path().join("t"))
            .with_budget(20)
            .with_perm(0o666),
    )
    .unwrap();
    log
}

#[test]
fn test_overflowing_record_rotates_once() {
    let temp_dir = TempDir::new().unwrap();
    let log = init_small(&temp_dir);
    let current = temp_dir.path().join("t.log");
    let previous = temp_dir.path().join("t.old.log");

    assert_eq!(log.quota(), Some(10));

    log.log(b"12345").unwrap();
    assert_eq!(log.current_size(), Some(5));

    // 5 + 6 > 10: rotate, then write into the emptied current file
    log.log(b"123456").unwrap();
    assert_eq!(log.current_size(), Some(6));
    assert_eq!(read(&current), "123456");
    assert_eq!(read(&previous), "12345");
}

#[test]
fn test_record_filling_quota_exactly_does_not_rotate() {
    let temp_dir = TempDir::new().unwrap();
    let log = init_small(&temp_dir);

    log.log(b"12345").unwrap();
    log.log(b"67890").unwrap();

    assert_eq!(log.current_size(), Some(10));
    assert_eq!(read(&temp_dir.path().join("t.log")), "1234567890");
    assert_eq!(read(&temp_dir.path().join("t.old.log")), "");
}

#[test]
fn test_previous_generation_is_intact_until_next_rotation() {
    let temp_dir = TempDir::new().unwrap();
    let log = init_small(&temp_dir);
    let previous = temp_dir.path().join("t.old.log");

    log.log(b"aaaaaaaa").unwrap();
    log.log(b"bbbbbbbb").unwrap();
    assert_eq!(read(&previous), "aaaaaaaa");

    // Fills the current generation without rotating
    log.log(b"cc").unwrap();
    assert_eq!(read(&previous), "aaaaaaaa");

    log.log(b"dddd").unwrap();
    assert_eq!(read(&previous), "bbbbbbbbcc");
    assert_eq!(read(&temp_dir.path().join("t.log")), "dddd");
}

#[test]
fn test_record_too_large_neither_rotates_nor_writes() {
    let temp_dir = TempDir::new().unwrap();
    let log = init_small(&temp_dir);
    log.log(b"12345").unwrap();

    let result = log.log(b"12345678901");
    assert!(matches!(
        result,
        Err(TwinlogError::RecordTooLarge { len: 11, quota: 10 })
    ));

    assert_eq!(log.current_size(), Some(5));
    assert_eq!(read(&temp_dir.path().join("t.log")), "12345");
    assert_eq!(read(&temp_dir.path().join("t.old.log")), "");
}

#[test]
fn test_double_rotation_leaves_both_generations_empty() {
    let temp_dir = TempDir::new().unwrap();
    let log = init_small(&temp_dir);
    let current = temp_dir.path().join("t.log");
    let previous = temp_dir.path().join("t.old.log");

    log.log(b"12345").unwrap();

    log.rotate().unwrap();
    assert_eq!(read(&previous), "12345");
    assert_eq!(read(&current), "");

    log.rotate().unwrap();
    assert_eq!(read(&previous), "");
    assert_eq!(read(&current), "");
    assert_eq!(log.current_size(), Some(0));
}

#[test]
fn test_footprint_stays_within_budget() {
    let temp_dir = TempDir::new().unwrap();
    let log = RotatingLog::new();
    log.open(&LoggerConfig::new(temp_dir.path().join("t")).with_budget(100))
        .unwrap();

    for i in 0..500 {
        log.log(format!("record {}\n", i).as_bytes()).unwrap();

        let current = fs::metadata(temp_dir.path().join("t.log")).unwrap().len();
        let previous = fs::metadata(temp_dir.path().join("t.old.log")).unwrap().len();
        assert!(current <= 50);
        assert!(previous <= 50);
        assert_eq!(log.current_size(), Some(current));
    }

    // Every retained line is a whole record
    let content = read(&temp_dir.path().join("t.old.log")) + &read(&temp_dir.path().join("t.log"));
    for line in content.lines() {
        assert!(line.starts_with("record "), "unexpected line {:?}", line);
    }
    assert!(content.ends_with("record 499\n"));
}

#[test]
fn test_init_twice_fails_and_keeps_first_state() {
    let temp_dir = TempDir::new().unwrap();
    let log = init_small(&temp_dir);
    log.log(b"12345").unwrap();

    let other = LoggerConfig::new(temp_dir.path().join("other")).with_budget(1000);
    let result = log.init(&other);
    assert!(matches!(result, Err(TwinlogError::AlreadyInitialized)));

    assert_eq!(log.quota(), Some(10));
    assert_eq!(log.current_size(), Some(5));
    assert_eq!(read(&temp_dir.path().join("t.log")), "12345");
    assert!(!temp_dir.path().join("other.log").exists());
}

#[test]
fn test_reinit_after_uninit_truncates() {
    let temp_dir = TempDir::new().unwrap();
    let log = init_small(&temp_dir);
    log.log(b"12345").unwrap();
    log.log(b"123456").unwrap();
    log.uninit();

    log.init(&LoggerConfig::new(temp_dir.path().join("t")).with_budget(20))
        .unwrap();

    assert_eq!(log.current_size(), Some(0));
    assert_eq!(read(&temp_dir.path().join("t.log")), "");
    assert_eq!(read(&temp_dir.path().join("t.old.log")), "");
}

#[test]
fn test_resume_keeps_content_and_accounting() {
    let temp_dir = TempDir::new().unwrap();
    let base = temp_dir.path().join("t");
    let log = init_small(&temp_dir);
    log.log(b"12345").unwrap();
    log.log(b"123456").unwrap();
    log.uninit();

    let config = LoggerConfig::new(&base)
        .with_budget(20)
        .with_on_open(OnOpen::Resume);
    log.open(&config).unwrap();

    assert_eq!(log.current_size(), Some(6));
    log.log(b"ab").unwrap();
    assert_eq!(read(&temp_dir.path().join("t.log")), "123456ab");
    assert_eq!(read(&temp_dir.path().join("t.old.log")), "12345");
}

#[test]
fn test_resume_over_quota_rotates_on_open() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("t.log"), b"0123456789abcdef").unwrap();

    let log = RotatingLog::new();
    let config = LoggerConfig::new(temp_dir.path().join("t"))
        .with_budget(20)
        .with_on_open(OnOpen::Resume);
    log.open(&config).unwrap();

    assert_eq!(log.current_size(), Some(0));
    assert_eq!(read(&temp_dir.path().join("t.old.log")), "0123456789abcdef");
    assert_eq!(read(&temp_dir.path().join("t.log")), "");
}

#[test]
fn test_auto_init_after_uninit_reports_unwritable_default() {
    let temp_dir = TempDir::new().unwrap();
    let unwritable = temp_dir.path().join("missing-dir").join("nested").join("app");
    let log = RotatingLog::new().with_default_config(LoggerConfig::new(&unwritable));

    log.init(&LoggerConfig::new(temp_dir.path().join("t")).with_budget(20))
        .unwrap();
    log.uninit();

    let result = log.log_or_init(b"hello");
    assert!(matches!(result, Err(TwinlogError::OpenFailed { .. })));
    assert!(!log.is_initialized());
}

#[test]
fn test_auto_init_uses_default_config() {
    let temp_dir = TempDir::new().unwrap();
    let log = RotatingLog::new()
        .with_default_config(LoggerConfig::new(temp_dir.path().join("auto")).with_budget(20));

    log.log_or_init(b"hello").unwrap();

    assert!(log.is_initialized());
    assert_eq!(log.current_size(), Some(5));
    assert_eq!(read(&temp_dir.path().join("auto.log")), "hello");
}
