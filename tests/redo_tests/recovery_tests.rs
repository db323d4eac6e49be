//! Tests for redo log recovery
//!
//! These tests verify:
//! - Recovery from a missing, empty or clean log
//! - Partial writes at the tail are discarded
//! - Corrupted or out-of-order records end the valid prefix
//! - Restore truncates the file and appends continue after it
//! - Restore refuses a log damaged before its last record

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use redokv::config::SyncPolicy;
use redokv::redo::{LogRecord, Operation, RedoLog, RedoRecovery, HEADER_SIZE};
use redokv::KvError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_log() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join(RedoLog::FILENAME);
    (temp_dir, path)
}

/// Write raw frames directly to a file (for crafting damage)
fn write_frames(path: &Path, frames: &[Vec<u8>]) {
    let mut file = File::create(path).unwrap();
    for frame in frames {
        file.write_all(frame).unwrap();
    }
    file.sync_all().unwrap();
}

fn frame(record: &LogRecord) -> Vec<u8> {
    record.encode().unwrap()
}

fn append_bytes(path: &Path, bytes: &[u8]) {
    let mut file = OpenOptions::new().append(true).open(path).unwrap();
    file.write_all(bytes).unwrap();
    file.sync_all().unwrap();
}

// =============================================================================
// Clean Logs
// =============================================================================

#[test]
fn test_recover_missing_file() {
    let (_temp, path) = setup_temp_log();

    let (records, report) = RedoRecovery::recover(&path).unwrap();

    assert!(records.is_empty());
    assert_eq!(report.records_recovered, 0);
    assert_eq!(report.last_serial, None);
    assert!(!report.was_truncated);
}

#[test]
fn test_recover_empty_file() {
    let (_temp, path) = setup_temp_log();
    File::create(&path).unwrap();

    let (records, report) = RedoRecovery::recover(&path).unwrap();

    assert!(records.is_empty());
    assert_eq!(report.valid_bytes, 0);
    assert_eq!(report.discarded_bytes, 0);
    assert!(!report.was_truncated);
}

#[test]
fn test_recover_clean_log() {
    let (_temp, path) = setup_temp_log();
    let frames: Vec<Vec<u8>> = (0..10)
        .map(|i| frame(&LogRecord::insert(i, format!("key{}", i), format!("value{}", i))))
        .collect();
    write_frames(&path, &frames);

    let (records, report) = RedoRecovery::recover(&path).unwrap();

    assert_eq!(records.len(), 10);
    assert_eq!(report.records_recovered, 10);
    assert_eq!(report.last_serial, Some(9));
    assert_eq!(report.valid_bytes, fs::metadata(&path).unwrap().len());
    assert!(!report.was_truncated);
    assert_eq!(report.reason, None);

    for (i, record) in records.iter().enumerate() {
        assert_eq!(record.serial, i as u64);
    }
}

// =============================================================================
// Partial Writes
// =============================================================================

#[test]
fn test_recover_partial_header_at_tail() {
    let (_temp, path) = setup_temp_log();
    let good = frame(&LogRecord::insert(0, "k", "v"));
    write_frames(&path, &[good.clone()]);
    append_bytes(&path, &[0u8; HEADER_SIZE - 3]);

    let (records, report) = RedoRecovery::recover(&path).unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(report.valid_bytes, good.len() as u64);
    assert_eq!(report.discarded_bytes, (HEADER_SIZE - 3) as u64);
    assert!(report.was_truncated);
    assert!(report.reason.unwrap().contains("truncated header"));
}

#[test]
fn test_recover_partial_payload_at_tail() {
    let (_temp, path) = setup_temp_log();
    let good = frame(&LogRecord::insert(0, "k", "v"));
    let mut torn = frame(&LogRecord::insert(1, "k2", "v2"));
    torn.truncate(HEADER_SIZE + 2);
    write_frames(&path, &[good, torn]);

    let (records, report) = RedoRecovery::recover(&path).unwrap();

    assert_eq!(records, vec![LogRecord::insert(0, "k", "v")]);
    assert_eq!(report.last_serial, Some(0));
    assert!(report.was_truncated);
    assert!(report.reason.unwrap().contains("truncated payload"));
}

// =============================================================================
// Corruption
// =============================================================================

#[test]
fn test_recover_stops_at_checksum_mismatch() {
    let (_temp, path) = setup_temp_log();
    let first = frame(&LogRecord::insert(0, "k1", "v1"));
    let mut second = frame(&LogRecord::insert(1, "k2", "v2"));
    let third = frame(&LogRecord::insert(2, "k3", "v3"));
    if let Some(byte) = second.last_mut() {
        *byte ^= 0xFF;
    }
    write_frames(&path, &[first.clone(), second.clone(), third.clone()]);

    let (records, report) = RedoRecovery::recover(&path).unwrap();

    // Framing after a bad record cannot be trusted, so the rest goes too
    assert_eq!(records.len(), 1);
    assert_eq!(report.valid_bytes, first.len() as u64);
    assert_eq!(report.discarded_bytes, (second.len() + third.len()) as u64);
    assert!(report.interior_damage);
    assert!(report.reason.unwrap().contains("checksum mismatch"));
}

#[test]
fn test_restore_refuses_damage_before_last_record() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(RedoLog::FILENAME);

    let first = frame(&LogRecord::insert(0, "a", "1"));
    let mut second = frame(&LogRecord::insert(1, "b", "2"));
    let third = frame(&LogRecord::insert(2, "c", "3"));
    second[HEADER_SIZE + 1] ^= 0xFF;
    write_frames(&path, &[first.clone(), second, third]);
    let before = fs::metadata(&path).unwrap().len();

    let mut log = RedoLog::open(temp.path(), SyncPolicy::EveryWrite).unwrap();
    match log.restore() {
        Err(KvError::RedoCorruption { offset, .. }) => assert_eq!(offset, first.len() as u64),
        other => panic!("expected RedoCorruption, got {:?}", other.map(|(r, _)| r.len())),
    }

    // Nothing was cut and nothing can be appended
    assert_eq!(fs::metadata(&path).unwrap().len(), before);
    assert!(matches!(
        log.append(Operation::Insert, "d", Some("4")),
        Err(KvError::RedoNotRestored)
    ));
    drop(log);
    assert_eq!(fs::metadata(&path).unwrap().len(), before);
}

#[test]
fn test_damaged_last_record_is_not_interior() {
    let (_temp, path) = setup_temp_log();
    let first = frame(&LogRecord::insert(0, "a", "1"));
    let mut last = frame(&LogRecord::insert(1, "b", "2"));
    last[HEADER_SIZE + 1] ^= 0xFF;
    write_frames(&path, &[first, last]);

    let report = RedoRecovery::verify(&path).unwrap();

    assert!(report.was_truncated);
    assert!(!report.interior_damage);
}

#[test]
fn test_recover_corruption_at_first_record() {
    let (_temp, path) = setup_temp_log();
    let mut bytes = frame(&LogRecord::insert(0, "k", "v"));
    bytes[HEADER_SIZE + 1] ^= 0xFF;
    write_frames(&path, &[bytes]);

    let (records, report) = RedoRecovery::recover(&path).unwrap();

    assert!(records.is_empty());
    assert_eq!(report.last_serial, None);
    assert_eq!(report.valid_bytes, 0);
    assert!(report.was_truncated);
}

#[test]
fn test_recover_rejects_oversized_length() {
    let (_temp, path) = setup_temp_log();
    let good = frame(&LogRecord::insert(0, "k", "v"));
    let mut bogus = Vec::new();
    bogus.extend_from_slice(&u32::MAX.to_le_bytes());
    bogus.extend_from_slice(&0u32.to_le_bytes());
    write_frames(&path, &[good, bogus]);

    let (records, report) = RedoRecovery::recover(&path).unwrap();

    assert_eq!(records.len(), 1);
    assert!(report.reason.unwrap().contains("exceeds limit"));
}

#[test]
fn test_recover_stops_at_out_of_order_serial() {
    let (_temp, path) = setup_temp_log();
    write_frames(
        &path,
        &[
            frame(&LogRecord::insert(0, "a", "1")),
            frame(&LogRecord::insert(1, "b", "2")),
            frame(&LogRecord::insert(1, "c", "3")),
        ],
    );

    let (records, report) = RedoRecovery::recover(&path).unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(report.last_serial, Some(1));
    assert!(report.was_truncated);
    assert!(!report.interior_damage);
    assert!(report.reason.unwrap().contains("does not follow"));
}

// =============================================================================
// Verify and Restore
// =============================================================================

#[test]
fn test_verify_does_not_modify_file() {
    let (_temp, path) = setup_temp_log();
    write_frames(&path, &[frame(&LogRecord::insert(0, "k", "v"))]);
    append_bytes(&path, &[1, 2, 3]);
    let before = fs::metadata(&path).unwrap().len();

    let report = RedoRecovery::verify(&path).unwrap();

    assert!(report.was_truncated);
    assert_eq!(fs::metadata(&path).unwrap().len(), before);
}

#[test]
fn test_recover_and_verify_agree() {
    let (_temp, path) = setup_temp_log();
    let frames: Vec<Vec<u8>> = (0..20)
        .map(|i| frame(&LogRecord::insert(i, "k", "v")))
        .collect();
    write_frames(&path, &frames);

    let (records, recovered) = RedoRecovery::recover(&path).unwrap();
    let verified = RedoRecovery::verify(&path).unwrap();

    assert_eq!(records.len() as u64, recovered.records_recovered);
    assert_eq!(recovered, verified);
}

#[test]
fn test_restore_truncates_tail_and_appends_after_it() {
    let temp = TempDir::new().unwrap();

    let valid_len = {
        let mut log = RedoLog::open(temp.path(), SyncPolicy::EveryWrite).unwrap();
        log.restore().unwrap();
        log.append(Operation::Insert, "a", Some("1")).unwrap();
        log.append(Operation::Insert, "b", Some("2")).unwrap();
        fs::metadata(log.path()).unwrap().len()
    };

    let path = temp.path().join(RedoLog::FILENAME);
    let mut torn = frame(&LogRecord::insert(2, "c", "3"));
    torn.truncate(torn.len() - 1);
    append_bytes(&path, &torn);

    let mut log = RedoLog::open(temp.path(), SyncPolicy::EveryWrite).unwrap();
    let (records, report) = log.restore().unwrap();

    assert_eq!(records.len(), 2);
    assert!(report.was_truncated);
    assert_eq!(fs::metadata(&path).unwrap().len(), valid_len);

    // The torn record's serial is handed out again since it never committed
    assert_eq!(log.append(Operation::Delete, "a", None).unwrap(), 2);
    drop(log);

    let (records, report) = RedoRecovery::recover(&path).unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[2], LogRecord::delete(2, "a"));
    assert!(!report.was_truncated);
}
