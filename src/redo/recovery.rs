//! Redo log recovery
//!
//! Scans a log after a restart and finds where the valid prefix ends.

use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::{KvError, Result};

use super::record::parse_header;
use super::{LogRecord, RedoReader, HEADER_SIZE};

/// Outcome of scanning a redo log
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Number of records in the valid prefix
    pub records_recovered: u64,

    /// Serial of the last valid record
    pub last_serial: Option<u64>,

    /// Length of the valid prefix in bytes
    pub valid_bytes: u64,

    /// Bytes after the valid prefix
    pub discarded_bytes: u64,

    /// Whether a tail has to be (or was) cut off
    pub was_truncated: bool,

    /// The bad record is followed by more bytes, so the discarded range is
    /// not just an interrupted final write
    pub interior_damage: bool,

    /// Why the scan stopped early
    pub reason: Option<String>,
}

/// Scans redo logs
pub struct RedoRecovery;

impl RedoRecovery {
    /// Read every valid record of a log file, in serial order
    ///
    /// Stops at the first incomplete, damaged or out-of-order record and
    /// reports everything from there on as the discarded tail. If that
    /// record's frame ends before the file does, `interior_damage` is set.
    /// The file is not modified. A missing file is an empty log.
    pub fn recover(path: &Path) -> Result<(Vec<LogRecord>, RecoveryReport)> {
        let mut report = RecoveryReport::default();
        let mut records = Vec::new();

        let file_len = match fs::metadata(path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok((records, report));
            }
            Err(e) => return Err(e.into()),
        };

        let mut reader = RedoReader::open(path)?;
        loop {
            match reader.next_record() {
                Ok(Some(record)) => {
                    if let Some(last) = report.last_serial {
                        if record.serial <= last {
                            report.reason = Some(format!(
                                "serial {} does not follow {} at offset {}",
                                record.serial,
                                last,
                                report.valid_bytes
                            ));
                            break;
                        }
                    }
                    report.last_serial = Some(record.serial);
                    report.records_recovered += 1;
                    report.valid_bytes = reader.offset();
                    records.push(record);
                }
                Ok(None) => break,
                Err(e @ KvError::RedoCorruption { .. }) => {
                    report.reason = Some(e.to_string());
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        report.discarded_bytes = file_len.saturating_sub(report.valid_bytes);
        report.was_truncated = report.discarded_bytes > 0;
        if report.was_truncated {
            report.interior_damage = !frame_reaches_end(path, report.valid_bytes, file_len)?;
        }

        Ok((records, report))
    }

    /// Report on a log file without returning its records
    pub fn verify(path: &Path) -> Result<RecoveryReport> {
        Self::recover(path).map(|(_, report)| report)
    }
}

/// Whether the frame starting at `start` runs to (or past) end of file
fn frame_reaches_end(path: &Path, start: u64, file_len: u64) -> Result<bool> {
    if file_len - start < HEADER_SIZE as u64 {
        return Ok(true);
    }

    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(start))?;
    let mut header = [0u8; HEADER_SIZE];
    file.read_exact(&mut header)?;

    let (len, _) = parse_header(&header);
    Ok(start + HEADER_SIZE as u64 + u64::from(len) >= file_len)
}
