//! Redo Log Module
//!
//! Append-only journal of storage mutations.
//!
//! ## Responsibilities
//! - Append a record before the storage table applies a mutation
//! - Assign serials in application order, never reused
//! - CRC32 checksums for corruption detection
//! - Restore after a restart, discarding a damaged tail
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────┐
//! │ Record 1                                 │
//! │ ┌─────────┬─────────┬──────────────────┐ │
//! │ │ Len (4) │ CRC (4) │ bincode(record)  │ │
//! │ └─────────┴─────────┴──────────────────┘ │
//! ├──────────────────────────────────────────┤
//! │ Record 2                                 │
//! │ ┌─────────┬─────────┬──────────────────┐ │
//! │ │ Len (4) │ CRC (4) │ bincode(record)  │ │
//! │ └─────────┴─────────┴──────────────────┘ │
//! └──────────────────────────────────────────┘
//! ```
//! Integers are little-endian; the CRC covers the payload only.

mod reader;
mod record;
mod recovery;
mod writer;

use std::fs;
use std::path::Path;

use crate::config::SyncPolicy;
use crate::error::{KvError, Result};

pub use reader::{RedoIterator, RedoReader};
pub use record::{LogRecord, Operation, HEADER_SIZE, MAX_RECORD_SIZE};
pub use recovery::{RecoveryReport, RedoRecovery};
pub use writer::RedoWriter;

/// The redo log of one storage table
///
/// Lifecycle: [`RedoLog::open`], then [`RedoLog::restore`] exactly once,
/// then any number of [`RedoLog::append`] calls. Appending before the log
/// was restored fails, since the next serial is unknown until then.
pub struct RedoLog {
    writer: RedoWriter,

    /// Serial for the next record; `None` until restored
    next_serial: Option<u64>,
}

impl RedoLog {
    /// File name of the log inside the root directory
    pub const FILENAME: &'static str = "redo.log";

    /// Open or create the log under `root`
    pub fn open(root: &Path, sync_policy: SyncPolicy) -> Result<Self> {
        fs::create_dir_all(root)?;
        let writer = RedoWriter::open(&root.join(Self::FILENAME), sync_policy)?;

        Ok(Self {
            writer,
            next_serial: None,
        })
    }

    /// Read back the persisted log
    ///
    /// Returns the valid records in serial order. A damaged final record is
    /// cut off the file so later appends follow the last good record. Damage
    /// with complete records behind it fails with `RedoCorruption` and leaves
    /// the file as it is.
    pub fn restore(&mut self) -> Result<(Vec<LogRecord>, RecoveryReport)> {
        self.writer.sync()?;

        let (records, report) = RedoRecovery::recover(self.writer.path())?;

        if report.interior_damage {
            let reason = report.reason.clone().unwrap_or_default();
            tracing::error!(
                path = %self.writer.path().display(),
                offset = report.valid_bytes,
                reason = %reason,
                "Redo log damaged before its last record"
            );
            return Err(KvError::RedoCorruption {
                offset: report.valid_bytes,
                reason,
            });
        }

        if report.was_truncated {
            tracing::warn!(
                path = %self.writer.path().display(),
                valid_bytes = report.valid_bytes,
                discarded_bytes = report.discarded_bytes,
                reason = report.reason.as_deref().unwrap_or("unknown"),
                "Discarding damaged redo log tail"
            );
            self.writer.truncate(report.valid_bytes)?;
        }

        self.next_serial = Some(report.last_serial.map_or(0, |serial| serial + 1));

        Ok((records, report))
    }

    /// Append one mutation and return its serial
    pub fn append(&mut self, operation: Operation, key: &str, value: Option<&str>) -> Result<u64> {
        let serial = self.next_serial.ok_or(KvError::RedoNotRestored)?;

        let record = LogRecord {
            serial,
            operation,
            key: key.to_string(),
            value: value.map(str::to_string),
        };
        self.writer.write(&record)?;

        self.next_serial = Some(serial + 1);
        Ok(serial)
    }

    /// Persist every buffered record to the root directory
    pub fn dump(&mut self) -> Result<()> {
        self.writer.sync()
    }

    /// Serial the next append will get, once restored
    pub fn next_serial(&self) -> Option<u64> {
        self.next_serial
    }

    pub fn path(&self) -> &Path {
        self.writer.path()
    }
}
