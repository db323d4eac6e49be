//! Redo log writer
//!
//! Appends framed records to the log file and applies the sync policy.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::SyncPolicy;
use crate::error::Result;

use super::LogRecord;

/// Writes records to the redo log file
pub struct RedoWriter {
    path: PathBuf,
    file: BufWriter<File>,
    sync_policy: SyncPolicy,
    /// Records written since the last fsync
    unsynced: usize,
}

impl RedoWriter {
    /// Open or create a redo log file for appending
    pub fn open(path: &Path, sync_policy: SyncPolicy) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            file: BufWriter::new(file),
            sync_policy,
            unsynced: 0,
        })
    }

    /// Append one record, syncing according to the policy
    pub fn write(&mut self, record: &LogRecord) -> Result<()> {
        let frame = record.encode()?;
        self.file.write_all(&frame)?;
        self.unsynced += 1;

        match self.sync_policy {
            SyncPolicy::EveryWrite => self.sync()?,
            SyncPolicy::EveryNEntries { count } => {
                if self.unsynced >= count {
                    self.sync()?;
                }
            }
        }

        Ok(())
    }

    /// Flush buffered records and fsync the file
    pub fn sync(&mut self) -> Result<()> {
        self.file.flush()?;
        self.file.get_ref().sync_data()?;
        self.unsynced = 0;
        Ok(())
    }

    /// Cut the file back to `len` bytes (drops a damaged tail)
    pub fn truncate(&mut self, len: u64) -> Result<()> {
        self.file.flush()?;
        self.file.get_ref().set_len(len)?;
        self.file.get_ref().sync_all()?;
        self.unsynced = 0;
        Ok(())
    }

    /// Number of records written but not yet fsynced
    pub fn unsynced(&self) -> usize {
        self.unsynced
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
