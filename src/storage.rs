//! Storage Module
//!
//! The key→value table and the redo log it owns.
//!
//! ## Responsibilities
//! - Serve get/set/del under one exclusive lock
//! - Journal every mutation before applying it
//! - Replay the redo log on open, before any traffic
//! - Refuse mutations once the redo log has failed

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{KvError, Result};
use crate::redo::{LogRecord, Operation, RedoLog};

/// Acknowledgement returned by a successful mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack;

impl fmt::Display for Ack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OK")
    }
}

/// The storage table
///
/// ## Concurrency Model: one exclusive lock
///
/// The mapping and the redo log sit behind a single `Mutex`. Reads and
/// writes from every connection take it, so at most one operation is in
/// flight and redo serials match the order mutations hit the mapping.
///
/// Inside `set`/`del` the record is appended first and the mapping changed
/// second. A crash in between leaves a record that replay re-applies.
pub struct Storage {
    root: PathBuf,
    inner: Mutex<Inner>,
}

struct Inner {
    entries: HashMap<String, String>,
    redo: RedoLog,

    /// Set once an append failed; mutations are refused from then on
    failure: Option<String>,
}

impl Storage {
    /// Open the table under `config.root()` and replay its redo log
    pub fn open(config: &Config) -> Result<Self> {
        let mut redo = RedoLog::open(config.root(), config.sync_policy())?;
        let (records, report) = redo.restore()?;

        let entries = replay(records);

        tracing::info!(
            path = %redo.path().display(),
            records = report.records_recovered,
            discarded_bytes = report.discarded_bytes,
            keys = entries.len(),
            "Redo log restored"
        );

        Ok(Self {
            root: config.root().to_path_buf(),
            inner: Mutex::new(Inner {
                entries,
                redo,
                failure: None,
            }),
        })
    }

    /// Get the current value of `key`
    pub fn get(&self, key: &str) -> Result<String> {
        let inner = self.inner.lock();
        inner.entries.get(key).cloned().ok_or(KvError::NotFound)
    }

    /// Insert or overwrite `key`
    pub fn set(&self, key: &str, value: &str) -> Result<Ack> {
        let mut inner = self.inner.lock();
        inner.ensure_writable()?;

        if let Err(e) = inner.redo.append(Operation::Insert, key, Some(value)) {
            return Err(inner.fail(e));
        }
        inner.entries.insert(key.to_string(), value.to_string());

        Ok(Ack)
    }

    /// Remove `key`; fails with `NotFound` if absent
    pub fn del(&self, key: &str) -> Result<Ack> {
        let mut inner = self.inner.lock();

        if !inner.entries.contains_key(key) {
            return Err(KvError::NotFound);
        }
        inner.ensure_writable()?;

        if let Err(e) = inner.redo.append(Operation::Delete, key, None) {
            return Err(inner.fail(e));
        }
        inner.entries.remove(key);

        Ok(Ack)
    }

    /// Force buffered redo records to disk
    pub fn dump(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        match inner.redo.dump() {
            Ok(()) => Ok(()),
            Err(e) => Err(inner.fail(e)),
        }
    }

    // =========================================================================
    // Accessors (for testing and tooling)
    // =========================================================================

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// Serial the next mutation will be journaled under
    pub fn next_serial(&self) -> u64 {
        self.inner.lock().redo.next_serial().unwrap_or(0)
    }

    /// Copy of the current mapping
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.inner.lock().entries.clone()
    }

    pub fn is_read_only(&self) -> bool {
        self.inner.lock().failure.is_some()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Inner {
    fn ensure_writable(&self) -> Result<()> {
        match &self.failure {
            Some(reason) => Err(KvError::ReadOnly(reason.clone())),
            None => Ok(()),
        }
    }

    /// Record a redo failure; durability is no longer guaranteed
    fn fail(&mut self, err: KvError) -> KvError {
        tracing::error!(
            path = %self.redo.path().display(),
            error = %err,
            "Redo log failed, refusing further mutations"
        );
        self.failure = Some(err.to_string());
        err
    }
}

/// Rebuild a mapping by applying records in order
///
/// Deletes of absent keys are ignored, so replaying a log twice gives the
/// same mapping as replaying it once.
pub fn replay(records: impl IntoIterator<Item = LogRecord>) -> HashMap<String, String> {
    let mut entries = HashMap::new();

    for record in records {
        match record.operation {
            Operation::Insert => {
                if let Some(value) = record.value {
                    entries.insert(record.key, value);
                }
            }
            Operation::Delete => {
                entries.remove(&record.key);
            }
        }
    }

    entries
}
