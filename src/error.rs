//! Error types for RedoKV
//!
//! Provides a unified error type for all operations. The `Display` text of
//! the per-request variants is what clients see after `ERR: `.

use thiserror::Error;

/// Result type alias using KvError
pub type Result<T> = std::result::Result<T, KvError>;

/// Unified error type for RedoKV operations
#[derive(Debug, Error)]
pub enum KvError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Redo Log Errors
    // -------------------------------------------------------------------------
    #[error("redo log corruption at offset {offset}: {reason}")]
    RedoCorruption { offset: u64, reason: String },

    #[error("redo log must be restored before appending")]
    RedoNotRestored,

    #[error("invalid log record: {0}")]
    InvalidRecord(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("not found")]
    NotFound,

    #[error("storage is read-only after redo log failure: {0}")]
    ReadOnly(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("empty command")]
    EmptyCommand,

    #[error("not supported: {0}")]
    UnknownCommand(String),

    #[error("wrong number of arguments for '{verb}': expected {expected}, got {got}")]
    WrongArity {
        verb: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("empty argument for '{verb}'")]
    EmptyArgument { verb: &'static str },

    #[error("protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("accept failed: {0}")]
    Accept(#[source] std::io::Error),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<bincode::Error> for KvError {
    fn from(err: bincode::Error) -> Self {
        KvError::Serialization(err.to_string())
    }
}
