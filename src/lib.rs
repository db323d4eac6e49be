//! # RedoKV
//!
//! An in-process key-value cache with:
//! - A text line protocol over TCP (`set`, `get`, `del`, `quit`)
//! - One exclusive lock serializing every read and write
//! - An append-only redo log written before each mutation
//! - Log replay on startup, discarding a damaged tail
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │               (one thread per connection)                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ line
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  Command Dispatcher                          │
//! │                (verb → handler table)                        │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                    Storage Table                             │
//! │                  (single Mutex)                              │
//! │      ┌─────────────┐          ┌─────────────┐               │
//! │      │  Redo Log   │ ──then──▶│   HashMap   │               │
//! │      │  (Append)   │          │  (entries)  │               │
//! │      └─────────────┘          └─────────────┘               │
//! └─────────────────────────────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod network;
pub mod protocol;
pub mod redo;
pub mod storage;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::Config;
pub use error::{KvError, Result};
pub use storage::{Ack, Storage};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of RedoKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
