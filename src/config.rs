//! Configuration for RedoKV
//!
//! Startup parameters, read once and immutable afterwards.

use std::path::{Path, PathBuf};

use crate::error::{KvError, Result};

/// Default data root
pub const DEFAULT_ROOT: &str = "/tmp";

/// Default listen port
pub const DEFAULT_PORT: u16 = 2081;

/// Default listen host (all interfaces)
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Main configuration for a RedoKV instance
///
/// Built through [`Config::builder`]; fields are private so a constructed
/// config cannot be changed.
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for the redo log
    /// Internal structure:
    ///   {root}/
    ///     └── redo.log
    root: PathBuf,

    /// Sync strategy: how often to fsync the redo log
    sync_policy: SyncPolicy,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// Listen host
    host: String,

    /// Listen port (0 picks an ephemeral port)
    port: u16,

    /// Upstream primary address. Stored, never acted upon.
    master: Option<String>,

    /// Connection read timeout (milliseconds, 0 = none)
    read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = none)
    write_timeout_ms: u64,
}

/// Redo log sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPolicy {
    /// fsync before every append returns
    EveryWrite,

    /// fsync after N buffered records
    EveryNEntries { count: usize },
}

impl SyncPolicy {
    /// Map a "sync every N writes" count onto a policy
    pub fn every(count: usize) -> Self {
        if count <= 1 {
            SyncPolicy::EveryWrite
        } else {
            SyncPolicy::EveryNEntries { count }
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
            sync_policy: SyncPolicy::EveryWrite,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            master: None,
            read_timeout_ms: 0,
            write_timeout_ms: 0,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn sync_policy(&self) -> SyncPolicy {
        self.sync_policy
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn master(&self) -> Option<&str> {
        self.master.as_deref()
    }

    pub fn read_timeout_ms(&self) -> u64 {
        self.read_timeout_ms
    }

    pub fn write_timeout_ms(&self) -> u64 {
        self.write_timeout_ms
    }

    /// `host:port` string handed to the listener
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data root directory
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.root = path.into();
        self
    }

    /// Set the redo log sync strategy
    pub fn sync_policy(mut self, policy: SyncPolicy) -> Self {
        self.config.sync_policy = policy;
        self
    }

    /// Set the listen host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the listen port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the master address; an empty string means none
    pub fn master(mut self, addr: impl Into<String>) -> Self {
        let addr = addr.into();
        self.config.master = if addr.trim().is_empty() { None } else { Some(addr) };
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Result<Config> {
        let config = self.config;

        if config.root.as_os_str().is_empty() {
            return Err(KvError::Config("root directory must not be empty".to_string()));
        }
        if config.host.is_empty() {
            return Err(KvError::Config("listen host must not be empty".to_string()));
        }
        if let SyncPolicy::EveryNEntries { count: 0 } = config.sync_policy {
            return Err(KvError::Config("sync batch size must be at least 1".to_string()));
        }

        Ok(config)
    }
}
