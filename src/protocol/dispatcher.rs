//! Command dispatcher
//!
//! Resolves a verb token and runs the command against the storage table.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{KvError, Result};
use crate::storage::Storage;

use super::{Command, Request, Verb};

/// Maps verb tokens to handlers over a shared storage table
///
/// The verb table is fixed when the dispatcher is built.
pub struct Dispatcher {
    storage: Arc<Storage>,
    verbs: HashMap<&'static str, Verb>,
}

impl Dispatcher {
    pub fn new(storage: Arc<Storage>) -> Self {
        let verbs = Verb::ALL.iter().map(|verb| (verb.name(), *verb)).collect();
        Self { storage, verbs }
    }

    /// Parse, resolve and execute one request line
    ///
    /// Returns the reply payload: the value for `get`, the ack token for
    /// `set`/`del`.
    pub fn dispatch(&self, line: &str) -> Result<String> {
        let request = Request::parse(line)?;
        let verb = self.resolve(request.verb)?;
        let command = Command::from_args(verb, &request.args)?;
        self.execute(command)
    }

    /// Look up a verb token
    pub fn resolve(&self, token: &str) -> Result<Verb> {
        self.verbs
            .get(token)
            .copied()
            .ok_or_else(|| KvError::UnknownCommand(token.to_string()))
    }

    /// Run a checked command
    pub fn execute(&self, command: Command<'_>) -> Result<String> {
        match command {
            Command::Get { key } => self.storage.get(key),
            Command::Set { key, value } => self.storage.set(key, value).map(|ack| ack.to_string()),
            Command::Del { key } => self.storage.del(key).map(|ack| ack.to_string()),
        }
    }

    pub fn storage(&self) -> &Arc<Storage> {
        &self.storage
    }
}
