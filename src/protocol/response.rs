//! Reply definitions
//!
//! One reply line per request: `OK: <payload>` or `ERR: <message>`.

use std::fmt;

use crate::error::{KvError, Result};

/// Reply status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Err,
}

impl Status {
    fn prefix(self) -> &'static str {
        match self {
            Status::Ok => "OK: ",
            Status::Err => "ERR: ",
        }
    }
}

/// A reply to send to the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: Status,

    /// Value for `get`, ack token for mutations, message for errors
    pub payload: String,
}

impl Reply {
    pub fn ok(payload: impl Into<String>) -> Self {
        Self {
            status: Status::Ok,
            payload: payload.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Err,
            payload: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    /// Wire form including the `\r\n` terminator
    pub fn encode(&self) -> String {
        format!("{}\r\n", self)
    }

    /// Parse a reply line (terminator optional)
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim_end_matches(|c: char| c == '\r' || c == '\n');

        if let Some(payload) = line.strip_prefix(Status::Ok.prefix()) {
            Ok(Reply::ok(payload))
        } else if let Some(message) = line.strip_prefix(Status::Err.prefix()) {
            Ok(Reply::error(message))
        } else {
            Err(KvError::Protocol(format!("malformed reply: {:?}", line)))
        }
    }
}

impl From<Result<String>> for Reply {
    fn from(result: Result<String>) -> Self {
        match result {
            Ok(payload) => Reply::ok(payload),
            Err(e) => Reply::error(e.to_string()),
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.status.prefix(), self.payload)
    }
}
