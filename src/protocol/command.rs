//! Command definitions
//!
//! Turns a request line into a verb and a checked argument list.

use crate::error::{KvError, Result};

/// Line that ends a session without a reply
pub const QUIT: &str = "quit";

/// Registered verbs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Set,
    Get,
    Del,
}

impl Verb {
    pub const ALL: [Verb; 3] = [Verb::Set, Verb::Get, Verb::Del];

    /// Wire token
    pub fn name(self) -> &'static str {
        match self {
            Verb::Set => "set",
            Verb::Get => "get",
            Verb::Del => "del",
        }
    }

    /// Number of arguments after the verb
    pub fn arity(self) -> usize {
        match self {
            Verb::Set => 2,
            Verb::Get | Verb::Del => 1,
        }
    }
}

/// A request line split into tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request<'a> {
    pub verb: &'a str,
    pub args: Vec<&'a str>,
}

impl<'a> Request<'a> {
    /// Split a line on single spaces
    ///
    /// No quoting or escaping: repeated spaces produce empty tokens.
    pub fn parse(line: &'a str) -> Result<Self> {
        let line = strip_terminator(line);
        if line.is_empty() {
            return Err(KvError::EmptyCommand);
        }

        let mut tokens = line.split(' ');
        let verb = tokens.next().unwrap_or_default();
        Ok(Self {
            verb,
            args: tokens.collect(),
        })
    }
}

/// A command with its arguments checked against the verb
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    Set { key: &'a str, value: &'a str },
    Get { key: &'a str },
    Del { key: &'a str },
}

impl<'a> Command<'a> {
    /// Bind positional arguments to `verb`
    pub fn from_args(verb: Verb, args: &[&'a str]) -> Result<Self> {
        if args.len() != verb.arity() {
            return Err(KvError::WrongArity {
                verb: verb.name(),
                expected: verb.arity(),
                got: args.len(),
            });
        }
        if args.iter().any(|arg| arg.is_empty()) {
            return Err(KvError::EmptyArgument { verb: verb.name() });
        }

        Ok(match verb {
            Verb::Set => Command::Set {
                key: args[0],
                value: args[1],
            },
            Verb::Get => Command::Get { key: args[0] },
            Verb::Del => Command::Del { key: args[0] },
        })
    }

    pub fn verb(&self) -> Verb {
        match self {
            Command::Set { .. } => Verb::Set,
            Command::Get { .. } => Verb::Get,
            Command::Del { .. } => Verb::Del,
        }
    }

    /// Request line without terminator
    pub fn to_line(&self) -> String {
        match self {
            Command::Set { key, value } => format!("set {} {}", key, value),
            Command::Get { key } => format!("get {}", key),
            Command::Del { key } => format!("del {}", key),
        }
    }
}

/// Trim `\r` and `\n` from both ends of a line
pub fn strip_terminator(line: &str) -> &str {
    line.trim_matches(|c: char| c == '\r' || c == '\n')
}
