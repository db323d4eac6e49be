//! Protocol Module
//!
//! Text line protocol between clients and the server.
//!
//! ### Requests
//! - `set <key> <value>` → `OK: OK`
//! - `get <key>`         → `OK: <value>` or `ERR: not found`
//! - `del <key>`         → `OK: OK` or `ERR: not found`
//! - `quit`              → connection closed, no reply
//!
//! Tokens are separated by single spaces; there is no quoting. Anything
//! else gets an `ERR: <message>` reply and the session continues.

mod codec;
mod command;
mod dispatcher;
mod response;

pub use codec::{read_line, read_reply, write_command, write_line, write_reply, MAX_LINE};
pub use command::{strip_terminator, Command, Request, Verb, QUIT};
pub use dispatcher::Dispatcher;
pub use response::{Reply, Status};
