//! TCP Client
//!
//! Blocking client for the line protocol, used by the CLI and tests.

use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};

use crate::error::Result;
use crate::protocol::{read_reply, write_command, write_line, Command, Reply, QUIT};

pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl Client {
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;

        Ok(Self {
            reader: BufReader::new(stream.try_clone()?),
            writer: BufWriter::new(stream),
        })
    }

    /// Send a command and wait for its reply
    pub fn send(&mut self, command: &Command<'_>) -> Result<Reply> {
        write_command(&mut self.writer, command)?;
        read_reply(&mut self.reader)
    }

    /// Send a raw line and wait for its reply
    pub fn send_line(&mut self, line: &str) -> Result<Reply> {
        write_line(&mut self.writer, line)?;
        read_reply(&mut self.reader)
    }

    pub fn get(&mut self, key: &str) -> Result<Reply> {
        self.send(&Command::Get { key })
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<Reply> {
        self.send(&Command::Set { key, value })
    }

    pub fn del(&mut self, key: &str) -> Result<Reply> {
        self.send(&Command::Del { key })
    }

    /// End the session
    pub fn quit(mut self) -> Result<()> {
        write_line(&mut self.writer, QUIT)
    }
}
