//! TCP Server
//!
//! Accepts connections and gives each one its own thread.

use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

use crate::config::Config;
use crate::error::{KvError, Result};
use crate::protocol::Dispatcher;
use crate::storage::Storage;

use super::Connection;

/// TCP server for RedoKV
///
/// One thread per accepted connection, no limit and no pooling. A failed
/// bind or accept ends the server; a failed connection ends only itself.
pub struct Server {
    config: Config,
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
}

impl Server {
    /// Bind the listening socket
    ///
    /// `storage` must already be open, which means its redo log has been
    /// replayed before the first client can connect.
    pub fn bind(config: Config, storage: Arc<Storage>) -> Result<Self> {
        let addr = config.listen_addr();
        let listener = TcpListener::bind(&addr).map_err(|source| KvError::Bind {
            addr: addr.clone(),
            source,
        })?;

        tracing::info!("Listening on {}", listener.local_addr()?);
        if let Some(master) = config.master() {
            tracing::info!("Master {} configured; replication is not supported, ignoring", master);
        }

        Ok(Self {
            config,
            listener,
            dispatcher: Arc::new(Dispatcher::new(storage)),
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until accept fails (blocking)
    pub fn run(self) -> Result<()> {
        loop {
            let (stream, peer) = self.listener.accept().map_err(KvError::Accept)?;
            tracing::info!("New client {}", peer);
            self.spawn_connection(stream, peer);
        }
    }

    fn spawn_connection(&self, stream: TcpStream, peer: SocketAddr) {
        let dispatcher = Arc::clone(&self.dispatcher);
        let read_ms = self.config.read_timeout_ms();
        let write_ms = self.config.write_timeout_ms();

        let spawned = thread::Builder::new()
            .name(format!("conn-{}", peer))
            .spawn(move || {
                let mut connection = match Connection::new(stream, dispatcher) {
                    Ok(connection) => connection,
                    Err(e) => {
                        tracing::warn!("Failed to set up connection from {}: {}", peer, e);
                        return;
                    }
                };

                if let Err(e) = connection.set_timeouts(read_ms, write_ms) {
                    tracing::warn!("Failed to set timeouts for {}: {}", peer, e);
                    return;
                }

                if let Err(e) = connection.handle() {
                    tracing::warn!("Connection {} closed with error: {}", peer, e);
                }
            });

        if let Err(e) = spawned {
            tracing::warn!("Failed to spawn thread for {}, dropping connection: {}", peer, e);
        }
    }
}
