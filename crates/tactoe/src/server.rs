//! `Server` and its accept loop.
//!
//! This is the entry point for running the tic-tac-toe game server: it
//! ties together the registries (players, clients) with the listening
//! socket, and spawns one service thread per accepted connection.

use std::sync::Arc;
use std::thread;

use tactoe_game::{ClientRegistry, ClientSession};
use tactoe_registry::PlayerRegistry;
use tactoe_transport::TcpServer;

use crate::service;
use crate::ServerError;

/// Default capacity of the client registry — the maximum number of
/// simultaneously connected sockets.
pub const DEFAULT_CLIENT_CAPACITY: usize = 256;

/// A bound, not-yet-running tic-tac-toe server.
pub struct Server {
    listener: TcpServer,
    players: Arc<PlayerRegistry>,
    clients: Arc<ClientRegistry>,
}

impl Server {
    /// Binds a listening socket at `addr` (e.g. `"0.0.0.0:8080"`), with a
    /// fresh, empty player registry and a client registry of `capacity`.
    pub fn bind(addr: &str, capacity: usize) -> Result<Self, ServerError> {
        let listener = TcpServer::bind(addr)?;
        Ok(Server {
            listener,
            players: Arc::new(PlayerRegistry::new()),
            clients: Arc::new(ClientRegistry::new(capacity)),
        })
    }

    /// The address this server is actually bound to.
    pub fn local_addr(&self) -> Result<std::net::SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// The client registry, shared with the caller so it can be handed to
    /// a signal handler for a clean shutdown.
    pub fn clients(&self) -> Arc<ClientRegistry> {
        self.clients.clone()
    }

    /// Runs the accept loop. Blocks forever — there is no protocol-level
    /// way to stop accepting short of the process exiting, which is what
    /// a `SIGHUP`-triggered shutdown does directly (see `signals`).
    pub fn run(self) -> Result<(), ServerError> {
        tracing::info!("tic-tac-toe server running");
        loop {
            match self.listener.accept() {
                Ok((conn, addr)) => {
                    let client = Arc::new(ClientSession::new(Arc::new(conn)));
                    if let Err(e) = self.clients.register(client.clone()) {
                        tracing::warn!(error = %e, %addr, "rejected connection");
                        continue;
                    }
                    let players = self.players.clone();
                    let clients = self.clients.clone();
                    thread::spawn(move || service::run(client, players, clients));
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
