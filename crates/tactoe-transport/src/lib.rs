//! Blocking TCP transport layer for the tic-tac-toe game server.
//!
//! Provides [`TcpServer`] (the listening socket) and [`TcpConnection`]
//! (one accepted, framed connection). There is exactly one transport mode
//! — raw TCP carrying the fixed-header protocol from `tactoe-protocol` —
//! so, unlike a pluggable multi-backend transport, there is no trait to
//! implement against.

mod error;
mod tcp;

pub use error::TransportError;
pub use tcp::{TcpConnection, TcpServer};

use std::fmt;

/// Opaque identifier for a connection, assigned in accept order.
///
/// Doubles as the client registry's key (the registry is "keyed by
/// connection").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}
