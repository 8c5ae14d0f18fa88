//! # tactoe
//!
//! A tic-tac-toe game server: accepts TCP connections speaking the
//! `tactoe-protocol` wire format, lets clients register a username, invite
//! each other to a game with a chosen role, and play it out move by move,
//! with Elo-style ratings updated when a game ends.
//!
//! ```text
//! tactoe (this crate: CLI, signals, accept loop, service loop)
//!   -> tactoe-game (session/game/invitation state)
//!        -> tactoe-registry (player identity, ratings)
//!        -> tactoe-transport (sockets)
//!             -> tactoe-protocol (wire format)
//! ```

mod error;
mod server;
mod service;
mod signals;

pub use error::ServerError;
pub use server::{Server, DEFAULT_CLIENT_CAPACITY};
pub use signals::install as install_signal_handlers;
