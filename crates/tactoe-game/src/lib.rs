//! Game, invitation, and client session state for the tic-tac-toe game
//! server.
//!
//! This crate sits above `tactoe-protocol` (wire format) and
//! `tactoe-transport` (sockets), and below the top-level service loop:
//!
//! ```text
//! tactoe (service loop, CLI)
//!   -> tactoe-game (this crate: Game, Invitation, ClientSession, ClientRegistry)
//!        -> tactoe-registry (Player, ratings)
//!        -> tactoe-transport (TcpConnection)
//!             -> tactoe-protocol (Frame, wire codec)
//! ```
//!
//! `ClientSession` and `Invitation` hold `Arc` references to each other
//! (a client's invitation slot table references its invitations; every
//! invitation holds its source and target clients) — a deliberate
//! reference cycle. It's broken explicitly: `Invitation::close` always
//! runs before an invitation is dropped from both endpoints' tables, so
//! nothing relies on `Drop` to collect it.

mod client;
mod client_registry;
mod error;
mod game;
mod invitation;

pub use client::ClientSession;
pub use client_registry::ClientRegistry;
pub use error::{ClientError, GameError, InvitationError, RegistryError};
pub use game::{Game, GameMove};
pub use invitation::{Invitation, InvitationState};
