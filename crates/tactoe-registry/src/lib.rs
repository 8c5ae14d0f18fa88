//! Player identity and rating tracking for the tic-tac-toe game server.
//!
//! This crate owns the process-wide notion of a "player": a username and
//! an Elo-style rating, independent of any particular client connection.
//! A player can be looked up by more than one client session over the
//! life of the process (log out, log back in), so identity lives here,
//! not in the connection-scoped client layer above.
//!
//! # How it fits in the stack
//!
//! ```text
//! Game Layer (above)     ← looks up/creates players on login, posts results
//!     ↕
//! Registry Layer (this crate)  ← player identity, rating
//! ```

mod error;
mod player;
mod player_registry;

pub use error::RegistryError;
pub use player::{post_result, GameResult, Player, INITIAL_RATING};
pub use player_registry::PlayerRegistry;
