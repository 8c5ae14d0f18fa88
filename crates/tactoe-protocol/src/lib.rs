//! Wire protocol for the tic-tac-toe game server.
//!
//! This crate defines the "language" that clients and the server speak:
//!
//! - **Types** ([`Header`], [`Frame`], [`MessageType`], [`Role`]) — the
//!   fixed 16-byte header and the optional payload that follows it.
//! - **Codec** ([`read_frame`], [`write_frame`]) — how those frames are
//!   read from and written to any `Read`/`Write` byte stream.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while framing.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and the client
//! session (game semantics). It doesn't know about sockets or registries —
//! it only knows how to serialize and deserialize frames.
//!
//! ```text
//! Transport (bytes) → Protocol (Frame) → Client session (game rules)
//! ```

mod codec;
mod error;
mod types;

pub use codec::{read_frame, write_frame};
pub use error::ProtocolError;
pub use types::{Frame, Header, MessageType, Role, HEADER_LEN, MAX_PAYLOAD_LEN};
