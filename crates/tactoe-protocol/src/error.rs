//! Error types for the protocol layer.
//!
//! Each crate defines its own error enum. This keeps errors specific and
//! meaningful — when you see a `ProtocolError`, you know the problem is
//! in framing, not in networking or game rules.

/// Errors that can occur while reading or writing a frame.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The header named a `type` byte that matches no known `MessageType`.
    #[error("unknown message type byte: {0}")]
    UnknownMessageType(u8),

    /// The header named a `role` byte that matches no known `Role`.
    #[error("unknown role byte: {0}")]
    UnknownRole(u8),

    /// Stream ended before a full header or payload was read.
    #[error("connection closed mid-frame")]
    UnexpectedEof,

    /// Underlying I/O failure on the byte stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
