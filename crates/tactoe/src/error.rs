//! Top-level error type for the process entry point and accept loop.
//!
//! Per-connection failures never surface here — those are handled inside
//! the service loop (NACK, or tear the connection down) and logged there.
//! This type only covers what can keep the server from starting or
//! running at all.

/// Errors that can abort startup or the accept loop itself.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Transport(#[from] tactoe_transport::TransportError),

    #[error("failed to install signal handlers: {0}")]
    Signal(#[source] std::io::Error),
}
