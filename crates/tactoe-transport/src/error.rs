use tactoe_protocol::ProtocolError;

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Framing failed while reading or writing on an otherwise healthy
    /// socket (malformed header, unknown message type, truncated frame).
    #[error("frame error: {0}")]
    Frame(#[from] ProtocolError),

    /// Binding the listening socket failed.
    #[error("bind failed: {0}")]
    BindFailed(#[source] std::io::Error),

    /// Accepting an incoming connection failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// Half-closing (shutdown) a connection failed.
    #[error("shutdown failed: {0}")]
    ShutdownFailed(#[source] std::io::Error),
}
