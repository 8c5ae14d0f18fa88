//! Blocking TCP transport: one OS thread services one connection.
//!
//! Unlike an async transport, accepting and servicing connections here
//! blocks the calling thread. `TcpServer::accept` blocks until a peer
//! connects; `TcpConnection::recv_frame` blocks until a full frame (or
//! EOF) arrives. This matches the server's one-thread-per-client model:
//! there is no pool and no scheduler, just `std::net` and `std::thread`.

use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tactoe_protocol::{read_frame, write_frame, Frame};

use crate::{ConnectionId, TransportError};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Listens for incoming connections on a bound TCP port.
pub struct TcpServer {
    listener: TcpListener,
}

impl TcpServer {
    /// Binds a listening socket to `addr` (e.g. `"0.0.0.0:8080"`).
    pub fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr).map_err(TransportError::BindFailed)?;
        tracing::info!(addr, "listening for connections");
        Ok(Self { listener })
    }

    /// The address this server is actually bound to (useful in tests that
    /// bind to port 0 and need the OS-assigned port).
    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        self.listener.local_addr().map_err(TransportError::BindFailed)
    }

    /// Blocks until a client connects, then returns the accepted
    /// connection and its address.
    pub fn accept(&self) -> Result<(TcpConnection, SocketAddr), TransportError> {
        let (stream, addr) = self.listener.accept().map_err(TransportError::AcceptFailed)?;
        let id = ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(%id, %addr, "accepted connection");
        Ok((TcpConnection::new(id, stream)?, addr))
    }
}

/// A single TCP connection, framed with the tic-tac-toe wire protocol.
///
/// Reads and writes use independent handles (`TcpStream::try_clone`) so
/// that a half-close from another thread (`shutdown`) can interrupt a
/// thread blocked in `recv_frame` without racing on the same handle.
pub struct TcpConnection {
    id: ConnectionId,
    read_stream: Mutex<TcpStream>,
    write_stream: Mutex<TcpStream>,
}

impl TcpConnection {
    fn new(id: ConnectionId, stream: TcpStream) -> Result<Self, TransportError> {
        let write_stream = stream.try_clone().map_err(TransportError::AcceptFailed)?;
        Ok(Self {
            id,
            read_stream: Mutex::new(stream),
            write_stream: Mutex::new(write_stream),
        })
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Blocks until a complete frame arrives, or returns an error on a
    /// malformed frame or disconnection.
    pub fn recv_frame(&self) -> Result<Frame, TransportError> {
        let mut stream = self.read_stream.lock().expect("read stream mutex poisoned");
        Ok(read_frame(&mut *stream)?)
    }

    /// Writes a complete frame. Serialized against other senders on this
    /// connection so that two frames are never interleaved on the wire —
    /// this is the connection's `send_lock`.
    pub fn send_frame(&self, frame: &Frame) -> Result<(), TransportError> {
        let mut stream = self.write_stream.lock().expect("write stream mutex poisoned");
        Ok(write_frame(&mut *stream, frame)?)
    }

    /// Half-closes both directions of the socket. A thread blocked in
    /// `recv_frame` observes this as EOF on its next read.
    pub fn shutdown(&self) -> Result<(), TransportError> {
        let stream = self.read_stream.lock().expect("read stream mutex poisoned");
        stream
            .shutdown(Shutdown::Both)
            .map_err(TransportError::ShutdownFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use tactoe_protocol::{MessageType, Role};

    #[test]
    fn test_accept_and_round_trip_frame() {
        let server = TcpServer::bind("127.0.0.1:0").unwrap();
        let addr = server.local_addr().unwrap();

        let client_thread = thread::spawn(move || {
            let stream = TcpStream::connect(addr).unwrap();
            let conn = TcpConnection::new(ConnectionId::new(99), stream).unwrap();
            conn.send_frame(&Frame::new(MessageType::Login, 0, Role::None, Some(b"alice".to_vec())))
                .unwrap();
        });

        let (conn, _addr) = server.accept().unwrap();
        let frame = conn.recv_frame().unwrap();
        assert_eq!(frame.header.msg_type, MessageType::Login);
        assert_eq!(frame.payload_str(), Some("alice"));

        client_thread.join().unwrap();
    }

    #[test]
    fn test_shutdown_unblocks_pending_recv() {
        let server = TcpServer::bind("127.0.0.1:0").unwrap();
        let addr = server.local_addr().unwrap();

        let client_thread = thread::spawn(move || {
            let _stream = TcpStream::connect(addr).unwrap();
            // Hold the connection open without sending anything.
            thread::sleep(std::time::Duration::from_millis(50));
        });

        let (conn, _addr) = server.accept().unwrap();
        let conn = std::sync::Arc::new(conn);
        let reader = conn.clone();
        let handle = thread::spawn(move || reader.recv_frame());

        thread::sleep(std::time::Duration::from_millis(10));
        conn.shutdown().unwrap();

        let result = handle.join().unwrap();
        assert!(result.is_err());
        client_thread.join().unwrap();
    }
}
