//! Core protocol types for the tic-tac-toe wire format.
//!
//! Every frame on the wire is a fixed 16-byte header, optionally followed
//! by a payload of `header.size` bytes. This module defines the header
//! layout and the enums that give its fields meaning.
//!
//! Think of this as the "language" that the client and server speak.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Size in bytes of the fixed frame header.
pub const HEADER_LEN: usize = 16;

/// Largest payload a frame can carry — the wire `size` field is a `u16`
/// byte count.
pub const MAX_PAYLOAD_LEN: usize = u16::MAX as usize;

// ---------------------------------------------------------------------------
// MessageType
// ---------------------------------------------------------------------------

/// Every kind of frame that can appear on the wire, in wire-discriminant
/// order. Client-to-server requests come first, then server replies, then
/// asynchronous server pushes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    Login = 0,
    Users = 1,
    Invite = 2,
    Revoke = 3,
    Accept = 4,
    Decline = 5,
    Move = 6,
    Resign = 7,
    Ack = 8,
    Nack = 9,
    Invited = 10,
    Revoked = 11,
    Accepted = 12,
    Declined = 13,
    Moved = 14,
    Ended = 15,
}

impl MessageType {
    /// Decodes a wire byte into a `MessageType`, or `None` if it names no
    /// known variant.
    pub fn from_u8(byte: u8) -> Option<Self> {
        use MessageType::*;
        let variant = match byte {
            0 => Login,
            1 => Users,
            2 => Invite,
            3 => Revoke,
            4 => Accept,
            5 => Decline,
            6 => Move,
            7 => Resign,
            8 => Ack,
            9 => Nack,
            10 => Invited,
            11 => Revoked,
            12 => Accepted,
            13 => Declined,
            14 => Moved,
            15 => Ended,
            _ => return None,
        };
        Some(variant)
    }

    /// Whether this message type is sent by a client to the server.
    pub fn is_request(self) -> bool {
        use MessageType::*;
        matches!(
            self,
            Login | Users | Invite | Revoke | Accept | Decline | Move | Resign
        )
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// A game role, also used to carry a win/draw result in `ENDED` frames.
///
/// `None` means "no role" — the target role field is unused, or a game
/// ended in a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Role {
    None = 0,
    X = 1,
    O = 2,
}

impl Role {
    /// The role that does not belong to `self`. `None` is its own opposite
    /// — there is nothing to flip.
    pub fn opposite(self) -> Role {
        match self {
            Role::X => Role::O,
            Role::O => Role::X,
            Role::None => Role::None,
        }
    }

    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Role::None),
            1 => Some(Role::X),
            2 => Some(Role::O),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::None => write!(f, "none"),
            Role::X => write!(f, "X"),
            Role::O => write!(f, "O"),
        }
    }
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// The fixed 16-byte frame header. Multi-byte fields are network byte
/// order (big-endian) on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub msg_type: MessageType,
    /// Invitation id, endpoint-local. Meaning depends on `msg_type`.
    pub id: u8,
    /// Meaning depends on `msg_type` — a desired/assigned game role, or a
    /// win/draw result.
    pub role: Role,
    /// Payload byte count that follows this header.
    pub size: u16,
    pub timestamp_sec: u32,
    pub timestamp_nsec: u32,
}

impl Header {
    /// Builds a header with a freshly sampled wall-clock timestamp.
    /// `size` is filled in separately once the payload (if any) is known.
    pub fn new(msg_type: MessageType, id: u8, role: Role, size: u16) -> Self {
        let (timestamp_sec, timestamp_nsec) = sample_timestamp();
        Header {
            msg_type,
            id,
            role,
            size,
            timestamp_sec,
            timestamp_nsec,
        }
    }

    pub fn to_bytes(self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[0] = self.msg_type as u8;
        buf[1] = self.id;
        buf[2] = self.role.as_u8();
        buf[3..5].copy_from_slice(&self.size.to_be_bytes());
        buf[5..9].copy_from_slice(&self.timestamp_sec.to_be_bytes());
        buf[9..13].copy_from_slice(&self.timestamp_nsec.to_be_bytes());
        // Bytes 13..16 are reserved/padding, always zero.
        buf
    }
}

/// Samples the wall clock, split into whole seconds and the nanosecond
/// remainder, the way every outbound frame's timestamp is produced.
/// Falls back to zero if the clock is somehow before the Unix epoch.
fn sample_timestamp() -> (u32, u32) {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(d) => (d.as_secs() as u32, d.subsec_nanos()),
        Err(_) => (0, 0),
    }
}

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// A complete frame: header plus its optional payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub header: Header,
    pub payload: Option<Vec<u8>>,
}

impl Frame {
    /// Builds a frame, filling in the header's `size` from the payload.
    ///
    /// # Panics
    /// Panics if `payload` is longer than [`MAX_PAYLOAD_LEN`]; callers
    /// build payloads from bounded, server-controlled data (usernames,
    /// board renderings) so this should never trigger in practice.
    pub fn new(msg_type: MessageType, id: u8, role: Role, payload: Option<Vec<u8>>) -> Self {
        let size = payload.as_ref().map_or(0, |p| p.len());
        assert!(size <= MAX_PAYLOAD_LEN, "payload exceeds wire size field");
        Frame {
            header: Header::new(msg_type, id, role, size as u16),
            payload,
        }
    }

    /// An ACK with no payload, role `None`.
    pub fn ack(id: u8) -> Self {
        Frame::new(MessageType::Ack, id, Role::None, None)
    }

    /// An ACK carrying a payload (e.g. the initiator's new slot id lives
    /// in `id`, the payload carries an initial board for an X-initiated
    /// accept).
    pub fn ack_with(id: u8, role: Role, payload: Vec<u8>) -> Self {
        Frame::new(MessageType::Ack, id, role, Some(payload))
    }

    /// A NACK — always empty.
    pub fn nack() -> Self {
        Frame::new(MessageType::Nack, 0, Role::None, None)
    }

    pub fn payload_str(&self) -> Option<&str> {
        self.payload
            .as_deref()
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type_from_u8_round_trips_every_variant() {
        for byte in 0u8..=15 {
            let mt = MessageType::from_u8(byte).expect("every byte 0..=15 is a valid variant");
            assert_eq!(mt as u8, byte);
        }
    }

    #[test]
    fn test_message_type_from_u8_rejects_unknown() {
        assert!(MessageType::from_u8(16).is_none());
        assert!(MessageType::from_u8(255).is_none());
    }

    #[test]
    fn test_role_opposite() {
        assert_eq!(Role::X.opposite(), Role::O);
        assert_eq!(Role::O.opposite(), Role::X);
        assert_eq!(Role::None.opposite(), Role::None);
    }

    #[test]
    fn test_header_to_bytes_layout() {
        let header = Header {
            msg_type: MessageType::Invite,
            id: 7,
            role: Role::X,
            size: 300,
            timestamp_sec: 0x01020304,
            timestamp_nsec: 0x05060708,
        };
        let buf = header.to_bytes();
        assert_eq!(buf[0], MessageType::Invite as u8);
        assert_eq!(buf[1], 7);
        assert_eq!(buf[2], Role::X as u8);
        assert_eq!(&buf[3..5], &300u16.to_be_bytes());
        assert_eq!(&buf[5..9], &0x01020304u32.to_be_bytes());
        assert_eq!(&buf[9..13], &0x05060708u32.to_be_bytes());
    }

    #[test]
    fn test_frame_new_computes_size_from_payload() {
        let frame = Frame::new(MessageType::Moved, 3, Role::None, Some(b"hello".to_vec()));
        assert_eq!(frame.header.size, 5);
    }

    #[test]
    fn test_frame_ack_has_no_payload() {
        let frame = Frame::ack(9);
        assert_eq!(frame.header.msg_type, MessageType::Ack);
        assert!(frame.payload.is_none());
    }
}
