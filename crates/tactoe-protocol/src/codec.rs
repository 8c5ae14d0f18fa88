//! Frame codec: read and write frames on any `Read`/`Write` byte stream.
//!
//! `write_frame` writes the header and payload fully or fails; `read_frame`
//! reads a full header, then (if `size > 0`) reads exactly `size` payload
//! bytes. Both rely on `Read::read_exact`/`Write::write_all`, which already
//! retry through partial reads/writes — an end-of-file before a frame is
//! complete surfaces as [`ProtocolError::UnexpectedEof`].

use std::io::{self, ErrorKind, Read, Write};

use crate::types::{Header, MessageType, Role, HEADER_LEN};
use crate::{Frame, ProtocolError};

/// Writes a frame's header followed by its payload, if any.
pub fn write_frame<W: Write>(w: &mut W, frame: &Frame) -> Result<(), ProtocolError> {
    w.write_all(&frame.header.to_bytes())?;
    if let Some(payload) = &frame.payload {
        w.write_all(payload)?;
    }
    w.flush()?;
    Ok(())
}

/// Reads one complete frame: a 16-byte header, then `header.size` payload
/// bytes if `size > 0`.
pub fn read_frame<R: Read>(r: &mut R) -> Result<Frame, ProtocolError> {
    let mut header_buf = [0u8; HEADER_LEN];
    read_exact_or_eof(r, &mut header_buf)?;

    let msg_type = MessageType::from_u8(header_buf[0])
        .ok_or(ProtocolError::UnknownMessageType(header_buf[0]))?;
    let id = header_buf[1];
    let role = Role::from_u8(header_buf[2]).ok_or(ProtocolError::UnknownRole(header_buf[2]))?;
    let size = u16::from_be_bytes([header_buf[3], header_buf[4]]);
    let timestamp_sec =
        u32::from_be_bytes([header_buf[5], header_buf[6], header_buf[7], header_buf[8]]);
    let timestamp_nsec = u32::from_be_bytes([
        header_buf[9],
        header_buf[10],
        header_buf[11],
        header_buf[12],
    ]);

    let header = Header {
        msg_type,
        id,
        role,
        size,
        timestamp_sec,
        timestamp_nsec,
    };

    let payload = if size > 0 {
        let mut buf = vec![0u8; size as usize];
        read_exact_or_eof(r, &mut buf)?;
        Some(buf)
    } else {
        None
    };

    Ok(Frame { header, payload })
}

/// `Read::read_exact` that reports a clean EOF (nothing read at all) the
/// same as a truncated one (some bytes read, then EOF): both are a
/// protocol-level error, since the caller asked for a specific byte count.
fn read_exact_or_eof<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<(), ProtocolError> {
    match r.read_exact(buf) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(ProtocolError::UnexpectedEof),
        Err(e) => Err(ProtocolError::Io(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_write_then_read_frame_round_trips() {
        let frame = Frame::new(MessageType::Invite, 3, Role::X, Some(b"bob".to_vec()));
        let mut buf = Vec::new();
        write_frame(&mut buf, &frame).unwrap();

        let mut cursor = Cursor::new(buf);
        let decoded = read_frame(&mut cursor).unwrap();

        assert_eq!(decoded.header.msg_type, MessageType::Invite);
        assert_eq!(decoded.header.id, 3);
        assert_eq!(decoded.header.role, Role::X);
        assert_eq!(decoded.payload.as_deref(), Some(&b"bob"[..]));
    }

    #[test]
    fn test_read_frame_no_payload() {
        let frame = Frame::ack(9);
        let mut buf = Vec::new();
        write_frame(&mut buf, &frame).unwrap();

        let mut cursor = Cursor::new(buf);
        let decoded = read_frame(&mut cursor).unwrap();
        assert!(decoded.payload.is_none());
        assert_eq!(decoded.header.size, 0);
    }

    #[test]
    fn test_read_frame_on_empty_stream_is_eof() {
        let mut cursor = Cursor::new(Vec::<u8>::new());
        let err = read_frame(&mut cursor).unwrap_err();
        assert!(matches!(err, ProtocolError::UnexpectedEof));
    }

    #[test]
    fn test_read_frame_truncated_mid_payload_is_eof() {
        let frame = Frame::new(MessageType::Move, 1, Role::X, Some(b"12345".to_vec()));
        let mut buf = Vec::new();
        write_frame(&mut buf, &frame).unwrap();
        buf.truncate(buf.len() - 2); // chop off the last two payload bytes

        let mut cursor = Cursor::new(buf);
        let err = read_frame(&mut cursor).unwrap_err();
        assert!(matches!(err, ProtocolError::UnexpectedEof));
    }

    #[test]
    fn test_read_frame_unknown_message_type_byte() {
        let mut header = [0u8; HEADER_LEN];
        header[0] = 200; // no such MessageType
        let mut cursor = Cursor::new(header.to_vec());
        let err = read_frame(&mut cursor).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownMessageType(200)));
    }

    #[test]
    fn test_write_frame_propagates_io_error() {
        struct FailingWriter;
        impl Write for FailingWriter {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(ErrorKind::BrokenPipe, "pipe broke"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }
        let frame = Frame::ack(0);
        let err = write_frame(&mut FailingWriter, &frame).unwrap_err();
        assert!(matches!(err, ProtocolError::Io(_)));
    }
}
