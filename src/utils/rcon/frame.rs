use crate::error::ProtocolError;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::Cursor;

/// Size of request id + packet type + the two trailing null bytes.
pub const FRAME_OVERHEAD: usize = 4 + 4 + 1 + 1;
/// Servers split long output every 4096 characters. A fragment holding fewer
/// characters than that ends the response.
pub const MAX_PAYLOAD_CLIENTBOUND: usize = 4096;
/// Upper bound on an incoming length prefix: a full fragment of 4-byte UTF-8 characters.
pub const MAX_FRAME_LEN: usize = MAX_PAYLOAD_CLIENTBOUND * 4 + FRAME_OVERHEAD;
/// Longest command payload a server accepts.
pub const MAX_PAYLOAD_SERVERBOUND: usize = 1446;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// SERVERDATA_AUTH
    Auth,
    /// SERVERDATA_EXECCOMMAND, also used by servers for SERVERDATA_AUTH_RESPONSE
    ExecCommand,
    /// SERVERDATA_RESPONSE_VALUE
    ResponseValue,
    Other(i32),
}

impl From<FrameKind> for i32 {
    fn from(kind: FrameKind) -> Self {
        match kind {
            FrameKind::ResponseValue => 0,
            FrameKind::ExecCommand => 2,
            FrameKind::Auth => 3,
            FrameKind::Other(v) => v,
        }
    }
}

impl From<i32> for FrameKind {
    fn from(value: i32) -> Self {
        match value {
            0 => FrameKind::ResponseValue,
            2 => FrameKind::ExecCommand,
            3 => FrameKind::Auth,
            v => FrameKind::Other(v),
        }
    }
}

/// One length-prefixed RCON packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RconFrame {
    pub request_id: i32,
    pub kind: FrameKind,
    pub payload: Vec<u8>,
}

impl RconFrame {
    pub fn new(request_id: i32, kind: FrameKind, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            request_id,
            kind,
            payload: payload.into(),
        }
    }

    /// Value of the length prefix for this frame.
    pub fn declared_len(&self) -> usize {
        self.payload.len() + FRAME_OVERHEAD
    }

    /// Whether this fragment is the last one of a response.
    pub fn ends_response(&self) -> bool {
        String::from_utf8_lossy(&self.payload).chars().count() < MAX_PAYLOAD_CLIENTBOUND
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(4 + self.declared_len());
        // Writing into a Vec cannot fail.
        let _ = buffer.write_i32::<LittleEndian>(self.declared_len() as i32);
        let _ = buffer.write_i32::<LittleEndian>(self.request_id);
        let _ = buffer.write_i32::<LittleEndian>(self.kind.into());
        buffer.extend_from_slice(&self.payload);
        buffer.push(0x00); // payload terminator
        buffer.push(0x00); // empty trailing string
        buffer
    }

    /// Decode one complete frame, length prefix included.
    pub fn decode(buf: &[u8]) -> Result<Self, ProtocolError> {
        if buf.len() < 4 {
            return Err(ProtocolError::LengthMismatch {
                declared: 4,
                available: buf.len(),
            });
        }
        let mut cursor = Cursor::new(buf);
        let declared = cursor.read_i32::<LittleEndian>()?;
        let declared = check_declared_len(declared)?;
        let available = buf.len() - 4;
        if declared != available {
            return Err(ProtocolError::LengthMismatch {
                declared,
                available,
            });
        }
        Self::decode_body(&buf[4..])
    }

    /// Decode everything after the length prefix. The caller has already
    /// read exactly the declared number of bytes.
    pub fn decode_body(body: &[u8]) -> Result<Self, ProtocolError> {
        if body.len() < FRAME_OVERHEAD {
            return Err(ProtocolError::InvalidLength(body.len() as i32));
        }
        let mut cursor = Cursor::new(body);
        let request_id = cursor.read_i32::<LittleEndian>()?;
        let kind = cursor.read_i32::<LittleEndian>()?;

        let end = body.len();
        if body[end - 2] != 0 || body[end - 1] != 0 {
            return Err(ProtocolError::MissingTerminator);
        }

        Ok(Self {
            request_id,
            kind: kind.into(),
            payload: body[8..end - 2].to_vec(),
        })
    }
}

/// Validate a length prefix read off the wire.
pub fn check_declared_len(declared: i32) -> Result<usize, ProtocolError> {
    if declared < FRAME_OVERHEAD as i32 || declared > MAX_FRAME_LEN as i32 {
        return Err(ProtocolError::InvalidLength(declared));
    }
    Ok(declared as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_frame_layout() {
        let frame = RconFrame::new(7, FrameKind::Auth, "pw");
        let bytes = frame.encode();

        assert_eq!(
            bytes,
            vec![12, 0, 0, 0, 7, 0, 0, 0, 3, 0, 0, 0, b'p', b'w', 0, 0]
        );
    }

    #[test]
    fn decode_keeps_payload_and_requires_both_terminators() {
        let frame = RconFrame::new(42, FrameKind::ResponseValue, "Added Steve_01 to the whitelist");
        let bytes = frame.encode();
        assert_eq!(&bytes[bytes.len() - 2..], &[0, 0]);

        let decoded = RconFrame::decode(&bytes).unwrap();
        assert_eq!(decoded, frame);
        assert_eq!(decoded.encode(), bytes);
    }

    #[test]
    fn empty_payload_frame() {
        let bytes = RconFrame::new(-1, FrameKind::ExecCommand, "").encode();
        assert_eq!(bytes.len(), 14);

        let decoded = RconFrame::decode(&bytes).unwrap();
        assert_eq!(decoded.request_id, -1);
        assert_eq!(decoded.kind, FrameKind::ExecCommand);
        assert!(decoded.payload.is_empty());
    }

    #[test]
    fn truncated_buffer_is_a_length_mismatch() {
        let mut bytes = RconFrame::new(1, FrameKind::ResponseValue, "hello").encode();
        bytes.truncate(bytes.len() - 3);

        match RconFrame::decode(&bytes) {
            Err(ProtocolError::LengthMismatch { declared, available }) => {
                assert_eq!(declared, 15);
                assert_eq!(available, 12);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn missing_terminator_is_rejected() {
        let mut bytes = RconFrame::new(1, FrameKind::ResponseValue, "hello").encode();
        let last = bytes.len() - 1;
        bytes[last] = b'!';

        assert!(matches!(
            RconFrame::decode(&bytes),
            Err(ProtocolError::MissingTerminator)
        ));
    }

    #[test]
    fn declared_length_bounds() {
        assert!(matches!(check_declared_len(9), Err(ProtocolError::InvalidLength(9))));
        assert!(matches!(check_declared_len(-5), Err(ProtocolError::InvalidLength(-5))));
        assert_eq!(check_declared_len(10).unwrap(), 10);
        assert_eq!(check_declared_len(4106).unwrap(), 4106);
        // 3000 two-byte characters in one fragment
        assert_eq!(check_declared_len(6010).unwrap(), 6010);
        assert_eq!(check_declared_len(16394).unwrap(), MAX_FRAME_LEN);
        assert!(matches!(
            check_declared_len(16395),
            Err(ProtocolError::InvalidLength(16395))
        ));
        assert!(check_declared_len(i32::MAX).is_err());
    }

    #[test]
    fn fragment_end_counts_characters_not_bytes() {
        let full_ascii = RconFrame::new(1, FrameKind::ResponseValue, "a".repeat(4096));
        assert!(!full_ascii.ends_response());

        let short_ascii = RconFrame::new(1, FrameKind::ResponseValue, "a".repeat(4095));
        assert!(short_ascii.ends_response());

        // 6000 bytes but only 3000 characters
        let cyrillic = RconFrame::new(1, FrameKind::ResponseValue, "ж".repeat(3000));
        assert!(cyrillic.payload.len() > MAX_PAYLOAD_CLIENTBOUND);
        assert!(cyrillic.ends_response());

        let full_cyrillic = RconFrame::new(1, FrameKind::ResponseValue, "ж".repeat(4096));
        assert!(!full_cyrillic.ends_response());
    }

    #[test]
    fn unknown_packet_types_survive() {
        let frame = RconFrame::new(3, FrameKind::Other(9), "x");
        let decoded = RconFrame::decode(&frame.encode()).unwrap();
        assert_eq!(decoded.kind, FrameKind::Other(9));
    }
}
