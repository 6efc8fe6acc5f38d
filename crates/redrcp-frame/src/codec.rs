use bytes::{BufMut, Bytes, BytesMut};

use crate::crc::crc16;
use crate::error::{FrameError, Result};

/// Start-of-frame marker.
pub const PREAMBLE: u8 = 0xBB;

/// Marker closing the CRC-protected region.
pub const END_MARK: u8 = 0x7E;

/// Frame header: preamble (1) + type (1) + code (1) + length (2) = 5 bytes.
pub const HEADER_SIZE: usize = 5;

/// Frame trailer: end mark (1) + CRC (2) = 3 bytes.
pub const TRAILER_SIZE: usize = 3;

/// Largest payload the 16-bit length field can describe.
pub const MAX_PAYLOAD: usize = u16::MAX as usize;

/// The type byte of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    Command = 0x00,
    Response = 0x01,
    Notification = 0x02,
    Reserved = 0x03,
}

impl MessageType {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for MessageType {
    /// The unrecognised type byte.
    type Error = u8;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Self::Command),
            0x01 => Ok(Self::Response),
            0x02 => Ok(Self::Notification),
            0x03 => Ok(Self::Reserved),
            other => Err(other),
        }
    }
}

/// One complete protocol message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Raw type byte as seen on the wire. See [`Frame::message_type`].
    pub kind: u8,
    /// Operation identifier.
    pub code: u8,
    /// Opaque payload.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(kind: MessageType, code: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            kind: kind.as_u8(),
            code,
            payload: payload.into(),
        }
    }

    /// Create a command frame.
    pub fn command(code: u8, payload: impl Into<Bytes>) -> Self {
        Self::new(MessageType::Command, code, payload)
    }

    /// The decoded type, or `None` when the type byte is outside the protocol.
    pub fn message_type(&self) -> Option<MessageType> {
        MessageType::try_from(self.kind).ok()
    }

    /// The total wire size of this frame (header + payload + trailer).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len() + TRAILER_SIZE
    }

    /// Append the wire encoding of this frame to `dst`.
    pub fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        put_frame(self.kind, self.code, &self.payload, dst)
    }

    /// Wire encoding of this frame as a standalone buffer.
    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(self.wire_size());
        self.encode(&mut buf)?;
        Ok(buf.freeze())
    }
}

/// Encode a frame into the wire format.
///
/// The CRC covers type, code, length, payload and end mark; the preamble
/// and the CRC itself are excluded.
pub fn encode_frame(kind: MessageType, code: u8, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    put_frame(kind.as_u8(), code, payload, dst)
}

fn put_frame(kind: u8, code: u8, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }

    dst.reserve(HEADER_SIZE + payload.len() + TRAILER_SIZE);
    dst.put_u8(PREAMBLE);
    let body_start = dst.len();
    dst.put_u8(kind);
    dst.put_u8(code);
    dst.put_u16(payload.len() as u16);
    dst.put_slice(payload);
    dst.put_u8(END_MARK);
    let crc = crc16(&dst[body_start..]);
    dst.put_u16(crc);
    Ok(())
}

/// Configuration for blocking frame readers.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Frames announcing a longer payload are dropped. Default: 65535.
    pub max_payload_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: MAX_PAYLOAD,
        }
    }
}
