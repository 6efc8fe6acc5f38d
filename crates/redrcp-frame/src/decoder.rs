use bytes::{Buf, BufMut, BytesMut};
use tracing::{debug, trace};

use crate::codec::{Frame, END_MARK, MAX_PAYLOAD, PREAMBLE};
use crate::crc::crc16;

/// Offset of the payload inside the CRC-protected region (type, code, len hi, len lo).
const BODY_HEADER_SIZE: usize = 4;

/// Position of the decoder inside a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
    AwaitPreamble,
    AwaitType,
    AwaitCode,
    AwaitLenHi,
    AwaitLenLo,
    AwaitPayload,
    AwaitEndMark,
    AwaitCrcHi,
    AwaitCrcLo,
}

/// Running counters of what the decoder has seen since it was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    /// Frames that passed CRC validation.
    pub frames: u64,
    /// Frames dropped because the CRC did not match.
    pub crc_errors: u64,
    /// Frames abandoned because the end mark was missing.
    pub end_mark_errors: u64,
    /// Frames abandoned because the announced length exceeded the limit.
    pub oversized: u64,
}

/// Byte-at-a-time frame decoder.
///
/// Feed it every inbound byte in order; it returns a frame once the byte
/// completing a CRC-valid frame arrives. Malformed input never produces an
/// error. It is dropped, and the decoder waits for the next preamble.
///
/// When the end mark is missing, the bytes already consumed are *not*
/// rescanned for an embedded preamble. A corrupted length field can
/// therefore swallow a following frame before the decoder resynchronizes.
#[derive(Debug)]
pub struct FrameDecoder {
    state: DecodeState,
    kind: u8,
    code: u8,
    len_hi: u8,
    payload_len: usize,
    crc_hi: u8,
    /// Type through end mark, i.e. exactly the CRC-protected bytes.
    frame_bytes: BytesMut,
    max_payload: usize,
    stats: DecoderStats,
}

impl FrameDecoder {
    /// Create a decoder accepting payloads up to the protocol maximum.
    pub fn new() -> Self {
        Self::with_max_payload(MAX_PAYLOAD)
    }

    /// Create a decoder that abandons frames announcing more than `max_payload` bytes.
    pub fn with_max_payload(max_payload: usize) -> Self {
        Self {
            state: DecodeState::AwaitPreamble,
            kind: 0,
            code: 0,
            len_hi: 0,
            payload_len: 0,
            crc_hi: 0,
            frame_bytes: BytesMut::with_capacity(64),
            max_payload,
            stats: DecoderStats::default(),
        }
    }

    /// Current state.
    pub fn state(&self) -> DecodeState {
        self.state
    }

    /// Counters since creation (not cleared by [`reset`](Self::reset)).
    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// Drop any partial frame and wait for a preamble.
    pub fn reset(&mut self) {
        self.state = DecodeState::AwaitPreamble;
        self.frame_bytes.clear();
    }

    /// Advance by exactly one byte.
    ///
    /// Returns `Some(frame)` when this byte completes a CRC-valid frame.
    pub fn decode_byte(&mut self, byte: u8) -> Option<Frame> {
        match self.state {
            DecodeState::AwaitPreamble => {
                if byte == PREAMBLE {
                    self.state = DecodeState::AwaitType;
                }
            }
            DecodeState::AwaitType => {
                self.kind = byte;
                self.frame_bytes.clear();
                self.frame_bytes.put_u8(byte);
                self.state = DecodeState::AwaitCode;
            }
            DecodeState::AwaitCode => {
                self.code = byte;
                self.frame_bytes.put_u8(byte);
                self.state = DecodeState::AwaitLenHi;
            }
            DecodeState::AwaitLenHi => {
                self.len_hi = byte;
                self.frame_bytes.put_u8(byte);
                self.state = DecodeState::AwaitLenLo;
            }
            DecodeState::AwaitLenLo => {
                self.frame_bytes.put_u8(byte);
                self.payload_len = usize::from(u16::from_be_bytes([self.len_hi, byte]));
                if self.payload_len > self.max_payload {
                    self.stats.oversized += 1;
                    debug!(
                        code = self.code,
                        len = self.payload_len,
                        max = self.max_payload,
                        "dropping frame: payload too large"
                    );
                    self.state = DecodeState::AwaitPreamble;
                } else if self.payload_len == 0 {
                    self.state = DecodeState::AwaitEndMark;
                } else {
                    self.frame_bytes.reserve(self.payload_len + 1);
                    self.state = DecodeState::AwaitPayload;
                }
            }
            DecodeState::AwaitPayload => {
                self.frame_bytes.put_u8(byte);
                if self.frame_bytes.len() - BODY_HEADER_SIZE == self.payload_len {
                    self.state = DecodeState::AwaitEndMark;
                }
            }
            DecodeState::AwaitEndMark => {
                self.frame_bytes.put_u8(byte);
                if byte == END_MARK {
                    self.state = DecodeState::AwaitCrcHi;
                } else {
                    self.stats.end_mark_errors += 1;
                    debug!(
                        code = self.code,
                        got = byte,
                        "dropping frame: end mark missing"
                    );
                    self.state = DecodeState::AwaitPreamble;
                }
            }
            DecodeState::AwaitCrcHi => {
                self.crc_hi = byte;
                self.state = DecodeState::AwaitCrcLo;
            }
            DecodeState::AwaitCrcLo => {
                self.state = DecodeState::AwaitPreamble;
                let received = u16::from_be_bytes([self.crc_hi, byte]);
                let computed = crc16(&self.frame_bytes);
                if received != computed {
                    self.stats.crc_errors += 1;
                    debug!(
                        code = self.code,
                        received,
                        computed,
                        "dropping frame: CRC mismatch"
                    );
                    return None;
                }
                return Some(self.take_frame());
            }
        }
        None
    }

    /// Feed a slice, returning every frame completed along the way.
    pub fn decode_slice(&mut self, bytes: &[u8]) -> Vec<Frame> {
        bytes
            .iter()
            .filter_map(|&byte| self.decode_byte(byte))
            .collect()
    }

    fn take_frame(&mut self) -> Frame {
        let mut body = self.frame_bytes.split();
        body.advance(BODY_HEADER_SIZE);
        body.truncate(self.payload_len);
        self.stats.frames += 1;
        trace!(
            kind = self.kind,
            code = self.code,
            len = self.payload_len,
            "frame decoded"
        );
        Frame {
            kind: self.kind,
            code: self.code,
            payload: body.freeze(),
        }
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::codec::{encode_frame, MessageType};

    fn wire(kind: MessageType, code: u8, payload: &[u8]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        encode_frame(kind, code, payload, &mut buf).unwrap();
        buf.to_vec()
    }

    #[test]
    fn ready_only_on_last_byte() {
        let bytes = wire(MessageType::Response, 0x03, b"v1.2.3");
        let mut decoder = FrameDecoder::new();

        for (i, &byte) in bytes.iter().enumerate() {
            let out = decoder.decode_byte(byte);
            if i + 1 < bytes.len() {
                assert!(out.is_none(), "frame emitted early at byte {i}");
            } else {
                let frame = out.expect("frame should complete on last byte");
                assert_eq!(frame.message_type(), Some(MessageType::Response));
                assert_eq!(frame.code, 0x03);
                assert_eq!(frame.payload.as_ref(), b"v1.2.3");
            }
        }
        assert_eq!(decoder.state(), DecodeState::AwaitPreamble);
        assert_eq!(decoder.stats().frames, 1);
    }

    #[test]
    fn roundtrip_across_kinds_and_sizes() {
        let mut decoder = FrameDecoder::new();
        let kinds = [
            MessageType::Command,
            MessageType::Response,
            MessageType::Notification,
            MessageType::Reserved,
        ];
        for (i, kind) in kinds.into_iter().enumerate() {
            for len in [0usize, 1, 2, 127, 300, 4096] {
                let payload: Vec<u8> = (0..len).map(|b| (b * 7 + i) as u8).collect();
                let frames = decoder.decode_slice(&wire(kind, i as u8 * 0x40, &payload));
                assert_eq!(frames.len(), 1);
                assert_eq!(frames[0].message_type(), Some(kind));
                assert_eq!(frames[0].code, i as u8 * 0x40);
                assert_eq!(frames[0].payload.as_ref(), payload.as_slice());
            }
        }
    }

    #[test]
    fn maximum_payload_roundtrip() {
        let payload = vec![0xA5u8; MAX_PAYLOAD];
        let mut decoder = FrameDecoder::new();
        let frames = decoder.decode_slice(&wire(MessageType::Notification, 0x22, &payload));
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload.len(), MAX_PAYLOAD);
    }

    #[test]
    fn payload_may_contain_markers() {
        let payload = [PREAMBLE, END_MARK, PREAMBLE, 0x00, END_MARK];
        let mut decoder = FrameDecoder::new();
        let frames = decoder.decode_slice(&wire(MessageType::Response, 0x29, &payload));
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload.as_ref(), &payload);
    }

    #[test]
    fn any_crc_bit_flip_is_rejected() {
        let good = wire(MessageType::Response, 0x36, &[0x00]);
        let crc_offset = good.len() - 2;

        for bit in 0..16 {
            let mut bad = good.clone();
            bad[crc_offset + bit / 8] ^= 1 << (bit % 8);

            let mut decoder = FrameDecoder::new();
            for &byte in &bad {
                assert!(decoder.decode_byte(byte).is_none(), "bit {bit} accepted");
            }
            assert_eq!(decoder.state(), DecodeState::AwaitPreamble);
            assert_eq!(decoder.stats().crc_errors, 1);

            let frames = decoder.decode_slice(&good);
            assert_eq!(frames.len(), 1, "decoder did not recover after bit {bit}");
        }
    }

    #[test]
    fn corrupted_payload_is_rejected() {
        let mut bytes = wire(MessageType::Notification, 0x22, &[0x30, 0x00, 0xE2, 0x00]);
        bytes[6] ^= 0x01;
        let mut decoder = FrameDecoder::new();
        assert!(decoder.decode_slice(&bytes).is_empty());
        assert_eq!(decoder.stats().crc_errors, 1);
    }

    #[test]
    fn skips_garbage_before_preamble() {
        let mut bytes = vec![0x00, 0x7E, 0x13, 0xFF];
        bytes.extend(wire(MessageType::Response, 0x03, &[0x01]));
        let mut decoder = FrameDecoder::new();
        let frames = decoder.decode_slice(&bytes);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload.as_ref(), &[0x01]);
    }

    #[test]
    fn back_to_back_frames() {
        let mut bytes = wire(MessageType::Notification, 0x22, &[0x30, 0x00]);
        bytes.extend(wire(MessageType::Notification, 0x22, &[0x30, 0x01]));
        bytes.extend(wire(MessageType::Response, 0x37, &[0x00]));

        let mut decoder = FrameDecoder::new();
        let frames = decoder.decode_slice(&bytes);
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[1].payload, Bytes::from_static(&[0x30, 0x01]));
        assert_eq!(frames[2].code, 0x37);
    }

    #[test]
    fn missing_end_mark_abandons_frame() {
        // Header announces one payload byte, then 0x00 where 0x7E belongs.
        let mut bytes = vec![PREAMBLE, 0x01, 0x03, 0x00, 0x01, 0xAA, 0x00];
        bytes.extend(wire(MessageType::Response, 0x03, &[0xAA]));

        let mut decoder = FrameDecoder::new();
        let mut frames = Vec::new();
        for (i, &byte) in bytes.iter().enumerate() {
            if let Some(frame) = decoder.decode_byte(byte) {
                frames.push(frame);
            }
            if i == 6 {
                assert_eq!(decoder.state(), DecodeState::AwaitPreamble);
            }
        }
        assert_eq!(frames.len(), 1);
        assert_eq!(decoder.stats().end_mark_errors, 1);
    }

    #[test]
    fn corrupted_length_swallows_following_frame() {
        let inner = wire(MessageType::Response, 0x03, &[]);
        let mut bytes = vec![PREAMBLE, 0x01, 0x22, 0x00, inner.len() as u8];
        bytes.extend(&inner);
        bytes.push(0x00);
        let after = wire(MessageType::Response, 0x37, &[0x00]);
        bytes.extend(&after);

        let mut decoder = FrameDecoder::new();
        let frames = decoder.decode_slice(&bytes);

        // The embedded frame was consumed as payload and is not recovered.
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].code, 0x37);
    }

    #[test]
    fn oversized_length_is_abandoned() {
        let mut decoder = FrameDecoder::with_max_payload(4);
        let frames = decoder.decode_slice(&wire(MessageType::Response, 0x03, &[0u8; 5]));
        assert!(frames.is_empty());
        assert_eq!(decoder.stats().oversized, 1);

        let frames = decoder.decode_slice(&wire(MessageType::Response, 0x03, &[0u8; 4]));
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn reset_discards_partial_frame() {
        let bytes = wire(MessageType::Response, 0x03, &[1, 2, 3]);
        let mut decoder = FrameDecoder::new();
        decoder.decode_slice(&bytes[..5]);
        assert_eq!(decoder.state(), DecodeState::AwaitPayload);

        decoder.reset();
        assert_eq!(decoder.state(), DecodeState::AwaitPreamble);
        assert_eq!(decoder.decode_slice(&bytes).len(), 1);
    }
}
