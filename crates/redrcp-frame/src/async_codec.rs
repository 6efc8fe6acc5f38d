//! `tokio_util` codec over the byte-level decoder (feature `async`).

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::Frame;
use crate::decoder::FrameDecoder;
use crate::error::FrameError;

/// Frames RED RCP traffic for `FramedRead` / `FramedWrite`.
///
/// Decoding consumes input one byte at a time through [`FrameDecoder`], so
/// partial frames survive across reads and corrupted frames are skipped.
#[derive(Debug, Default)]
pub struct RcpCodec {
    decoder: FrameDecoder,
}

impl RcpCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Access the underlying decoder (state and counters).
    pub fn decoder(&self) -> &FrameDecoder {
        &self.decoder
    }
}

impl Decoder for RcpCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, FrameError> {
        let mut consumed = 0;
        let mut ready = None;
        for &byte in src.iter() {
            consumed += 1;
            if let Some(frame) = self.decoder.decode_byte(byte) {
                ready = Some(frame);
                break;
            }
        }
        src.advance(consumed);
        Ok(ready)
    }
}

impl Encoder<Frame> for RcpCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), FrameError> {
        item.encode(dst)
    }
}

#[cfg(test)]
mod tests {
    use futures_util::{SinkExt, StreamExt};
    use tokio_util::codec::{FramedRead, FramedWrite};

    use super::*;
    use crate::codec::MessageType;

    #[tokio::test]
    async fn framed_write_then_read() {
        let mut wire = Vec::new();
        {
            let mut sink = FramedWrite::new(&mut wire, RcpCodec::new());
            sink.send(Frame::command(0x03, vec![0x01])).await.unwrap();
            sink.send(Frame::new(MessageType::Notification, 0x22, vec![0x30, 0x00]))
                .await
                .unwrap();
        }

        let mut stream = FramedRead::new(wire.as_slice(), RcpCodec::new());
        let first = stream.next().await.unwrap().unwrap();
        let second = stream.next().await.unwrap().unwrap();
        assert_eq!(first.message_type(), Some(MessageType::Command));
        assert_eq!(first.payload.as_ref(), &[0x01]);
        assert_eq!(second.code, 0x22);
        assert!(stream.next().await.is_none());
    }

    #[test]
    fn decode_keeps_partial_frames_across_calls() {
        let wire = Frame::new(MessageType::Response, 0x37, vec![0x00])
            .to_bytes()
            .unwrap();
        let mut codec = RcpCodec::new();

        let mut first = BytesMut::from(&wire[..4]);
        assert!(codec.decode(&mut first).unwrap().is_none());
        assert!(first.is_empty());

        let mut rest = BytesMut::from(&wire[4..]);
        let frame = codec.decode(&mut rest).unwrap().unwrap();
        assert_eq!(frame.code, 0x37);
    }

    #[test]
    fn decode_leaves_bytes_after_completed_frame() {
        let mut wire = BytesMut::new();
        Frame::new(MessageType::Response, 0x36, vec![0x00])
            .encode(&mut wire)
            .unwrap();
        Frame::new(MessageType::Response, 0x37, vec![0x00])
            .encode(&mut wire)
            .unwrap();

        let mut codec = RcpCodec::new();
        assert_eq!(codec.decode(&mut wire).unwrap().unwrap().code, 0x36);
        assert!(!wire.is_empty());
        assert_eq!(codec.decode(&mut wire).unwrap().unwrap().code, 0x37);
        assert!(wire.is_empty());
    }
}
