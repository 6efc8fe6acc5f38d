//! RED RCP frame codec.
//!
//! Every message on the wire is framed as:
//!
//! ```text
//! ┌──────┬──────┬──────┬─────────┬───────────┬──────┬──────────┐
//! │ 0xBB │ Type │ Code │ Len BE  │ Payload   │ 0x7E │ CRC16 BE │
//! │      │ (1B) │ (1B) │ (2B)    │ (Len B)   │      │ (2B)     │
//! └──────┴──────┴──────┴─────────┴───────────┴──────┴──────────┘
//! ```
//!
//! The CRC covers everything between the preamble and the CRC itself.
//! Inbound bytes are decoded one at a time by [`FrameDecoder`], which never
//! fails: corrupted frames are dropped and the decoder hunts for the next
//! preamble.

pub mod code;
pub mod codec;
pub mod crc;
pub mod decoder;
pub mod error;
pub mod reader;

#[cfg(feature = "async")]
pub mod async_codec;

pub use codec::{
    encode_frame, Frame, FrameConfig, MessageType, END_MARK, HEADER_SIZE, MAX_PAYLOAD, PREAMBLE,
    TRAILER_SIZE,
};
pub use crc::crc16;
pub use decoder::{DecodeState, DecoderStats, FrameDecoder};
pub use error::{FrameError, Result};
pub use reader::FrameReader;

#[cfg(feature = "async")]
pub use async_codec::RcpCodec;
