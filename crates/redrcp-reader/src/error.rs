use std::time::Duration;

use bytes::Bytes;

use crate::error_code::ErrorCode;

/// Errors surfaced by [`Reader`](crate::Reader) calls.
///
/// Corrupted frames are never reported here. They are dropped on the
/// receive path and show up, at most, as a [`Timeout`](Self::Timeout) on the
/// call that was waiting for them.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// No response arrived within the bound. The call may be retried.
    #[error("no response within {0:?}")]
    Timeout(Duration),

    /// The response answered a different command than the one sent.
    #[error("response code mismatch (sent 0x{expected:02X}, got 0x{received:02X})")]
    Mismatch { expected: u8, received: u8 },

    /// The reader reported a command failure.
    #[error("reader rejected command 0x{code:02X}: {error}")]
    ReaderError { code: u8, error: ErrorCode },

    /// A start/stop style command answered something other than success.
    #[error("unexpected response to command 0x{code:02X}: {payload:02X?}")]
    UnexpectedResponse { code: u8, payload: Bytes },

    /// No connection is open.
    #[error("not connected")]
    NotConnected,

    /// The connection was closed while the call was waiting.
    #[error("disconnected while waiting for a response")]
    Disconnected,

    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] redrcp_transport::TransportError),

    /// Frame-level error (encoding side only).
    #[error("frame error: {0}")]
    Frame(#[from] redrcp_frame::FrameError),
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
