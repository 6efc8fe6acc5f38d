//! Protocol engine for RED RCP RAIN RFID readers.
//!
//! ```text
//!  caller ──execute──▶ Reader ──send──▶ Transport
//!                        ▲                  │ bytes (receive thread)
//!                        │                  ▼
//!                  ResponseQueue ◀──── Dispatcher ──▶ session handlers
//!                                          │
//!                                          ▼
//!                                     ErrorLedger
//! ```
//!
//! [`Reader`] pairs each command with its response under a timeout. The
//! [`Dispatcher`] owns the receive path: it decodes bytes into frames,
//! normalizes command failures, and routes notifications to the handler
//! of each active [`SessionKind`].

pub mod commands;
pub mod dispatcher;
pub mod error;
pub mod error_code;
pub mod ledger;
pub mod notification;
pub mod queue;
pub mod reader;
pub mod registry;

pub use commands::ReaderInfoType;
pub use dispatcher::{CommandFailure, Dispatcher};
pub use error::{ProtocolError, Result};
pub use error_code::ErrorCode;
pub use ledger::ErrorLedger;
pub use notification::{
    epc_len_from_pc, DtcResult, Notification, RssiSample, SessionKind, TagUii, TagUiiEx,
    TagUiiRssi, TagUiiTid, COMPLETION_SENTINEL,
};
pub use queue::{RecvError, ResponseOutcome, ResponseQueue};
pub use reader::{Reader, ReaderConfig, DEFAULT_RESPONSE_TIMEOUT};
pub use registry::{SessionFlags, SessionHandler};
