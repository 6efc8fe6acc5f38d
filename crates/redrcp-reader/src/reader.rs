use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, info, trace, warn};

use redrcp_frame::code::{code_name, STATUS_SUCCESS};
use redrcp_frame::Frame;
use redrcp_transport::Transport;

use crate::dispatcher::{CommandFailure, Dispatcher};
use crate::error::{ProtocolError, Result};
use crate::error_code::ErrorCode;
use crate::ledger::ErrorLedger;
use crate::notification::SessionKind;
use crate::queue::{RecvError, ResponseOutcome, ResponseQueue};
use crate::registry::SessionHandler;

/// How long a call waits for its response unless told otherwise.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Bound on the wait in [`Reader::execute`].
    pub response_timeout: Duration,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
        }
    }
}

/// A connection to one reader.
///
/// Calls are serialized internally: the protocol has no call identifier,
/// so at most one command is ever outstanding. A second caller blocks until
/// the first one returns.
pub struct Reader<T: Transport> {
    transport: Mutex<T>,
    call_lock: Mutex<()>,
    dispatcher: Arc<Dispatcher>,
    ledger: Arc<ErrorLedger>,
    queue: Arc<ResponseQueue>,
    config: ReaderConfig,
}

impl<T: Transport> Reader<T> {
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, ReaderConfig::default())
    }

    pub fn with_config(transport: T, config: ReaderConfig) -> Self {
        let ledger = Arc::new(ErrorLedger::new());
        let queue = Arc::new(ResponseQueue::new());
        let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&ledger), Arc::clone(&queue)));
        Self {
            transport: Mutex::new(transport),
            call_lock: Mutex::new(()),
            dispatcher,
            ledger,
            queue,
            config,
        }
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Open the transport and start routing received bytes.
    ///
    /// Decoder state, sessions and the error ledger start fresh.
    pub fn connect(&self, endpoint: &str) -> Result<()> {
        let mut transport = self.transport();
        if transport.is_connected() {
            return Err(redrcp_transport::TransportError::AlreadyConnected.into());
        }

        self.dispatcher.reset();
        self.ledger.reset();
        self.queue.reopen();
        self.dispatcher.attach();

        let dispatcher = Arc::clone(&self.dispatcher);
        let on_byte = Box::new(move |byte| dispatcher.on_byte(byte));
        if let Err(err) = transport.connect(endpoint, on_byte) {
            self.dispatcher.detach();
            self.queue.close();
            return Err(err.into());
        }
        info!(endpoint, "connected");
        Ok(())
    }

    /// Close the connection.
    ///
    /// Received bytes stop being routed first, then a call waiting for a
    /// response is woken with [`ProtocolError::Disconnected`], and only then
    /// is the transport released. Must not be called from a session or
    /// failure callback.
    pub fn disconnect(&self) -> Result<()> {
        self.dispatcher.detach();
        self.queue.close();
        let result = self.transport().disconnect();
        self.dispatcher.clear_sessions();
        result?;
        info!("disconnected");
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.transport().is_connected()
    }

    /// Send a command and wait for its response with the configured timeout.
    pub fn execute(&self, code: u8, payload: &[u8]) -> Result<Bytes> {
        self.execute_with_timeout(code, payload, self.config.response_timeout)
    }

    /// Send a command and wait up to `timeout` for its response.
    ///
    /// Returns the response payload. A command-failure frame for `code`
    /// becomes [`ProtocolError::ReaderError`]; the same error code is also
    /// available from [`last_error_for`](Self::last_error_for).
    pub fn execute_with_timeout(
        &self,
        code: u8,
        payload: &[u8],
        timeout: Duration,
    ) -> Result<Bytes> {
        let _call = self
            .call_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let stale = self.queue.drain();
        if stale > 0 {
            debug!(stale, "discarded stale responses");
        }

        let wire = Frame::command(code, Bytes::copy_from_slice(payload)).to_bytes()?;
        {
            let mut transport = self.transport();
            if !transport.is_connected() {
                return Err(ProtocolError::NotConnected);
            }
            trace!(code, name = code_name(code), len = payload.len(), "sending command");
            transport.send(&wire)?;
        }

        let outcome = match self.queue.recv_timeout(timeout) {
            Ok(outcome) => outcome,
            Err(RecvError::Timeout) => {
                debug!(code, name = code_name(code), ?timeout, "response timed out");
                return Err(ProtocolError::Timeout(timeout));
            }
            Err(RecvError::Closed) => return Err(ProtocolError::Disconnected),
        };

        if outcome.code() != code {
            self.queue.drain();
            warn!(
                expected = code,
                received = outcome.code(),
                "response does not match command"
            );
            return Err(ProtocolError::Mismatch {
                expected: code,
                received: outcome.code(),
            });
        }

        match outcome {
            ResponseOutcome::Success { payload, .. } => Ok(payload),
            ResponseOutcome::Failure { code, error } => {
                Err(ProtocolError::ReaderError { code, error })
            }
        }
    }

    /// Execute a start/stop style command that answers a single `0x00` byte.
    pub(crate) fn execute_status(&self, code: u8, payload: &[u8]) -> Result<()> {
        let response = self.execute(code, payload)?;
        if response.as_ref() != [STATUS_SUCCESS] {
            return Err(ProtocolError::UnexpectedResponse {
                code,
                payload: response,
            });
        }
        Ok(())
    }

    /// Register `handler` for `kind` and send `start_code`.
    ///
    /// The session becomes active the moment the successful response is
    /// received, so notifications that immediately follow it are delivered.
    pub fn start_session(
        &self,
        kind: SessionKind,
        start_code: u8,
        payload: &[u8],
        handler: SessionHandler,
    ) -> Result<()> {
        self.dispatcher.register_session(kind, start_code, handler);
        if let Err(err) = self.execute_status(start_code, payload) {
            // A start acknowledgement may have been routed behind another
            // response, so the kind can already be active here.
            self.dispatcher.end_session(kind);
            return Err(err);
        }
        info!(%kind, code = start_code, "session start acknowledged");
        Ok(())
    }

    /// Send `stop_code` and end the session once the reader acknowledges it.
    pub fn stop_session(&self, kind: SessionKind, stop_code: u8) -> Result<()> {
        self.execute_status(stop_code, &[])?;
        self.dispatcher.end_session(kind);
        info!(%kind, "session stopped");
        Ok(())
    }

    /// End a session locally, for kinds the reader has no stop command for.
    pub fn end_session(&self, kind: SessionKind) {
        self.dispatcher.end_session(kind);
    }

    pub fn is_session_active(&self, kind: SessionKind) -> bool {
        self.dispatcher.is_session_active(kind)
    }

    /// Most recent error the reader reported for `code`.
    pub fn last_error_for(&self, code: u8) -> Option<ErrorCode> {
        self.ledger.last_error_for(code)
    }

    /// Most recent error the reader reported for any command.
    pub fn last_error(&self) -> ErrorCode {
        self.ledger.last_error()
    }

    /// Observe every command-failure frame, including ones no call waits for.
    ///
    /// Runs on the receive thread under the receive lock.
    pub fn on_command_failure(&self, observer: impl FnMut(CommandFailure) + Send + 'static) {
        self.dispatcher.set_failure_observer(Some(Box::new(observer)));
    }

    pub fn clear_command_failure_observer(&self) {
        self.dispatcher.set_failure_observer(None);
    }

    /// Counters of the receive-side frame decoder.
    pub fn decoder_stats(&self) -> redrcp_frame::DecoderStats {
        self.dispatcher.decoder_stats()
    }

    fn transport(&self) -> MutexGuard<'_, T> {
        self.transport
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<T: Transport> Drop for Reader<T> {
    fn drop(&mut self) {
        if self.is_connected() {
            let _ = self.disconnect();
        }
    }
}

impl<T: Transport> std::fmt::Debug for Reader<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reader")
            .field("config", &self.config)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}
