use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, trace, warn};

use redrcp_frame::code::{code_name, COMMAND_FAILURE};
use redrcp_frame::{DecoderStats, Frame, FrameDecoder, MessageType};

use crate::error_code::ErrorCode;
use crate::ledger::ErrorLedger;
use crate::notification::SessionKind;
use crate::queue::{ResponseOutcome, ResponseQueue};
use crate::registry::{NotificationRegistry, SessionFlags, SessionHandler};

/// Out-of-band report of a command-failure frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandFailure {
    /// Code of the command the reader rejected.
    pub code: u8,
    pub error: ErrorCode,
}

type FailureObserver = Box<dyn FnMut(CommandFailure) + Send + 'static>;

struct ReceiveState {
    decoder: FrameDecoder,
    registry: NotificationRegistry,
    on_failure: Option<FailureObserver>,
}

/// The receive path of a connection.
///
/// Every inbound byte goes through [`on_byte`](Self::on_byte), which holds a
/// single lock while it decodes and routes. Decoder state is never reachable
/// outside that lock.
pub struct Dispatcher {
    state: Mutex<ReceiveState>,
    flags: Arc<SessionFlags>,
    attached: AtomicBool,
    ledger: Arc<ErrorLedger>,
    queue: Arc<ResponseQueue>,
}

impl Dispatcher {
    pub fn new(ledger: Arc<ErrorLedger>, queue: Arc<ResponseQueue>) -> Self {
        let flags = Arc::new(SessionFlags::default());
        Self {
            state: Mutex::new(ReceiveState {
                decoder: FrameDecoder::new(),
                registry: NotificationRegistry::new(Arc::clone(&flags)),
                on_failure: None,
            }),
            flags,
            attached: AtomicBool::new(false),
            ledger,
            queue,
        }
    }

    /// Feed one received byte. Bytes arriving while detached are discarded.
    pub fn on_byte(&self, byte: u8) {
        if !self.attached.load(Ordering::Acquire) {
            return;
        }
        let mut state = self.lock();
        if let Some(frame) = state.decoder.decode_byte(byte) {
            self.route(&mut state, frame);
        }
    }

    fn route(&self, state: &mut ReceiveState, frame: Frame) {
        trace!(
            kind = frame.kind,
            code = frame.code,
            name = code_name(frame.code),
            len = frame.payload.len(),
            "frame received"
        );
        match frame.message_type() {
            Some(MessageType::Response) if frame.code == COMMAND_FAILURE => {
                let [code, error] = frame.payload.as_ref() else {
                    debug!(payload = ?frame.payload, "malformed command failure dropped");
                    return;
                };
                let failure = CommandFailure {
                    code: *code,
                    error: ErrorCode::from(*error),
                };
                warn!(
                    code = failure.code,
                    name = code_name(failure.code),
                    error = %failure.error,
                    "reader reported command failure"
                );
                self.ledger.record_failure(failure.code, failure.error);
                state.registry.on_failure(failure.code);
                self.enqueue(ResponseOutcome::Failure {
                    code: failure.code,
                    error: failure.error,
                });
                if let Some(observer) = state.on_failure.as_mut() {
                    observer(failure);
                }
            }
            Some(MessageType::Response) => {
                state.registry.on_response(frame.code, &frame.payload);
                self.enqueue(ResponseOutcome::Success {
                    code: frame.code,
                    payload: frame.payload,
                });
            }
            Some(MessageType::Notification) => {
                state.registry.route(frame.code, &frame.payload);
            }
            Some(MessageType::Command | MessageType::Reserved) | None => {
                debug!(kind = frame.kind, code = frame.code, "frame ignored");
            }
        }
    }

    fn enqueue(&self, outcome: ResponseOutcome) {
        let code = outcome.code();
        if !self.queue.push(outcome) {
            debug!(code, name = code_name(code), "response dropped, slot occupied");
        }
    }

    /// Start accepting bytes.
    pub fn attach(&self) {
        self.attached.store(true, Ordering::Release);
    }

    /// Stop accepting bytes. A byte already inside `on_byte` finishes routing.
    pub fn detach(&self) {
        self.attached.store(false, Ordering::Release);
    }

    /// Reset decoder state and clear every session.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.decoder.reset();
        state.registry.clear();
    }

    pub fn decoder_stats(&self) -> DecoderStats {
        self.lock().decoder.stats()
    }

    pub fn flags(&self) -> &SessionFlags {
        &self.flags
    }

    pub fn is_session_active(&self, kind: SessionKind) -> bool {
        self.flags.is_active(kind)
    }

    pub(crate) fn register_session(
        &self,
        kind: SessionKind,
        start_code: u8,
        handler: SessionHandler,
    ) {
        let mut state = self.lock();
        state.registry.register(kind, handler);
        state.registry.arm(kind, start_code);
    }

    pub(crate) fn end_session(&self, kind: SessionKind) {
        self.lock().registry.end(kind);
    }

    pub(crate) fn clear_sessions(&self) {
        self.lock().registry.clear();
    }

    pub(crate) fn set_failure_observer(&self, observer: Option<FailureObserver>) {
        self.lock().on_failure = observer;
    }

    fn lock(&self) -> MutexGuard<'_, ReceiveState> {
        // A panicking callback must not wedge the receive path for good.
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("attached", &self.attached.load(Ordering::Relaxed))
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}
