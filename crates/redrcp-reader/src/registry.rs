use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info};

use redrcp_frame::code::STATUS_SUCCESS;

use crate::notification::{Notification, SessionKind, COMPLETION_SENTINEL, KIND_COUNT};

type DataCallback = Box<dyn FnMut(SessionKind, Notification) + Send + 'static>;
type CompleteCallback = Box<dyn FnMut(SessionKind) + Send + 'static>;

/// Callbacks for one notification session.
///
/// Both run on the transport's receive thread while the receive path is
/// locked. They must return quickly and must not call back into the
/// [`Reader`](crate::Reader); hand work off to a channel instead.
pub struct SessionHandler {
    on_data: DataCallback,
    on_complete: Option<CompleteCallback>,
}

impl SessionHandler {
    pub fn new(on_data: impl FnMut(SessionKind, Notification) + Send + 'static) -> Self {
        Self {
            on_data: Box::new(on_data),
            on_complete: None,
        }
    }

    /// Invoked once when the reader signals the end of the session.
    pub fn on_complete(mut self, f: impl FnMut(SessionKind) + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }
}

impl std::fmt::Debug for SessionHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandler")
            .field("on_complete", &self.on_complete.is_some())
            .finish_non_exhaustive()
    }
}

/// One flag per [`SessionKind`], readable without taking the receive lock.
#[derive(Debug, Default)]
pub struct SessionFlags {
    flags: [AtomicBool; KIND_COUNT],
}

impl SessionFlags {
    pub fn is_active(&self, kind: SessionKind) -> bool {
        self.flags[kind.index()].load(Ordering::Acquire)
    }

    pub(crate) fn set(&self, kind: SessionKind, active: bool) {
        self.flags[kind.index()].store(active, Ordering::Release);
    }

    pub(crate) fn clear_all(&self) {
        for flag in &self.flags {
            flag.store(false, Ordering::Release);
        }
    }
}

/// Per-kind handler table plus pending activations.
///
/// Owned by the dispatcher and only touched under its receive lock.
#[derive(Debug)]
pub(crate) struct NotificationRegistry {
    handlers: [Option<SessionHandler>; KIND_COUNT],
    /// Start command code each kind is waiting on, if any.
    armed: [Option<u8>; KIND_COUNT],
    flags: Arc<SessionFlags>,
}

impl NotificationRegistry {
    pub(crate) fn new(flags: Arc<SessionFlags>) -> Self {
        Self {
            handlers: Default::default(),
            armed: [None; KIND_COUNT],
            flags,
        }
    }

    pub(crate) fn register(&mut self, kind: SessionKind, handler: SessionHandler) {
        self.handlers[kind.index()] = Some(handler);
    }

    /// Activate `kind` when the next successful response to `start_code` is routed.
    pub(crate) fn arm(&mut self, kind: SessionKind, start_code: u8) {
        self.armed[kind.index()] = Some(start_code);
    }

    pub(crate) fn disarm(&mut self, kind: SessionKind) {
        self.armed[kind.index()] = None;
    }

    pub(crate) fn activate(&mut self, kind: SessionKind) {
        self.armed[kind.index()] = None;
        self.flags.set(kind, true);
    }

    /// Clear the flag and drop the handler.
    pub(crate) fn end(&mut self, kind: SessionKind) {
        self.armed[kind.index()] = None;
        self.handlers[kind.index()] = None;
        self.flags.set(kind, false);
    }

    pub(crate) fn clear(&mut self) {
        self.handlers = Default::default();
        self.armed = [None; KIND_COUNT];
        self.flags.clear_all();
    }

    /// A response for `code` was routed. Armed kinds waiting on it are
    /// activated on a `[0x00]` payload and disarmed otherwise.
    pub(crate) fn on_response(&mut self, code: u8, payload: &[u8]) {
        let success = payload == [STATUS_SUCCESS];
        for kind in SessionKind::ALL {
            if self.armed[kind.index()] != Some(code) {
                continue;
            }
            if success {
                info!(%kind, "session started");
                self.activate(kind);
            } else {
                debug!(%kind, ?payload, "start command not acknowledged, disarming");
                self.disarm(kind);
            }
        }
    }

    /// The reader rejected `code`; disarm anything waiting on it.
    pub(crate) fn on_failure(&mut self, code: u8) {
        for kind in SessionKind::ALL {
            if self.armed[kind.index()] == Some(code) {
                self.disarm(kind);
            }
        }
    }

    /// Deliver a notification frame to every active kind that handles `code`.
    ///
    /// Returns how many handlers were invoked.
    pub(crate) fn route(&mut self, code: u8, payload: &Bytes) -> usize {
        let mut delivered = 0;
        let mut matched = false;
        for kind in SessionKind::ALL {
            if !kind.handles(code) {
                continue;
            }
            matched = true;
            if !self.flags.is_active(kind) {
                debug!(%kind, code, "notification for inactive session dropped");
                continue;
            }

            let slot = &mut self.handlers[kind.index()];
            if kind.has_completion_sentinel() && payload.as_ref() == [COMPLETION_SENTINEL] {
                self.flags.set(kind, false);
                info!(%kind, "session completed");
                if let Some(on_complete) = slot.as_mut().and_then(|h| h.on_complete.as_mut()) {
                    on_complete(kind);
                }
                continue;
            }

            let Some(notification) = kind.parse(payload) else {
                debug!(%kind, len = payload.len(), "malformed notification payload dropped");
                continue;
            };
            if kind.is_single_shot() {
                self.flags.set(kind, false);
            }
            if let Some(handler) = slot.as_mut() {
                (handler.on_data)(kind, notification);
                delivered += 1;
            }
        }
        if !matched {
            debug!(code, "notification with unknown code dropped");
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    type Log = Arc<Mutex<Vec<String>>>;

    fn recording_handler(log: &Log) -> SessionHandler {
        let data_log = Arc::clone(log);
        let done_log = Arc::clone(log);
        SessionHandler::new(move |kind, n| {
            let epc_len = n.uii().map(|u| u.epc.len()).unwrap_or_default();
            data_log.lock().unwrap().push(format!("{kind}:{epc_len}"));
        })
        .on_complete(move |kind| done_log.lock().unwrap().push(format!("{kind}:done")))
    }

    fn registry() -> (NotificationRegistry, Arc<SessionFlags>) {
        let flags = Arc::new(SessionFlags::default());
        (NotificationRegistry::new(Arc::clone(&flags)), flags)
    }

    fn tag() -> Bytes {
        let mut payload = vec![0x34, 0x00];
        payload.extend_from_slice(&[0xAA; 12]);
        Bytes::from(payload)
    }

    #[test]
    fn inactive_kind_is_inert() {
        let log = Log::default();
        let (mut reg, _) = registry();
        reg.register(SessionKind::AutoRead2, recording_handler(&log));

        assert_eq!(reg.route(0x22, &tag()), 0);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn armed_kind_activates_on_success_response() {
        let log = Log::default();
        let (mut reg, flags) = registry();
        reg.register(SessionKind::AutoRead2, recording_handler(&log));
        reg.arm(SessionKind::AutoRead2, 0x36);

        reg.on_response(0x03, &[0x00]);
        assert!(!flags.is_active(SessionKind::AutoRead2));

        reg.on_response(0x36, &[0x00]);
        assert!(flags.is_active(SessionKind::AutoRead2));

        assert_eq!(reg.route(0x22, &tag()), 1);
        assert_eq!(reg.route(0x22, &tag()), 1);
        assert!(flags.is_active(SessionKind::AutoRead2));
        assert_eq!(*log.lock().unwrap(), ["AutoRead2:12", "AutoRead2:12"]);
    }

    #[test]
    fn non_success_response_or_failure_disarms() {
        let (mut reg, flags) = registry();
        reg.arm(SessionKind::AutoRead2, 0x36);
        reg.on_response(0x36, &[0x01]);
        reg.on_response(0x36, &[0x00]);
        assert!(!flags.is_active(SessionKind::AutoRead2));

        reg.arm(SessionKind::AutoRead2, 0x36);
        reg.on_failure(0x36);
        reg.on_response(0x36, &[0x00]);
        assert!(!flags.is_active(SessionKind::AutoRead2));
    }

    #[test]
    fn sentinel_completes_session() {
        let log = Log::default();
        let (mut reg, flags) = registry();
        reg.register(SessionKind::ReadTypeCUiiTid, recording_handler(&log));
        reg.activate(SessionKind::ReadTypeCUiiTid);

        assert_eq!(reg.route(0x25, &Bytes::from_static(&[0x1F])), 0);
        assert!(!flags.is_active(SessionKind::ReadTypeCUiiTid));
        assert_eq!(reg.route(0x25, &tag()), 0);
        assert_eq!(*log.lock().unwrap(), ["ReadTypeCUiiTid:done"]);
    }

    #[test]
    fn short_payload_does_not_reach_handler() {
        let log = Log::default();
        let (mut reg, flags) = registry();
        reg.register(SessionKind::AutoRead2, recording_handler(&log));
        reg.activate(SessionKind::AutoRead2);

        let mut short = tag().to_vec();
        short.truncate(2 + 11);
        assert_eq!(reg.route(0x22, &Bytes::from(short)), 0);
        assert!(flags.is_active(SessionKind::AutoRead2));
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn single_shot_clears_after_first_tag() {
        let log = Log::default();
        let (mut reg, flags) = registry();
        reg.register(SessionKind::ReadTypeCUii, recording_handler(&log));
        reg.activate(SessionKind::ReadTypeCUii);

        assert_eq!(reg.route(0x22, &tag()), 1);
        assert!(!flags.is_active(SessionKind::ReadTypeCUii));
        assert_eq!(reg.route(0x22, &tag()), 0);
    }

    #[test]
    fn shared_code_reaches_every_active_kind() {
        let log = Log::default();
        let (mut reg, _) = registry();
        reg.register(SessionKind::DtcScan, recording_handler(&log));
        reg.register(SessionKind::OptimumFrequencyHopping, recording_handler(&log));
        reg.activate(SessionKind::DtcScan);
        reg.activate(SessionKind::OptimumFrequencyHopping);

        let dtc = Bytes::from_static(&[1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(reg.route(0xCA, &dtc), 2);
        assert_eq!(
            *log.lock().unwrap(),
            ["DtcScan:0", "OptimumFrequencyHopping:0"]
        );
    }

    #[test]
    fn end_and_clear_reset_state() {
        let log = Log::default();
        let (mut reg, flags) = registry();
        reg.register(SessionKind::AutoRead2, recording_handler(&log));
        reg.activate(SessionKind::AutoRead2);
        reg.activate(SessionKind::DtcScan);

        reg.end(SessionKind::AutoRead2);
        assert!(!flags.is_active(SessionKind::AutoRead2));
        assert!(flags.is_active(SessionKind::DtcScan));

        reg.arm(SessionKind::AutoRead2, 0x36);
        reg.clear();
        reg.on_response(0x36, &[0x00]);
        assert!(!flags.is_active(SessionKind::AutoRead2));
        assert!(!flags.is_active(SessionKind::DtcScan));
    }
}
