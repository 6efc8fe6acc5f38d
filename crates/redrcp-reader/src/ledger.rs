use std::collections::HashMap;
use std::sync::Mutex;

use crate::error_code::ErrorCode;

/// Most recent error reported by the reader, per command and overall.
///
/// Written only by the receive path when a command-failure frame arrives;
/// readable from any thread. Entries are overwritten, never cleared, until
/// the ledger is reset on connect.
#[derive(Debug)]
pub struct ErrorLedger {
    inner: Mutex<LedgerState>,
}

#[derive(Debug)]
struct LedgerState {
    by_code: HashMap<u8, ErrorCode>,
    last: ErrorCode,
}

impl Default for LedgerState {
    fn default() -> Self {
        Self {
            by_code: HashMap::new(),
            last: ErrorCode::OtherError,
        }
    }
}

impl ErrorLedger {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(LedgerState::default()),
        }
    }

    /// Record a failure of `code`, replacing any earlier entry and the overall value.
    pub fn record_failure(&self, code: u8, error: ErrorCode) {
        let mut state = self.lock();
        state.by_code.insert(code, error);
        state.last = error;
    }

    /// Last error reported for `code`, if the reader ever rejected it.
    pub fn last_error_for(&self, code: u8) -> Option<ErrorCode> {
        self.lock().by_code.get(&code).copied()
    }

    /// Last error reported for any command. `OtherError` until the first failure.
    pub fn last_error(&self) -> ErrorCode {
        self.lock().last
    }

    pub(crate) fn reset(&self) {
        *self.lock() = LedgerState::default();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LedgerState> {
        // The state is two plain values; a panic mid-update cannot leave it torn.
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ErrorLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_ledger() {
        let ledger = ErrorLedger::new();
        assert_eq!(ledger.last_error_for(0x36), None);
        assert_eq!(ledger.last_error(), ErrorCode::OtherError);
    }

    #[test]
    fn records_per_code_and_overall() {
        let ledger = ErrorLedger::new();
        ledger.record_failure(0x36, ErrorCode::InsufficientPrivileges);
        ledger.record_failure(0x16, ErrorCode::TooHighParameter);

        assert_eq!(
            ledger.last_error_for(0x36),
            Some(ErrorCode::InsufficientPrivileges)
        );
        assert_eq!(ledger.last_error_for(0x16), Some(ErrorCode::TooHighParameter));
        assert_eq!(ledger.last_error(), ErrorCode::TooHighParameter);
    }

    #[test]
    fn later_failure_overwrites() {
        let ledger = ErrorLedger::new();
        ledger.record_failure(0x36, ErrorCode::InsufficientPrivileges);
        ledger.record_failure(0x36, ErrorCode::AutomaticReadInOperation);
        assert_eq!(
            ledger.last_error_for(0x36),
            Some(ErrorCode::AutomaticReadInOperation)
        );
    }

    #[test]
    fn reset_restores_initial_state() {
        let ledger = ErrorLedger::new();
        ledger.record_failure(0x36, ErrorCode::NoTagDetected);
        ledger.reset();
        assert_eq!(ledger.last_error_for(0x36), None);
        assert_eq!(ledger.last_error(), ErrorCode::OtherError);
    }
}
