//! Cancellation and deadline context for store operations
//!
//! A caller builds one `OpContext` per logical request. The pool checks it
//! while waiting for a connection. Sessions check it before every statement,
//! poll it from SQLite's progress handler so a running statement is
//! interrupted, and use the remaining time to bound SQLite's lock wait.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::errors::{storage, Result};

/// Shared flag a caller flips to abort in-flight work
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Default)]
pub struct OpContext {
    deadline: Option<Instant>,
    cancel: Option<CancelToken>,
}

impl OpContext {
    /// No deadline, not cancellable
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::default().with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline; `None` when there is no deadline
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Fail fast if the caller gave up
    ///
    /// # Errors
    ///
    /// Storage error naming `op` when cancelled or past the deadline.
    pub fn check(&self, op: &str) -> Result<()> {
        match self.stop_reason() {
            Some(reason) => Err(storage(op, reason)),
            None => Ok(()),
        }
    }

    /// Cancelled or past the deadline
    pub fn is_done(&self) -> bool {
        self.stop_reason().is_some()
    }

    fn stop_reason(&self) -> Option<&'static str> {
        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            return Some("operation cancelled");
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some("deadline exceeded"),
            _ => None,
        }
    }

    /// The tighter of `bound` and the time left on this context
    pub fn clamp(&self, bound: Duration) -> Duration {
        match self.remaining() {
            Some(remaining) => remaining.min(bound),
            None => bound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adplace_core::ExErrorKind;

    #[test]
    fn test_background_never_fails() {
        assert!(OpContext::background().check("op").is_ok());
        assert_eq!(OpContext::background().remaining(), None);
    }

    #[test]
    fn test_past_deadline_is_storage_error() {
        let ctx = OpContext::background().with_deadline(Instant::now() - Duration::from_millis(1));
        let err = ctx.check("select_ads").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Storage);
        assert!(err.message().contains("deadline"));
    }

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancelToken::new();
        let ctx = OpContext::background().with_cancel(token.clone());
        assert!(ctx.check("op").is_ok());

        assert!(!ctx.is_done());
        token.cancel();
        assert!(ctx.is_done());
        let err = ctx.check("op").unwrap_err();
        assert!(err.message().contains("cancelled"));
    }

    #[test]
    fn test_clamp_prefers_shorter_bound() {
        let ctx = OpContext::with_timeout(Duration::from_secs(60));
        assert_eq!(ctx.clamp(Duration::from_millis(5)), Duration::from_millis(5));
        assert_eq!(
            OpContext::background().clamp(Duration::from_secs(3)),
            Duration::from_secs(3)
        );
    }
}
