//! Per-call request context.
//!
//! A [`RequestContext`] carries an optional deadline and a cancellation
//! token. It is passed into every transport call rather than stored on the
//! client, so callers can impose an outer deadline that composes with the
//! bound each operation applies on its own.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::TransportError;

/// Shared cancellation flag.
///
/// Cloning yields a handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token that is not yet cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Observed at the next network call boundary.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Deadline and cancellation scope for network calls.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    deadline: Option<Instant>,
    cancel: CancelToken,
}

impl RequestContext {
    /// A context with no deadline and a fresh cancellation token.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derive a context bounded by `timeout` from now.
    ///
    /// The tighter of the existing deadline and the new one wins; the
    /// cancellation token is shared with the parent.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(existing) if existing < candidate => existing,
            _ => candidate,
        };
        Self {
            deadline: Some(deadline),
            cancel: self.cancel.clone(),
        }
    }

    /// Derive a context observing the given cancellation token.
    pub fn with_cancel(&self, cancel: CancelToken) -> Self {
        Self {
            deadline: self.deadline,
            cancel,
        }
    }

    /// The absolute deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The cancellation token observed by this context.
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Time left before the deadline, if one is set.
    ///
    /// Returns `Some(Duration::ZERO)` once the deadline has passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Fail fast if the context is cancelled or out of time.
    pub fn check(&self) -> Result<(), TransportError> {
        if self.cancel.is_cancelled() {
            return Err(TransportError::Cancelled);
        }
        if self.remaining() == Some(Duration::ZERO) {
            return Err(TransportError::DeadlineExceeded);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_has_no_deadline() {
        let ctx = RequestContext::background();
        assert!(ctx.deadline().is_none());
        assert!(ctx.remaining().is_none());
        assert!(ctx.check().is_ok());
    }

    #[test]
    fn tighter_deadline_wins() {
        let outer = RequestContext::background().with_timeout(Duration::from_secs(1));
        let inner = outer.with_timeout(Duration::from_secs(60));
        assert_eq!(inner.deadline(), outer.deadline());

        let narrower = outer.with_timeout(Duration::from_millis(10));
        assert!(narrower.deadline() < outer.deadline());
    }

    #[test]
    fn expired_deadline_fails_check() {
        let ctx = RequestContext::background().with_timeout(Duration::ZERO);
        assert!(matches!(ctx.check(), Err(TransportError::DeadlineExceeded)));
    }

    #[test]
    fn cancellation_is_shared_with_children() {
        let ctx = RequestContext::background();
        let child = ctx.with_timeout(Duration::from_secs(30));

        ctx.cancel_token().cancel();

        assert!(matches!(child.check(), Err(TransportError::Cancelled)));
    }

    #[test]
    fn with_cancel_keeps_deadline() {
        let ctx = RequestContext::background().with_timeout(Duration::from_secs(5));
        let token = CancelToken::new();
        let derived = ctx.with_cancel(token.clone());

        assert_eq!(derived.deadline(), ctx.deadline());
        token.cancel();
        assert!(derived.check().is_err());
        assert!(ctx.check().is_ok());
    }
}
