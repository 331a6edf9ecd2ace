//! Cancellation and deadline plumbing shared by every API call.
//!
//! A [`CallContext`] travels with a logical operation. The transport executor
//! consults it before each physical attempt and the retry loops race their
//! inter-attempt sleeps against it, so a cancelled or expired call stops at the
//! next suspension point and reports the context error verbatim.

use std::time::Duration;

use thiserror::Error;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

/// Reasons a [`CallContext`] is considered done.
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
pub enum ContextError {
    /// The caller cancelled the operation.
    #[error("context canceled")]
    Cancelled,
    /// The deadline attached to the context elapsed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Cancellation token plus optional deadline for a single logical call.
#[derive(Clone, Debug, Default)]
pub struct CallContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// Context that is never cancelled and has no deadline.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// Context that expires `timeout` from now.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(Instant::now() + timeout),
        }
    }

    /// Context driven by an externally owned cancellation token.
    #[must_use]
    pub const fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Returns a copy of this context whose deadline is at most `timeout`
    /// from now. Cancellation of the parent still propagates.
    #[must_use]
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(existing) if existing < candidate => existing,
            _ => candidate,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    /// Token that cancels this context when triggered.
    #[must_use]
    pub const fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Deadline attached to this context, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancels the context.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns the reason the context is done, or `None` while it is live.
    /// Cancellation takes precedence over an elapsed deadline.
    #[must_use]
    pub fn err(&self) -> Option<ContextError> {
        if self.token.is_cancelled() {
            return Some(ContextError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolves once the context is cancelled or its deadline passes.
    pub async fn done(&self) -> ContextError {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    () = self.token.cancelled() => ContextError::Cancelled,
                    () = sleep_until(deadline) => ContextError::DeadlineExceeded,
                }
            }
            None => {
                self.token.cancelled().await;
                ContextError::Cancelled
            }
        }
    }

    /// Sleeps for `delay` unless the context finishes first, in which case
    /// the context error is returned.
    ///
    /// # Errors
    ///
    /// Returns the [`ContextError`] that interrupted the sleep.
    pub async fn sleep(&self, delay: Duration) -> Result<(), ContextError> {
        if let Some(err) = self.err() {
            return Err(err);
        }
        if delay.is_zero() {
            return Ok(());
        }
        tokio::select! {
            err = self.done() => Err(err),
            () = tokio::time::sleep(delay) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_context_is_live() {
        assert_eq!(CallContext::background().err(), None);
    }

    #[test]
    fn cancelled_context_reports_cancellation() {
        let ctx = CallContext::background();
        ctx.cancel();
        assert_eq!(ctx.err(), Some(ContextError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_elapses_after_timeout() {
        let ctx = CallContext::with_timeout(Duration::from_secs(2));
        assert_eq!(ctx.err(), None);
        tokio::time::advance(Duration::from_secs(3)).await;
        assert_eq!(ctx.err(), Some(ContextError::DeadlineExceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn sleep_is_interrupted_by_deadline() {
        let ctx = CallContext::with_timeout(Duration::from_millis(50));
        let result = ctx.sleep(Duration::from_secs(10)).await;
        assert_eq!(result, Err(ContextError::DeadlineExceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn child_keeps_the_earlier_deadline() {
        let parent = CallContext::with_timeout(Duration::from_secs(1));
        let child = parent.child_with_timeout(Duration::from_secs(60));
        assert_eq!(child.deadline(), parent.deadline());
    }

    #[test]
    fn cancelling_parent_cancels_child() {
        let parent = CallContext::background();
        let child = parent.child_with_timeout(Duration::from_secs(60));
        parent.cancel();
        assert_eq!(child.err(), Some(ContextError::Cancelled));
    }
}
