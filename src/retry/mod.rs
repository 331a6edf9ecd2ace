//! Retry loops used by the transport executor and the completion tracker.
//!
//! Each unit of work reports an [`Attempt`]: either stop with a final result,
//! or continue with an optional pending error. Stopping is the only way a
//! unit of work ends the loop early, whether it succeeded or failed for good.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::context::{CallContext, ContextError};

/// Outcome of a single unit of work inside a retry loop.
#[derive(Debug, Eq, PartialEq)]
pub enum Attempt<T, E> {
    /// End the loop with this result.
    Stop(Result<T, E>),
    /// Run again; the error, if any, is remembered as the pending error.
    Continue(Option<E>),
}

/// Error returned by [`retry_with_limit`].
#[derive(Debug, Eq, PartialEq)]
pub enum RetryError<E> {
    /// The unit of work stopped the loop with this error.
    Stopped(E),
    /// The retry budget ran out. Carries the error of the final attempt.
    Exhausted(Option<E>),
    /// The call context finished while waiting between attempts.
    Interrupted(ContextError),
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped(err) => err.fmt(f),
            Self::Exhausted(Some(err)) => write!(
                f,
                "maximum number of trials has been exhausted with error: {err}"
            ),
            Self::Exhausted(None) => f.write_str("maximum number of trials has been exhausted"),
            Self::Interrupted(err) => err.fmt(f),
        }
    }
}

impl<E> std::error::Error for RetryError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Stopped(err) | Self::Exhausted(Some(err)) => Some(err),
            Self::Exhausted(None) => None,
            Self::Interrupted(err) => Some(err),
        }
    }
}

/// Linear backoff: the wait before retry `n` (1-based) is `delay * n`.
#[must_use]
pub const fn backoff_delay(delay: Duration, retry: u32) -> Duration {
    delay.saturating_mul(retry)
}

/// Runs `work` up to `max_retries + 1` times.
///
/// The first attempt runs immediately. Before retry `n` the loop sleeps for
/// `delay * n`, so the total wait after `N` retries is `delay * (1 + … + N)`.
/// `work` receives the 1-based attempt number.
///
/// # Errors
///
/// Returns [`RetryError::Stopped`] when `work` stops with an error,
/// [`RetryError::Exhausted`] when every attempt asked to continue, and
/// [`RetryError::Interrupted`] when `ctx` finishes during a backoff sleep.
pub async fn retry_with_limit<T, E, F, Fut>(
    ctx: &CallContext,
    max_retries: u32,
    delay: Duration,
    mut work: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Attempt<T, E>>,
{
    let mut pending = None;
    for retry in 0..=max_retries {
        if retry > 0 {
            let wait = backoff_delay(delay, retry);
            debug!(retry, wait_ms = wait.as_millis(), "backing off before retry");
            ctx.sleep(wait).await.map_err(RetryError::Interrupted)?;
        }
        match work(retry + 1).await {
            Attempt::Stop(result) => return result.map_err(RetryError::Stopped),
            Attempt::Continue(err) => pending = err,
        }
    }
    Err(RetryError::Exhausted(pending))
}

/// Runs `work` until it stops or `ctx` finishes, sleeping `delay` before
/// every attempt.
///
/// The context is checked before each sleep; a context that is already done
/// returns its error without invoking `work`.
///
/// # Errors
///
/// Returns the error `work` stopped with, or the [`ContextError`] converted
/// into `E` once the context is cancelled or its deadline passes.
pub async fn retry_with_context<T, E, F, Fut>(
    ctx: &CallContext,
    delay: Duration,
    mut work: F,
) -> Result<T, E>
where
    E: From<ContextError>,
    F: FnMut() -> Fut,
    Fut: Future<Output = Attempt<T, E>>,
{
    loop {
        if let Some(err) = ctx.err() {
            return Err(err.into());
        }
        ctx.sleep(delay).await?;
        match work().await {
            Attempt::Stop(result) => return result,
            Attempt::Continue(_) => debug!("operation still in progress"),
        }
    }
}
