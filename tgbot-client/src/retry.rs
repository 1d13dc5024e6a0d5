//! Retry policies for the long poller's "sleep `retry_after` and retry" rule (§4.5).
//!
//! Ported from the teacher's FLOOD_WAIT-oriented policy: the Bot API plays
//! the identical role with a 429 response's `retry_after` parameter instead
//! of a `FLOOD_WAIT_n` RPC error name.

use std::num::NonZeroU32;
use std::ops::ControlFlow;
use std::time::Duration;

use crate::errors::TransportError;

/// Controls how the long poller reacts when `getUpdates` fails.
pub trait RetryPolicy: Send + Sync + 'static {
    fn should_retry(&self, ctx: &RetryContext) -> ControlFlow<(), Duration>;
}

/// Context passed to [`RetryPolicy::should_retry`] on each failure.
pub struct RetryContext {
    pub fail_count: NonZeroU32,
    pub slept_so_far: Duration,
    pub error: TransportError,
}

/// Never retry — the poller stops at the first transport error.
pub struct NoRetries;
impl RetryPolicy for NoRetries {
    fn should_retry(&self, _: &RetryContext) -> ControlFlow<(), Duration> {
        ControlFlow::Break(())
    }
}

/// Sleep `retry_after` on a 429 response (capped at `threshold`), a fixed
/// interval on a plain I/O error, and `fallback_delay` on anything else —
/// every transport error gets *some* sleep-and-retry, never a give-up
/// (§4.5: "on transport error other than cancellation, sleep `retry_after`
/// and retry" — only the poller's own cancellation ends the loop).
pub struct TooManyRequestsBackoff {
    /// Upper bound applied to a 429's own `retry_after`, so a server asking
    /// for an unreasonably long wait doesn't stall the poller for that long
    /// in one sleep (it will simply ask again after waking up).
    pub threshold: Duration,
    pub io_errors_as_wait_of: Option<Duration>,
    /// Sleep used for any transport error that isn't a 429 with
    /// `retry_after` or a plain I/O error (e.g. a malformed response).
    pub fallback_delay: Duration,
}

impl Default for TooManyRequestsBackoff {
    fn default() -> Self {
        Self {
            threshold: Duration::from_secs(60),
            io_errors_as_wait_of: Some(Duration::from_secs(1)),
            fallback_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy for TooManyRequestsBackoff {
    fn should_retry(&self, ctx: &RetryContext) -> ControlFlow<(), Duration> {
        if let Some(secs) = ctx.error.retry_after() {
            let capped = secs.min(self.threshold.as_secs().max(1));
            tracing::info!(retry_after = secs, capped, "Too Many Requests — sleeping before retry");
            return ControlFlow::Continue(Duration::from_secs(capped));
        }
        if matches!(ctx.error, TransportError::Io(_)) {
            if let Some(d) = self.io_errors_as_wait_of {
                tracing::info!(?d, "I/O error — sleeping before retry");
                return ControlFlow::Continue(d);
            }
        }
        tracing::warn!(
            error = %ctx.error,
            delay = ?self.fallback_delay,
            fail_count = ctx.fail_count.get(),
            "transport error — sleeping the fallback interval and retrying",
        );
        ControlFlow::Continue(self.fallback_delay)
    }
}
