use std::sync::Arc;

use flume::Selector;
use tracing::info;

use crate::{
    context::{CancelFn, CancelToken, CleanupGuard},
    error::InterruptError,
    sync::{DoneFn, WaitFn, WaitOutcome},
};

use super::dispatcher::subscribe;

/// What ended a [`wait_for_interrupt`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterruptCause {
    /// The token was cancelled.
    Cancelled,
    /// An interrupt signal (Ctrl+C) arrived.
    Interrupted,
}

fn noop() -> CancelFn {
    Arc::new(|| {})
}

fn noop_wait() -> WaitFn {
    Arc::new(|_| WaitOutcome::Drained)
}

/// Blocks until ``token`` is cancelled or an interrupt signal arrives, then
/// cancels, marks done and waits
///
/// The cleanup always runs, whichever event ended the wait and even when
/// listening for the signal failed; the final wait is bounded by
/// [`DEFAULT_CLEANUP_TIMEOUT`](crate::config::DEFAULT_CLEANUP_TIMEOUT).
///
/// # Parameters
///
/// * `token`: token ending the wait when cancelled, ``None`` waits for the signal only
/// * `cancel`: cancels the caller's scope, no-op if ``None``
/// * `done`: marks the caller's unit of work as finished, no-op if ``None``
/// * `wait`: waits for the rest of the scope, no-op if ``None``
///
/// # Example
///
/// ```rust,no_run
/// use timeout_waitgroup::{with_cancel_and_done_and_wait, wait_for_interrupt, WaitScope};
///
/// let (scope, cancel, done, wait) = with_cancel_and_done_and_wait(&WaitScope::background(), None);
///
/// // hand ``scope`` to workers, each entering a nested scope of its own
///
/// wait_for_interrupt(Some(scope.token()), Some(cancel), Some(done), Some(wait))
///     .expect("no interrupt handler");
/// ```
pub fn wait_for_interrupt(
    token: Option<&CancelToken>,
    cancel: Option<CancelFn>,
    done: Option<DoneFn>,
    wait: Option<WaitFn>,
) -> Result<InterruptCause, InterruptError> {
    let _cleanup = CleanupGuard::new(
        cancel.unwrap_or_else(noop),
        done.unwrap_or_else(noop),
        wait.unwrap_or_else(noop_wait),
    );

    let subscription = subscribe()?;

    let cause = match token {
        Some(token) => {
            let cancelled = token.done();
            Selector::new()
                .recv(&cancelled, |_| InterruptCause::Cancelled)
                .recv(subscription.receiver(), |_| InterruptCause::Interrupted)
                .wait()
        }
        None => {
            _ = subscription.receiver().recv();
            InterruptCause::Interrupted
        }
    };

    info!(?cause, "shutting down");
    Ok(cause)
}
