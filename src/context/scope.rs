use std::{sync::Arc, time::Duration};

use tracing::debug;

use crate::{
    config::DEFAULT_CLEANUP_TIMEOUT,
    sync::{DoneFn, SharedWaitGroup, TimeoutWaitGroup, WaitFn, WaitOutcome},
};

use super::cancel::CancelToken;

/// A bound ``cancel`` call of some scope's token.
pub type CancelFn = Arc<dyn Fn() + Send + Sync>;

/// Wait Scope
///
/// A cancellation token paired with the wait group every unit of work in the
/// scope reports to. Scopes are derived from a parent with
/// [`with_cancel_and_wait_group`] or [`with_cancel_and_done_and_wait`]; a derived
/// scope inherits its parent's wait group unless it is given its own, so waiting
/// on the top-level wait group waits for every nested scope.
#[derive(Clone, Debug)]
pub struct WaitScope {
    token: CancelToken,
    wait_group: Option<SharedWaitGroup>,
}

impl WaitScope {
    /// The root scope: a token nobody else can reach and no wait group
    pub fn background() -> Self {
        Self::from_token(CancelToken::new())
    }

    /// A root scope observing an existing token
    pub fn from_token(token: CancelToken) -> Self {
        WaitScope {
            token,
            wait_group: None,
        }
    }

    /// The scope's cancellation token
    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    /// The wait group carried by the scope, if any
    pub fn wait_group(&self) -> Option<&SharedWaitGroup> {
        self.wait_group.as_ref()
    }

    /// A Boolean value that indicates whether the scope has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Default for WaitScope {
    fn default() -> Self {
        Self::background()
    }
}

/// Derives a cancellable scope carrying a wait group
///
/// The wait group is resolved as: the one given explicitly, else the one the
/// parent carries, else a fresh [`TimeoutWaitGroup`]. It is attached to the
/// derived scope and returned as is; its counter is left alone.
///
/// # Parameters
///
/// * `parent`: scope to derive from, its token cancels the derived one
/// * `wait_group`: wait group to attach instead of the inherited one
///
/// # Returns
///
/// The derived scope, a function cancelling it and the resolved wait group
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use timeout_waitgroup::{with_cancel_and_wait_group, WaitScope};
///
/// let (scope, cancel, wg) = with_cancel_and_wait_group(&WaitScope::background(), None);
/// let (nested, _cancel, nested_wg) = with_cancel_and_wait_group(&scope, None);
/// assert!(Arc::ptr_eq(&wg, &nested_wg));
///
/// cancel();
/// assert!(nested.is_cancelled());
/// ```
pub fn with_cancel_and_wait_group(
    parent: &WaitScope,
    wait_group: Option<SharedWaitGroup>,
) -> (WaitScope, CancelFn, SharedWaitGroup) {
    let wait_group = match (wait_group, &parent.wait_group) {
        (Some(explicit), _) => explicit,
        (None, Some(inherited)) => inherited.clone(),
        (None, None) => {
            debug!("scope has no wait group, creating one");
            Arc::new(TimeoutWaitGroup::new())
        }
    };

    let token = parent.token.child();
    let canceller = token.clone();
    let cancel: CancelFn = Arc::new(move || canceller.cancel());

    let scope = WaitScope {
        token,
        wait_group: Some(wait_group.clone()),
    };
    (scope, cancel, wait_group)
}

/// Derives a cancellable scope and registers one unit of work with its wait group
///
/// Works like [`with_cancel_and_wait_group`], then calls ``add(1)`` on the
/// resolved wait group and hands back its ``done`` and ``wait_for`` bound to it,
/// so entering a scope is what registers the caller as a unit of work.
///
/// # Example
///
/// ```rust
/// use std::{thread, time::Duration};
/// use timeout_waitgroup::{with_cancel_and_done_and_wait, WaitOutcome, WaitScope};
///
/// let (scope, cancel, done, wait) = with_cancel_and_done_and_wait(&WaitScope::background(), None);
///
/// let (worker_scope, _, worker_done, _) = with_cancel_and_done_and_wait(&scope, None);
/// let handle = thread::spawn(move || {
///     worker_scope.token().wait();
///     worker_done();
/// });
///
/// cancel();
/// done();
/// assert_eq!(wait(Some(Duration::from_secs(5))), WaitOutcome::Drained);
/// handle.join().unwrap();
/// ```
pub fn with_cancel_and_done_and_wait(
    parent: &WaitScope,
    wait_group: Option<SharedWaitGroup>,
) -> (WaitScope, CancelFn, DoneFn, WaitFn) {
    let (scope, cancel, wait_group) = with_cancel_and_wait_group(parent, wait_group);

    wait_group.add(1);

    let done_group = wait_group.clone();
    let done: DoneFn = Arc::new(move || done_group.done());
    let wait: WaitFn = Arc::new(move |timeout| wait_group.wait_for(timeout));

    (scope, cancel, done, wait)
}

/// Cancels, marks done and then waits
///
/// # Parameters
///
/// * `cancel`: cancels the scope
/// * `done`: marks the caller's unit of work as finished
/// * `wait`: waits for the rest of the scope
/// * `timeout`: bound on the wait, [`DEFAULT_CLEANUP_TIMEOUT`] if ``None``
pub fn cleanup(
    cancel: &CancelFn,
    done: &DoneFn,
    wait: &WaitFn,
    timeout: Option<Duration>,
) -> WaitOutcome {
    cancel();
    done();
    let outcome = wait(Some(timeout.unwrap_or(DEFAULT_CLEANUP_TIMEOUT)));
    if outcome.is_timed_out() {
        debug!("cleanup gave up waiting for the scope");
    }
    outcome
}

/// Cleanup Guard
///
/// Runs [`cleanup`] when dropped, so a scope is released on every exit path of
/// the function holding the guard, panics included.
///
/// # Example
///
/// ```rust
/// use timeout_waitgroup::{with_cancel_and_done_and_wait, CleanupGuard, WaitScope};
///
/// let (scope, cancel, done, wait) = with_cancel_and_done_and_wait(&WaitScope::background(), None);
/// {
///     let _guard = CleanupGuard::new(cancel, done, wait);
///     // work until the end of the block
/// }
/// assert!(scope.is_cancelled());
/// ```
#[must_use = "the cleanup runs when the guard is dropped"]
pub struct CleanupGuard {
    cancel: CancelFn,
    done: DoneFn,
    wait: WaitFn,
    timeout: Option<Duration>,
    armed: bool,
}

impl CleanupGuard {
    /// Arms a guard running [`cleanup`] with the default timeout when dropped
    pub fn new(cancel: CancelFn, done: DoneFn, wait: WaitFn) -> Self {
        CleanupGuard {
            cancel,
            done,
            wait,
            timeout: None,
            armed: true,
        }
    }

    /// Bounds the final wait by ``timeout`` instead of the default
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Runs the cleanup now rather than on drop
    pub fn run(mut self) -> WaitOutcome {
        self.fire()
    }

    fn fire(&mut self) -> WaitOutcome {
        self.armed = false;
        cleanup(&self.cancel, &self.done, &self.wait, self.timeout)
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if self.armed {
            self.fire();
        }
    }
}
