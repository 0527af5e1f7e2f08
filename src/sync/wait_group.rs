use std::{
    fmt,
    sync::atomic::{AtomicBool, Ordering},
    time::{Duration, Instant},
};

use flume::{Receiver, RecvTimeoutError};
use parking_lot::{const_mutex, Mutex, Once};
use tracing::{debug, trace};

use crate::error::UsageError;

use super::{
    registry::{State, WaiterId},
    traits::{WaitGroup, WaitOutcome},
};

/// Timeout Wait Group
///
/// A counting wait group whose waiters may each give up after their own timeout.
///
/// Like a conventional wait group the counter is raised with ``add`` and lowered
/// with ``done``; every ``wait`` call blocks until the counter returns to zero.
/// Unlike one, any number of threads may wait at once, each with an optional
/// timeout of its own, and a waiter that times out never disturbs the counter
/// or the other waiters.
///
/// ``TimeoutWaitGroup::new`` is a ``const fn``, so a wait group can live in a
/// ``static`` and is ready to use without any runtime setup.
///
/// # Example
///
/// ```rust
/// use std::{sync::Arc, thread, time::Duration};
/// use timeout_waitgroup::{TimeoutWaitGroup, WaitOutcome};
///
/// let wg = Arc::new(TimeoutWaitGroup::new());
///
/// // a fresh wait group falls straight through
/// assert_eq!(wg.wait(), WaitOutcome::Drained);
///
/// wg.add(1);
/// let worker = wg.clone();
/// let handle = thread::spawn(move || {
///     thread::sleep(Duration::from_millis(50));
///     worker.done();
/// });
///
/// assert_eq!(wg.wait_timeout(Duration::from_millis(1)), WaitOutcome::TimedOut);
/// assert_eq!(wg.wait(), WaitOutcome::Drained);
/// handle.join().unwrap();
/// ```
pub struct TimeoutWaitGroup {
    constructed: AtomicBool,
    construct: Once,
    state: Mutex<State>,
}

impl TimeoutWaitGroup {
    /// Creates an empty wait group
    pub const fn new() -> Self {
        TimeoutWaitGroup {
            constructed: AtomicBool::new(false),
            construct: Once::new(),
            state: const_mutex(State::new()),
        }
    }

    // the flag keeps repeat callers off the Once after the first use
    fn construct_if_required(&self) {
        if self.constructed.load(Ordering::Acquire) {
            return;
        }
        self.construct.call_once(|| {
            self.state.lock().construct();
            self.constructed.store(true, Ordering::Release);
            trace!("wait group constructed");
        });
    }
}

impl TimeoutWaitGroup {
    /// Increments the counter by the given amount
    ///
    /// # Parameters
    ///
    /// * `delta`: number of units of work to add
    ///
    /// # Panics
    ///
    /// Panics if the counter would overflow.
    pub fn add(&self, delta: usize) {
        if let Err(error) = self.try_add(delta) {
            panic!("{error}");
        }
    }

    /// Increments the counter by the given amount, returning an error instead of
    /// panicking on overflow
    pub fn try_add(&self, delta: usize) -> Result<(), UsageError> {
        self.construct_if_required();
        self.state.lock().increment(delta)?;
        Ok(())
    }

    /// Decrements the counter, waking every registered waiter when it reaches zero
    ///
    /// # Panics
    ///
    /// Panics if the counter is already zero, i.e. ``done`` was called more often
    /// than the ``add``s allowed for.
    pub fn done(&self) {
        if let Err(error) = self.try_done() {
            panic!("{error}");
        }
    }

    /// Decrements the counter, returning an error instead of panicking if it is
    /// already zero
    pub fn try_done(&self) -> Result<(), UsageError> {
        self.construct_if_required();
        let mut state = self.state.lock();
        if state.decrement()? > 0 {
            return Ok(());
        }
        let notified = state.notify_all();
        drop(state);
        if notified > 0 {
            trace!(notified, "wait group drained");
        }
        Ok(())
    }
}

impl TimeoutWaitGroup {
    /// Blocks until the counter reaches zero
    pub fn wait(&self) -> WaitOutcome {
        self.wait_for(None)
    }

    /// Blocks until the counter reaches zero or the timeout elapses, whichever
    /// comes first
    pub fn wait_timeout(&self, timeout: Duration) -> WaitOutcome {
        self.wait_for(Some(timeout))
    }

    /// Blocks until the counter reaches zero or, if one is given, the timeout
    /// elapses
    ///
    /// # Parameters
    ///
    /// * `timeout`: how long to wait at most, ``None`` waits indefinitely
    ///
    /// # Returns
    ///
    /// - ``WaitOutcome::Drained``: the counter was or became zero
    /// - ``WaitOutcome::TimedOut``: the timeout elapsed first
    pub fn wait_for(&self, timeout: Option<Duration>) -> WaitOutcome {
        let Some(registration) = self.register() else {
            return WaitOutcome::Drained;
        };
        match timeout {
            None => registration.park(),
            Some(timeout) => registration.park_timeout(timeout),
        }
    }

    /// Waits asynchronously until the counter reaches zero
    ///
    /// Dropping the returned future before it completes deregisters the waiter.
    ///
    /// # Example
    ///
    /// ```rust
    /// use timeout_waitgroup::TimeoutWaitGroup;
    ///
    /// let wg = TimeoutWaitGroup::new();
    /// wg.add(1);
    /// wg.done();
    /// futures_lite::future::block_on(wg.wait_async());
    /// ```
    pub async fn wait_async(&self) {
        if let Some(registration) = self.register() {
            _ = registration.receiver.recv_async().await;
        }
    }

    fn register(&self) -> Option<Registration<'_>> {
        self.construct_if_required();
        let mut state = self.state.lock();
        if state.counter() == 0 {
            return None;
        }
        let (id, receiver) = state.register();
        trace!(id, "waiter registered");
        Some(Registration {
            group: self,
            id,
            receiver,
        })
    }
}

impl TimeoutWaitGroup {
    /// Number of outstanding units of work at the time of the call
    pub fn count(&self) -> usize {
        self.state.lock().counter()
    }

    /// Number of waiters currently blocked on this wait group
    pub fn waiter_count(&self) -> usize {
        self.state.lock().waiter_count()
    }

    /// A Boolean value that indicates whether the counter is zero
    pub fn is_drained(&self) -> bool {
        self.count() == 0
    }
}

impl Default for TimeoutWaitGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TimeoutWaitGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("TimeoutWaitGroup")
            .field("counter", &state.counter())
            .field("waiters", &state.waiter_count())
            .finish()
    }
}

impl WaitGroup for TimeoutWaitGroup {
    fn add(&self, delta: usize) {
        TimeoutWaitGroup::add(self, delta)
    }

    fn done(&self) {
        TimeoutWaitGroup::done(self)
    }

    fn wait_for(&self, timeout: Option<Duration>) -> WaitOutcome {
        TimeoutWaitGroup::wait_for(self, timeout)
    }
}

/// A registered waiter, deregistered on drop whichever way the wait ends.
struct Registration<'a> {
    group: &'a TimeoutWaitGroup,
    id: WaiterId,
    receiver: Receiver<()>,
}

impl Registration<'_> {
    fn park(&self) -> WaitOutcome {
        // the sender only goes away after posting to the slot
        _ = self.receiver.recv();
        WaitOutcome::Drained
    }

    fn park_timeout(&self, timeout: Duration) -> WaitOutcome {
        // a timeout past the end of the clock never elapses
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return self.park();
        };
        match self.receiver.recv_deadline(deadline) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => WaitOutcome::Drained,
            Err(RecvTimeoutError::Timeout) if self.receiver.try_recv().is_ok() => {
                WaitOutcome::Drained
            }
            Err(RecvTimeoutError::Timeout) => {
                debug!(id = self.id, ?timeout, "wait timed out");
                WaitOutcome::TimedOut
            }
        }
    }
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        if self.group.state.lock().deregister(self.id) {
            trace!(id = self.id, "waiter deregistered");
        }
    }
}
