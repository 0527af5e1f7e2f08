use std::{fmt, sync::Arc, time::Duration};

/// How a wait call returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaitOutcome {
    /// The counter reached zero, or already was zero when the wait started.
    Drained,
    /// The timeout elapsed first. The counter may still be non-zero.
    TimedOut,
}

impl WaitOutcome {
    /// Returns true if the wait observed the counter reaching zero.
    pub fn is_drained(self) -> bool {
        self == WaitOutcome::Drained
    }

    /// Returns true if the wait gave up because its timeout elapsed.
    pub fn is_timed_out(self) -> bool {
        self == WaitOutcome::TimedOut
    }
}

/// The capability set shared by every wait group the scope layer can carry.
///
/// Workers only ever need ``add`` and ``done``, supervisors only ``wait_for``.
pub trait WaitGroup: Send + Sync {
    /// Increments the counter by ``delta``
    fn add(&self, delta: usize);

    /// Decrements the counter by one, waking every waiter when it reaches zero
    ///
    /// # Panics
    ///
    /// Panics if the counter is already zero.
    fn done(&self);

    /// Blocks until the counter is zero or the optional timeout elapses
    fn wait_for(&self, timeout: Option<Duration>) -> WaitOutcome;
}

impl fmt::Debug for dyn WaitGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dyn WaitGroup")
    }
}

/// A wait group shared between scopes, workers and supervisors.
pub type SharedWaitGroup = Arc<dyn WaitGroup>;

/// A bound ``done`` call of some wait group.
pub type DoneFn = Arc<dyn Fn() + Send + Sync>;

/// A bound ``wait_for`` call of some wait group.
pub type WaitFn = Arc<dyn Fn(Option<Duration>) -> WaitOutcome + Send + Sync>;
