use thiserror::Error;

/// Contract violations of a wait group.
///
/// The panicking methods ([`add`](crate::TimeoutWaitGroup::add),
/// [`done`](crate::TimeoutWaitGroup::done)) abort with these messages; the
/// ``try_`` variants hand them back instead.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageError {
    #[error("timeout_waitgroup: negative TimeoutWaitGroup counter")]
    NegativeCounter,

    #[error("timeout_waitgroup: TimeoutWaitGroup counter overflow (counter {counter}, delta {delta})")]
    CounterOverflow { counter: usize, delta: usize },
}

/// Failure to listen for the interrupt signal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InterruptError {
    #[error("failed to install the interrupt handler: {0}")]
    Install(String),
}

impl From<ctrlc::Error> for InterruptError {
    fn from(error: ctrlc::Error) -> Self {
        InterruptError::Install(error.to_string())
    }
}
