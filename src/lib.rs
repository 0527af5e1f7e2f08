//! A counting wait group that any number of threads can wait on, each with a timeout of its own,
//! plus cancellable wait scopes and a Ctrl+C shutdown helper built on top of it.
//!
//! # Installation
//! Add to your source code
//!
//! ```sh
//! cargo add timeout_waitgroup
//! ```
//!
//! # Example
//!
//! ```rust
//! use std::{sync::Arc, thread, time::Duration};
//! use timeout_waitgroup::{TimeoutWaitGroup, WaitOutcome};
//!
//! let wg = Arc::new(TimeoutWaitGroup::new());
//!
//! for _ in 0..4 {
//!     wg.add(1);
//!     let wg = wg.clone();
//!     thread::spawn(move || {
//!         // some work
//!         thread::sleep(Duration::from_millis(10));
//!         wg.done();
//!     });
//! }
//!
//! // an impatient observer gives up early without disturbing anyone else
//! let impatient = wg.clone();
//! let handle = thread::spawn(move || impatient.wait_timeout(Duration::from_nanos(1)));
//!
//! assert_eq!(wg.wait(), WaitOutcome::Drained);
//! let _ = handle.join().unwrap();
//! ```
//!
//! # Usage
//!
//! To properly use this crate
//! * ``TimeoutWaitGroup`` counts outstanding units of work with ``add`` and ``done`` and lets
//! any number of callers ``wait``, ``wait_timeout`` or ``wait_async`` for the count to reach zero.
//! See [`TimeoutWaitGroup`](self::TimeoutWaitGroup) for more information
//!
//! * ``with_cancel_and_wait_group`` and ``with_cancel_and_done_and_wait`` derive a cancellable
//! [`WaitScope`](self::WaitScope) that carries a wait group shared with every nested scope.
//! See [`with_cancel_and_done_and_wait`](self::with_cancel_and_done_and_wait) for more information
//!
//! * ``cleanup`` and ``CleanupGuard`` release a scope: cancel, done, then a bounded wait.
//! See [`cleanup`](self::cleanup) for more information
//!
//! * ``wait_for_interrupt`` parks the calling thread until its scope is cancelled or Ctrl+C is
//! pressed, then runs the same cleanup. See [`wait_for_interrupt`](self::wait_for_interrupt)
//! for more information
//!
//! # Waiting
//!
//! A wait on a wait group whose counter is already zero returns immediately. Otherwise the
//! caller is registered and blocks until the ``done`` call that brings the counter to zero
//! wakes every registered waiter at once, or until its own timeout elapses. Each wait tells
//! which of the two happened through [`WaitOutcome`](self::WaitOutcome).
//!
//! # Warning
//! * Calling ``done`` more often than the ``add``s allowed for panics
//! * This crate blocks OS threads, use ``wait_async`` from inside an async executor
//! * ``wait_for_interrupt`` takes over the process' SIGINT handling through ``ctrlc``

pub mod config;
mod context;
mod error;
mod interrupt;
mod sync;

pub use context::{
    cleanup, with_cancel_and_done_and_wait, with_cancel_and_wait_group, CancelFn, CancelToken,
    CleanupGuard, WaitScope,
};
pub use error::{InterruptError, UsageError};
pub use interrupt::{install as install_interrupt_handler, wait_for_interrupt, InterruptCause};
pub use sync::{DoneFn, SharedWaitGroup, TimeoutWaitGroup, WaitFn, WaitGroup, WaitOutcome};
