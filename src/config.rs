use std::time::Duration;

/// Timeout used by [`cleanup`](crate::cleanup) and
/// [`wait_for_interrupt`](crate::wait_for_interrupt) when the caller supplies none.
pub const DEFAULT_CLEANUP_TIMEOUT: Duration = Duration::from_secs(60);

/// Number of pending interrupts each subscription can hold before further
/// deliveries are dropped, enough to survive Ctrl+C being spammed.
pub const INTERRUPT_BUFFER: usize = 128;
