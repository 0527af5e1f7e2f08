mod registry;
mod traits;
mod wait_group;

pub use traits::{DoneFn, SharedWaitGroup, WaitFn, WaitGroup, WaitOutcome};
pub use wait_group::TimeoutWaitGroup;
