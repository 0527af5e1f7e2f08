mod dispatcher;
mod wait;

pub use dispatcher::install;
pub use wait::{wait_for_interrupt, InterruptCause};
