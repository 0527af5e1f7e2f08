mod cancel;
mod scope;

pub use cancel::CancelToken;
pub use scope::{
    cleanup, with_cancel_and_done_and_wait, with_cancel_and_wait_group, CancelFn, CleanupGuard,
    WaitScope,
};
