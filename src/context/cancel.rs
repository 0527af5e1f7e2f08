use std::{
    fmt,
    sync::{Arc, Weak},
    time::{Duration, Instant},
};

use flume::{Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;

/// Cancel Token
///
/// A cloneable "please stop" flag. Tokens form a tree: cancelling a token
/// cancels every token derived from it with [`child`](CancelToken::child), while
/// cancelling a child leaves its parent untouched.
///
/// Cancellation is observable by polling [`is_cancelled`](CancelToken::is_cancelled),
/// by blocking on [`wait`](CancelToken::wait), by awaiting
/// [`cancelled`](CancelToken::cancelled) or through the channel returned by
/// [`done`](CancelToken::done), which disconnects once the token is cancelled.
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<State>,
    done: Receiver<()>,
}

struct State {
    // dropped on cancel, disconnecting every receiver of ``done``
    sender: Option<Sender<()>>,
    children: Vec<Weak<Inner>>,
}

impl CancelToken {
    /// Creates a new root token that is only ever cancelled explicitly
    pub fn new() -> Self {
        let (sender, done) = flume::bounded(0);
        CancelToken {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    sender: Some(sender),
                    children: Vec::new(),
                }),
                done,
            }),
        }
    }

    /// Derives a token that is cancelled together with this one
    ///
    /// A child derived from an already cancelled token starts out cancelled.
    pub fn child(&self) -> Self {
        let child = CancelToken::new();
        let mut state = self.inner.state.lock();
        if state.sender.is_none() {
            drop(state);
            child.cancel();
            return child;
        }
        state.children.retain(|weak| weak.strong_count() > 0);
        state.children.push(Arc::downgrade(&child.inner));
        child
    }

    /// Cancels this token and every token derived from it
    ///
    /// Calling ``cancel`` more than once has no further effect.
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    /// A Boolean value that indicates whether the token has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.inner.done.is_disconnected()
    }

    /// Returns a receiver that disconnects once the token is cancelled
    ///
    /// Nothing is ever sent on it, so ``recv`` returning an error means the token
    /// was cancelled. It can be raced against other channels with
    /// ``flume::Selector``.
    pub fn done(&self) -> Receiver<()> {
        self.inner.done.clone()
    }

    /// Blocks until the token is cancelled
    pub fn wait(&self) {
        _ = self.inner.done.recv();
    }

    /// Blocks until the token is cancelled or the timeout elapses
    ///
    /// # Returns
    ///
    /// - true: the token was cancelled
    /// - false: the timeout elapsed first
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            self.wait();
            return true;
        };
        matches!(
            self.inner.done.recv_deadline(deadline),
            Err(RecvTimeoutError::Disconnected)
        )
    }

    /// Waits asynchronously until the token is cancelled
    pub async fn cancelled(&self) {
        _ = self.inner.done.recv_async().await;
    }
}

impl Inner {
    fn cancel(&self) {
        let children = {
            let mut state = self.state.lock();
            if state.sender.take().is_none() {
                return;
            }
            std::mem::take(&mut state.children)
        };
        children
            .iter()
            .filter_map(Weak::upgrade)
            .for_each(|child| child.cancel());
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
