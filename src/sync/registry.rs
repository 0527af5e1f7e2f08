use std::collections::HashMap;

use flume::{Receiver, Sender};

use crate::error::UsageError;

pub(crate) type WaiterId = u64;

/// Counter and waiter registry of a wait group, always mutated as one unit
/// under the wait group's lock.
pub(crate) struct State {
    counter: usize,
    next_id: WaiterId,
    waiters: Option<HashMap<WaiterId, Sender<()>>>,
}

impl State {
    pub(crate) const fn new() -> Self {
        State {
            counter: 0,
            next_id: 0,
            waiters: None,
        }
    }

    pub(crate) fn construct(&mut self) {
        self.waiters();
    }

    fn waiters(&mut self) -> &mut HashMap<WaiterId, Sender<()>> {
        self.waiters.get_or_insert_with(HashMap::new)
    }
}

impl State {
    pub(crate) fn counter(&self) -> usize {
        self.counter
    }

    pub(crate) fn waiter_count(&self) -> usize {
        self.waiters.as_ref().map_or(0, HashMap::len)
    }

    pub(crate) fn increment(&mut self, delta: usize) -> Result<usize, UsageError> {
        self.counter = self
            .counter
            .checked_add(delta)
            .ok_or(UsageError::CounterOverflow {
                counter: self.counter,
                delta,
            })?;
        Ok(self.counter)
    }

    pub(crate) fn decrement(&mut self) -> Result<usize, UsageError> {
        self.counter = self
            .counter
            .checked_sub(1)
            .ok_or(UsageError::NegativeCounter)?;
        Ok(self.counter)
    }
}

impl State {
    /// Registers a new waiter and hands back the receiving end of its slot.
    pub(crate) fn register(&mut self) -> (WaiterId, Receiver<()>) {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        // one slot so the broadcast never blocks, even for abandoned waiters
        let (sender, receiver) = flume::bounded(1);
        self.waiters().insert(id, sender);
        (id, receiver)
    }

    pub(crate) fn deregister(&mut self, id: WaiterId) -> bool {
        self.waiters().remove(&id).is_some()
    }

    /// Notifies and deregisters every waiter, returning how many were notified.
    pub(crate) fn notify_all(&mut self) -> usize {
        self.waiters()
            .drain()
            .filter(|(_, sender)| sender.try_send(()).is_ok())
            .count()
    }
}
