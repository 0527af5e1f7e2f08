use std::sync::{
    atomic::{AtomicU64, Ordering},
    OnceLock,
};

use flume::{Receiver, Sender};
use parking_lot::{const_mutex, Mutex};
use tracing::{debug, info, warn};

use crate::{config::INTERRUPT_BUFFER, error::InterruptError};

type SubscriptionId = u64;

// SIGINT can only have one handler per process, so it fans out from here
static SUBSCRIBERS: Mutex<Vec<(SubscriptionId, Sender<()>)>> = const_mutex(Vec::new());
static NEXT_ID: AtomicU64 = AtomicU64::new(0);
static INSTALLED: OnceLock<Result<(), InterruptError>> = OnceLock::new();

/// Installs the process-wide interrupt handler
///
/// [`wait_for_interrupt`](crate::wait_for_interrupt) installs it on first use;
/// calling this up front makes sure an interrupt arriving before then is not
/// handled by the default action of terminating the process. Further calls
/// return the result of the first one.
///
/// # Errors
///
/// Fails if another interrupt handler was already installed through ``ctrlc``
/// or the operating system refused the registration.
pub fn install() -> Result<(), InterruptError> {
    INSTALLED
        .get_or_init(|| match ctrlc::set_handler(broadcast) {
            Ok(()) => {
                debug!("interrupt handler installed");
                Ok(())
            }
            Err(error) => {
                warn!(%error, "could not install interrupt handler");
                Err(error.into())
            }
        })
        .clone()
}

fn broadcast() {
    let subscribers = SUBSCRIBERS.lock();
    info!(subscribers = subscribers.len(), "interrupt received");
    for (_, sender) in subscribers.iter() {
        // a full buffer already has plenty of interrupts pending
        _ = sender.try_send(());
    }
}

/// A live interest in interrupts, unsubscribed on drop.
pub(crate) struct Subscription {
    id: SubscriptionId,
    receiver: Receiver<()>,
}

impl Subscription {
    pub(crate) fn receiver(&self) -> &Receiver<()> {
        &self.receiver
    }
}

pub(crate) fn subscribe() -> Result<Subscription, InterruptError> {
    install()?;
    let (sender, receiver) = flume::bounded(INTERRUPT_BUFFER);
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    SUBSCRIBERS.lock().push((id, sender));
    Ok(Subscription { id, receiver })
}

impl Drop for Subscription {
    fn drop(&mut self) {
        SUBSCRIBERS.lock().retain(|(id, _)| *id != self.id);
    }
}
