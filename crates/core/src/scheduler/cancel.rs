//! Cooperative cancellation for the scheduler.
//!
//! Interruption is modelled as a token passed through the scheduler rather
//! than a signal handler mutating shared state: the owner of a
//! [`CancelSource`] decides when to cancel, every [`CancelToken`] observes it.

use tokio::sync::watch;

/// The cancelling side. Dropping the source does not cancel.
pub struct CancelSource {
    tx: watch::Sender<bool>,
}

impl CancelSource {
    /// Creates a new, un-cancelled source.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Hands out a token observing this source.
    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

impl Default for CancelSource {
    fn default() -> Self {
        Self::new()
    }
}

/// The observing side, cheap to clone.
#[derive(Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// A token that can never be cancelled, for callers without interruption.
    pub fn never() -> Self {
        let (_, rx) = watch::channel(false);
        Self { rx }
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Completes once cancellation is requested. If the source is dropped
    /// without cancelling, this stays pending forever.
    pub async fn cancelled(&mut self) {
        while !*self.rx.borrow() {
            if self.rx.changed().await.is_err() {
                // Source dropped without cancelling; never resolve.
                std::future::pending::<()>().await;
            }
        }
    }
}
