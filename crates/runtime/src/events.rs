//! Out-of-band notifications from the wallet.
//!
//! The wallet pushes `accountsChanged` / `chainChanged` at any time -
//! the user can switch accounts or networks in the extension popup
//! with no request in flight. The connection parses those frames into
//! [`ProviderEvent`] values and emits them on a broadcast channel;
//! consumers either poll a receiver directly or register a callback
//! task whose lifetime is pinned to an RAII [`Subscription`] guard.

use rw_protocol::{Address, ChainId};
use tokio::sync::{broadcast, oneshot};

/// A notification pushed by the wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// The authorized account set changed. The payload is the full
    /// ordered set; empty means the wallet disconnected the site.
    AccountsChanged(Vec<Address>),
    /// The wallet is now pointed at a different chain.
    ChainChanged(ChainId),
}

/// Broadcast capacity. Wallet notifications are rare and lag on a
/// laggy consumer only drops stale intermediate states.
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Fan-out point for [`ProviderEvent`]s.
pub(crate) struct EventBus {
    tx: broadcast::Sender<ProviderEvent>,
}

impl EventBus {
    pub(crate) fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Emits to all current subscribers. No subscribers is fine.
    pub(crate) fn emit(&self, event: ProviderEvent) {
        let _ = self.tx.send(event);
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.tx.subscribe()
    }
}

/// RAII handle that cancels an event-forwarding task when dropped.
///
/// Created by whoever spawns a task consuming provider events (the
/// session does this in `initialize`). Dropping the guard, or calling
/// [`unsubscribe`](Self::unsubscribe), signals the task to stop -
/// release is deterministic, not left to garbage collection.
pub struct Subscription {
    cancel_tx: Option<oneshot::Sender<()>>,
}

impl Subscription {
    /// Wraps the cancel side of a task's shutdown channel.
    pub fn new(cancel_tx: oneshot::Sender<()>) -> Self {
        Self {
            cancel_tx: Some(cancel_tx),
        }
    }

    /// Explicitly cancels the subscription, equivalent to dropping it.
    pub fn unsubscribe(mut self) {
        if let Some(tx) = self.cancel_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(tx) = self.cancel_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel_tx.is_some())
            .finish()
    }
}
