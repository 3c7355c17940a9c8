//! Notification hub.
//!
//! Holds the reload clients that are currently connected. A broadcast
//! drains the whole set: each browser reconnects after reloading, so a
//! registration is good for exactly one change.

use std::sync::Mutex;

use tokio::sync::mpsc;

use super::event::ReloadEvent;

/// Sending half of one open reload connection.
#[derive(Debug)]
pub(crate) struct ReloadClient {
    tx: mpsc::UnboundedSender<ReloadEvent>,
}

impl ReloadClient {
    /// Create a client and the receiver that feeds its connection.
    pub(crate) fn channel() -> (Self, mpsc::UnboundedReceiver<ReloadEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queue an event. Returns `false` if the connection is gone.
    pub(crate) fn send(&self, event: ReloadEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    /// Whether the connection side is still alive.
    pub(crate) fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }
}

/// Set of registered reload clients.
#[derive(Debug, Default)]
pub(crate) struct NotificationHub {
    clients: Mutex<Vec<ReloadClient>>,
}

impl NotificationHub {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a client to receive the next reload.
    ///
    /// Clients whose connection has already closed are pruned first.
    pub(crate) fn register(&self, client: ReloadClient) {
        let mut clients = self.clients.lock().unwrap();
        clients.retain(ReloadClient::is_open);
        clients.push(client);
    }

    /// Send a reload event to every registered client and empty the set.
    ///
    /// Returns the number of clients the event was delivered to. Failed
    /// deliveries are dropped silently.
    pub(crate) fn broadcast(&self) -> usize {
        let clients = std::mem::take(&mut *self.clients.lock().unwrap());

        clients
            .into_iter()
            .filter(|client| client.send(ReloadEvent::Reload))
            .count()
    }

    /// Number of clients waiting for the next reload.
    pub(crate) fn len(&self) -> usize {
        self.clients.lock().unwrap().len()
    }
}
