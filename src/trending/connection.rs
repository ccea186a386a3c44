use std::fmt::Display;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::models::TrendingPayload;

use super::hub::TrendingHub;

/// Opaque handle identifying one registered viewer
///
/// Ids increase monotonically, so ordering by id is registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViewerId(pub(crate) u64);

impl Display for ViewerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "viewer-{}", self.0)
    }
}

/// Lifecycle of a viewer connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

/// Events that move a connection between states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The hub registered the viewer and queued its initial snapshot
    Registered,
    /// The viewer or the server closed the connection
    Close,
    /// The transport went away without a close handshake
    Abort,
}

impl ConnectionState {
    /// Closed is terminal.
    pub fn next(self, event: ConnectionEvent) -> ConnectionState {
        match (self, event) {
            (ConnectionState::Closed, _) => ConnectionState::Closed,
            (_, ConnectionEvent::Close | ConnectionEvent::Abort) => ConnectionState::Closed,
            (ConnectionState::Connecting | ConnectionState::Open, ConnectionEvent::Registered) => {
                ConnectionState::Open
            }
        }
    }
}

/// One live subscriber to the trending broadcast
///
/// Dropping the handle counts as a transport abort and deregisters the
/// viewer, so a connection task that ends for any reason cannot leak its
/// registry slot.
pub struct ViewerConnection {
    id: ViewerId,
    state: ConnectionState,
    receiver: mpsc::Receiver<Arc<TrendingPayload>>,
    hub: TrendingHub,
}

impl ViewerConnection {
    pub(crate) fn new(
        id: ViewerId,
        receiver: mpsc::Receiver<Arc<TrendingPayload>>,
        hub: TrendingHub,
    ) -> Self {
        Self {
            id,
            state: ConnectionState::Connecting,
            receiver,
            hub,
        }
    }

    pub fn id(&self) -> ViewerId {
        self.id
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Waits for the next payload; `None` once the connection is closed
    ///
    /// The hub drops its sender when delivery to this viewer fails or the
    /// server shuts down; queued payloads are still drained first.
    pub async fn recv(&mut self) -> Option<Arc<TrendingPayload>> {
        if self.state == ConnectionState::Closed {
            return None;
        }

        match self.receiver.recv().await {
            Some(payload) => Some(payload),
            None => {
                self.apply(ConnectionEvent::Abort);
                None
            }
        }
    }

    /// Returns an already queued payload without waiting
    pub fn try_recv(&mut self) -> Option<Arc<TrendingPayload>> {
        if self.state == ConnectionState::Closed {
            return None;
        }
        self.receiver.try_recv().ok()
    }

    /// Explicit close; safe to call any number of times
    pub fn close(&mut self) {
        self.apply(ConnectionEvent::Close);
    }

    pub(crate) fn apply(&mut self, event: ConnectionEvent) {
        let next = self.state.next(event);
        if next == ConnectionState::Closed && self.state != ConnectionState::Closed {
            self.receiver.close();
            self.hub.disconnect(self.id);
        }
        self.state = next;
    }
}

impl Drop for ViewerConnection {
    fn drop(&mut self) {
        self.apply(ConnectionEvent::Abort);
    }
}
