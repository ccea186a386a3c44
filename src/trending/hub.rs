use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc::{self, error::TrySendError};

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{MovieId, Snapshot, TrendingPayload},
};

use super::connection::{ConnectionEvent, ViewerConnection, ViewerId};
use super::snapshot::SnapshotPair;

/// Sizes that bound notification volume and per-viewer memory
#[derive(Debug, Clone, Copy)]
pub struct HubSettings {
    pub max_delta: usize,
    pub initial_burst: usize,
    pub viewer_buffer: usize,
    pub max_viewers: usize,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for HubSettings {
    fn from(config: &Config) -> Self {
        Self {
            max_delta: config.max_delta_size,
            initial_burst: config.initial_burst_size,
            viewer_buffer: config.viewer_buffer.max(1),
            max_viewers: config.max_viewers,
        }
    }
}

/// Result of handing one poll's snapshot to the hub
#[derive(Debug, Clone, PartialEq)]
pub enum PublishOutcome {
    /// The snapshot was empty; nothing rotated
    Rejected,
    /// First snapshot stored; viewers are not notified
    Seeded { entries: usize },
    /// Rotated, but no entry is new
    Unchanged,
    /// Rotated and the delta went out
    Broadcast(FanOutReport),
}

/// Per-broadcast delivery summary
#[derive(Debug, Clone, PartialEq)]
pub struct FanOutReport {
    pub movies: Vec<MovieId>,
    pub delivered: usize,
    pub dropped: Vec<ViewerId>,
}

struct HubState {
    snapshots: SnapshotPair,
    viewers: BTreeMap<ViewerId, mpsc::Sender<Arc<TrendingPayload>>>,
    next_id: u64,
}

/// Owner of the snapshot pair and the viewer registry
///
/// Both live behind one mutex, which is the single point of mutation for
/// the pipeline: rotation, delta computation and fan-out happen in one
/// critical section, and a viewer registers against the same snapshot it is
/// sent. Nothing awaits while the lock is held; fan-out only `try_send`s
/// into bounded per-viewer queues.
#[derive(Clone)]
pub struct TrendingHub {
    state: Arc<Mutex<HubState>>,
    settings: HubSettings,
}

impl TrendingHub {
    pub fn new(settings: HubSettings) -> Self {
        Self {
            state: Arc::new(Mutex::new(HubState {
                snapshots: SnapshotPair::new(),
                viewers: BTreeMap::new(),
                next_id: 1,
            })),
            settings,
        }
    }

    pub fn settings(&self) -> HubSettings {
        self.settings
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        // State stays consistent across a panicking holder: every mutation
        // is a single insert, remove or rotate.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a viewer and queues the current snapshot for it
    ///
    /// Fails without registering anything when the registry is full.
    pub fn connect(&self) -> AppResult<ViewerConnection> {
        let mut state = self.lock();

        if state.viewers.len() >= self.settings.max_viewers {
            tracing::warn!(
                viewers = state.viewers.len(),
                max_viewers = self.settings.max_viewers,
                "Rejecting viewer, registry full"
            );
            return Err(AppError::ChannelUnavailable(
                "Too many viewers connected".to_string(),
            ));
        }

        let id = ViewerId(state.next_id);
        let (tx, rx) = mpsc::channel(self.settings.viewer_buffer);

        let movies = state
            .snapshots
            .current()
            .map(|s| s.head(self.settings.initial_burst))
            .unwrap_or_default();
        tx.try_send(Arc::new(TrendingPayload::now(movies)))
            .map_err(|e| AppError::Internal(format!("Could not queue initial snapshot: {}", e)))?;

        state.next_id += 1;
        state.viewers.insert(id, tx);
        let viewers = state.viewers.len();
        drop(state);

        let mut connection = ViewerConnection::new(id, rx, self.clone());
        connection.apply(ConnectionEvent::Registered);

        tracing::info!(viewer = %id, viewers, "Viewer connected");
        Ok(connection)
    }

    /// Removes a viewer; returns whether it was still registered
    pub fn disconnect(&self, id: ViewerId) -> bool {
        let mut state = self.lock();
        let removed = state.viewers.remove(&id).is_some();
        let viewers = state.viewers.len();
        drop(state);

        if removed {
            tracing::info!(viewer = %id, viewers, "Viewer disconnected");
        }
        removed
    }

    /// Rotates in a freshly polled snapshot and broadcasts any delta
    pub fn publish(&self, snapshot: Snapshot) -> PublishOutcome {
        let mut state = self.lock();
        let seeding = state.snapshots.current().is_none();
        let entries = snapshot.len();

        let Some(delta) = state.snapshots.rotate(snapshot, self.settings.max_delta) else {
            return PublishOutcome::Rejected;
        };

        if seeding {
            return PublishOutcome::Seeded { entries };
        }
        if delta.is_empty() {
            return PublishOutcome::Unchanged;
        }

        let movies = delta.ids();
        let payload = Arc::new(TrendingPayload::now(delta.into_entries()));
        let (delivered, dropped) = fan_out(&mut state.viewers, &payload);
        let remaining = state.viewers.len();
        drop(state);

        tracing::info!(
            movies = ?movies,
            delivered,
            dropped = dropped.len(),
            viewers = remaining,
            "Broadcast newly trending movies"
        );

        PublishOutcome::Broadcast(FanOutReport {
            movies,
            delivered,
            dropped,
        })
    }

    /// Drops every viewer's sender so their connections wind down
    pub fn close_all(&self) -> usize {
        let mut state = self.lock();
        let closed = state.viewers.len();
        state.viewers.clear();
        drop(state);

        tracing::info!(closed, "Closed all viewer connections");
        closed
    }

    pub fn viewer_count(&self) -> usize {
        self.lock().viewers.len()
    }

    pub fn current_snapshot(&self) -> Option<Snapshot> {
        self.lock().snapshots.current().cloned()
    }
}

/// Sends to every viewer in registration order, removing the ones that fail
fn fan_out(
    viewers: &mut BTreeMap<ViewerId, mpsc::Sender<Arc<TrendingPayload>>>,
    payload: &Arc<TrendingPayload>,
) -> (usize, Vec<ViewerId>) {
    let mut delivered = 0;
    let mut dropped = Vec::new();

    for (id, tx) in viewers.iter() {
        match tx.try_send(Arc::clone(payload)) {
            Ok(()) => delivered += 1,
            Err(TrySendError::Full(_)) => {
                tracing::warn!(viewer = %id, "Viewer queue full, dropping viewer");
                dropped.push(*id);
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(viewer = %id, "Viewer transport gone, dropping viewer");
                dropped.push(*id);
            }
        }
    }

    for id in &dropped {
        viewers.remove(id);
    }

    (delivered, dropped)
}
