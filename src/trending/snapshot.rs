use crate::models::{Delta, Snapshot};

use super::delta::compute_delta;

/// The two most recent snapshots; older ones are discarded
#[derive(Debug, Default)]
pub struct SnapshotPair {
    previous: Option<Snapshot>,
    current: Option<Snapshot>,
}

impl SnapshotPair {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Snapshot> {
        self.current.as_ref()
    }

    pub fn previous(&self) -> Option<&Snapshot> {
        self.previous.as_ref()
    }

    /// Moves current into previous, installs `next`, and returns the delta
    ///
    /// An empty `next` is refused and leaves both snapshots untouched, so a
    /// blank upstream response can never read as "everything stopped
    /// trending". Returns `None` in that case.
    pub fn rotate(&mut self, next: Snapshot, max_delta: usize) -> Option<Delta> {
        if next.is_empty() {
            return None;
        }

        let delta = match &self.current {
            Some(current) => compute_delta(current, &next, max_delta),
            None => Delta::empty(),
        };
        self.previous = self.current.replace(next);

        Some(delta)
    }
}
