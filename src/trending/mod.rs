//! Real-time "trending now" pipeline
//!
//! The poller fetches a snapshot on a fixed cadence, the hub rotates it in,
//! computes the delta against the previous snapshot, and fans the delta out
//! to every registered viewer connection.

pub mod connection;
pub mod delta;
pub mod hub;
pub mod poller;
pub mod snapshot;

pub use connection::{ConnectionState, ViewerConnection, ViewerId};
pub use delta::compute_delta;
pub use hub::{FanOutReport, HubSettings, PublishOutcome, TrendingHub};
pub use poller::{PollOutcome, TrendPoller};
pub use snapshot::SnapshotPair;
