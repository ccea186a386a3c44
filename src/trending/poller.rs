use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    models::{Snapshot, TimeWindow},
    services::providers::MetadataProvider,
};

use super::hub::{PublishOutcome, TrendingHub};

/// Result of one poll cycle
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The fetch failed; snapshots are untouched
    FetchFailed(String),
    /// The fetch returned nothing usable; snapshots are untouched
    Empty,
    Published(PublishOutcome),
}

/// Periodically refreshes the trending snapshot
pub struct TrendPoller {
    provider: Arc<dyn MetadataProvider>,
    hub: TrendingHub,
    window: TimeWindow,
    interval: Duration,
}

impl TrendPoller {
    pub fn new(
        provider: Arc<dyn MetadataProvider>,
        hub: TrendingHub,
        window: TimeWindow,
        interval: Duration,
    ) -> Self {
        Self {
            provider,
            hub,
            window,
            interval,
        }
    }

    /// Fetches once and hands the result to the hub
    ///
    /// Failures and empty lists are logged and skipped; the next tick simply
    /// tries again.
    pub async fn poll_once(&self) -> PollOutcome {
        let feed = match self.provider.trending(self.window).await {
            Ok(feed) => feed,
            Err(e) => {
                warn!(
                    error = %e,
                    provider = self.provider.name(),
                    "Trending poll failed, keeping previous snapshot"
                );
                return PollOutcome::FetchFailed(e.to_string());
            }
        };

        if feed.results.is_empty() {
            warn!(provider = self.provider.name(), "No trending data received");
            return PollOutcome::Empty;
        }

        let outcome = self.hub.publish(Snapshot::new(feed.results));
        match &outcome {
            PublishOutcome::Seeded { entries } => {
                info!(entries, "Seeded trending snapshot")
            }
            PublishOutcome::Unchanged => debug!("Trending membership unchanged"),
            PublishOutcome::Rejected => debug!("Hub refused empty snapshot"),
            PublishOutcome::Broadcast(_) => {}
        }
        PollOutcome::Published(outcome)
    }

    /// Polls immediately, then every interval, until `shutdown` fires
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            window = %self.window,
            provider = self.provider.name(),
            "Starting trending poller"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Trending poller received shutdown signal");
                    break;
                }
                _ = ticker.tick() => {
                    tokio::select! {
                        _ = shutdown.cancelled() => {
                            info!("Trending poller cancelled mid-poll");
                            break;
                        }
                        _ = self.poll_once() => {}
                    }
                }
            }
        }

        info!("Trending poller stopped");
    }

    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
