use std::sync::Arc;

use crate::{
    config::Config,
    middleware::RateLimiter,
    services::{providers::MetadataProvider, MovieCatalog},
    trending::{HubSettings, TrendingHub},
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub catalog: MovieCatalog,
    pub hub: TrendingHub,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    /// Builds state around an optional upstream provider; `None` is demo mode
    pub fn new(config: Config, provider: Option<Arc<dyn MetadataProvider>>) -> Self {
        let hub = TrendingHub::new(HubSettings::from(&config));
        let rate_limiter = RateLimiter::per_minute(config.rate_limit_per_minute)
            .trusting_forwarded_for(config.trust_forwarded_for);

        Self {
            catalog: MovieCatalog::new(provider),
            hub,
            rate_limiter,
            config: Arc::new(config),
        }
    }
}
