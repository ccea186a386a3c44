use std::sync::Arc;
use std::time::Duration;

use crate::{
    cache::{CacheKey, ResponseCache},
    cached,
    error::{AppError, AppResult},
    models::{MovieDetails, MovieId, TimeWindow, TrendingFeed},
    services::providers::{DemoProvider, MetadataProvider},
};

const TRENDING_TTL: Duration = Duration::from_secs(3600);
const SEARCH_TTL: Duration = Duration::from_secs(3600);
const DETAILS_TTL: Duration = Duration::from_secs(86400);

/// Movie lookups for request handlers
///
/// Wraps the configured provider with thin revalidation and degrades to the
/// demo catalog instead of surfacing upstream failures to callers.
#[derive(Clone)]
pub struct MovieCatalog {
    provider: Option<Arc<dyn MetadataProvider>>,
    demo: DemoProvider,
    cache: ResponseCache,
}

impl MovieCatalog {
    /// `None` runs the catalog in demo mode
    pub fn new(provider: Option<Arc<dyn MetadataProvider>>) -> Self {
        Self {
            provider,
            demo: DemoProvider::new(),
            cache: ResponseCache::new(),
        }
    }

    pub fn is_demo(&self) -> bool {
        self.provider.is_none()
    }

    pub async fn trending(&self, window: TimeWindow) -> TrendingFeed {
        let Some(provider) = &self.provider else {
            tracing::warn!("TMDB access token not configured, serving demo trending");
            return self.demo.trending_feed();
        };

        // An empty list is treated as a failed lookup so it is never cached
        let result: AppResult<TrendingFeed> = cached!(
            self.cache,
            CacheKey::Trending(window),
            TRENDING_TTL,
            async {
                let feed = provider.trending(window).await?;
                if feed.results.is_empty() {
                    return Err(AppError::ExternalApi(format!(
                        "Upstream trending list for {} is empty",
                        window
                    )));
                }
                Ok::<TrendingFeed, AppError>(feed)
            }
        );

        match result {
            Ok(feed) => feed,
            Err(e) => {
                tracing::error!(error = %e, provider = provider.name(), "Trending lookup failed, serving demo");
                self.demo.trending_feed()
            }
        }
    }

    pub async fn search(&self, query: &str) -> TrendingFeed {
        let Some(provider) = &self.provider else {
            tracing::warn!("TMDB access token not configured, searching demo catalog");
            return self.demo.search_feed(query);
        };

        let result: AppResult<TrendingFeed> = cached!(
            self.cache,
            CacheKey::Search(query.to_string()),
            SEARCH_TTL,
            provider.search(query)
        );

        result.unwrap_or_else(|e| {
            tracing::error!(error = %e, query = %query, provider = provider.name(), "Search failed, searching demo catalog");
            self.demo.search_feed(query)
        })
    }

    /// `None` when the movie is unknown or the upstream lookup failed
    pub async fn details(&self, id: MovieId) -> Option<MovieDetails> {
        let Some(provider) = &self.provider else {
            return self.demo.movie_details(id);
        };

        let result: AppResult<Option<MovieDetails>> = cached!(
            self.cache,
            CacheKey::Details(id),
            DETAILS_TTL,
            provider.details(id)
        );

        result.unwrap_or_else(|e| {
            tracing::error!(error = %e, movie_id = id, provider = provider.name(), "Details lookup failed");
            None
        })
    }
}
