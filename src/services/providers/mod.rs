//! Movie metadata provider abstraction
//!
//! The metadata API (TMDB) is the only outbound dependency of the service.
//! Handlers reach it through the catalog, which adds demo fallback and
//! revalidation; the trending poller calls a provider directly so that only
//! real upstream data is ever diffed.

use crate::{
    error::AppResult,
    models::{MovieDetails, MovieId, TimeWindow, TrendingFeed},
};

pub mod demo;
pub mod tmdb;

pub use demo::DemoProvider;
pub use tmdb::TmdbProvider;

/// Trait for movie metadata providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Fetch the trending list for a time window, in upstream order
    async fn trending(&self, window: TimeWindow) -> AppResult<TrendingFeed>;

    /// Search movies by free text
    async fn search(&self, query: &str) -> AppResult<TrendingFeed>;

    /// Fetch full details; `Ok(None)` when the movie does not exist
    async fn details(&self, id: MovieId) -> AppResult<Option<MovieDetails>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
