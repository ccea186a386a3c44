/// TMDB API provider
///
/// Authenticates with a v4 read access token sent as a bearer header.
///
/// API Flow:
/// 1. Trending: /trending/movie/{day|week}
/// 2. Search: /search/movie?query=...&page=1
/// 3. Details: /movie/{id}?append_to_response=credits,videos
use reqwest::{Client as HttpClient, StatusCode};
use serde::de::DeserializeOwned;

use crate::{
    error::{AppError, AppResult},
    models::{MovieDetails, MovieId, TimeWindow, TmdbPage, TrendingFeed},
    services::providers::MetadataProvider,
};

const USER_AGENT: &str = concat!("cinescape/", env!("CARGO_PKG_VERSION"));

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    access_token: String,
    api_url: String,
}

impl TmdbProvider {
    pub fn new(access_token: String, api_url: String) -> AppResult<Self> {
        let http_client = HttpClient::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http_client,
            access_token,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    /// Sends an authenticated GET, returning the raw response on any status
    async fn send(&self, path: &str, query: &[(&str, &str)]) -> AppResult<reqwest::Response> {
        let url = format!("{}{}", self.api_url, path);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.access_token)
            .header("Content-Type", "application/json;charset=utf-8")
            .query(query)
            .send()
            .await?;

        Ok(response)
    }

    /// Decodes a successful response, turning anything else into `ExternalApi`
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> AppResult<T> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB returned status {}: {}",
                status, body
            )));
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(error = %e, "Failed to deserialize TMDB response");
            AppError::ExternalApi(format!("Failed to parse TMDB response: {}", e))
        })
    }
}

#[async_trait::async_trait]
impl MetadataProvider for TmdbProvider {
    async fn trending(&self, window: TimeWindow) -> AppResult<TrendingFeed> {
        let path = format!("/trending/movie/{}", window.as_str());
        let page: TmdbPage = Self::decode(self.send(&path, &[]).await?).await?;
        let feed = page.into_feed();

        tracing::info!(
            window = %window,
            results = feed.results.len(),
            provider = "tmdb",
            "Trending fetched"
        );

        Ok(feed)
    }

    async fn search(&self, query: &str) -> AppResult<TrendingFeed> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        let response = self
            .send("/search/movie", &[("query", query), ("page", "1")])
            .await?;
        let page: TmdbPage = Self::decode(response).await?;
        let feed = page.into_feed();

        tracing::info!(
            query = %query,
            results = feed.results.len(),
            provider = "tmdb",
            "Movie search completed"
        );

        Ok(feed)
    }

    async fn details(&self, id: MovieId) -> AppResult<Option<MovieDetails>> {
        let path = format!("/movie/{}", id);
        let response = self
            .send(&path, &[("append_to_response", "credits,videos")])
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(movie_id = id, "TMDB has no such movie");
            return Ok(None);
        }

        let details: MovieDetails = Self::decode(response).await?;
        tracing::info!(movie_id = id, title = %details.movie.title, "Movie details fetched");

        Ok(Some(details))
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
