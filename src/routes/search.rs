use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{models::TrendingEntry, state::AppState};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<TrendingEntry>,
    pub demo: bool,
}

/// Handler for movie search endpoint
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Json<SearchResponse> {
    let query = params.q.trim();
    if query.is_empty() {
        return Json(SearchResponse {
            results: Vec::new(),
            demo: false,
        });
    }

    let feed = state.catalog.search(query).await;
    Json(SearchResponse {
        results: feed.results,
        demo: feed.demo,
    })
}
