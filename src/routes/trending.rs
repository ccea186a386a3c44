use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::{
    models::{TimeWindow, TrendingPayload},
    state::AppState,
};

/// Entries returned by the latest-trending endpoint
const LATEST_LIMIT: usize = 10;

#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    time: Option<String>,
}

impl WindowQuery {
    pub fn window(&self) -> TimeWindow {
        TimeWindow::from_param(self.time.as_deref())
    }
}

/// Handler for the latest-trending endpoint
pub async fn latest(
    State(state): State<AppState>,
    Query(params): Query<WindowQuery>,
) -> Json<TrendingPayload> {
    let mut feed = state.catalog.trending(params.window()).await;
    feed.results.truncate(LATEST_LIMIT);
    Json(TrendingPayload::now(feed.results))
}
