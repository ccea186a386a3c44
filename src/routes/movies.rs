use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::{
    error::{AppError, AppResult},
    models::{MovieDetails, MovieId, TrendingFeed},
    state::AppState,
};

use super::trending::WindowQuery;

/// Handler for the full trending feed
pub async fn trending_feed(
    State(state): State<AppState>,
    Query(params): Query<WindowQuery>,
) -> Json<TrendingFeed> {
    Json(state.catalog.trending(params.window()).await)
}

/// Handler for movie details
pub async fn details(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> AppResult<Json<MovieDetails>> {
    let id: MovieId = raw_id
        .trim()
        .parse()
        .map_err(|_| AppError::InvalidInput("Invalid movie ID".to_string()))?;

    state
        .catalog
        .details(id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Movie not found".to_string()))
}
