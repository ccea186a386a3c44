use axum::Json;

use crate::{
    error::AppResult,
    models::{RecommendationRequest, RecommendationResponse},
    services::recommendations,
};

/// Handler for recommendations endpoint
pub async fn recommend(
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<RecommendationResponse>> {
    let response = recommendations::get_recommendations(request)?;
    Ok(Json(response))
}
