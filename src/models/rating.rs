use serde::{Deserialize, Serialize};

use super::MovieId;

/// Highest score a user can give
pub const MAX_RATING: u8 = 10;

/// One row of the ratings table kept by the backend service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rating {
    pub user_id: String,
    pub movie_id: MovieId,
    pub rating: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review: Option<String>,
}

/// Ratings and watchlist read from the backend service for one user
#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationRequest {
    pub user_id: String,
    /// Ratings by this user and by anyone else who rated the same movies
    #[serde(default)]
    pub ratings: Vec<Rating>,
    #[serde(default)]
    pub watchlist: Vec<MovieId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationResponse {
    pub recommendations: Vec<MovieId>,
    pub watchlist: Vec<MovieId>,
    pub ratings_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
