use std::collections::HashSet;

use crate::{
    error::{AppError, AppResult},
    models::{
        rating::MAX_RATING, MovieId, Rating, RecommendationRequest, RecommendationResponse,
    },
};

/// How many of the user's own top ratings seed the peer search
const SEED_RATINGS: usize = 10;
/// Peer score at or above which a movie is worth recommending
const RECOMMEND_THRESHOLD: u8 = 7;
const MAX_RECOMMENDATIONS: usize = 20;

const NO_RATINGS_MESSAGE: &str = "No ratings yet. Rate movies to get recommendations!";
const NOT_ENOUGH_DATA_MESSAGE: &str = "Not enough data for recommendations yet.";

/// Generates watch recommendations by rating co-occurrence
///
/// Takes the user's ten best-rated movies, looks at what other users who
/// rated those same movies scored highly, and returns those movies the user
/// has not rated yet. Ratings come from the backend service; nothing is
/// read or written here.
pub fn get_recommendations(request: RecommendationRequest) -> AppResult<RecommendationResponse> {
    if let Some(bad) = request.ratings.iter().find(|r| r.rating > MAX_RATING) {
        return Err(AppError::InvalidInput(format!(
            "Rating for movie {} must be between 0 and {}",
            bad.movie_id, MAX_RATING
        )));
    }

    let (mut own, peers): (Vec<Rating>, Vec<Rating>) = request
        .ratings
        .into_iter()
        .partition(|r| r.user_id == request.user_id);

    let rated_ids: HashSet<MovieId> = own.iter().map(|r| r.movie_id).collect();

    // Highest first; stable so ties keep their supplied order
    own.sort_by(|a, b| b.rating.cmp(&a.rating));
    own.truncate(SEED_RATINGS);

    if own.is_empty() {
        return Ok(RecommendationResponse {
            recommendations: Vec::new(),
            watchlist: Vec::new(),
            ratings_count: 0,
            message: Some(NO_RATINGS_MESSAGE.to_string()),
        });
    }

    let seed_ids: HashSet<MovieId> = own.iter().map(|r| r.movie_id).collect();
    let similar: Vec<&Rating> = peers
        .iter()
        .filter(|r| seed_ids.contains(&r.movie_id))
        .collect();

    if similar.is_empty() {
        return Ok(RecommendationResponse {
            recommendations: Vec::new(),
            watchlist: Vec::new(),
            ratings_count: own.len(),
            message: Some(NOT_ENOUGH_DATA_MESSAGE.to_string()),
        });
    }

    // Peers who share a seed movie are "similar"; collect their other favourites
    let similar_users: HashSet<&str> = similar.iter().map(|r| r.user_id.as_str()).collect();
    let mut candidates: Vec<&Rating> = peers
        .iter()
        .filter(|r| similar_users.contains(r.user_id.as_str()))
        .collect();
    candidates.sort_by(|a, b| b.rating.cmp(&a.rating));

    let mut seen = HashSet::new();
    let recommendations: Vec<MovieId> = candidates
        .into_iter()
        .filter(|r| r.rating >= RECOMMEND_THRESHOLD && !rated_ids.contains(&r.movie_id))
        .filter(|r| seen.insert(r.movie_id))
        .map(|r| r.movie_id)
        .take(MAX_RECOMMENDATIONS)
        .collect();

    tracing::debug!(
        user_id = %request.user_id,
        similar_users = similar_users.len(),
        recommendations = recommendations.len(),
        "Recommendations computed"
    );

    Ok(RecommendationResponse {
        recommendations,
        watchlist: request.watchlist,
        ratings_count: own.len(),
        message: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rating(user: &str, movie_id: MovieId, rating: u8) -> Rating {
        Rating {
            user_id: user.to_string(),
            movie_id,
            rating,
            review: None,
        }
    }

    fn request(ratings: Vec<Rating>) -> RecommendationRequest {
        RecommendationRequest {
            user_id: "me".to_string(),
            ratings,
            watchlist: vec![424],
        }
    }

    #[test]
    fn test_no_ratings_yet() {
        let response = get_recommendations(request(vec![rating("other", 1, 9)])).unwrap();
        assert!(response.recommendations.is_empty());
        assert_eq!(response.ratings_count, 0);
        assert_eq!(response.message.as_deref(), Some(NO_RATINGS_MESSAGE));
    }

    #[test]
    fn test_no_overlapping_peers() {
        let response =
            get_recommendations(request(vec![rating("me", 1, 9), rating("other", 2, 9)])).unwrap();
        assert!(response.recommendations.is_empty());
        assert_eq!(response.ratings_count, 1);
        assert_eq!(response.message.as_deref(), Some(NOT_ENOUGH_DATA_MESSAGE));
    }

    #[test]
    fn test_recommends_peer_favourites_above_threshold() {
        let response = get_recommendations(request(vec![
            rating("me", 550, 9),
            rating("me", 278, 8),
            rating("alice", 550, 10),
            rating("alice", 238, 9),
            rating("alice", 389, 6),
            rating("bob", 278, 7),
            rating("bob", 240, 8),
            rating("bob", 238, 7),
            rating("carol", 999, 10),
        ]))
        .unwrap();

        // 389 is below threshold; carol shares no movie with me
        assert_eq!(response.recommendations, vec![238, 240]);
        assert_eq!(response.watchlist, vec![424]);
        assert_eq!(response.ratings_count, 2);
        assert_eq!(response.message, None);
    }

    #[test]
    fn test_already_rated_movies_are_excluded() {
        let response = get_recommendations(request(vec![
            rating("me", 550, 9),
            rating("me", 238, 3),
            rating("alice", 550, 9),
            rating("alice", 238, 10),
        ]))
        .unwrap();
        assert!(response.recommendations.is_empty());
        assert_eq!(response.message, None);
    }

    #[test]
    fn test_out_of_range_rating_rejected() {
        let result = get_recommendations(request(vec![rating("me", 1, 11)]));
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_caps_at_twenty() {
        let mut ratings = vec![rating("me", 1, 10), rating("peer", 1, 10)];
        ratings.extend((100..140).map(|id| rating("peer", id, 8)));

        let response = get_recommendations(request(ratings)).unwrap();
        assert_eq!(response.recommendations.len(), MAX_RECOMMENDATIONS);
        assert_eq!(response.recommendations[0], 100);
    }
}
