use axum::{
    extract::State,
    http::{HeaderValue, Method, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    middleware::{make_span_with_request_id, rate_limit_middleware, request_id_middleware},
    state::AppState,
};

pub mod movies;
pub mod realtime;
pub mod recommendations;
pub mod search;
pub mod trending;

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(realtime::ws_handler))
        .nest("/api/v1", api_routes(&state))
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(from_fn(request_id_middleware))
        .layer(cors)
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes(state: &AppState) -> Router<AppState> {
    let limited = Router::new()
        .route("/search", get(search::search))
        .route("/recommendations", post(recommendations::recommend))
        .route_layer(from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ));

    Router::new()
        .route("/trending", get(trending::latest))
        .route("/movies/trending", get(movies::trending_feed))
        .route("/movies/:id", get(movies::details))
        .route("/socket", get(realtime::sse_handler))
        .merge(limited)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "viewers": state.hub.viewer_count(),
        })),
    )
}
