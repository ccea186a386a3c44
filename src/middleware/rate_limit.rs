use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::RETRY_AFTER, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::AppError;

pub const RATE_LIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Outcome of counting one request against its window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub retry_after: Duration,
}

#[derive(Debug)]
struct Window {
    count: u32,
    resets_at: Instant,
}

/// Fixed-window request counter keyed by client
///
/// In-memory and per process, which is all a single-node deployment needs.
#[derive(Clone)]
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    trust_forwarded_for: bool,
    windows: Arc<Mutex<HashMap<String, Window>>>,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            trust_forwarded_for: false,
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Keys clients by `x-forwarded-for` instead of the peer address.
    ///
    /// Only enable behind a proxy that overwrites the header.
    pub fn trusting_forwarded_for(mut self, trust: bool) -> Self {
        self.trust_forwarded_for = trust;
        self
    }

    pub fn per_minute(limit: u32) -> Self {
        Self::new(limit, Duration::from_secs(60))
    }

    /// Counts a request for `key` and decides whether it may proceed
    pub fn check(&self, key: &str) -> RateDecision {
        let now = Instant::now();
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);

        let window = windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            resets_at: now + self.window,
        });
        if now >= window.resets_at {
            window.count = 0;
            window.resets_at = now + self.window;
        }
        window.count = window.count.saturating_add(1);

        RateDecision {
            allowed: window.count <= self.limit,
            remaining: self.limit.saturating_sub(window.count),
            retry_after: window.resets_at.saturating_duration_since(now),
        }
    }

    /// Forgets windows that have already reset; returns how many were removed
    pub fn prune(&self) -> usize {
        let now = Instant::now();
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        let before = windows.len();
        windows.retain(|_, w| w.resets_at > now);
        before - windows.len()
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Prunes on a fixed cadence until `shutdown` fires
    pub fn spawn_pruner(&self, every: Duration, shutdown: CancellationToken) -> JoinHandle<()> {
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + every, every);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let removed = limiter.prune();
                        if removed > 0 {
                            tracing::debug!(removed, "Pruned expired rate limit windows");
                        }
                    }
                }
            }
            tracing::debug!("Rate limit pruner stopped");
        })
    }
}

/// Client key: the peer IP, or the first forwarded address when trusted
fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>, trust_forwarded_for: bool) -> String {
    let forwarded = trust_forwarded_for
        .then(|| {
            headers
                .get("x-forwarded-for")
                .and_then(|h| h.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        })
        .flatten();

    forwarded
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "anonymous".to_string())
}

/// Rejects requests over the per-client limit with 429
pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    let key = client_key(request.headers(), peer, limiter.trust_forwarded_for);
    let decision = limiter.check(&key);

    if !decision.allowed {
        let retry_after_secs = decision.retry_after.as_secs().max(1);
        tracing::warn!(client = %key, retry_after_secs, "Rate limit exceeded");

        let mut response = AppError::RateLimited { retry_after_secs }.into_response();
        if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
            response.headers_mut().insert(RETRY_AFTER, value);
        }
        return response;
    }

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&decision.remaining.to_string()) {
        response
            .headers_mut()
            .insert(RATE_LIMIT_REMAINING_HEADER, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_limit_resets_after_window() {
        let limiter = RateLimiter::per_minute(2);

        assert!(limiter.check("1.2.3.4").allowed);
        let second = limiter.check("1.2.3.4");
        assert!(second.allowed);
        assert_eq!(second.remaining, 0);

        let third = limiter.check("1.2.3.4");
        assert!(!third.allowed);
        assert_eq!(third.retry_after, Duration::from_secs(60));

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(limiter.check("1.2.3.4").allowed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clients_counted_separately() {
        let limiter = RateLimiter::per_minute(1);
        assert!(limiter.check("a").allowed);
        assert!(limiter.check("b").allowed);
        assert!(!limiter.check("a").allowed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_prune_drops_expired_windows() {
        let limiter = RateLimiter::per_minute(5);
        limiter.check("a");
        tokio::time::advance(Duration::from_secs(30)).await;
        limiter.check("b");
        tokio::time::advance(Duration::from_secs(31)).await;

        assert_eq!(limiter.prune(), 1);
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn test_client_key_ignores_forwarded_for_by_default() {
        let mut headers = HeaderMap::new();
        let peer: SocketAddr = "10.0.0.9:5000".parse().unwrap();
        assert_eq!(client_key(&headers, Some(peer), false), "10.0.0.9");
        assert_eq!(client_key(&headers, None, false), "anonymous");

        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        assert_eq!(client_key(&headers, Some(peer), false), "10.0.0.9");
        assert_eq!(client_key(&headers, None, false), "anonymous");
    }

    #[test]
    fn test_client_key_uses_forwarded_for_when_trusted() {
        let mut headers = HeaderMap::new();
        let peer: SocketAddr = "10.0.0.9:5000".parse().unwrap();
        assert_eq!(client_key(&headers, Some(peer), true), "10.0.0.9");

        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        assert_eq!(client_key(&headers, Some(peer), true), "203.0.113.7");
    }
}
