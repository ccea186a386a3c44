pub mod rate_limit;
pub mod request_id;

pub use rate_limit::{rate_limit_middleware, RateDecision, RateLimiter};
pub use request_id::{make_span_with_request_id, request_id_middleware, RequestId};
