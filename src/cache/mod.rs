mod macros;
pub mod response_cache;

pub use response_cache::CacheKey;
pub use response_cache::ResponseCache;
