/// A macro to simplify revalidation against the in-process response cache.
///
/// If a fresh value is present for the key it is returned. Otherwise the
/// block is awaited, its value stored under the key for `$ttl`, and then
/// returned. Errors from the block are propagated and never cached.
///
/// # Arguments
/// * `$cache`: a [`ResponseCache`](crate::cache::ResponseCache).
/// * `$key`: the [`CacheKey`](crate::cache::CacheKey) to read and write.
/// * `$ttl`: a `Duration` for which the stored value stays fresh.
/// * `$block`: a future producing `AppResult<T>`.
///
/// # Example
/// ```rust,ignore
/// let feed = cached!(self.cache, CacheKey::Trending(window), TRENDING_TTL, async move {
///     self.fetch_trending_page(window).await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        if let Some(hit) = $cache.get(&key) {
            Ok(hit)
        } else {
            match $block.await {
                Ok(value) => {
                    $cache.insert(&key, &value, $ttl);
                    Ok(value)
                }
                Err(e) => Err(e),
            }
        }
    }};
}
