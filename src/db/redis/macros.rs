/// Read-through caching over [`Cache`](crate::db::Cache).
///
/// Returns the cached value for `$key` when present. Otherwise awaits `$block`,
/// queues the computed value for a background write with `$ttl` seconds to live,
/// and returns it. A failed cache read is logged and treated as a miss. Evaluates
/// to an `AppResult`, so it is usually the tail expression of a function returning one.
///
/// ```rust,ignore
/// cached!(self.cache, CacheKey::from(query), self.cache_ttl, async move {
///     self.request_summary(query).await
/// })
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        match $cache.get_from_cache(&key).await {
            Ok(Some(cached)) => {
                tracing::debug!(key = %key, "Cache hit");
                Ok(cached)
            }
            lookup => {
                match lookup {
                    Err(e) => tracing::warn!(key = %key, error = %e, "Cache read failed, bypassing cache"),
                    Ok(_) => tracing::debug!(key = %key, "Cache miss"),
                }
                let value = $block.await?;
                $cache.set_in_background(&key, &value, $ttl);
                Ok(value)
            }
        }
    }};
}
