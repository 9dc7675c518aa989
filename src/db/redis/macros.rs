/// Read-through caching around an async block.
///
/// `$cache` is an `Option<&Cache>`; with `None` the block simply runs. A
/// cache read failure is logged and treated as a miss so Redis outages
/// never fail a request. Successful results are written back in the
/// background with `$ttl` seconds to live; errors are never cached.
///
/// # Example
/// ```rust,ignore
/// let details = cached!(
///     self.cache.as_ref(),
///     CacheKey::Details(endpoint, id),
///     DETAILS_CACHE_TTL,
///     async move { fetch_details(id).await }
/// );
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        match $cache {
            Some(cache) => {
                let hit = match cache.get_from_cache(&key).await {
                    Ok(hit) => hit,
                    Err(e) => {
                        tracing::warn!(error = %e, key = %key, "Cache read failed, treating as miss");
                        None
                    }
                };
                if let Some(cached) = hit {
                    Ok(cached)
                } else {
                    let value = $block.await?;
                    cache.set_in_background(&key, &value, $ttl);
                    Ok(value)
                }
            }
            None => $block.await,
        }
    }};
}
