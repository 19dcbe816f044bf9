use futures_util::future::BoxFuture;

/// Expiring key-value store.
pub trait Cache {
    type Error: std::error::Error + Send + Sync + 'static;
}

pub trait LoadCache<Item>: Cache {
    /// Returns `None` when the key is missing or its entry has expired.
    fn load(&self, key: &str) -> BoxFuture<'_, Result<Option<Item>, Self::Error>>;
}

pub trait StoreCache<Item>: Cache {
    fn store(
        &self,
        key: &str,
        item: &Item,
        ttl: chrono::Duration,
    ) -> BoxFuture<'_, Result<(), Self::Error>>;
}

pub trait EvictCache: Cache {
    /// Evicting a missing key is not an error.
    fn evict(&self, key: &str) -> BoxFuture<'_, Result<(), Self::Error>>;
}
