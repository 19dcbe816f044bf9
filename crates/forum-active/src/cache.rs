use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use forum_model::{
    cache::*,
    clock::{Clock, SystemClock},
};

/// One JSON file per key, carrying its own expiry time.
#[derive(Debug, Clone)]
pub struct FsCache<K = SystemClock> {
    root: PathBuf,
    clock: K,
}

impl FsCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_clock(path, SystemClock)
    }
}

impl<K> FsCache<K> {
    pub fn with_clock(path: impl Into<PathBuf>, clock: K) -> Self {
        Self {
            root: path.into(),
            clock,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, key: &str) -> Result<PathBuf, FsError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
            && !key.starts_with('.');
        if !valid {
            return Err(FsError::InvalidKey(key.to_owned()));
        }
        Ok(self.root.join(format!("{}.json", key)))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FsError {
    #[error("I/O error: {0}")]
    Io(#[from] #[source] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] #[source] serde_json::Error),
    #[error("invalid cache key {0:?}")]
    InvalidKey(String),
}

#[derive(Debug, Serialize)]
struct EntryRef<'a, T> {
    expires_at: DateTime<Utc>,
    value: &'a T,
}

#[derive(Debug, Deserialize)]
struct Entry<T> {
    expires_at: DateTime<Utc>,
    value: T,
}

async fn remove_if_exists(path: &Path) -> Result<(), std::io::Error> {
    match tokio::fs::remove_file(path).await {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

impl<K> Cache for FsCache<K> {
    type Error = FsError;
}

impl<T, K> LoadCache<T> for FsCache<K>
where
    T: DeserializeOwned + Send + 'static,
    K: Clock + Sync,
{
    fn load(&self, key: &str) -> BoxFuture<'_, Result<Option<T>, Self::Error>> {
        let path = self.entry_path(key);
        Box::pin(async move {
            let path = path?;
            let data = match tokio::fs::read(&path).await {
                Ok(data) => data,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
                Err(e) => return Err(e.into()),
            };
            let entry = serde_json::from_slice::<Entry<T>>(&data)?;
            if entry.expires_at <= self.clock.now() {
                log::debug!("Cache entry {} expired at {}", path.display(), entry.expires_at);
                remove_if_exists(&path).await?;
                return Ok(None);
            }
            Ok::<_, FsError>(Some(entry.value))
        })
    }
}

impl<T, K> StoreCache<T> for FsCache<K>
where
    T: Serialize,
    K: Clock + Sync,
{
    fn store(
        &self,
        key: &str,
        item: &T,
        ttl: chrono::Duration,
    ) -> BoxFuture<'_, Result<(), Self::Error>> {
        let path = self.entry_path(key);
        let data = serde_json::to_vec(&EntryRef {
            expires_at: self.clock.now() + ttl,
            value: item,
        });
        Box::pin(async move {
            let path = path?;
            let data = data?;
            tokio::fs::create_dir_all(&self.root).await?;
            tokio::fs::write(path, data).await?;
            Ok::<_, FsError>(())
        })
    }
}

impl<K: Sync> EvictCache for FsCache<K> {
    fn evict(&self, key: &str) -> BoxFuture<'_, Result<(), Self::Error>> {
        let path = self.entry_path(key);
        Box::pin(async move {
            remove_if_exists(&path?).await?;
            Ok::<_, FsError>(())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use forum_model::{clock::ManualClock, RankedUserList, User};

    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("forum-active-{}-{}", name, std::process::id()));
        std::fs::remove_dir_all(&dir).ok();
        dir
    }

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn stored_list_survives_until_expiry() {
        let dir = scratch_dir("expiry");
        let clock = Arc::new(ManualClock::new(at("2021-11-01T00:00:00Z")));
        let cache = FsCache::with_clock(&dir, clock.clone());
        let users = RankedUserList::from(vec![User::new(2, "bob"), User::new(1, "alice")]);

        cache
            .store("active_users", &users, chrono::Duration::minutes(60))
            .await
            .unwrap();
        assert!(dir.join("active_users.json").exists());

        let loaded: Option<RankedUserList> = cache.load("active_users").await.unwrap();
        assert_eq!(loaded, Some(users));

        clock.advance(chrono::Duration::minutes(60));
        let loaded: Option<RankedUserList> = cache.load("active_users").await.unwrap();
        assert_eq!(loaded, None);
        assert!(!dir.join("active_users.json").exists());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn missing_entries() {
        let dir = scratch_dir("missing");
        let cache = FsCache::new(&dir);

        let loaded: Option<RankedUserList> = cache.load("active_users").await.unwrap();
        assert_eq!(loaded, None);
        cache.evict("active_users").await.unwrap();

        cache
            .store("active_users", &RankedUserList::new(), chrono::Duration::minutes(1))
            .await
            .unwrap();
        cache.evict("active_users").await.unwrap();
        let loaded: Option<RankedUserList> = cache.load("active_users").await.unwrap();
        assert_eq!(loaded, None);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn keys_cannot_escape_root() {
        let cache = FsCache::new(scratch_dir("keys"));
        for key in ["", "../etc/passwd", "a/b", ".hidden"] {
            let err = cache.evict(key).await.unwrap_err();
            assert!(matches!(err, FsError::InvalidKey(_)), "{}", key);
        }
    }
}
