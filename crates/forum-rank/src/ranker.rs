use std::collections::HashMap;

use chrono::{DateTime, Utc};

use forum_model::{
    cache::*,
    clock::{Clock, SystemClock},
    store::*,
    RankedUserList, UserId,
};

use crate::{score, Error, RankerConfig};

type RankResult<T, S, C> = Result<T, Error<<S as DataSource>::Error, <C as Cache>::Error>>;

/// Scores recent topic and reply activity and keeps the top users cached.
#[derive(Debug)]
pub struct ActiveUserRanker<S, C, K = SystemClock> {
    config: RankerConfig,
    store: S,
    cache: C,
    clock: K,
}

impl<S, C> ActiveUserRanker<S, C> {
    pub fn new(config: RankerConfig, store: S, cache: C) -> Self {
        Self::with_clock(config, store, cache, SystemClock)
    }
}

impl<S, C, K> ActiveUserRanker<S, C, K> {
    pub fn with_clock(config: RankerConfig, store: S, cache: C, clock: K) -> Self {
        Self {
            config,
            store,
            cache,
            clock,
        }
    }

    pub fn config(&self) -> &RankerConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn clock(&self) -> &K {
        &self.clock
    }
}

impl<S, C, K> ActiveUserRanker<S, C, K>
where
    S: TopicStore + ReplyStore + UserStore,
    C: LoadCache<RankedUserList> + StoreCache<RankedUserList> + EvictCache,
    K: Clock,
{
    /// Start of the activity window. Saturates at the earliest representable time.
    fn window_start(&self) -> DateTime<Utc> {
        self.clock
            .now()
            .checked_sub_signed(self.config.window())
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    pub async fn compute_scores(&self) -> RankResult<HashMap<UserId, u64>, S, C> {
        let since = self.window_start();
        let topics = self
            .store
            .count_topics_since(since)
            .await
            .map_err(Error::DataSource)?;
        let replies = self
            .store
            .count_replies_since(since)
            .await
            .map_err(Error::DataSource)?;

        let scores = score::tally(
            &topics,
            &replies,
            self.config.topic_weight,
            self.config.reply_weight,
        );
        log::debug!(
            "Scored {} user(s) since {} ({} topic author(s), {} reply author(s))",
            scores.len(),
            since,
            topics.len(),
            replies.len(),
        );
        Ok(scores)
    }

    pub fn rank(&self, scores: &HashMap<UserId, u64>) -> Vec<UserId> {
        score::rank(scores, self.config.user_count)
    }

    /// Looks up users in order. Users missing from the store are dropped.
    pub async fn resolve(&self, ids: &[UserId]) -> RankResult<RankedUserList, S, C> {
        let mut users = RankedUserList::new();
        for &id in ids {
            match self.store.find_user(id).await.map_err(Error::DataSource)? {
                Some(user) => users.push(user),
                None => log::trace!("User {} not found, skipping", id),
            }
        }
        Ok(users)
    }

    /// Runs the whole pipeline without touching the cache.
    pub async fn calculate_active_users(&self) -> RankResult<RankedUserList, S, C> {
        let scores = self.compute_scores().await?;
        let ids = self.rank(&scores);
        self.resolve(&ids).await
    }

    pub async fn get_active_users(&self) -> RankResult<RankedUserList, S, C> {
        let key = &self.config.cache_key;
        if let Some(users) = self.cache.load(key).await.map_err(Error::Cache)? {
            log::debug!("Cache hit for {}", key);
            return Ok(users);
        }

        log::debug!("Cache miss for {}, calculating", key);
        let users = self.calculate_active_users().await?;
        self.cache
            .store(key, &users, self.config.cache_ttl())
            .await
            .map_err(Error::Cache)?;
        Ok(users)
    }

    /// Evicts the cached list, then stores `users` in its place.
    pub async fn cache_active_users(&self, users: &RankedUserList) -> RankResult<(), S, C> {
        let key = &self.config.cache_key;
        self.cache.evict(key).await.map_err(Error::Cache)?;
        self.cache
            .store(key, users, self.config.cache_ttl())
            .await
            .map_err(Error::Cache)?;
        Ok(())
    }

    pub async fn recalculate_and_cache(&self) -> RankResult<RankedUserList, S, C> {
        let users = self.calculate_active_users().await?;
        self.cache_active_users(&users).await?;
        log::info!(
            "Cached {} active user(s) under {} for {} minute(s)",
            users.len(),
            self.config.cache_key,
            self.config.cache_ttl_minutes,
        );
        Ok(users)
    }
}
