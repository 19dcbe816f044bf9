//! In-process collaborators for hosts without a database or cache server.

use std::collections::{BTreeMap, HashMap};
use std::convert::Infallible;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};

use forum_model::{
    cache::*,
    clock::{Clock, SystemClock},
    store::*,
    ActivityRecord, User, UserId,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// A topic or a reply, reduced to what scoring needs.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn new(user_id: u64, created_at: DateTime<Utc>) -> Self {
        Self {
            user_id: UserId(user_id),
            created_at,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForumSnapshot {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub topics: Vec<Post>,
    #[serde(default)]
    pub replies: Vec<Post>,
}

#[derive(Debug, Default)]
struct ForumTables {
    users: HashMap<UserId, User>,
    topics: Vec<Post>,
    replies: Vec<Post>,
}

impl From<ForumSnapshot> for ForumTables {
    fn from(snapshot: ForumSnapshot) -> Self {
        let ForumSnapshot {
            users,
            topics,
            replies,
        } = snapshot;
        Self {
            users: users.into_iter().map(|u| (u.id(), u)).collect(),
            topics,
            replies,
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryForum(Mutex<ForumTables>);

impl MemoryForum {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: ForumSnapshot) -> Self {
        Self(Mutex::new(ForumTables::from(snapshot)))
    }

    /// Swaps every table for the contents of `snapshot`.
    pub fn replace(&self, snapshot: ForumSnapshot) {
        *lock(&self.0) = ForumTables::from(snapshot);
    }

    pub fn add_user(&self, user: User) {
        lock(&self.0).users.insert(user.id(), user);
    }

    pub fn remove_user(&self, id: UserId) -> Option<User> {
        lock(&self.0).users.remove(&id)
    }

    pub fn add_topic(&self, post: Post) {
        lock(&self.0).topics.push(post);
    }

    pub fn add_reply(&self, post: Post) {
        lock(&self.0).replies.push(post);
    }

    fn count_since(posts: &[Post], since: DateTime<Utc>) -> Vec<ActivityRecord> {
        let mut counts = BTreeMap::<UserId, u64>::new();
        for post in posts.iter().filter(|p| p.created_at >= since) {
            *counts.entry(post.user_id).or_default() += 1;
        }
        counts
            .into_iter()
            .map(|(user_id, count)| ActivityRecord { user_id, count })
            .collect()
    }
}

impl DataSource for MemoryForum {
    type Error = Infallible;
}

impl TopicStore for MemoryForum {
    fn count_topics_since(
        &self,
        since: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Vec<ActivityRecord>, Self::Error>> {
        let records = Self::count_since(&lock(&self.0).topics, since);
        Box::pin(async move { Ok::<_, Infallible>(records) })
    }
}

impl ReplyStore for MemoryForum {
    fn count_replies_since(
        &self,
        since: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Vec<ActivityRecord>, Self::Error>> {
        let records = Self::count_since(&lock(&self.0).replies, since);
        Box::pin(async move { Ok::<_, Infallible>(records) })
    }
}

impl UserStore for MemoryForum {
    fn find_user(&self, id: UserId) -> BoxFuture<'_, Result<Option<User>, Self::Error>> {
        let user = lock(&self.0).users.get(&id).cloned();
        Box::pin(async move { Ok::<_, Infallible>(user) })
    }
}

#[derive(Debug)]
struct Entry<T> {
    value: T,
    expires_at: DateTime<Utc>,
}

/// Expiring cache held in process memory. Expiry is checked on read.
#[derive(Debug)]
pub struct MemoryCache<T, K = SystemClock> {
    entries: Mutex<HashMap<String, Entry<T>>>,
    clock: K,
}

impl<T> MemoryCache<T> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl<T> Default for MemoryCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, K: Clock> MemoryCache<T, K> {
    pub fn with_clock(clock: K) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Whether `key` holds an entry, expired or not.
    pub fn contains(&self, key: &str) -> bool {
        lock(&self.entries).contains_key(key)
    }

    pub fn expires_at(&self, key: &str) -> Option<DateTime<Utc>> {
        lock(&self.entries).get(key).map(|e| e.expires_at)
    }
}

impl<T, K> Cache for MemoryCache<T, K> {
    type Error = Infallible;
}

impl<T, K> LoadCache<T> for MemoryCache<T, K>
where
    T: Clone + Send + 'static,
    K: Clock,
{
    fn load(&self, key: &str) -> BoxFuture<'_, Result<Option<T>, Self::Error>> {
        let now = self.clock.now();
        let mut entries = lock(&self.entries);
        let value = match entries.get(key).map(|e| e.expires_at > now) {
            Some(true) => entries.get(key).map(|e| e.value.clone()),
            Some(false) => {
                entries.remove(key);
                None
            }
            None => None,
        };
        Box::pin(async move { Ok::<_, Infallible>(value) })
    }
}

impl<T, K> StoreCache<T> for MemoryCache<T, K>
where
    T: Clone + Send + 'static,
    K: Clock,
{
    fn store(
        &self,
        key: &str,
        item: &T,
        ttl: chrono::Duration,
    ) -> BoxFuture<'_, Result<(), Self::Error>> {
        let entry = Entry {
            value: item.clone(),
            expires_at: self.clock.now() + ttl,
        };
        lock(&self.entries).insert(key.to_owned(), entry);
        Box::pin(async { Ok::<_, Infallible>(()) })
    }
}

impl<T, K> EvictCache for MemoryCache<T, K> {
    fn evict(&self, key: &str) -> BoxFuture<'_, Result<(), Self::Error>> {
        lock(&self.entries).remove(key);
        Box::pin(async { Ok::<_, Infallible>(()) })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use forum_model::clock::ManualClock;

    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn forum_counts_posts_per_author_inclusive_of_start() {
        let forum = MemoryForum::new();
        forum.add_topic(Post::new(1, at("2021-11-01T00:00:00Z")));
        forum.add_topic(Post::new(1, at("2021-11-03T00:00:00Z")));
        forum.add_topic(Post::new(2, at("2021-10-31T23:59:59Z")));
        forum.add_reply(Post::new(2, at("2021-11-02T00:00:00Z")));

        let since = at("2021-11-01T00:00:00Z");
        let topics = forum.count_topics_since(since).await.unwrap();
        assert_eq!(topics, [ActivityRecord::new(1, 2)]);
        let replies = forum.count_replies_since(since).await.unwrap();
        assert_eq!(replies, [ActivityRecord::new(2, 1)]);
    }

    #[tokio::test]
    async fn forum_user_lookup() {
        let forum = MemoryForum::from_snapshot(ForumSnapshot {
            users: vec![User::new(1, "alice")],
            ..Default::default()
        });
        assert_eq!(forum.find_user(UserId(1)).await.unwrap().unwrap().name(), "alice");
        assert!(forum.find_user(UserId(2)).await.unwrap().is_none());

        forum.remove_user(UserId(1));
        assert!(forum.find_user(UserId(1)).await.unwrap().is_none());

        forum.replace(ForumSnapshot {
            users: vec![User::new(2, "bob")],
            ..Default::default()
        });
        assert_eq!(forum.find_user(UserId(2)).await.unwrap().unwrap().name(), "bob");
    }

    #[tokio::test]
    async fn cache_entries_expire() {
        let clock = Arc::new(ManualClock::new(at("2021-11-01T00:00:00Z")));
        let cache = MemoryCache::<u32, _>::with_clock(clock.clone());

        cache.store("k", &7, chrono::Duration::minutes(60)).await.unwrap();
        assert_eq!(cache.load("k").await.unwrap(), Some(7));
        assert_eq!(cache.expires_at("k"), Some(at("2021-11-01T01:00:00Z")));

        clock.advance(chrono::Duration::minutes(59));
        assert_eq!(cache.load("k").await.unwrap(), Some(7));

        clock.advance(chrono::Duration::minutes(1));
        assert_eq!(cache.load("k").await.unwrap(), None);
        assert!(!cache.contains("k"));
    }

    #[tokio::test]
    async fn evicting_missing_key_is_noop() {
        let cache = MemoryCache::<u32>::new();
        cache.evict("missing").await.unwrap();
        assert!(!cache.contains("missing"));

        cache.store("k", &1, chrono::Duration::minutes(1)).await.unwrap();
        cache.evict("k").await.unwrap();
        assert_eq!(cache.load("k").await.unwrap(), None);
    }
}
