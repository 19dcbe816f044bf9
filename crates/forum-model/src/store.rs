use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;

use crate::{ActivityRecord, User, UserId};

/// Backing forum database. Topic, reply and user lookups share one error type.
pub trait DataSource {
    type Error: std::error::Error + Send + Sync + 'static;
}

pub trait TopicStore: DataSource {
    /// Topics created at or after `since`, counted per author.
    fn count_topics_since(
        &self,
        since: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Vec<ActivityRecord>, Self::Error>>;
}

pub trait ReplyStore: DataSource {
    /// Replies created at or after `since`, counted per author.
    fn count_replies_since(
        &self,
        since: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Vec<ActivityRecord>, Self::Error>>;
}

pub trait UserStore: DataSource {
    fn find_user(&self, id: UserId) -> BoxFuture<'_, Result<Option<User>, Self::Error>>;
}
