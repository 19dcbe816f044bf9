use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankerConfig {
    pub topic_weight: u64,
    pub reply_weight: u64,
    pub pass_days: u32,
    pub user_count: usize,
    pub cache_key: String,
    pub cache_ttl_minutes: u32,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            topic_weight: 4,
            reply_weight: 1,
            pass_days: 7,
            user_count: 6,
            cache_key: String::from("active_users"),
            cache_ttl_minutes: 60,
        }
    }
}

impl RankerConfig {
    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.pass_days))
    }

    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.cache_ttl_minutes))
    }
}
