use serde::{Deserialize, Serialize};

pub mod cache;
pub mod clock;
pub mod store;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    introduction: Option<String>,
}

impl User {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id: UserId(id),
            name: name.into(),
            avatar: None,
            introduction: None,
        }
    }

    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }

    pub fn with_introduction(mut self, introduction: impl Into<String>) -> Self {
        self.introduction = Some(introduction.into());
        self
    }
}

impl User {
    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn avatar(&self) -> Option<&str> {
        self.avatar.as_deref()
    }

    pub fn introduction(&self) -> Option<&str> {
        self.introduction.as_deref()
    }
}

/// Number of topics or replies a user created inside the activity window.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub user_id: UserId,
    pub count: u64,
}

impl ActivityRecord {
    pub fn new(user_id: u64, count: u64) -> Self {
        Self {
            user_id: UserId(user_id),
            count,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ScoredUser {
    pub user_id: UserId,
    pub score: u64,
}

impl ScoredUser {
    /// Descending by score, then ascending by user id.
    pub fn rank_cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .score
            .cmp(&self.score)
            .then_with(|| self.user_id.cmp(&other.user_id))
    }
}

/// Resolved users, highest score first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RankedUserList(Vec<User>);

impl RankedUserList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, user: User) {
        self.0.push(user);
    }

    pub fn ids(&self) -> impl Iterator<Item = UserId> + '_ {
        self.0.iter().map(User::id)
    }

    pub fn into_inner(self) -> Vec<User> {
        self.0
    }
}

impl std::ops::Deref for RankedUserList {
    type Target = [User];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<User>> for RankedUserList {
    fn from(users: Vec<User>) -> Self {
        Self(users)
    }
}

impl FromIterator<User> for RankedUserList {
    fn from_iter<I: IntoIterator<Item = User>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for RankedUserList {
    type Item = User;
    type IntoIter = std::vec::IntoIter<User>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a RankedUserList {
    type Item = &'a User;
    type IntoIter = std::slice::Iter<'a, User>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_order_breaks_ties_by_id() {
        let mut users = vec![
            ScoredUser { user_id: UserId(3), score: 10 },
            ScoredUser { user_id: UserId(1), score: 4 },
            ScoredUser { user_id: UserId(2), score: 10 },
        ];
        users.sort_by(ScoredUser::rank_cmp);
        let ids = users.iter().map(|u| u.user_id.0).collect::<Vec<_>>();
        assert_eq!(ids, [2, 3, 1]);
    }

    #[test]
    fn ranked_list_is_a_plain_json_array() {
        let list = RankedUserList::from(vec![
            User::new(7, "alice").with_avatar("https://example.com/a.png"),
            User::new(3, "bob"),
        ]);
        let json = serde_json::to_value(&list).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                { "id": 7, "name": "alice", "avatar": "https://example.com/a.png" },
                { "id": 3, "name": "bob" },
            ])
        );

        let parsed = serde_json::from_value::<RankedUserList>(json).unwrap();
        assert_eq!(parsed, list);
        assert_eq!(parsed.ids().collect::<Vec<_>>(), [UserId(7), UserId(3)]);
    }
}
