use std::path::Path;

use eyre::{Result, WrapErr};
use serde::de::DeserializeOwned;

use forum_rank::memory::ForumSnapshot;

async fn read_table<T: DeserializeOwned>(dir: &Path, name: &str) -> Result<Vec<T>> {
    let path = dir.join(name);
    let data = match tokio::fs::read(&path).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::warn!("{} not found, treating as empty", path.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };
    let rows = serde_json::from_slice::<Vec<T>>(&data)
        .wrap_err_with(|| format!("Failed to parse {}", path.display()))?;
    Ok(rows)
}

/// Loads `users.json`, `topics.json` and `replies.json` from `dir`.
pub async fn load_snapshot(dir: impl AsRef<Path>) -> Result<ForumSnapshot> {
    let dir = dir.as_ref();
    let snapshot = ForumSnapshot {
        users: read_table(dir, "users.json").await?,
        topics: read_table(dir, "topics.json").await?,
        replies: read_table(dir, "replies.json").await?,
    };
    log::debug!(
        "Loaded {} user(s), {} topic(s), {} reply(ies) from {}",
        snapshot.users.len(),
        snapshot.topics.len(),
        snapshot.replies.len(),
        dir.display(),
    );
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use forum_model::UserId;

    use super::*;

    #[tokio::test]
    async fn reads_tables_and_tolerates_missing_ones() {
        let dir = std::env::temp_dir().join(format!("forum-active-snapshot-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("users.json"),
            r#"[{"id": 1, "name": "alice"}, {"id": 2, "name": "bob", "avatar": "https://example.com/b.png"}]"#,
        )
        .unwrap();
        std::fs::write(
            dir.join("topics.json"),
            r#"[{"user_id": 1, "created_at": "2021-11-01T09:30:00Z"}]"#,
        )
        .unwrap();
        std::fs::remove_file(dir.join("replies.json")).ok();

        let snapshot = load_snapshot(&dir).await.unwrap();
        assert_eq!(snapshot.users.len(), 2);
        assert_eq!(snapshot.users[1].avatar(), Some("https://example.com/b.png"));
        assert_eq!(snapshot.topics.len(), 1);
        assert_eq!(snapshot.topics[0].user_id, UserId(1));
        assert!(snapshot.replies.is_empty());

        std::fs::write(dir.join("replies.json"), "not json").unwrap();
        let err = load_snapshot(&dir).await.unwrap_err();
        assert!(err.to_string().contains("replies.json"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
