use std::collections::HashMap;

use forum_model::{ActivityRecord, ScoredUser, UserId};

/// Combines topic and reply counts into one score per user.
///
/// Topic records overwrite, reply records accumulate on top. Records with a
/// zero count never create an entry.
pub fn tally(
    topics: &[ActivityRecord],
    replies: &[ActivityRecord],
    topic_weight: u64,
    reply_weight: u64,
) -> HashMap<UserId, u64> {
    let mut scores = HashMap::new();

    for record in topics.iter().filter(|r| r.count > 0) {
        scores.insert(record.user_id, record.count.saturating_mul(topic_weight));
    }
    for record in replies.iter().filter(|r| r.count > 0) {
        let score = scores.entry(record.user_id).or_insert(0u64);
        *score = score.saturating_add(record.count.saturating_mul(reply_weight));
    }

    scores
}

/// Top `limit` users by score, ties going to the lower user id.
pub fn rank(scores: &HashMap<UserId, u64>, limit: usize) -> Vec<UserId> {
    let mut scored = scores
        .iter()
        .map(|(&user_id, &score)| ScoredUser { user_id, score })
        .collect::<Vec<_>>();
    scored.sort_unstable_by(ScoredUser::rank_cmp);
    scored.truncate(limit);
    scored.into_iter().map(|s| s.user_id).collect()
}
