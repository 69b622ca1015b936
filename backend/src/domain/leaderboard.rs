//! Leaderboard projection, ranking, and the commit feed driving live pushes.

use std::cmp::Ordering;

use serde::Serialize;
use tokio::sync::broadcast;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{RoastScore, SubmissionRecord};

/// Entries shown when the caller does not ask for a specific count.
pub const DEFAULT_LEADERBOARD_LIMIT: usize = 5;
/// Hard cap on entries per read.
pub const MAX_LEADERBOARD_LIMIT: usize = 20;

const FEED_CAPACITY: usize = 64;

/// Validation errors for [`LeaderboardLimit`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LeaderboardLimitError {
    #[error("limit must be between 1 and {max}, got {value}")]
    OutOfRange { value: usize, max: usize },
}

/// Number of entries requested, in `1..=MAX_LEADERBOARD_LIMIT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaderboardLimit(usize);

impl LeaderboardLimit {
    pub fn new(value: usize) -> Result<Self, LeaderboardLimitError> {
        if value == 0 || value > MAX_LEADERBOARD_LIMIT {
            return Err(LeaderboardLimitError::OutOfRange {
                value,
                max: MAX_LEADERBOARD_LIMIT,
            });
        }
        Ok(Self(value))
    }

    /// Use `requested` when present, otherwise `default`.
    pub fn or_default(
        requested: Option<usize>,
        default: LeaderboardLimit,
    ) -> Result<Self, LeaderboardLimitError> {
        requested.map_or(Ok(default), Self::new)
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for LeaderboardLimit {
    fn default() -> Self {
        Self(DEFAULT_LEADERBOARD_LIMIT)
    }
}

/// Read-only leaderboard row.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    #[schema(example = 1)]
    pub rank: u32,
    #[schema(example = "Captain Selfie")]
    pub nickname: String,
    #[schema(value_type = f64, example = 9.5)]
    pub score: RoastScore,
    #[schema(example = "Bold lighting choice.")]
    pub roast: String,
}

fn leaderboard_order(a: &SubmissionRecord, b: &SubmissionRecord) -> Ordering {
    b.score()
        .value()
        .total_cmp(&a.score().value())
        .then_with(|| a.created_at().cmp(&b.created_at()))
}

/// Order records by score descending (earlier first on ties) and keep the
/// top `limit`, numbering ranks from one.
///
/// An empty input yields an empty board.
pub fn rank_entries(
    records: impl IntoIterator<Item = SubmissionRecord>,
    limit: LeaderboardLimit,
) -> Vec<LeaderboardEntry> {
    let mut records: Vec<SubmissionRecord> = records.into_iter().collect();
    records.sort_by(leaderboard_order);
    records
        .into_iter()
        .take(limit.get())
        .zip(1_u32..)
        .map(|(record, rank)| LeaderboardEntry {
            rank,
            nickname: record.nickname().to_owned(),
            score: record.score(),
            roast: record.roast().to_owned(),
        })
        .collect()
}

/// Broadcast of committed submission ids.
///
/// Subscribers treat every message as "the board may have changed" and
/// reload; a lagged receiver simply reloads once.
#[derive(Debug, Clone)]
pub struct LeaderboardFeed {
    sender: broadcast::Sender<Uuid>,
}

impl Default for LeaderboardFeed {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(FEED_CAPACITY);
        Self { sender }
    }
}

impl LeaderboardFeed {
    /// Announce a committed submission. No-op without subscribers.
    pub fn publish(&self, submission_id: Uuid) {
        let _ = self.sender.send(submission_id);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Uuid> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use rstest::rstest;

    use super::*;
    use crate::domain::{ContactEmail, EvaluationResult, NewSubmission};

    fn record(index: i64, score: f64) -> SubmissionRecord {
        let created_at = Utc
            .with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp")
            + Duration::seconds(index);
        SubmissionRecord::new(
            Uuid::new_v4(),
            NewSubmission {
                email: ContactEmail::new(format!("user{index}@example.com")).expect("valid email"),
                evaluation: EvaluationResult::new(
                    RoastScore::clamped(score).expect("finite"),
                    format!("nick-{index}"),
                    "roast",
                )
                .expect("valid evaluation"),
            },
            created_at,
        )
    }

    #[test]
    fn orders_by_score_descending_and_truncates() {
        let records = [9.5, 7.0, 10.0, 8.2]
            .into_iter()
            .enumerate()
            .map(|(i, score)| record(i as i64, score));

        let entries = rank_entries(records, LeaderboardLimit::new(3).expect("valid limit"));

        let scores: Vec<f64> = entries.iter().map(|e| e.score.value()).collect();
        assert_eq!(scores, vec![10.0, 9.5, 8.2]);
        let ranks: Vec<u32> = entries.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn earlier_submission_wins_ties() {
        let entries = rank_entries(
            [record(2, 9.0), record(1, 9.0)],
            LeaderboardLimit::default(),
        );
        assert_eq!(entries[0].nickname, "nick-1");
        assert_eq!(entries[1].nickname, "nick-2");
    }

    #[test]
    fn empty_input_is_an_empty_board() {
        assert!(rank_entries(Vec::new(), LeaderboardLimit::default()).is_empty());
    }

    #[rstest]
    #[case(0)]
    #[case(MAX_LEADERBOARD_LIMIT + 1)]
    fn rejects_out_of_range_limits(#[case] value: usize) {
        assert!(LeaderboardLimit::new(value).is_err());
    }

    #[rstest]
    #[case(None, DEFAULT_LEADERBOARD_LIMIT)]
    #[case(Some(1), 1)]
    #[case(Some(MAX_LEADERBOARD_LIMIT), MAX_LEADERBOARD_LIMIT)]
    fn applies_default_limit(#[case] requested: Option<usize>, #[case] expected: usize) {
        let limit = LeaderboardLimit::or_default(requested, LeaderboardLimit::default())
            .expect("valid limit");
        assert_eq!(limit.get(), expected);
    }

    #[tokio::test]
    async fn feed_delivers_to_subscribers() {
        let feed = LeaderboardFeed::default();
        let mut receiver = feed.subscribe();
        let id = Uuid::new_v4();

        feed.publish(id);

        assert_eq!(receiver.recv().await.expect("message"), id);
    }

    #[test]
    fn publishing_without_subscribers_is_harmless() {
        let feed = LeaderboardFeed::default();
        feed.publish(Uuid::new_v4());
        assert_eq!(feed.subscriber_count(), 0);
    }
}
