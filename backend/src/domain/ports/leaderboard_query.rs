//! Driving port for reading and following the leaderboard.

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream};

use crate::domain::{Error, LeaderboardEntry, LeaderboardLimit};

/// Stream of leaderboard snapshots, current board first.
pub type LeaderboardStream = BoxStream<'static, Result<Vec<LeaderboardEntry>, Error>>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeaderboardQuery: Send + Sync {
    /// Current top entries.
    async fn top(&self, limit: LeaderboardLimit) -> Result<Vec<LeaderboardEntry>, Error>;

    /// Lazily follow the board: the current snapshot, then a fresh snapshot
    /// after each committed submission.
    fn subscribe(&self, limit: LeaderboardLimit) -> LeaderboardStream;
}

/// Fixture query with an empty board.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureLeaderboardQuery;

#[async_trait]
impl LeaderboardQuery for FixtureLeaderboardQuery {
    async fn top(&self, _limit: LeaderboardLimit) -> Result<Vec<LeaderboardEntry>, Error> {
        Ok(Vec::new())
    }

    fn subscribe(&self, _limit: LeaderboardLimit) -> LeaderboardStream {
        Box::pin(stream::once(async { Ok(Vec::new()) }))
    }
}
