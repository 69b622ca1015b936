//! Leaderboard domain service.
//!
//! Reads the top scores from the submission repository and follows the
//! commit feed so live subscribers receive a fresh snapshot after every
//! stored submission.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{
    LeaderboardQuery, LeaderboardStream, SubmissionRepository, SubmissionRepositoryError,
};
use crate::domain::{Error, LeaderboardEntry, LeaderboardFeed, LeaderboardLimit, rank_entries};

fn map_repository_error(error: SubmissionRepositoryError) -> Error {
    match error {
        SubmissionRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("leaderboard unavailable: {message}"))
        }
        SubmissionRepositoryError::Query { message } => {
            Error::internal(format!("leaderboard query failed: {message}"))
        }
        SubmissionRepositoryError::Duplicate { email_scope } => {
            Error::internal(format!("unexpected duplicate on read ({email_scope})"))
        }
    }
}

async fn load_board(
    repository: &dyn SubmissionRepository,
    limit: LeaderboardLimit,
) -> Result<Vec<LeaderboardEntry>, Error> {
    let records = repository
        .top_scores(limit.get())
        .await
        .map_err(map_repository_error)?;
    Ok(rank_entries(records, limit))
}

/// Leaderboard service implementing [`LeaderboardQuery`].
#[derive(Clone)]
pub struct LeaderboardService {
    repository: Arc<dyn SubmissionRepository>,
    feed: LeaderboardFeed,
}

impl LeaderboardService {
    pub fn new(repository: Arc<dyn SubmissionRepository>, feed: LeaderboardFeed) -> Self {
        Self { repository, feed }
    }
}

struct Follow {
    repository: Arc<dyn SubmissionRepository>,
    commits: broadcast::Receiver<Uuid>,
    limit: LeaderboardLimit,
    primed: bool,
}

impl Follow {
    /// Wait for the next commit, folding any backlog into a single reload.
    /// `false` once the feed has closed.
    async fn next_commit(&mut self) -> bool {
        match self.commits.recv().await {
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                debug!(skipped, "leaderboard subscriber lagged; reloading");
            }
            Err(RecvError::Closed) => return false,
        }
        loop {
            match self.commits.try_recv() {
                Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        true
    }
}

#[async_trait]
impl LeaderboardQuery for LeaderboardService {
    async fn top(&self, limit: LeaderboardLimit) -> Result<Vec<LeaderboardEntry>, Error> {
        load_board(self.repository.as_ref(), limit).await
    }

    fn subscribe(&self, limit: LeaderboardLimit) -> LeaderboardStream {
        // Subscribe before the first read so no commit slips between them.
        let follow = Follow {
            repository: Arc::clone(&self.repository),
            commits: self.feed.subscribe(),
            limit,
            primed: false,
        };
        Box::pin(stream::unfold(follow, |mut follow| async move {
            if follow.primed && !follow.next_commit().await {
                return None;
            }
            follow.primed = true;
            let snapshot = load_board(follow.repository.as_ref(), follow.limit).await;
            Some((snapshot, follow))
        }))
    }
}
