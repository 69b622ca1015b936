//! Shared WebSocket adapter state.

use std::sync::Arc;

use crate::domain::LeaderboardLimit;
use crate::domain::ports::LeaderboardQuery;

use super::origin::AllowedOrigins;

/// Dependency bundle for the leaderboard socket.
#[derive(Clone)]
pub struct WsState {
    pub leaderboard: Arc<dyn LeaderboardQuery>,
    pub default_limit: LeaderboardLimit,
    pub origins: AllowedOrigins,
}

impl WsState {
    /// State with the default limit and origin allow-list.
    pub fn new(leaderboard: Arc<dyn LeaderboardQuery>) -> Self {
        Self {
            leaderboard,
            default_limit: LeaderboardLimit::default(),
            origins: AllowedOrigins::default(),
        }
    }

    pub fn with_default_limit(mut self, limit: LeaderboardLimit) -> Self {
        self.default_limit = limit;
        self
    }

    pub fn with_origins(mut self, origins: AllowedOrigins) -> Self {
        self.origins = origins;
        self
    }
}
