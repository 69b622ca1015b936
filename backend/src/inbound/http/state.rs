//! Shared HTTP adapter state.
//!
//! Handlers receive this through `actix_web::web::Data` and only ever talk to
//! domain ports, so tests can swap in fixtures or mocks without I/O.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::domain::LeaderboardLimit;
use crate::domain::ports::{LeaderboardQuery, RoastSubmissionService, SubmissionRepository};

/// Port implementations backing the HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub submissions: Arc<dyn RoastSubmissionService>,
    pub leaderboard: Arc<dyn LeaderboardQuery>,
    /// Consulted by the store connectivity probe only.
    pub store: Arc<dyn SubmissionRepository>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub submissions: Arc<dyn RoastSubmissionService>,
    pub leaderboard: Arc<dyn LeaderboardQuery>,
    pub store: Arc<dyn SubmissionRepository>,
    /// Entries returned when a leaderboard request omits `limit`.
    pub default_limit: LeaderboardLimit,
    /// Parent of every per-request cancellation token.
    pub shutdown: CancellationToken,
}

impl HttpState {
    /// Construct state with the default leaderboard size and a fresh shutdown
    /// token.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use roasted::domain::ports::{
    ///     FixtureLeaderboardQuery, FixtureRoastSubmissionService, FixtureSubmissionRepository,
    /// };
    /// use roasted::inbound::http::state::{HttpState, HttpStatePorts};
    ///
    /// let state = HttpState::new(HttpStatePorts {
    ///     submissions: Arc::new(FixtureRoastSubmissionService),
    ///     leaderboard: Arc::new(FixtureLeaderboardQuery),
    ///     store: Arc::new(FixtureSubmissionRepository),
    /// });
    /// assert_eq!(state.default_limit.get(), 5);
    /// ```
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            submissions,
            leaderboard,
            store,
        } = ports;
        Self {
            submissions,
            leaderboard,
            store,
            default_limit: LeaderboardLimit::default(),
            shutdown: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn with_default_limit(mut self, limit: LeaderboardLimit) -> Self {
        self.default_limit = limit;
        self
    }

    /// Tie request cancellation to the server's shutdown token.
    #[must_use]
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }
}
