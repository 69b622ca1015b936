//! Frames pushed to leaderboard WebSocket clients.
//!
//! Every frame is a JSON object tagged by `type`.

use serde::Serialize;

use crate::domain::{Error, ErrorCode, LeaderboardEntry, LeaderboardLimit, TraceId};
use crate::inbound::http::error::client_view;

/// Outbound leaderboard frame.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LeaderboardFrame {
    /// Full board after a change (or on connect).
    Snapshot {
        limit: usize,
        entries: Vec<LeaderboardEntry>,
    },
    /// The board could not be read this time; the connection stays open.
    #[serde(rename_all = "camelCase")]
    Error {
        code: ErrorCode,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        trace_id: Option<String>,
    },
}

impl LeaderboardFrame {
    pub fn snapshot(limit: LeaderboardLimit, entries: Vec<LeaderboardEntry>) -> Self {
        Self::Snapshot {
            limit: limit.get(),
            entries,
        }
    }

    /// Error frame carrying only what clients may see.
    ///
    /// Falls back to the connection's trace id when the error has none.
    pub fn error(error: &Error) -> Self {
        let visible = client_view(error);
        Self::Error {
            code: visible.code(),
            message: visible.message().to_owned(),
            trace_id: visible
                .trace_id()
                .map(str::to_owned)
                .or_else(|| TraceId::current().map(|id| id.to_string())),
        }
    }
}
