//! Leaderboard snapshot HTTP handler.
//!
//! ```text
//! GET /api/v1/leaderboard?limit=N
//! ```
//!
//! Returns the same snapshot a `/ws/leaderboard` subscriber receives as its
//! first frame; live updates only flow over the socket.

use actix_web::{get, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::domain::{Error, LeaderboardEntry, LeaderboardLimit, MAX_LEADERBOARD_LIMIT};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct LeaderboardQueryParams {
    /// Entries to return, 1 to 20; the server default applies when omitted.
    #[param(minimum = 1, maximum = 20)]
    pub limit: Option<usize>,
}

/// Ranked leaderboard snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardBody {
    pub limit: usize,
    pub entries: Vec<LeaderboardEntry>,
}

/// Resolve a requested entry count against the configured default.
pub(crate) fn resolve_limit(
    requested: Option<usize>,
    default: LeaderboardLimit,
) -> Result<LeaderboardLimit, Error> {
    LeaderboardLimit::or_default(requested, default).map_err(|err| {
        Error::invalid_request(err.to_string()).with_details(json!({
            "field": "limit",
            "max": MAX_LEADERBOARD_LIMIT,
            "code": "limit_out_of_range",
        }))
    })
}

/// Top entries by score, ties broken by the earlier submission.
#[utoipa::path(
    get,
    path = "/api/v1/leaderboard",
    params(LeaderboardQueryParams),
    responses(
        (status = 200, description = "Leaderboard snapshot", body = LeaderboardBody),
        (status = 400, description = "Limit out of range", body = Error),
        (status = 503, description = "Store unavailable", body = Error)
    ),
    tags = ["leaderboard"],
    operation_id = "getLeaderboard"
)]
#[get("/leaderboard")]
pub async fn get_leaderboard(
    state: web::Data<HttpState>,
    query: web::Query<LeaderboardQueryParams>,
) -> ApiResult<web::Json<LeaderboardBody>> {
    let limit = resolve_limit(query.limit, state.default_limit)?;
    let entries = state.leaderboard.top(limit).await?;
    Ok(web::Json(LeaderboardBody {
        limit: limit.get(),
        entries,
    }))
}
