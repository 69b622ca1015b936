//! WebSocket inbound adapter pushing live leaderboard updates.
//!
//! Responsibilities:
//! - validate upgrade requests against the origin allow-list
//! - resolve the requested entry count before the upgrade
//! - run one leaderboard subscription per connection

use actix_web::http::header::{HeaderValue, ORIGIN};
use actix_web::web::{self, Payload};
use actix_web::{HttpRequest, HttpResponse, get};
use tracing::{Instrument, error, info, info_span, warn};
use url::Url;

use crate::domain::{Error, TraceId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::leaderboard::{LeaderboardQueryParams, resolve_limit};

mod session;

pub mod messages;
pub mod origin;
pub mod state;

/// Upgrade to a socket streaming leaderboard snapshots.
///
/// The first frame is the current board; another follows each committed
/// submission.
#[utoipa::path(
    get,
    path = "/ws/leaderboard",
    params(LeaderboardQueryParams),
    responses(
        (status = 101, description = "Switching protocols"),
        (status = 400, description = "Malformed origin or limit out of range", body = Error),
        (status = 403, description = "Origin not allowed", body = Error),
    ),
    tags = ["leaderboard"],
    operation_id = "leaderboardSocket"
)]
#[get("/ws/leaderboard")]
pub async fn leaderboard_ws(
    state: web::Data<state::WsState>,
    query: web::Query<LeaderboardQueryParams>,
    req: HttpRequest,
    body: Payload,
) -> ApiResult<HttpResponse> {
    let mut origins = req.headers().get_all(ORIGIN);
    let origin = origins.next().ok_or_else(|| {
        warn!("missing Origin header on leaderboard upgrade");
        Error::forbidden("Origin not allowed")
    })?;
    if origins.next().is_some() {
        warn!("multiple Origin headers on leaderboard upgrade");
        return Err(Error::invalid_request("Invalid Origin header"));
    }
    validate_origin(&state.origins, origin)?;

    let limit = resolve_limit(query.limit, state.default_limit)?;
    let (response, session, stream) = actix_ws::handle(&req, body).map_err(|err| {
        error!(error = %err, "leaderboard upgrade failed");
        Error::from(err)
    })?;

    let trace_id = TraceId::current().unwrap_or_else(TraceId::generate);
    let updates = state.leaderboard.subscribe(limit);
    info!(limit = limit.get(), "leaderboard socket opened");
    actix_web::rt::spawn(
        TraceId::scope(
            trace_id,
            session::handle_ws_session(limit, updates, session, stream),
        )
        .instrument(info_span!("leaderboard_socket", %trace_id)),
    );
    Ok(response)
}

fn validate_origin(allowed: &origin::AllowedOrigins, header: &HeaderValue) -> Result<(), Error> {
    let raw = header.to_str().map_err(|err| {
        warn!(error = %err, "Origin header is not visible ASCII");
        Error::invalid_request("Invalid Origin header")
    })?;
    let parsed = Url::parse(raw).map_err(|err| {
        warn!(error = %err, "Origin header is not a URL");
        Error::invalid_request("Invalid Origin header")
    })?;

    if allowed.allows(&parsed) {
        Ok(())
    } else {
        warn!(origin = raw, "rejected leaderboard upgrade from disallowed origin");
        Err(Error::forbidden("Origin not allowed"))
    }
}
