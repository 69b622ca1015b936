//! Visitor session endpoints.
//!
//! ```text
//! GET    /api/v1/session
//! DELETE /api/v1/session
//! ```

use actix_web::{HttpResponse, delete, get, web};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{Error, SubmissionSession};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;

/// What the session context currently records.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionStateBody {
    pub already_submitted: bool,
    pub submitted_at: Option<DateTime<Utc>>,
    /// An evaluation survived a failed write and will be reused on retry.
    pub pending_write: bool,
}

impl From<&SubmissionSession> for SessionStateBody {
    fn from(value: &SubmissionSession) -> Self {
        Self {
            already_submitted: value.already_submitted(),
            submitted_at: value.submitted_at(),
            pending_write: value.has_pending(),
        }
    }
}

/// Report the session's submission flags.
#[utoipa::path(
    get,
    path = "/api/v1/session",
    responses(
        (status = 200, description = "Session flags", body = SessionStateBody),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["session"],
    operation_id = "getSession",
    security(("SessionCookie" = []))
)]
#[get("/session")]
pub async fn get_session(session: SessionContext) -> ApiResult<web::Json<SessionStateBody>> {
    let submission = session.submission()?;
    Ok(web::Json(SessionStateBody::from(&submission)))
}

/// Forget the "already submitted" marker and any pending write.
#[utoipa::path(
    delete,
    path = "/api/v1/session",
    responses(
        (status = 204, description = "Session context cleared"),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["session"],
    operation_id = "resetSession",
    security(("SessionCookie" = []))
)]
#[delete("/session")]
pub async fn reset_session(session: SessionContext) -> ApiResult<HttpResponse> {
    session.reset()?;
    Ok(HttpResponse::NoContent().finish())
}
