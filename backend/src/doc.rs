//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every HTTP endpoint, the leaderboard socket upgrade,
//! and the session cookie scheme. The document backs Swagger UI in debug
//! builds and is exported with `cargo run --bin openapi-dump`.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::ports::{CaptureOptions, RoastSubmissionResponse};
use crate::domain::{
    CaptureBranch, CaptureSource, Error, ErrorCode, LeaderboardEntry, RoastPresentation,
    SocialPlatform,
};
use crate::inbound::http::capture::CameraPermission;
use crate::inbound::http::leaderboard::LeaderboardBody;
use crate::inbound::http::roasts::{CaptureBody, RoastSubmissionBody};
use crate::inbound::http::submission_session::SessionStateBody;

/// Adds the session cookie security scheme.
struct SessionCookieAddon;

impl Modify for SessionCookieAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Private cookie carrying the per-browser submission marker. Issued on first use.",
            ))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SessionCookieAddon),
    info(
        title = "roasted.lol API",
        description = "Selfie capture, AI roast scoring and a live leaderboard."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::capture::capture_options,
        crate::inbound::http::roasts::submit_roast,
        crate::inbound::http::submission_session::get_session,
        crate::inbound::http::submission_session::reset_session,
        crate::inbound::http::leaderboard::get_leaderboard,
        crate::inbound::ws::leaderboard_ws,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        CaptureBranch,
        CaptureSource,
        CaptureOptions,
        CameraPermission,
        SocialPlatform,
        RoastSubmissionBody,
        CaptureBody,
        RoastSubmissionResponse,
        RoastPresentation,
        SessionStateBody,
        LeaderboardEntry,
        LeaderboardBody,
    )),
    tags(
        (name = "capture", description = "Capture sources offered after the camera prompt"),
        (name = "roasts", description = "Submitting a picture for a roast"),
        (name = "session", description = "Per-browser submission marker"),
        (name = "leaderboard", description = "Top roasts, pulled or pushed"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
