//! Roast submission HTTP handler.
//!
//! ```text
//! POST /api/v1/roasts
//! ```
//!
//! Images travel as base64 `data:` URLs inside the JSON body. The session
//! context is written back whatever the outcome, so a failed store write keeps
//! its evaluation for the retry.

use std::sync::Arc;

use actix_web::error::JsonPayloadError;
use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use utoipa::ToSchema;

use crate::domain::ports::{CaptureInput, RoastSubmissionRequest, RoastSubmissionResponse};
use crate::domain::{Error, MAX_CAPTURE_BYTES, SocialPlatform, UploadedFile, decode_data_url};
use crate::inbound::http::ApiResult;
use crate::inbound::http::camera::DataUrlCamera;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Largest JSON body accepted: a maximal capture after base64 expansion, plus
/// headroom for the other fields.
pub const MAX_SUBMISSION_BODY_BYTES: usize = MAX_CAPTURE_BYTES / 3 * 4 + 64 * 1024;

/// Request payload for one roast.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoastSubmissionBody {
    /// Outcome of the browser's camera prompt; absent means denied.
    #[serde(default)]
    pub camera_permission_granted: bool,
    pub capture: CaptureBody,
    #[schema(example = "ada@example.com")]
    pub email: String,
    /// Token from the human verification widget.
    pub verification_token: Option<String>,
}

/// Image source, tagged by `source`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum CaptureBody {
    /// A still grabbed by the browser from the webcam.
    Camera {
        #[serde(rename = "frameDataUrl")]
        #[schema(example = "data:image/jpeg;base64,/9j/4AAQ...")]
        frame_data_url: Option<String>,
    },
    /// A file picked by the visitor; absent or empty means nothing was chosen.
    Upload {
        #[serde(rename = "fileDataUrl")]
        #[schema(example = "data:image/png;base64,iVBORw0KGgo...")]
        file_data_url: Option<String>,
    },
    /// A social profile whose picture should be fetched.
    Profile {
        platform: SocialPlatform,
        #[schema(example = "@ada")]
        handle: String,
    },
}

impl CaptureBody {
    fn into_input(self) -> Result<CaptureInput, Error> {
        match self {
            Self::Camera { frame_data_url } => {
                Ok(CaptureInput::Camera(Arc::new(DataUrlCamera::new(frame_data_url))))
            }
            Self::Upload { file_data_url } => {
                let Some(url) = file_data_url.filter(|url| !url.trim().is_empty()) else {
                    return Ok(CaptureInput::Upload(None));
                };
                let (mime, bytes) = decode_data_url(&url).map_err(|err| {
                    Error::invalid_request(format!("capture file is not a usable data URL: {err}"))
                        .with_details(json!({
                            "field": "capture.fileDataUrl",
                            "code": "invalid_data_url",
                        }))
                })?;
                Ok(CaptureInput::Upload(Some(UploadedFile {
                    bytes,
                    declared_type: Some(mime),
                })))
            }
            Self::Profile { platform, handle } => Ok(CaptureInput::Profile { platform, handle }),
        }
    }
}

impl TryFrom<RoastSubmissionBody> for RoastSubmissionRequest {
    type Error = Error;

    fn try_from(body: RoastSubmissionBody) -> Result<Self, Self::Error> {
        Ok(Self {
            camera_permission_granted: body.camera_permission_granted,
            capture: body.capture.into_input()?,
            email: body.email,
            verification_token: body.verification_token,
        })
    }
}

/// JSON extractor settings for the submission scope.
///
/// Raises the body limit to fit a capture and reports malformed bodies as
/// domain errors so clients always see the same error envelope.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(MAX_SUBMISSION_BODY_BYTES)
        .error_handler(|err, _req| {
            let error = match &err {
                JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. } => {
                    Error::invalid_request("request body too large").with_details(json!({
                        "code": "payload_too_large",
                        "limit": MAX_SUBMISSION_BODY_BYTES,
                    }))
                }
                JsonPayloadError::ContentType => {
                    Error::invalid_request("expected an application/json body")
                }
                other => Error::invalid_request(format!("invalid request body: {other}")),
            };
            error.into()
        })
}

/// Capture, evaluate, and store one roast.
#[utoipa::path(
    post,
    path = "/api/v1/roasts",
    request_body = RoastSubmissionBody,
    responses(
        (status = 201, description = "Roast created", body = RoastSubmissionResponse),
        (status = 400, description = "Invalid capture, email, or verification token", body = Error),
        (status = 403, description = "Camera used after permission was denied", body = Error),
        (status = 409, description = "Already submitted from this session or email", body = Error),
        (status = 502, description = "Evaluator or profile resolver failed", body = Error),
        (status = 503, description = "Store unavailable; evaluation attached in details", body = Error)
    ),
    tags = ["roasts"],
    operation_id = "submitRoast",
    security(("SessionCookie" = []))
)]
#[post("/roasts")]
pub async fn submit_roast(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<RoastSubmissionBody>,
) -> ApiResult<HttpResponse> {
    let request = RoastSubmissionRequest::try_from(payload.into_inner())?;
    let mut submission = session.submission()?;
    let cancel = state.shutdown.child_token();

    let outcome = state
        .submissions
        .submit(request, &mut submission, cancel)
        .await;
    session.store_submission(&submission)?;

    let response = outcome?;
    info!(submission_id = %response.submission_id, "roast stored");
    Ok(HttpResponse::Created().json(response))
}

#[cfg(test)]
#[path = "roasts_tests.rs"]
mod tests;
