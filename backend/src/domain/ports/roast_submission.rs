//! Driving port for running one roast submission end to end.
//!
//! Inbound adapters hand over the visitor's capture, email, and verification
//! token together with the session context. The service mutates the session
//! in place (submitted marker, retained evaluation) so the adapter can store
//! it back whatever the outcome.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{
    CaptureBranch, CaptureSource, Error, RoastPresentation, SocialPlatform, SubmissionSession,
    UploadedFile,
};

use super::CameraDevice;

/// Image source supplied with a submission.
#[derive(Clone)]
pub enum CaptureInput {
    /// A camera device opened only for the duration of the capture.
    Camera(Arc<dyn CameraDevice>),
    /// A chosen file; `None` when nothing was selected.
    Upload(Option<UploadedFile>),
    /// A social profile whose picture should be fetched.
    Profile {
        platform: SocialPlatform,
        handle: String,
    },
}

impl CaptureInput {
    pub fn source(&self) -> CaptureSource {
        match self {
            Self::Camera(_) => CaptureSource::Camera,
            Self::Upload(_) => CaptureSource::Upload,
            Self::Profile { .. } => CaptureSource::Profile,
        }
    }
}

impl std::fmt::Debug for CaptureInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Camera(_) => f.write_str("Camera"),
            Self::Upload(file) => f.debug_tuple("Upload").field(file).finish(),
            Self::Profile { platform, handle } => f
                .debug_struct("Profile")
                .field("platform", platform)
                .field("handle", handle)
                .finish(),
        }
    }
}

/// Everything a visitor submits in one go.
#[derive(Debug, Clone)]
pub struct RoastSubmissionRequest {
    /// Outcome of the browser's camera permission prompt.
    pub camera_permission_granted: bool,
    pub capture: CaptureInput,
    pub email: String,
    pub verification_token: Option<String>,
}

/// Successful submission outcome.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoastSubmissionResponse {
    pub submission_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub presentation: RoastPresentation,
}

/// Sources offered after the camera prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CaptureOptions {
    pub branch: CaptureBranch,
    pub sources: Vec<CaptureSource>,
    pub verification_required: bool,
}

/// Driving port for roast submission.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoastSubmissionService: Send + Sync {
    /// Capture sources offered for the given permission outcome.
    fn capture_options(&self, camera_permission_granted: bool) -> CaptureOptions;

    /// Capture, evaluate, and persist one roast.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] for:
    /// - `InvalidRequest`: missing file, bad image, bad email, missing token.
    /// - `Forbidden`: camera capture after permission was denied.
    /// - `Conflict`: the session or email has already submitted.
    /// - `UpstreamError`: evaluator or profile resolver failure.
    /// - `ServiceUnavailable`: the store failed or the request was cancelled.
    async fn submit(
        &self,
        request: RoastSubmissionRequest,
        session: &mut SubmissionSession,
        cancel: CancellationToken,
    ) -> Result<RoastSubmissionResponse, Error>;
}

/// Fixture service rejecting every submission as a duplicate.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureRoastSubmissionService;

#[async_trait]
impl RoastSubmissionService for FixtureRoastSubmissionService {
    fn capture_options(&self, camera_permission_granted: bool) -> CaptureOptions {
        let branch = if camera_permission_granted {
            CaptureBranch::Camera
        } else {
            CaptureBranch::Alternate
        };
        CaptureOptions {
            branch,
            sources: vec![CaptureSource::Upload],
            verification_required: false,
        }
    }

    async fn submit(
        &self,
        _request: RoastSubmissionRequest,
        _session: &mut SubmissionSession,
        _cancel: CancellationToken,
    ) -> Result<RoastSubmissionResponse, Error> {
        Err(Error::conflict("submissions are closed"))
    }
}
