//! Feature flags that collapse the product variants into one workflow.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{CaptureSource, CompressionPolicy};

/// Which duplicate guards run before submitting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateCheckStrategy {
    None,
    Session,
    Remote,
    #[default]
    SessionThenRemote,
}

impl DuplicateCheckStrategy {
    pub fn checks_session(self) -> bool {
        matches!(self, Self::Session | Self::SessionThenRemote)
    }

    pub fn checks_remote(self) -> bool {
        matches!(self, Self::Remote | Self::SessionThenRemote)
    }
}

/// Unknown strategy name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown duplicate check strategy `{0}`")]
pub struct ParseDuplicateCheckError(String);

impl FromStr for DuplicateCheckStrategy {
    type Err = ParseDuplicateCheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "none" => Ok(Self::None),
            "session" => Ok(Self::Session),
            "remote" => Ok(Self::Remote),
            "session_then_remote" => Ok(Self::SessionThenRemote),
            other => Err(ParseDuplicateCheckError(other.to_owned())),
        }
    }
}

impl fmt::Display for DuplicateCheckStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Session => "session",
            Self::Remote => "remote",
            Self::SessionThenRemote => "session_then_remote",
        })
    }
}

/// Capture branch chosen after the camera permission prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CaptureBranch {
    /// Permission granted; the camera is offered alongside the other sources.
    Camera,
    /// Permission denied; only upload and profile sources are offered.
    Alternate,
}

/// Workflow configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowFlags {
    pub camera: bool,
    pub upload: bool,
    pub profile: bool,
    pub verification_required: bool,
    pub compress_images: bool,
    pub duplicate_check: DuplicateCheckStrategy,
    pub compression: CompressionPolicy,
}

impl Default for WorkflowFlags {
    fn default() -> Self {
        Self {
            camera: true,
            upload: true,
            profile: true,
            verification_required: true,
            compress_images: true,
            duplicate_check: DuplicateCheckStrategy::default(),
            compression: CompressionPolicy::default(),
        }
    }
}

impl WorkflowFlags {
    /// Branch taken for a permission outcome. A disabled camera behaves like
    /// a denial.
    pub fn branch_for(&self, camera_permission_granted: bool) -> CaptureBranch {
        if camera_permission_granted && self.camera {
            CaptureBranch::Camera
        } else {
            CaptureBranch::Alternate
        }
    }

    /// Sources offered on `branch`, in display order.
    ///
    /// # Examples
    /// ```
    /// use roasted::domain::{CaptureBranch, CaptureSource, WorkflowFlags};
    ///
    /// let flags = WorkflowFlags::default();
    /// assert_eq!(
    ///     flags.offered_sources(CaptureBranch::Alternate),
    ///     vec![CaptureSource::Upload, CaptureSource::Profile]
    /// );
    /// ```
    pub fn offered_sources(&self, branch: CaptureBranch) -> Vec<CaptureSource> {
        let mut sources = Vec::with_capacity(3);
        if self.camera && branch == CaptureBranch::Camera {
            sources.push(CaptureSource::Camera);
        }
        if self.upload {
            sources.push(CaptureSource::Upload);
        }
        if self.profile {
            sources.push(CaptureSource::Profile);
        }
        sources
    }
}
