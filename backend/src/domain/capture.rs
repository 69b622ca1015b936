//! Capture controller: turns camera frames, uploads, and profile pictures into
//! a single [`CapturedImage`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;

use super::ports::{
    CameraDevice, CameraError, MediaStream, ProfileImageSource, ProfileImageSourceError,
};
use super::{CapturedImage, Error, ImageError, ProfileHandle, SocialPlatform};

/// Where a capture came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CaptureSource {
    Camera,
    Upload,
    Profile,
}

/// A file chosen by the user, as received.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub bytes: Vec<u8>,
    /// MIME type declared by the client, if any.
    pub declared_type: Option<String>,
}

impl std::fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedFile")
            .field("len", &self.bytes.len())
            .field("declared_type", &self.declared_type)
            .finish()
    }
}

/// Failures while acquiring an image.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    #[error("camera permission denied")]
    PermissionDenied,
    #[error("no file selected")]
    NoFileSelected,
    #[error("unsupported image: {message}")]
    UnsupportedImage { message: String },
    #[error("profile picture lookup failed: {message}")]
    ProfileLookupFailed { message: String },
    #[error("camera device unavailable: {message}")]
    DeviceUnavailable { message: String },
}

impl From<ImageError> for CaptureError {
    fn from(value: ImageError) -> Self {
        Self::UnsupportedImage {
            message: value.to_string(),
        }
    }
}

impl From<CameraError> for CaptureError {
    fn from(value: CameraError) -> Self {
        match value {
            CameraError::PermissionDenied => Self::PermissionDenied,
            CameraError::Unavailable { message } => Self::DeviceUnavailable { message },
            CameraError::FrameUnreadable { message } => Self::UnsupportedImage { message },
        }
    }
}

impl From<CaptureError> for Error {
    fn from(value: CaptureError) -> Self {
        match &value {
            CaptureError::PermissionDenied => Error::forbidden(value.to_string()),
            CaptureError::NoFileSelected | CaptureError::UnsupportedImage { .. } => {
                Error::invalid_request(value.to_string())
            }
            CaptureError::ProfileLookupFailed { .. } => Error::upstream(value.to_string()),
            CaptureError::DeviceUnavailable { .. } => {
                Error::service_unavailable(value.to_string())
            }
        }
    }
}

/// Releases the wrapped stream when dropped, however the capture ends.
struct StreamGuard(Box<dyn MediaStream>);

impl StreamGuard {
    async fn grab_frame(&mut self) -> Result<CapturedImage, CameraError> {
        self.0.grab_frame().await
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.0.release();
    }
}

/// Acquires images from the supported sources.
#[derive(Clone)]
pub struct CaptureController {
    profiles: Arc<dyn ProfileImageSource>,
}

impl CaptureController {
    pub fn new(profiles: Arc<dyn ProfileImageSource>) -> Self {
        Self { profiles }
    }

    /// Grab one frame from `device`, releasing the stream immediately after.
    pub async fn acquire_from_camera(
        &self,
        device: &dyn CameraDevice,
    ) -> Result<CapturedImage, CaptureError> {
        let mut stream = StreamGuard(device.open().await?);
        let frame = stream.grab_frame().await;
        drop(stream);
        let image = frame?;
        debug!(bytes = image.len(), content_type = %image.content_type(), "camera frame captured");
        Ok(image)
    }

    /// Accept a user-selected file.
    pub fn acquire_from_upload(
        &self,
        file: Option<UploadedFile>,
    ) -> Result<CapturedImage, CaptureError> {
        let file = file
            .filter(|file| !file.bytes.is_empty())
            .ok_or(CaptureError::NoFileSelected)?;
        let image = CapturedImage::from_bytes(file.bytes, file.declared_type.as_deref())?;
        debug!(bytes = image.len(), content_type = %image.content_type(), "upload captured");
        Ok(image)
    }

    /// Fetch the profile picture for `handle` on `platform`.
    pub async fn acquire_from_profile(
        &self,
        platform: SocialPlatform,
        handle: &str,
    ) -> Result<CapturedImage, CaptureError> {
        let handle =
            ProfileHandle::new(handle).map_err(|err| CaptureError::ProfileLookupFailed {
                message: err.to_string(),
            })?;
        let picture = self
            .profiles
            .fetch(platform, &handle)
            .await
            .map_err(|err: ProfileImageSourceError| CaptureError::ProfileLookupFailed {
                message: err.to_string(),
            })?;
        let image = CapturedImage::from_bytes(picture.bytes, picture.content_type.as_deref())
            .map_err(|err| CaptureError::ProfileLookupFailed {
                message: err.to_string(),
            })?;
        debug!(%platform, bytes = image.len(), "profile picture captured");
        Ok(image)
    }
}
