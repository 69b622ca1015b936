//! Driven port for camera hardware.
//!
//! A [`CameraDevice`] hands out an exclusive [`MediaStream`]. Callers must
//! release the stream once a frame has been grabbed or the capture is
//! abandoned; the capture controller does so through a drop guard.

use async_trait::async_trait;

use crate::domain::CapturedImage;

use super::define_port_error;

define_port_error! {
    /// Errors surfaced by camera devices.
    pub enum CameraError {
        /// The user refused camera access.
        PermissionDenied =>
            "camera permission denied",
        /// No usable camera is available.
        Unavailable { message: String } =>
            "camera unavailable: {message}",
        /// A frame was grabbed but could not be read as an image.
        FrameUnreadable { message: String } =>
            "camera frame unreadable: {message}",
    }
}

/// Open stream on a camera device.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaStream: Send {
    /// Grab a single still frame.
    async fn grab_frame(&mut self) -> Result<CapturedImage, CameraError>;

    /// Stop every track and hand the device back. Must be idempotent.
    fn release(&mut self);
}

/// Camera device able to open exclusive streams.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CameraDevice: Send + Sync {
    async fn open(&self) -> Result<Box<dyn MediaStream>, CameraError>;
}
