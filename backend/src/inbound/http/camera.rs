//! Camera device backed by a frame the browser already grabbed.
//!
//! The browser owns the physical camera: it asks for permission, grabs one
//! still and stops its tracks before posting. On the server the "device" is
//! that single frame, handed out once through an exclusive stream.

use async_trait::async_trait;

use crate::domain::CapturedImage;
use crate::domain::ports::{CameraDevice, CameraError, MediaStream};

/// Device yielding the posted `data:` URL frame.
#[derive(Debug, Clone)]
pub struct DataUrlCamera {
    frame: Option<String>,
}

impl DataUrlCamera {
    /// `frame` is `None` when the browser sent no still.
    pub fn new(frame: Option<String>) -> Self {
        Self {
            frame: frame.filter(|frame| !frame.trim().is_empty()),
        }
    }
}

#[async_trait]
impl CameraDevice for DataUrlCamera {
    async fn open(&self) -> Result<Box<dyn MediaStream>, CameraError> {
        match &self.frame {
            Some(frame) => Ok(Box::new(DataUrlStream {
                frame: Some(frame.clone()),
            })),
            None => Err(CameraError::unavailable("no camera frame was captured")),
        }
    }
}

struct DataUrlStream {
    frame: Option<String>,
}

#[async_trait]
impl MediaStream for DataUrlStream {
    async fn grab_frame(&mut self) -> Result<CapturedImage, CameraError> {
        let frame = self
            .frame
            .as_deref()
            .ok_or_else(|| CameraError::unavailable("camera stream already released"))?;
        CapturedImage::from_data_url(frame)
            .map_err(|err| CameraError::frame_unreadable(err.to_string()))
    }

    fn release(&mut self) {
        self.frame = None;
    }
}
