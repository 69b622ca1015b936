//! Payload bounding for captured images.
//!
//! Large photographs are downscaled so the longest edge fits within
//! [`CompressionPolicy::max_edge`] and re-encoded as JPEG with decreasing
//! quality until the payload fits within [`CompressionPolicy::max_bytes`].

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;

use super::image::{CapturedImage, ImageContentType, ImageError};

/// Default longest edge, in pixels.
pub const DEFAULT_MAX_EDGE: u32 = 1024;
/// Default encoded payload ceiling, in bytes.
pub const DEFAULT_MAX_BYTES: usize = 1024 * 1024;

const JPEG_QUALITY_LADDER: [u8; 4] = [85, 70, 55, 40];

/// Errors raised while bounding an image.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompressionError {
    #[error("image could not be decoded: {message}")]
    Decode { message: String },
    #[error("image could not be re-encoded: {message}")]
    Encode { message: String },
    #[error("image still exceeds {max} bytes after compression")]
    StillTooLarge { max: usize },
    #[error(transparent)]
    Image(#[from] ImageError),
}

/// Size limits applied to captured images before submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionPolicy {
    max_edge: u32,
    max_bytes: usize,
}

impl Default for CompressionPolicy {
    fn default() -> Self {
        Self {
            max_edge: DEFAULT_MAX_EDGE,
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

impl CompressionPolicy {
    /// Build a policy with explicit limits. Zero values fall back to defaults.
    pub fn new(max_edge: u32, max_bytes: usize) -> Self {
        let defaults = Self::default();
        Self {
            max_edge: if max_edge == 0 { defaults.max_edge } else { max_edge },
            max_bytes: if max_bytes == 0 { defaults.max_bytes } else { max_bytes },
        }
    }

    pub fn max_edge(&self) -> u32 {
        self.max_edge
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Bound `image` to the policy limits.
    ///
    /// Images already within both limits are returned untouched.
    pub fn apply(&self, image: CapturedImage) -> Result<CapturedImage, CompressionError> {
        let decoded = image::load_from_memory_with_format(
            image.bytes(),
            image.content_type().image_format(),
        )
        .map_err(|err| CompressionError::Decode {
            message: err.to_string(),
        })?;

        let fits_edge = decoded.width().max(decoded.height()) <= self.max_edge;
        if fits_edge && image.len() <= self.max_bytes {
            return Ok(image);
        }

        let resized = if fits_edge {
            decoded
        } else {
            decoded.resize(self.max_edge, self.max_edge, FilterType::Triangle)
        };
        let rgb = resized.to_rgb8();

        for quality in JPEG_QUALITY_LADDER {
            let mut buffer = Cursor::new(Vec::new());
            JpegEncoder::new_with_quality(&mut buffer, quality)
                .encode_image(&rgb)
                .map_err(|err| CompressionError::Encode {
                    message: err.to_string(),
                })?;
            let bytes = buffer.into_inner();
            if bytes.len() <= self.max_bytes {
                return Ok(CapturedImage::new(bytes, ImageContentType::Jpeg)?);
            }
        }

        Err(CompressionError::StillTooLarge {
            max: self.max_bytes,
        })
    }
}
