//! Transient captured photograph.
//!
//! A [`CapturedImage`] lives for a single submission attempt. It is never
//! persisted; the only thing that leaves the process is its `data:` URL
//! encoding, sent to the evaluator and echoed back to the caller.

use std::fmt;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use image::ImageFormat;

/// Upper bound on raw capture size accepted before compression.
pub const MAX_CAPTURE_BYTES: usize = 10 * 1024 * 1024;

/// Image encodings accepted from capture sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageContentType {
    Jpeg,
    Png,
    Webp,
    Gif,
}

impl ImageContentType {
    /// MIME type string.
    pub fn as_mime(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
            Self::Gif => "image/gif",
        }
    }

    /// Parse a MIME type, ignoring parameters such as `charset`.
    ///
    /// # Examples
    /// ```
    /// use roasted::domain::ImageContentType;
    ///
    /// assert_eq!(
    ///     ImageContentType::from_mime("image/JPEG; q=0.9"),
    ///     Some(ImageContentType::Jpeg)
    /// );
    /// assert_eq!(ImageContentType::from_mime("text/html"), None);
    /// ```
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/webp" => Some(Self::Webp),
            "image/gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Detect the encoding from magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match image::guess_format(bytes).ok()? {
            ImageFormat::Jpeg => Some(Self::Jpeg),
            ImageFormat::Png => Some(Self::Png),
            ImageFormat::WebP => Some(Self::Webp),
            ImageFormat::Gif => Some(Self::Gif),
            _ => None,
        }
    }

    pub(crate) fn image_format(self) -> ImageFormat {
        match self {
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
            Self::Webp => ImageFormat::WebP,
            Self::Gif => ImageFormat::Gif,
        }
    }
}

impl fmt::Display for ImageContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_mime())
    }
}

/// Reasons an image payload is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImageError {
    #[error("image payload is empty")]
    Empty,
    #[error("image exceeds {max} bytes")]
    TooLarge { max: usize },
    #[error("unsupported image type: {content_type}")]
    UnsupportedType { content_type: String },
    #[error("image bytes do not match a supported encoding")]
    UnrecognisedBytes,
    #[error("malformed data URL")]
    MalformedDataUrl,
    #[error("data URL payload is not valid base64")]
    InvalidBase64,
}

/// Split a base64 `data:` URL into its declared MIME type and payload bytes.
///
/// The MIME type is returned as written; callers decide whether to trust it.
pub fn decode_data_url(url: &str) -> Result<(String, Vec<u8>), ImageError> {
    let rest = url
        .trim()
        .strip_prefix("data:")
        .ok_or(ImageError::MalformedDataUrl)?;
    let (meta, payload) = rest.split_once(',').ok_or(ImageError::MalformedDataUrl)?;
    let mime = meta
        .strip_suffix(";base64")
        .ok_or(ImageError::MalformedDataUrl)?;
    let bytes = BASE64
        .decode(payload.trim())
        .map_err(|_| ImageError::InvalidBase64)?;
    Ok((mime.to_owned(), bytes))
}

/// Owned image bytes paired with their content type.
#[derive(Clone, PartialEq, Eq)]
pub struct CapturedImage {
    bytes: Vec<u8>,
    content_type: ImageContentType,
}

impl CapturedImage {
    /// Wrap bytes whose encoding is already known.
    pub fn new(bytes: Vec<u8>, content_type: ImageContentType) -> Result<Self, ImageError> {
        if bytes.is_empty() {
            return Err(ImageError::Empty);
        }
        if bytes.len() > MAX_CAPTURE_BYTES {
            return Err(ImageError::TooLarge {
                max: MAX_CAPTURE_BYTES,
            });
        }
        Ok(Self {
            bytes,
            content_type,
        })
    }

    /// Wrap bytes, trusting magic bytes over any declared type.
    ///
    /// A declared type outside the supported set is rejected even when the
    /// bytes look like an image.
    pub fn from_bytes(bytes: Vec<u8>, declared: Option<&str>) -> Result<Self, ImageError> {
        if bytes.is_empty() {
            return Err(ImageError::Empty);
        }
        if let Some(mime) = declared.filter(|mime| !mime.trim().is_empty())
            && ImageContentType::from_mime(mime).is_none()
            && mime.trim() != "application/octet-stream"
        {
            return Err(ImageError::UnsupportedType {
                content_type: mime.trim().to_owned(),
            });
        }
        let content_type = ImageContentType::sniff(&bytes).ok_or(ImageError::UnrecognisedBytes)?;
        Self::new(bytes, content_type)
    }

    /// Decode a `data:<mime>;base64,<payload>` URL.
    ///
    /// # Examples
    /// ```
    /// use roasted::domain::{CapturedImage, ImageError};
    ///
    /// let err = CapturedImage::from_data_url("data:text/plain;base64,aGk=").unwrap_err();
    /// assert!(matches!(err, ImageError::UnsupportedType { .. }));
    /// ```
    pub fn from_data_url(url: &str) -> Result<Self, ImageError> {
        let (mime, bytes) = decode_data_url(url)?;
        if ImageContentType::from_mime(&mime).is_none() {
            return Err(ImageError::UnsupportedType { content_type: mime });
        }
        Self::from_bytes(bytes, Some(&mime))
    }

    /// Raw encoded bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn content_type(&self) -> ImageContentType {
        self.content_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Inline `data:` URL suitable for the evaluator and for display.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.content_type.as_mime(),
            BASE64.encode(&self.bytes)
        )
    }
}

// Bytes are elided so images never end up in logs.
impl fmt::Debug for CapturedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedImage")
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod test_images {
    //! Tiny encoded images shared by tests across the crate.
    use std::io::Cursor;

    use image::{ImageFormat, RgbImage};

    use super::{CapturedImage, ImageContentType};

    pub(crate) fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let pixels = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 255) as u8, (y % 255) as u8, ((x + y) % 255) as u8])
        });
        let mut buffer = Cursor::new(Vec::new());
        pixels
            .write_to(&mut buffer, format)
            .expect("encode test image");
        buffer.into_inner()
    }

    pub(crate) fn png(width: u32, height: u32) -> CapturedImage {
        CapturedImage::new(encoded(width, height, ImageFormat::Png), ImageContentType::Png)
            .expect("valid png")
    }

    /// High-entropy PNG that compresses poorly, larger than its JPEG form.
    pub(crate) fn noisy_png(width: u32, height: u32) -> CapturedImage {
        let mut state: u32 = 0x9e37_79b9;
        let pixels = RgbImage::from_fn(width, height, |_, _| {
            let mut next = || {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state & 0xff) as u8
            };
            image::Rgb([next(), next(), next()])
        });
        let mut buffer = Cursor::new(Vec::new());
        pixels
            .write_to(&mut buffer, ImageFormat::Png)
            .expect("encode test image");
        CapturedImage::new(buffer.into_inner(), ImageContentType::Png).expect("valid png")
    }

    pub(crate) fn jpeg(width: u32, height: u32) -> CapturedImage {
        CapturedImage::new(
            encoded(width, height, ImageFormat::Jpeg),
            ImageContentType::Jpeg,
        )
        .expect("valid jpeg")
    }
}
