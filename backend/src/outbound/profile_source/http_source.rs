//! Reqwest-backed avatar resolver adapter.
//!
//! Resolves `{base}/{platform}/{handle}` to picture bytes. Only image
//! responses within the size cap are accepted; decoding is left to the
//! capture controller.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url, header};

use crate::domain::ports::{ProfileImage, ProfileImageSource, ProfileImageSourceError};
use crate::domain::{MAX_CAPTURE_BYTES, ProfileHandle, SocialPlatform};

/// Largest picture accepted from the resolver.
pub const MAX_PROFILE_IMAGE_BYTES: usize = MAX_CAPTURE_BYTES;

/// Avatar resolver adapter performing HTTP GET requests under one base URL.
pub struct AvatarHttpSource {
    client: Client,
    base: Url,
}

impl AvatarHttpSource {
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base })
    }
}

fn profile_url(
    base: &Url,
    platform: SocialPlatform,
    handle: &ProfileHandle,
) -> Result<Url, ProfileImageSourceError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| ProfileImageSourceError::invalid_response("resolver URL cannot be a base"))?
        .pop_if_empty()
        .push(platform.as_str())
        .push(handle.as_ref());
    Ok(url)
}

#[async_trait]
impl ProfileImageSource for AvatarHttpSource {
    async fn fetch(
        &self,
        platform: SocialPlatform,
        handle: &ProfileHandle,
    ) -> Result<ProfileImage, ProfileImageSourceError> {
        let url = profile_url(&self.base, platform, handle)?;
        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "image/*")
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ProfileImageSourceError::not_found(
                platform.as_str(),
                handle.as_ref(),
            ));
        }
        if !status.is_success() {
            return Err(ProfileImageSourceError::invalid_response(format!(
                "status {}",
                status.as_u16()
            )));
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        check_content_type(content_type.as_deref())?;
        if let Some(length) = response.content_length()
            && length > MAX_PROFILE_IMAGE_BYTES as u64
        {
            return Err(too_large());
        }

        let bytes = response.bytes().await.map_err(map_transport_error)?;
        if bytes.len() > MAX_PROFILE_IMAGE_BYTES {
            return Err(too_large());
        }
        Ok(ProfileImage {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}

fn check_content_type(content_type: Option<&str>) -> Result<(), ProfileImageSourceError> {
    match content_type {
        Some(value) if value.trim().to_ascii_lowercase().starts_with("image/") => Ok(()),
        Some(value) => Err(ProfileImageSourceError::invalid_response(format!(
            "expected an image, got {value}"
        ))),
        None => Err(ProfileImageSourceError::invalid_response(
            "response has no content type",
        )),
    }
}

fn too_large() -> ProfileImageSourceError {
    ProfileImageSourceError::invalid_response(format!(
        "picture exceeds {MAX_PROFILE_IMAGE_BYTES} bytes"
    ))
}

fn map_transport_error(error: reqwest::Error) -> ProfileImageSourceError {
    if error.is_timeout() {
        ProfileImageSourceError::timeout(error.to_string())
    } else {
        ProfileImageSourceError::transport(error.to_string())
    }
}
