//! Driven port for fetching social-media profile pictures.

use async_trait::async_trait;

use crate::domain::{ProfileHandle, SocialPlatform};

use super::define_port_error;

/// Raw picture bytes as returned by the resolver.
#[derive(Clone, PartialEq, Eq)]
pub struct ProfileImage {
    pub bytes: Vec<u8>,
    /// `Content-Type` reported by the resolver, if any.
    pub content_type: Option<String>,
}

impl std::fmt::Debug for ProfileImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileImage")
            .field("len", &self.bytes.len())
            .field("content_type", &self.content_type)
            .finish()
    }
}

define_port_error! {
    /// Errors surfaced while resolving a profile picture.
    pub enum ProfileImageSourceError {
        /// No profile picture exists for the handle.
        NotFound { platform: String, handle: String } =>
            "no profile picture for {handle} on {platform}",
        /// Network transport failed before receiving a response.
        Transport { message: String } =>
            "profile resolver transport failed: {message}",
        /// The call exceeded its timeout.
        Timeout { message: String } =>
            "profile resolver timeout: {message}",
        /// The resolver answered with something other than an image.
        InvalidResponse { message: String } =>
            "profile resolver returned an invalid response: {message}",
    }
}

/// Port for resolving a handle to its profile picture.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileImageSource: Send + Sync {
    async fn fetch(
        &self,
        platform: SocialPlatform,
        handle: &ProfileHandle,
    ) -> Result<ProfileImage, ProfileImageSourceError>;
}

/// Fixture source that never finds a picture.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureProfileImageSource;

#[async_trait]
impl ProfileImageSource for FixtureProfileImageSource {
    async fn fetch(
        &self,
        platform: SocialPlatform,
        handle: &ProfileHandle,
    ) -> Result<ProfileImage, ProfileImageSourceError> {
        Err(ProfileImageSourceError::not_found(
            platform.as_str(),
            handle.as_ref(),
        ))
    }
}
