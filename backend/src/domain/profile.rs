//! Social-media profile references used as an alternate capture source.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Maximum handle length accepted across supported platforms.
pub const PROFILE_HANDLE_MAX: usize = 64;

/// Platforms whose profile pictures can be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SocialPlatform {
    Instagram,
    Facebook,
    #[serde(alias = "x")]
    Twitter,
}

impl SocialPlatform {
    /// Path segment used by avatar resolvers.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Instagram => "instagram",
            Self::Facebook => "facebook",
            Self::Twitter => "twitter",
        }
    }
}

impl fmt::Display for SocialPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SocialPlatform {
    type Err = ProfileHandleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "instagram" => Ok(Self::Instagram),
            "facebook" => Ok(Self::Facebook),
            "twitter" | "x" => Ok(Self::Twitter),
            other => Err(ProfileHandleError::UnknownPlatform {
                platform: other.to_owned(),
            }),
        }
    }
}

/// Validation errors for profile references.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProfileHandleError {
    #[error("profile handle must not be empty")]
    Empty,
    #[error("profile handle must be at most {max} characters")]
    TooLong { max: usize },
    #[error("profile handle contains invalid characters")]
    InvalidCharacters,
    #[error("unknown platform: {platform}")]
    UnknownPlatform { platform: String },
}

static HANDLE_RE: OnceLock<Regex> = OnceLock::new();

fn handle_regex() -> &'static Regex {
    HANDLE_RE.get_or_init(|| {
        Regex::new("^[A-Za-z0-9._-]+$")
            .unwrap_or_else(|error| panic!("profile handle regex failed to compile: {error}"))
    })
}

/// Normalised account handle with any leading `@` removed.
///
/// # Examples
/// ```
/// use roasted::domain::ProfileHandle;
///
/// let handle = ProfileHandle::new(" @roasted.lol ").expect("valid handle");
/// assert_eq!(handle.as_ref(), "roasted.lol");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProfileHandle(String);

impl ProfileHandle {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ProfileHandleError> {
        let trimmed = raw.as_ref().trim();
        let handle = trimmed.strip_prefix('@').unwrap_or(trimmed).trim();
        if handle.is_empty() {
            return Err(ProfileHandleError::Empty);
        }
        if handle.chars().count() > PROFILE_HANDLE_MAX {
            return Err(ProfileHandleError::TooLong {
                max: PROFILE_HANDLE_MAX,
            });
        }
        if !handle_regex().is_match(handle) {
            return Err(ProfileHandleError::InvalidCharacters);
        }
        Ok(Self(handle.to_owned()))
    }
}

impl AsRef<str> for ProfileHandle {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ProfileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
