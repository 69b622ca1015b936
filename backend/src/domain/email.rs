//! Contact email used as the per-person identity for duplicate guards.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Maximum accepted length of an address, in characters.
pub const CONTACT_EMAIL_MAX: usize = 254;

/// Validation errors returned by [`ContactEmail::new`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContactEmailError {
    #[error("email must not be empty")]
    Empty,
    #[error("email must be at most {max} characters")]
    TooLong { max: usize },
    #[error("email address is not valid")]
    Invalid,
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        let pattern = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";
        Regex::new(pattern).unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Trimmed, lower-cased email address.
///
/// Two addresses that differ only in case or surrounding whitespace compare
/// equal, so the duplicate guard treats them as the same person.
///
/// # Examples
/// ```
/// use roasted::domain::ContactEmail;
///
/// let email = ContactEmail::new("  Ada@Example.COM ").expect("valid email");
/// assert_eq!(email.as_ref(), "ada@example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContactEmail(String);

impl ContactEmail {
    /// Validate and normalise an address.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ContactEmailError> {
        let normalised = raw.as_ref().trim().to_lowercase();
        if normalised.is_empty() {
            return Err(ContactEmailError::Empty);
        }
        if normalised.chars().count() > CONTACT_EMAIL_MAX {
            return Err(ContactEmailError::TooLong {
                max: CONTACT_EMAIL_MAX,
            });
        }
        if !email_regex().is_match(&normalised) {
            return Err(ContactEmailError::Invalid);
        }
        Ok(Self(normalised))
    }

    /// Short, non-reversible scope safe to emit in logs.
    pub fn scope(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.0.as_bytes());
        let hash = hasher.finalize();
        hex::encode(&hash[..4])
    }
}

impl AsRef<str> for ContactEmail {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ContactEmail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<ContactEmail> for String {
    fn from(value: ContactEmail) -> Self {
        value.0
    }
}

impl TryFrom<String> for ContactEmail {
    type Error = ContactEmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
