//! Application settings loaded via OrthoConfig.
//!
//! Values come from CLI flags, `ROASTED_*` environment variables, or a
//! configuration file, in that order of precedence. Raw values are kept as
//! loaded and validated by the accessors so a bad value names its setting.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Deserializer};
use url::Url;
use zeroize::Zeroizing;

use crate::domain::{DuplicateCheckStrategy, LeaderboardLimit, WorkflowFlags};
use crate::inbound::ws::origin::AllowedOrigins;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_MODEL_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_AVATAR_BASE_URL: &str = "https://unavatar.io/";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Errors raised while validating loaded settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid {name}='{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
    #[error("{name} must be set in release builds")]
    Missing { name: &'static str },
    #[error("failed to read {name} at {path}: {source}")]
    Read {
        name: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn invalid(name: &'static str, value: impl Into<String>, reason: impl ToString) -> SettingsError {
    SettingsError::Invalid {
        name,
        value: value.into(),
        reason: reason.to_string(),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

/// A lone value arrives as a scalar; only comma-separated values become lists.
fn one_or_many<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        Option::<OneOrMany>::deserialize(deserializer)?.map(|value| match value {
            OneOrMany::One(single) => vec![single],
            OneOrMany::Many(list) => list,
        }),
    )
}

/// Server, adapter and workflow settings.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "ROASTED")]
pub struct AppSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL; submissions stay in memory when absent.
    pub database_url: Option<String>,
    /// Upper bound on pooled database connections.
    pub database_max_connections: Option<u32>,
    /// Chat completions endpoint used for roasting.
    pub model_endpoint: Option<String>,
    /// Model name sent with each evaluation.
    pub model: Option<String>,
    /// File holding the evaluator API key.
    pub model_api_key_file: Option<PathBuf>,
    /// Timeout for each outbound HTTP call, in seconds.
    pub request_timeout_secs: Option<u64>,
    /// Avatar resolver queried as `{base}/{platform}/{handle}`.
    pub avatar_base_url: Option<String>,
    /// Entries shown when a leaderboard read names no limit.
    pub leaderboard_limit: Option<usize>,
    /// Offer the live camera when permission is granted.
    ///
    /// Feature flags default to on and are read from the environment or a
    /// file only: a generated switch would report `false` whenever absent.
    #[ortho_config(skip_cli)]
    pub camera: Option<bool>,
    /// Offer file uploads.
    #[ortho_config(skip_cli)]
    pub upload: Option<bool>,
    /// Offer social profile pictures.
    #[ortho_config(skip_cli)]
    pub profile: Option<bool>,
    /// Require a human verification token with each submission.
    #[ortho_config(skip_cli)]
    pub verification_required: Option<bool>,
    /// Downscale images before evaluation.
    #[ortho_config(skip_cli)]
    pub compress_images: Option<bool>,
    /// `none`, `session`, `remote` or `session_then_remote`.
    pub duplicate_check: Option<String>,
    /// Origin patterns allowed to open leaderboard sockets; comma-separated
    /// in the environment.
    #[serde(default, deserialize_with = "one_or_many")]
    pub allowed_origins: Option<Vec<String>>,
}

impl AppSettings {
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|err| invalid("bind_addr", raw, err))
    }

    /// Configured database URL, ignoring blank values.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn model_endpoint(&self) -> Result<Url, SettingsError> {
        let raw = self.model_endpoint.as_deref().unwrap_or(DEFAULT_MODEL_ENDPOINT);
        Url::parse(raw).map_err(|err| invalid("model_endpoint", raw, err))
    }

    pub fn avatar_base_url(&self) -> Result<Url, SettingsError> {
        let raw = self.avatar_base_url.as_deref().unwrap_or(DEFAULT_AVATAR_BASE_URL);
        let url = Url::parse(raw).map_err(|err| invalid("avatar_base_url", raw, err))?;
        if url.cannot_be_a_base() {
            return Err(invalid("avatar_base_url", raw, "must be a hierarchical URL"));
        }
        Ok(url)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    /// Read the evaluator API key, if a key file is configured.
    pub fn model_api_key(&self) -> Result<Option<Zeroizing<String>>, SettingsError> {
        let Some(path) = &self.model_api_key_file else {
            return Ok(None);
        };
        let raw = std::fs::read_to_string(path)
            .map(Zeroizing::new)
            .map_err(|source| SettingsError::Read {
                name: "model_api_key_file",
                path: path.clone(),
                source,
            })?;
        let key = Zeroizing::new(raw.trim().to_owned());
        if key.is_empty() {
            let path = path.display().to_string();
            return Err(invalid("model_api_key_file", path, "key file is empty"));
        }
        Ok(Some(key))
    }

    pub fn leaderboard_limit(&self) -> Result<LeaderboardLimit, SettingsError> {
        LeaderboardLimit::or_default(self.leaderboard_limit, LeaderboardLimit::default()).map_err(
            |err| {
                invalid(
                    "leaderboard_limit",
                    self.leaderboard_limit.unwrap_or_default().to_string(),
                    err,
                )
            },
        )
    }

    pub fn workflow_flags(&self) -> Result<WorkflowFlags, SettingsError> {
        let duplicate_check = match self.duplicate_check.as_deref() {
            Some(raw) => raw
                .parse::<DuplicateCheckStrategy>()
                .map_err(|err| invalid("duplicate_check", raw, err))?,
            None => DuplicateCheckStrategy::default(),
        };
        Ok(WorkflowFlags {
            camera: self.camera.unwrap_or(true),
            upload: self.upload.unwrap_or(true),
            profile: self.profile.unwrap_or(true),
            verification_required: self.verification_required.unwrap_or(true),
            compress_images: self.compress_images.unwrap_or(true),
            duplicate_check,
            ..WorkflowFlags::default()
        })
    }

    pub fn allowed_origins(&self) -> Result<AllowedOrigins, SettingsError> {
        match self.allowed_origins.as_deref() {
            None | Some([]) => Ok(AllowedOrigins::default()),
            Some(patterns) => AllowedOrigins::parse(
                patterns
                    .iter()
                    .map(|pattern| pattern.trim())
                    .filter(|pattern| !pattern.is_empty()),
            )
            .map_err(|err| invalid("allowed_origins", patterns.join(","), err)),
        }
    }
}
