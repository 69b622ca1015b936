//! Resolved server configuration.

use std::net::SocketAddr;
use std::time::Duration;

use actix_web::cookie::{Key, SameSite};
use tokio_util::sync::CancellationToken;
use tracing::warn;
use url::Url;

#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetrics;
use roasted::domain::{LeaderboardLimit, WorkflowFlags};
use roasted::inbound::http::session_config::{BuildMode, SessionSettings};
use roasted::inbound::ws::origin::AllowedOrigins;
use roasted::outbound::openai::OpenAiEvaluatorConfig;
use roasted::outbound::persistence::DbPool;
use roasted::settings::{AppSettings, SettingsError};

/// Everything the server needs, validated up front.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) session_ttl: Duration,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
    /// `None` selects the canned evaluator (debug builds only).
    pub(crate) evaluator: Option<OpenAiEvaluatorConfig>,
    pub(crate) avatar_base_url: Url,
    pub(crate) request_timeout: Duration,
    pub(crate) flags: WorkflowFlags,
    pub(crate) leaderboard_limit: LeaderboardLimit,
    pub(crate) allowed_origins: AllowedOrigins,
    pub(crate) shutdown: CancellationToken,
    #[cfg(feature = "metrics")]
    pub(crate) prometheus: Option<PrometheusMetrics>,
}

impl ServerConfig {
    /// Validate `settings` and combine them with the session cookie settings.
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting, or [`SettingsError::Missing`] when a
    /// release build has no evaluator API key.
    pub fn from_settings(
        settings: &AppSettings,
        session: SessionSettings,
        mode: BuildMode,
    ) -> Result<Self, SettingsError> {
        let request_timeout = settings.request_timeout();
        let evaluator = match settings.model_api_key()? {
            Some(api_key) => {
                let endpoint = settings.model_endpoint()?;
                let mut config = OpenAiEvaluatorConfig::new(endpoint, api_key, request_timeout);
                let model = settings.model.as_deref().map(str::trim);
                if let Some(model) = model.filter(|name| !name.is_empty()) {
                    model.clone_into(&mut config.model);
                }
                Some(config)
            }
            None if mode == BuildMode::Debug => {
                warn!("no evaluator API key configured; every roast uses the canned reply");
                None
            }
            None => {
                return Err(SettingsError::Missing {
                    name: "model_api_key_file",
                });
            }
        };

        let SessionSettings {
            key,
            cookie_secure,
            same_site,
            ttl,
        } = session;

        Ok(Self {
            key,
            cookie_secure,
            same_site,
            session_ttl: ttl,
            bind_addr: settings.bind_addr()?,
            db_pool: None,
            evaluator,
            avatar_base_url: settings.avatar_base_url()?,
            request_timeout,
            flags: settings.workflow_flags()?,
            leaderboard_limit: settings.leaderboard_limit()?,
            allowed_origins: settings.allowed_origins()?,
            shutdown: CancellationToken::new(),
            #[cfg(feature = "metrics")]
            prometheus: None,
        })
    }

    /// Attach a database pool; submissions stay in memory without one.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Token cancelled when shutdown begins; in-flight submissions observe a
    /// child of it.
    #[must_use]
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    #[cfg(feature = "metrics")]
    /// Attach Prometheus middleware to the configuration.
    #[must_use]
    pub fn with_metrics(mut self, prometheus: Option<PrometheusMetrics>) -> Self {
        self.prometheus = prometheus;
        self
    }
}
