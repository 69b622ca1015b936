//! Backend entry-point: loads settings, runs migrations, and serves the API.

mod server;

use actix_web::web;
#[cfg(feature = "metrics")]
use server::metrics::build_metrics;
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use roasted::inbound::http::health::HealthState;
use roasted::inbound::http::session_config::{
    BuildMode, key_fingerprint, session_settings_from_env,
};
use roasted::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use roasted::settings::AppSettings;
use server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load()?;
    let mode = BuildMode::from_debug_assertions();
    let session = session_settings_from_env(&DefaultEnv::new(), mode)?;
    info!(fingerprint = %key_fingerprint(&session.key), "session key loaded");

    let shutdown = CancellationToken::new();
    let mut config =
        ServerConfig::from_settings(&settings, session, mode)?.with_shutdown(shutdown.clone());

    match settings.database_url() {
        Some(url) => {
            run_pending_migrations(url.to_owned()).await?;
            let mut pool_config = PoolConfig::new(url);
            if let Some(max) = settings.database_max_connections {
                pool_config = pool_config.with_max_size(max);
            }
            config = config.with_db_pool(DbPool::new(pool_config).await?);
        }
        None => warn!("no database configured; submissions are kept in memory"),
    }

    #[cfg(feature = "metrics")]
    {
        config = config.with_metrics(Some(build_metrics()?));
    }

    let bind_addr = config.bind_addr();
    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), config)?;
    info!(%bind_addr, "roasted backend listening");

    let handle = server.handle();
    actix_web::rt::spawn(async move {
        wait_for_shutdown_signal().await;
        info!("shutdown requested; draining");
        health_state.mark_unhealthy();
        shutdown.cancel();
        handle.stop(true).await;
    });

    server.await?;
    Ok(())
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
                return;
            }
            Err(error) => warn!(%error, "cannot listen for SIGTERM; only Ctrl-C stops the server"),
        }
    }
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "cannot listen for Ctrl-C");
    }
}
