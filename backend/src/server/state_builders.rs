//! Builders wiring adapters into the HTTP and WebSocket state.

use std::io;
use std::sync::Arc;

use actix_web::web;
use mockable::DefaultClock;

use roasted::domain::ports::{
    FixtureRoastEvaluator, LeaderboardQuery, ProfileImageSource, RoastEvaluator,
    RoastSubmissionService, SubmissionRepository,
};
use roasted::domain::{
    CaptureController, LeaderboardFeed, LeaderboardService, RoastSubmissionServiceImpl,
    WorkflowDeps,
};
use roasted::inbound::http::state::{HttpState, HttpStatePorts};
use roasted::inbound::ws::state::WsState;
use roasted::outbound::openai::OpenAiHttpEvaluator;
use roasted::outbound::persistence::{DieselSubmissionRepository, InMemorySubmissionRepository};
use roasted::outbound::profile_source::AvatarHttpSource;

use super::ServerConfig;

/// Adapter state shared by every worker.
#[derive(Clone)]
pub(crate) struct AdapterStates {
    pub(crate) http: web::Data<HttpState>,
    pub(crate) ws: web::Data<WsState>,
}

/// Diesel when a pool is configured, otherwise a process-local store.
fn build_repository(config: &ServerConfig) -> Arc<dyn SubmissionRepository> {
    match &config.db_pool {
        Some(pool) => Arc::new(DieselSubmissionRepository::new(pool.clone())),
        None => Arc::new(InMemorySubmissionRepository::new(Arc::new(DefaultClock))),
    }
}

fn build_evaluator(config: &mut ServerConfig) -> io::Result<Arc<dyn RoastEvaluator>> {
    match config.evaluator.take() {
        Some(evaluator) => OpenAiHttpEvaluator::new(evaluator)
            .map(|evaluator| Arc::new(evaluator) as Arc<dyn RoastEvaluator>)
            .map_err(|err| io::Error::other(format!("evaluator client: {err}"))),
        None => Ok(Arc::new(FixtureRoastEvaluator)),
    }
}

fn build_profile_source(config: &ServerConfig) -> io::Result<Arc<dyn ProfileImageSource>> {
    AvatarHttpSource::new(config.avatar_base_url.clone(), config.request_timeout)
        .map(|source| Arc::new(source) as Arc<dyn ProfileImageSource>)
        .map_err(|err| io::Error::other(format!("avatar client: {err}")))
}

/// Build both adapter states around one repository and one commit feed, so
/// a roast stored over HTTP reaches every open leaderboard socket.
///
/// # Errors
///
/// Returns [`io::Error`] when an outbound HTTP client cannot be built.
pub(crate) fn build_states(config: &mut ServerConfig) -> io::Result<AdapterStates> {
    let repository = build_repository(config);
    let evaluator = build_evaluator(config)?;
    let profiles = build_profile_source(config)?;
    let feed = LeaderboardFeed::default();

    let submissions: Arc<dyn RoastSubmissionService> = Arc::new(RoastSubmissionServiceImpl::new(
        config.flags,
        CaptureController::new(profiles),
        WorkflowDeps {
            evaluator,
            repository: Arc::clone(&repository),
            feed: feed.clone(),
        },
    ));
    let leaderboard: Arc<dyn LeaderboardQuery> =
        Arc::new(LeaderboardService::new(Arc::clone(&repository), feed));

    let http = HttpState::new(HttpStatePorts {
        submissions,
        leaderboard: Arc::clone(&leaderboard),
        store: repository,
    })
    .with_default_limit(config.leaderboard_limit)
    .with_shutdown(config.shutdown.clone());
    let ws = WsState::new(leaderboard)
        .with_default_limit(config.leaderboard_limit)
        .with_origins(config.allowed_origins.clone());

    Ok(AdapterStates {
        http: web::Data::new(http),
        ws: web::Data::new(ws),
    })
}
