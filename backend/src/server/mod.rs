//! Server construction and middleware wiring.

mod config;
#[cfg(feature = "metrics")]
pub(crate) mod metrics;
mod state_builders;

pub use config::ServerConfig;

#[cfg(feature = "metrics")]
use metrics::MetricsLayer;
use state_builders::{AdapterStates, build_states};

use std::time::Duration;

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::cookie::{Key, SameSite, time};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use roasted::Trace;
#[cfg(debug_assertions)]
use roasted::doc::ApiDoc;
use roasted::inbound::http::capture::capture_options;
#[cfg(debug_assertions)]
use roasted::inbound::http::debug::database_probe;
use roasted::inbound::http::health::{HealthState, live, ready};
use roasted::inbound::http::leaderboard::get_leaderboard;
use roasted::inbound::http::query_config;
use roasted::inbound::http::roasts::{json_config, submit_roast};
use roasted::inbound::http::submission_session::{get_session, reset_session};
use roasted::inbound::ws;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

/// Session cookie settings shared by every worker.
#[derive(Clone)]
struct CookieSettings {
    key: Key,
    secure: bool,
    same_site: SameSite,
    ttl: Duration,
}

fn session_middleware(cookie: CookieSettings) -> SessionMiddleware<CookieSessionStore> {
    let ttl = time::Duration::seconds(i64::try_from(cookie.ttl.as_secs()).unwrap_or(i64::MAX));
    SessionMiddleware::builder(CookieSessionStore::default(), cookie.key)
        .cookie_name("session".into())
        .cookie_path("/".into())
        .cookie_secure(cookie.secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(cookie.same_site)
        .session_lifecycle(PersistentSession::default().session_ttl(ttl))
        .build()
}

fn build_app(
    health_state: web::Data<HealthState>,
    states: AdapterStates,
    cookie: CookieSettings,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let api = web::scope("/api/v1")
        .wrap(session_middleware(cookie))
        .app_data(json_config())
        .service(capture_options)
        .service(submit_roast)
        .service(get_session)
        .service(reset_session)
        .service(get_leaderboard);

    let app = App::new()
        .app_data(health_state)
        .app_data(states.http)
        .app_data(states.ws)
        .app_data(query_config())
        .wrap(Trace)
        .service(api)
        .service(ws::leaderboard_ws)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app
        .service(database_probe)
        .service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct the Actix HTTP server and mark it ready.
///
/// Signal handling is left to the caller, which should mark `health_state`
/// unhealthy and cancel the configured shutdown token before stopping the
/// returned server.
///
/// # Errors
///
/// Propagates [`std::io::Error`] when an outbound client cannot be built or
/// binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    mut config: ServerConfig,
) -> std::io::Result<Server> {
    let states = build_states(&mut config)?;
    let cookie = CookieSettings {
        key: config.key.clone(),
        secure: config.cookie_secure,
        same_site: config.same_site,
        ttl: config.session_ttl,
    };

    #[cfg(feature = "metrics")]
    let metrics_layer = MetricsLayer::from_option(config.prometheus.take());

    let server_health_state = health_state.clone();
    let server = HttpServer::new(move || {
        let app = build_app(server_health_state.clone(), states.clone(), cookie.clone());

        #[cfg(feature = "metrics")]
        let app = app.wrap(metrics_layer.clone());

        app
    })
    .disable_signals()
    .bind(config.bind_addr())?
    .run();

    health_state.mark_ready();
    Ok(server)
}
