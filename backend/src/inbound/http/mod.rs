//! HTTP inbound adapter exposing the REST endpoints.

use actix_web::web;

use crate::domain::Error;

pub mod camera;
pub mod capture;
#[cfg(debug_assertions)]
pub mod debug;
pub mod error;
pub mod health;
pub mod leaderboard;
pub mod roasts;
pub mod session;
pub mod session_config;
pub mod state;
pub mod submission_session;
#[cfg(test)]
pub mod test_utils;

pub use error::ApiResult;

/// Query-string extraction failures reported in the domain error envelope.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        Error::invalid_request(format!("invalid query string: {err}")).into()
    })
}
