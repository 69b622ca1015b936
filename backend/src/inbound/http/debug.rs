//! Store connectivity probe, mounted in debug builds only.
//!
//! ```text
//! GET /debug/database
//! ```

use std::time::Instant;

use actix_web::{get, web};
use serde::Serialize;
use tracing::warn;

use crate::domain::Error;
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseProbeBody {
    pub status: &'static str,
    pub latency_ms: u128,
}

/// Round-trip a trivial query through the submission store.
#[get("/debug/database")]
pub async fn database_probe(state: web::Data<HttpState>) -> ApiResult<web::Json<DatabaseProbeBody>> {
    let started = Instant::now();
    state.store.ping().await.map_err(|err| {
        warn!(error = %err, "store probe failed");
        Error::service_unavailable(format!("store probe failed: {err}"))
    })?;
    Ok(web::Json(DatabaseProbeBody {
        status: "ok",
        latency_ms: started.elapsed().as_millis(),
    }))
}
