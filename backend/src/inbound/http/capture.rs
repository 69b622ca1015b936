//! Capture option HTTP handler.
//!
//! ```text
//! GET /api/v1/capture/options?permission=granted|denied
//! ```

use actix_web::{get, web};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::CaptureOptions;
use crate::inbound::http::state::HttpState;

/// Outcome of the browser's camera permission prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CameraPermission {
    Granted,
    Denied,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct CaptureOptionsQuery {
    /// Omitted means the prompt has not been answered; treated as denied.
    pub permission: Option<CameraPermission>,
}

/// Capture sources offered for a permission outcome.
///
/// A denial is a branch, not an error: upload and profile sources remain.
#[utoipa::path(
    get,
    path = "/api/v1/capture/options",
    params(CaptureOptionsQuery),
    responses(
        (status = 200, description = "Offered capture sources", body = CaptureOptions),
        (status = 400, description = "Unknown permission value")
    ),
    tags = ["capture"],
    operation_id = "captureOptions"
)]
#[get("/capture/options")]
pub async fn capture_options(
    state: web::Data<HttpState>,
    query: web::Query<CaptureOptionsQuery>,
) -> web::Json<CaptureOptions> {
    let granted = query.permission == Some(CameraPermission::Granted);
    web::Json(state.submissions.capture_options(granted))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use rstest::rstest;
    use serde_json::{Value, json};

    use super::*;
    use crate::domain::ports::{
        FixtureLeaderboardQuery, FixtureSubmissionRepository, MockRoastSubmissionService,
    };
    use crate::domain::{CaptureBranch, CaptureSource};
    use crate::inbound::http::state::HttpStatePorts;

    fn state(expected_grant: bool) -> HttpState {
        let mut submissions = MockRoastSubmissionService::new();
        submissions
            .expect_capture_options()
            .withf(move |granted| *granted == expected_grant)
            .times(1)
            .returning(|granted| CaptureOptions {
                branch: if granted {
                    CaptureBranch::Camera
                } else {
                    CaptureBranch::Alternate
                },
                sources: vec![CaptureSource::Upload, CaptureSource::Profile],
                verification_required: true,
            });
        HttpState::new(HttpStatePorts {
            submissions: Arc::new(submissions),
            leaderboard: Arc::new(FixtureLeaderboardQuery),
            store: Arc::new(FixtureSubmissionRepository),
        })
    }

    #[rstest]
    #[case("?permission=granted", true, "camera")]
    #[case("?permission=denied", false, "alternate")]
    #[case("", false, "alternate")]
    #[actix_web::test]
    async fn forwards_the_permission_outcome(
        #[case] query: &str,
        #[case] granted: bool,
        #[case] branch: &str,
    ) {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(granted)))
                .service(capture_options),
        )
        .await;

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("/capture/options{query}"))
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["branch"], branch);
        assert_eq!(body["sources"], json!(["upload", "profile"]));
        assert_eq!(body["verificationRequired"], true);
    }

    #[actix_web::test]
    async fn rejects_unknown_permission_values() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(HttpState::new(HttpStatePorts {
                    submissions: Arc::new(MockRoastSubmissionService::new()),
                    leaderboard: Arc::new(FixtureLeaderboardQuery),
                    store: Arc::new(FixtureSubmissionRepository),
                })))
                .service(capture_options),
        )
        .await;

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/capture/options?permission=maybe")
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
