//! Session helpers keeping handlers free of cookie plumbing.
//!
//! The [`SubmissionSession`] value travels in the private session cookie. A
//! cookie that no longer decodes (older format, tampering that survived
//! decryption) is treated as a fresh visitor rather than an error.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::domain::{Error, SubmissionSession};

pub(crate) const SUBMISSION_KEY: &str = "submission";

/// Newtype over the Actix session exposing submission-context operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Load the submission context, initialising it on first visit.
    pub fn submission(&self) -> Result<SubmissionSession, Error> {
        match self.0.get::<SubmissionSession>(SUBMISSION_KEY) {
            Ok(Some(session)) => Ok(session),
            Ok(None) => Ok(SubmissionSession::default()),
            Err(error) => {
                warn!(%error, "discarding undecodable submission session");
                self.0.remove(SUBMISSION_KEY);
                Ok(SubmissionSession::default())
            }
        }
    }

    /// Write the submission context back to the cookie.
    pub fn store_submission(&self, submission: &SubmissionSession) -> Result<(), Error> {
        self.0
            .insert(SUBMISSION_KEY, submission)
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// Replace the submission context with a fresh one.
    ///
    /// A fresh value is written rather than the key removed, so the client
    /// always receives a cookie that supersedes the old marker.
    pub fn reset(&self) -> Result<(), Error> {
        self.store_submission(&SubmissionSession::default())
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test, web};
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::inbound::http::test_utils::{session_cookie, test_session_middleware};

    fn session_test_app() -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .wrap(test_session_middleware())
            .route(
                "/mark",
                web::get().to(|session: SessionContext| async move {
                    let mut submission = session.submission()?;
                    let at = Utc
                        .with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
                        .single()
                        .expect("fixture timestamp");
                    submission.mark_submitted(at);
                    session.store_submission(&submission)?;
                    Ok::<_, Error>(HttpResponse::Ok())
                }),
            )
            .route(
                "/read",
                web::get().to(|session: SessionContext| async move {
                    let submission = session.submission()?;
                    Ok::<_, Error>(HttpResponse::Ok().body(submission.already_submitted().to_string()))
                }),
            )
            .route(
                "/corrupt",
                web::get().to(|session: Session| async move {
                    session
                        .insert(SUBMISSION_KEY, "not a session")
                        .expect("insert raw value");
                    HttpResponse::Ok()
                }),
            )
    }

    #[actix_web::test]
    async fn round_trips_submission_marker() {
        let app = test::init_service(session_test_app()).await;

        let marked = test::call_service(&app, test::TestRequest::get().uri("/mark").to_request()).await;
        assert_eq!(marked.status(), StatusCode::OK);
        let cookie = session_cookie(&marked);

        let read = test::call_service(
            &app,
            test::TestRequest::get().uri("/read").cookie(cookie).to_request(),
        )
        .await;
        assert_eq!(test::read_body(read).await, "true");
    }

    #[actix_web::test]
    async fn first_visit_starts_fresh() {
        let app = test::init_service(session_test_app()).await;

        let read = test::call_service(&app, test::TestRequest::get().uri("/read").to_request()).await;

        assert_eq!(test::read_body(read).await, "false");
    }

    #[actix_web::test]
    async fn undecodable_context_is_replaced() {
        let app = test::init_service(session_test_app()).await;
        let corrupt =
            test::call_service(&app, test::TestRequest::get().uri("/corrupt").to_request()).await;
        let cookie = session_cookie(&corrupt);

        let read = test::call_service(
            &app,
            test::TestRequest::get().uri("/read").cookie(cookie).to_request(),
        )
        .await;

        assert_eq!(read.status(), StatusCode::OK);
        assert_eq!(test::read_body(read).await, "false");
    }
}
