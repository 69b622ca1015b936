//! Driven port for the vision model that roasts a photograph.
//!
//! The port returns the model's raw reply text. Parsing and validation stay in
//! the domain (see [`crate::domain::parse_evaluation`]) so adapters never
//! decide what counts as a valid roast.

use async_trait::async_trait;

use crate::domain::CapturedImage;

use super::define_port_error;

define_port_error! {
    /// Errors surfaced while calling the evaluator.
    pub enum RoastEvaluatorError {
        /// Network transport failed before receiving a response.
        Transport { message: String } =>
            "evaluator transport failed: {message}",
        /// The call exceeded its timeout.
        Timeout { message: String } =>
            "evaluator timeout: {message}",
        /// The evaluator answered with a non-success status.
        Status { status: u16, message: String } =>
            "evaluator returned status {status}: {message}",
        /// The response envelope could not be decoded.
        Decode { message: String } =>
            "evaluator response decode failed: {message}",
        /// The response envelope carried no reply text.
        EmptyReply =>
            "evaluator returned no reply",
    }
}

/// Port for requesting a roast of a captured image.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoastEvaluator: Send + Sync {
    /// Send `image` to the evaluator and return its reply text verbatim.
    async fn evaluate(&self, image: &CapturedImage) -> Result<String, RoastEvaluatorError>;
}

/// Fixture evaluator returning a fixed, well-formed reply.
#[derive(Debug, Clone, Default)]
pub struct FixtureRoastEvaluator;

/// Reply produced by [`FixtureRoastEvaluator`].
pub const FIXTURE_EVALUATION_REPLY: &str =
    r#"{"score": 8.4, "nickname": "Captain Selfie", "roast": "Bold lighting choice."}"#;

#[async_trait]
impl RoastEvaluator for FixtureRoastEvaluator {
    async fn evaluate(&self, _image: &CapturedImage) -> Result<String, RoastEvaluatorError> {
        Ok(FIXTURE_EVALUATION_REPLY.to_owned())
    }
}
