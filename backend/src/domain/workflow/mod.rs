//! Submission workflow state machine.
//!
//! ```text
//! AwaitingPermission -> AwaitingCapture{branch} -> Captured
//!     -> AwaitingVerification -> Submitting -> Completed
//! ```
//!
//! `Failed` is reachable from every non-terminal state. [`SubmissionWorkflow::retry`]
//! returns a failed workflow to `Captured` with the image, the email, and any
//! evaluation already obtained. The verification token is never retained.

mod flags;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub use flags::{CaptureBranch, DuplicateCheckStrategy, ParseDuplicateCheckError, WorkflowFlags};

use super::ports::{RoastEvaluator, SubmissionRepository, SubmissionRepositoryError};
use super::{
    CaptureSource, CapturedImage, ContactEmail, Error, EvaluationOutcome, EvaluationResult,
    LeaderboardFeed, NewSubmission, SubmissionRecord, SubmissionSession, parse_evaluation,
};

/// Which guard detected a duplicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateGuard {
    /// The session context already carries the submitted marker.
    Session,
    /// The store already holds a record for the email.
    Remote,
    /// The store rejected the write on its uniqueness constraint.
    Store,
}

impl DuplicateGuard {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Session => "session",
            Self::Remote => "remote",
            Self::Store => "store",
        }
    }
}

/// Workflow failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SubmissionError {
    #[error("camera permission denied")]
    PermissionDenied,
    #[error("{message}")]
    Validation { message: String },
    #[error("a roast has already been submitted ({})", guard.as_str())]
    DuplicateSubmission { guard: DuplicateGuard },
    #[error("evaluation failed: {message}")]
    Upstream { message: String },
    #[error("duplicate check unavailable: {message}")]
    DuplicateCheckUnavailable { message: String },
    #[error("could not save the roast: {message}")]
    Persistence {
        message: String,
        /// Evaluation obtained before the write failed, kept for a retry.
        evaluation: Option<EvaluationResult>,
    },
    #[error("submission cancelled")]
    Cancelled,
    #[error("cannot {action} while {state}")]
    InvalidState {
        state: &'static str,
        action: &'static str,
    },
}

impl SubmissionError {
    fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

impl From<SubmissionError> for Error {
    fn from(value: SubmissionError) -> Self {
        let message = value.to_string();
        match value {
            SubmissionError::PermissionDenied => Error::forbidden(message),
            SubmissionError::Validation { .. } => Error::invalid_request(message),
            SubmissionError::DuplicateSubmission { guard } => {
                Error::conflict(message).with_details(json!({ "guard": guard.as_str() }))
            }
            SubmissionError::Upstream { .. } => Error::upstream(message),
            SubmissionError::DuplicateCheckUnavailable { .. } => {
                Error::service_unavailable(message)
            }
            SubmissionError::Persistence { evaluation, .. } => {
                let error = Error::service_unavailable(message);
                match evaluation.and_then(|evaluation| serde_json::to_value(evaluation).ok()) {
                    Some(evaluation) => error.with_details(json!({ "evaluation": evaluation })),
                    None => error,
                }
            }
            SubmissionError::Cancelled => Error::service_unavailable(message),
            SubmissionError::InvalidState { .. } => Error::conflict(message),
        }
    }
}

/// Current position in the workflow.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowState {
    AwaitingPermission,
    AwaitingCapture { branch: CaptureBranch },
    Captured,
    AwaitingVerification,
    Submitting,
    Completed,
    Failed { error: SubmissionError },
}

impl WorkflowState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AwaitingPermission => "awaiting permission",
            Self::AwaitingCapture { .. } => "awaiting capture",
            Self::Captured => "captured",
            Self::AwaitingVerification => "awaiting verification",
            Self::Submitting => "submitting",
            Self::Completed => "completed",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Opaque bot-verification token; only its presence is checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationToken(String);

impl VerificationToken {
    /// Wrap a token, treating blank input as absent.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_owned()))
    }
}

/// Collaborators shared by every workflow instance.
#[derive(Clone)]
pub struct WorkflowDeps {
    pub evaluator: Arc<dyn RoastEvaluator>,
    pub repository: Arc<dyn SubmissionRepository>,
    pub feed: LeaderboardFeed,
}

/// One visitor's pass from camera prompt to stored roast.
pub struct SubmissionWorkflow {
    flags: WorkflowFlags,
    deps: WorkflowDeps,
    state: WorkflowState,
    image: Option<CapturedImage>,
    email: Option<ContactEmail>,
    verification_token: Option<VerificationToken>,
    evaluation: Option<EvaluationResult>,
    record: Option<SubmissionRecord>,
}

impl SubmissionWorkflow {
    pub fn new(flags: WorkflowFlags, deps: WorkflowDeps) -> Self {
        Self {
            flags,
            deps,
            state: WorkflowState::AwaitingPermission,
            image: None,
            email: None,
            verification_token: None,
            evaluation: None,
            record: None,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn flags(&self) -> &WorkflowFlags {
        &self.flags
    }

    pub fn image(&self) -> Option<&CapturedImage> {
        self.image.as_ref()
    }

    pub fn email(&self) -> Option<&ContactEmail> {
        self.email.as_ref()
    }

    pub fn evaluation(&self) -> Option<&EvaluationResult> {
        self.evaluation.as_ref()
    }

    pub fn record(&self) -> Option<&SubmissionRecord> {
        self.record.as_ref()
    }

    fn invalid_state(&self, action: &'static str) -> SubmissionError {
        SubmissionError::InvalidState {
            state: self.state.name(),
            action,
        }
    }

    fn fail(&mut self, error: SubmissionError) -> SubmissionError {
        warn!(from = self.state.name(), error = %error, "submission workflow failed");
        self.state = WorkflowState::Failed {
            error: error.clone(),
        };
        error
    }

    /// Resolve the camera prompt. Denial selects the alternate branch; it is
    /// not a failure.
    pub fn resolve_permission(&mut self, granted: bool) -> Result<CaptureBranch, SubmissionError> {
        if self.state != WorkflowState::AwaitingPermission {
            return Err(self.invalid_state("resolve camera permission"));
        }
        let branch = self.flags.branch_for(granted);
        debug!(?branch, granted, "camera permission resolved");
        self.state = WorkflowState::AwaitingCapture { branch };
        Ok(branch)
    }

    /// Sources available in the current branch; empty outside capture.
    pub fn offered_sources(&self) -> Vec<CaptureSource> {
        match self.state {
            WorkflowState::AwaitingCapture { branch } => self.flags.offered_sources(branch),
            _ => Vec::new(),
        }
    }

    /// Check that `source` may be used in the current branch, before any
    /// device or network work happens.
    pub fn ensure_source_offered(&self, source: CaptureSource) -> Result<(), SubmissionError> {
        let WorkflowState::AwaitingCapture { branch } = self.state else {
            return Err(self.invalid_state("choose a capture source"));
        };
        if self.flags.offered_sources(branch).contains(&source) {
            return Ok(());
        }
        if source == CaptureSource::Camera && branch == CaptureBranch::Alternate {
            return Err(SubmissionError::PermissionDenied);
        }
        Err(SubmissionError::validation(format!(
            "capture source {source:?} is not enabled"
        )))
    }

    /// Accept an acquired image, bounding its size when compression is on.
    pub fn accept_capture(
        &mut self,
        source: CaptureSource,
        image: CapturedImage,
    ) -> Result<(), SubmissionError> {
        self.ensure_source_offered(source)?;
        let image = if self.flags.compress_images {
            let original = image.len();
            let bounded = self
                .flags
                .compression
                .apply(image)
                .map_err(|err| SubmissionError::validation(err.to_string()))?;
            debug!(original, bounded = bounded.len(), "image bounded");
            bounded
        } else {
            image
        };
        self.image = Some(image);
        self.state = WorkflowState::Captured;
        Ok(())
    }

    fn ensure_collecting_details(&mut self, action: &'static str) -> Result<(), SubmissionError> {
        match self.state {
            WorkflowState::Captured => {
                self.state = WorkflowState::AwaitingVerification;
                Ok(())
            }
            WorkflowState::AwaitingVerification => Ok(()),
            _ => Err(self.invalid_state(action)),
        }
    }

    pub fn provide_email(&mut self, email: ContactEmail) -> Result<(), SubmissionError> {
        self.ensure_collecting_details("provide an email")?;
        self.email = Some(email);
        Ok(())
    }

    pub fn provide_verification_token(
        &mut self,
        token: Option<VerificationToken>,
    ) -> Result<(), SubmissionError> {
        self.ensure_collecting_details("provide a verification token")?;
        self.verification_token = token;
        Ok(())
    }

    /// Reuse an evaluation whose write failed in an earlier attempt.
    pub fn restore_evaluation(
        &mut self,
        evaluation: EvaluationResult,
    ) -> Result<(), SubmissionError> {
        match self.state {
            WorkflowState::Captured | WorkflowState::AwaitingVerification => {
                self.evaluation = Some(evaluation);
                Ok(())
            }
            _ => Err(self.invalid_state("restore an evaluation")),
        }
    }

    /// Whether every detail required for submission is present.
    pub fn can_submit(&self) -> bool {
        matches!(
            self.state,
            WorkflowState::Captured | WorkflowState::AwaitingVerification
        ) && self.image.is_some()
            && self.email.is_some()
            && (!self.flags.verification_required || self.verification_token.is_some())
    }

    fn missing_details(&self) -> SubmissionError {
        if self.email.is_none() {
            SubmissionError::validation("an email address is required")
        } else {
            SubmissionError::validation("human verification is required")
        }
    }

    /// Run the guards, evaluate, and persist.
    ///
    /// Duplicate guards, including an unreadable store, abort without
    /// changing state. Every later failure moves the workflow to `Failed`.
    /// Cancellation is honoured while the evaluator runs and re-checked right
    /// before the write.
    pub async fn submit(
        &mut self,
        session: &mut SubmissionSession,
        cancel: &CancellationToken,
    ) -> Result<SubmissionRecord, SubmissionError> {
        if !matches!(
            self.state,
            WorkflowState::Captured | WorkflowState::AwaitingVerification
        ) {
            return Err(self.invalid_state("submit"));
        }
        if !self.can_submit() {
            return Err(self.missing_details());
        }
        let (Some(email), Some(image)) = (self.email.clone(), self.image.clone()) else {
            return Err(self.missing_details());
        };
        let strategy = self.flags.duplicate_check;

        if strategy.checks_session() && session.already_submitted() {
            debug!(email_scope = %email.scope(), "session already submitted");
            return Err(SubmissionError::DuplicateSubmission {
                guard: DuplicateGuard::Session,
            });
        }
        if strategy.checks_remote() {
            match self.deps.repository.exists_for_email(&email).await {
                Ok(false) => {}
                Ok(true) => {
                    debug!(email_scope = %email.scope(), "email already recorded");
                    return Err(SubmissionError::DuplicateSubmission {
                        guard: DuplicateGuard::Remote,
                    });
                }
                Err(err) => {
                    warn!(email_scope = %email.scope(), error = %err, "duplicate check failed");
                    return Err(SubmissionError::DuplicateCheckUnavailable {
                        message: err.to_string(),
                    });
                }
            }
        }

        self.state = WorkflowState::Submitting;

        let evaluation = match self.evaluation.clone() {
            Some(retained) => {
                debug!(email_scope = %email.scope(), "reusing retained evaluation");
                retained
            }
            None => self.evaluate(&image, cancel).await?,
        };
        self.evaluation = Some(evaluation.clone());

        if cancel.is_cancelled() {
            return Err(self.fail(SubmissionError::Cancelled));
        }

        let submission = NewSubmission {
            email: email.clone(),
            evaluation: evaluation.clone(),
        };
        match self.deps.repository.insert(&submission).await {
            Ok(record) => {
                session.mark_submitted(record.created_at());
                self.deps.feed.publish(record.id());
                info!(
                    submission_id = %record.id(),
                    email_scope = %email.scope(),
                    score = record.score().value(),
                    "roast submitted"
                );
                self.state = WorkflowState::Completed;
                self.record = Some(record.clone());
                Ok(record)
            }
            Err(SubmissionRepositoryError::Duplicate { .. }) => {
                Err(self.fail(SubmissionError::DuplicateSubmission {
                    guard: DuplicateGuard::Store,
                }))
            }
            Err(err) => Err(self.fail(SubmissionError::Persistence {
                message: err.to_string(),
                evaluation: Some(evaluation),
            })),
        }
    }

    async fn evaluate(
        &mut self,
        image: &CapturedImage,
        cancel: &CancellationToken,
    ) -> Result<EvaluationResult, SubmissionError> {
        let evaluator = Arc::clone(&self.deps.evaluator);
        let reply = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            reply = evaluator.evaluate(image) => Some(reply),
        };
        let reply = match reply {
            None => return Err(self.fail(SubmissionError::Cancelled)),
            Some(Err(err)) => {
                return Err(self.fail(SubmissionError::Upstream {
                    message: err.to_string(),
                }));
            }
            Some(Ok(reply)) => reply,
        };
        match parse_evaluation(&reply) {
            EvaluationOutcome::Valid(result) => Ok(result),
            EvaluationOutcome::Invalid(reason) => Err(self.fail(SubmissionError::Upstream {
                message: reason.to_string(),
            })),
        }
    }

    /// Return a failed workflow to `Captured`, keeping image, email, and any
    /// evaluation. The verification token must be supplied again.
    pub fn retry(&mut self) -> Result<(), SubmissionError> {
        if !matches!(self.state, WorkflowState::Failed { .. }) {
            return Err(self.invalid_state("retry"));
        }
        if self.image.is_none() {
            self.state = WorkflowState::AwaitingPermission;
            return Ok(());
        }
        self.verification_token = None;
        self.state = WorkflowState::Captured;
        Ok(())
    }
}
