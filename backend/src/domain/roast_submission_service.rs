//! Domain service implementing [`RoastSubmissionService`].
//!
//! Each call builds a fresh [`SubmissionWorkflow`] and drives it from the
//! permission prompt to the stored record, then renders the presentation.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::ports::{
    CaptureInput, CaptureOptions, RoastSubmissionRequest, RoastSubmissionResponse,
    RoastSubmissionService,
};
use super::{
    CaptureController, ContactEmail, DuplicateGuard, Error, SubmissionError, SubmissionSession,
    SubmissionWorkflow, VerificationToken, WorkflowDeps, WorkflowFlags, present,
};

/// Concrete submission service.
#[derive(Clone)]
pub struct RoastSubmissionServiceImpl {
    flags: WorkflowFlags,
    capture: CaptureController,
    deps: WorkflowDeps,
}

impl RoastSubmissionServiceImpl {
    pub fn new(flags: WorkflowFlags, capture: CaptureController, deps: WorkflowDeps) -> Self {
        Self {
            flags,
            capture,
            deps,
        }
    }
}

#[async_trait]
impl RoastSubmissionService for RoastSubmissionServiceImpl {
    fn capture_options(&self, camera_permission_granted: bool) -> CaptureOptions {
        let branch = self.flags.branch_for(camera_permission_granted);
        CaptureOptions {
            branch,
            sources: self.flags.offered_sources(branch),
            verification_required: self.flags.verification_required,
        }
    }

    async fn submit(
        &self,
        request: RoastSubmissionRequest,
        session: &mut SubmissionSession,
        cancel: CancellationToken,
    ) -> Result<RoastSubmissionResponse, Error> {
        let email = ContactEmail::new(&request.email)
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        // Must reject before capture: profile pictures are fetched remotely.
        if self.flags.duplicate_check.checks_session() && session.already_submitted() {
            debug!(email_scope = %email.scope(), "session already submitted");
            return Err(SubmissionError::DuplicateSubmission {
                guard: DuplicateGuard::Session,
            }
            .into());
        }
        let mut workflow = SubmissionWorkflow::new(self.flags, self.deps.clone());
        workflow.resolve_permission(request.camera_permission_granted)?;

        let source = request.capture.source();
        workflow.ensure_source_offered(source)?;
        let image = match request.capture {
            CaptureInput::Camera(device) => self.capture.acquire_from_camera(device.as_ref()).await?,
            CaptureInput::Upload(file) => self.capture.acquire_from_upload(file)?,
            CaptureInput::Profile { platform, handle } => {
                self.capture.acquire_from_profile(platform, &handle).await?
            }
        };
        workflow.accept_capture(source, image)?;
        workflow.provide_email(email.clone())?;
        workflow.provide_verification_token(
            request.verification_token.and_then(VerificationToken::new),
        )?;
        if let Some(evaluation) = session.pending_for(&email).cloned() {
            debug!(email_scope = %email.scope(), "resuming retained evaluation");
            workflow.restore_evaluation(evaluation)?;
        }

        match workflow.submit(session, &cancel).await {
            Ok(record) => {
                let Some(image) = workflow.image() else {
                    return Err(Error::internal("completed workflow lost its image"));
                };
                Ok(RoastSubmissionResponse {
                    submission_id: record.id(),
                    created_at: record.created_at(),
                    presentation: present(record.evaluation(), image),
                })
            }
            Err(err) => {
                if let SubmissionError::Persistence {
                    evaluation: Some(evaluation),
                    ..
                } = &err
                {
                    session.retain_pending(email, evaluation.clone());
                }
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
#[path = "roast_submission_service_tests.rs"]
mod tests;
