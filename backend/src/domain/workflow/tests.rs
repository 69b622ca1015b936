//! Tests for the submission workflow state machine.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rstest::{fixture, rstest};
use uuid::Uuid;

use super::*;
use crate::domain::image::test_images;
use crate::domain::ports::{
    MockRoastEvaluator, MockSubmissionRepository, RoastEvaluatorError,
};
use crate::domain::{CompressionPolicy, ErrorCode, ImageContentType};

const VALID_REPLY: &str = r#"{"score": 8.4, "nickname": "Sir Squint", "roast": "Nice."}"#;

fn email() -> ContactEmail {
    ContactEmail::new("ada@example.com").expect("valid email")
}

fn token() -> Option<VerificationToken> {
    VerificationToken::new("turnstile-ok")
}

fn evaluator_replying(reply: &'static str, times: usize) -> MockRoastEvaluator {
    let mut evaluator = MockRoastEvaluator::new();
    evaluator
        .expect_evaluate()
        .times(times)
        .returning(move |_| Ok(reply.to_owned()));
    evaluator
}

fn silent_evaluator() -> MockRoastEvaluator {
    let mut evaluator = MockRoastEvaluator::new();
    evaluator.expect_evaluate().times(0);
    evaluator
}

fn storing_repository() -> MockSubmissionRepository {
    let mut repository = MockSubmissionRepository::new();
    repository
        .expect_exists_for_email()
        .returning(|_| Ok(false));
    repository
        .expect_insert()
        .times(1)
        .returning(|submission| Ok(SubmissionRecord::new(Uuid::new_v4(), submission.clone(), Utc::now())));
    repository
}

fn workflow_with(
    flags: WorkflowFlags,
    evaluator: MockRoastEvaluator,
    repository: MockSubmissionRepository,
) -> (SubmissionWorkflow, LeaderboardFeed) {
    let feed = LeaderboardFeed::default();
    let deps = WorkflowDeps {
        evaluator: Arc::new(evaluator),
        repository: Arc::new(repository),
        feed: feed.clone(),
    };
    (SubmissionWorkflow::new(flags, deps), feed)
}

/// Drive a workflow to `AwaitingVerification` with every detail supplied.
fn ready(workflow: &mut SubmissionWorkflow) {
    workflow.resolve_permission(true).expect("permission");
    workflow
        .accept_capture(CaptureSource::Camera, test_images::jpeg(8, 8))
        .expect("capture");
    workflow.provide_email(email()).expect("email");
    workflow
        .provide_verification_token(token())
        .expect("token");
}

#[fixture]
fn flags() -> WorkflowFlags {
    WorkflowFlags::default()
}

#[rstest]
fn denial_selects_alternate_branch(flags: WorkflowFlags) {
    let (mut workflow, _) = workflow_with(flags, silent_evaluator(), MockSubmissionRepository::new());

    let branch = workflow.resolve_permission(false).expect("denial is not a failure");

    assert_eq!(branch, CaptureBranch::Alternate);
    assert_eq!(
        workflow.state(),
        &WorkflowState::AwaitingCapture {
            branch: CaptureBranch::Alternate
        }
    );
    assert_eq!(
        workflow.offered_sources(),
        vec![CaptureSource::Upload, CaptureSource::Profile]
    );
}

#[rstest]
fn camera_capture_on_alternate_branch_is_denied(flags: WorkflowFlags) {
    let (mut workflow, _) = workflow_with(flags, silent_evaluator(), MockSubmissionRepository::new());
    workflow.resolve_permission(false).expect("permission");

    let err = workflow
        .accept_capture(CaptureSource::Camera, test_images::jpeg(4, 4))
        .expect_err("camera not offered");

    assert_eq!(err, SubmissionError::PermissionDenied);
}

#[rstest]
fn disabled_source_is_a_validation_error(flags: WorkflowFlags) {
    let flags = WorkflowFlags {
        upload: false,
        ..flags
    };
    let (mut workflow, _) = workflow_with(flags, silent_evaluator(), MockSubmissionRepository::new());
    workflow.resolve_permission(true).expect("permission");

    let err = workflow
        .accept_capture(CaptureSource::Upload, test_images::png(4, 4))
        .expect_err("upload disabled");

    assert!(matches!(err, SubmissionError::Validation { .. }));
}

#[rstest]
fn capture_is_bounded_when_compression_enabled(flags: WorkflowFlags) {
    let flags = WorkflowFlags {
        compression: CompressionPolicy::new(8, 0),
        ..flags
    };
    let (mut workflow, _) = workflow_with(flags, silent_evaluator(), MockSubmissionRepository::new());
    workflow.resolve_permission(true).expect("permission");

    workflow
        .accept_capture(CaptureSource::Upload, test_images::png(32, 16))
        .expect("capture");

    let image = workflow.image().expect("image retained");
    assert_eq!(image.content_type(), ImageContentType::Jpeg);
    assert_eq!(workflow.state(), &WorkflowState::Captured);
}

#[rstest]
fn capture_is_untouched_when_compression_disabled(flags: WorkflowFlags) {
    let flags = WorkflowFlags {
        compress_images: false,
        compression: CompressionPolicy::new(8, 0),
        ..flags
    };
    let (mut workflow, _) = workflow_with(flags, silent_evaluator(), MockSubmissionRepository::new());
    workflow.resolve_permission(true).expect("permission");
    let original = test_images::png(32, 16);

    workflow
        .accept_capture(CaptureSource::Upload, original.clone())
        .expect("capture");

    assert_eq!(workflow.image(), Some(&original));
}

#[rstest]
#[case(true, false, false)]
#[case(true, true, true)]
#[case(false, false, true)]
fn can_submit_requires_email_and_token(
    flags: WorkflowFlags,
    #[case] verification_required: bool,
    #[case] with_token: bool,
    #[case] expected: bool,
) {
    let flags = WorkflowFlags {
        verification_required,
        ..flags
    };
    let (mut workflow, _) = workflow_with(flags, silent_evaluator(), MockSubmissionRepository::new());
    workflow.resolve_permission(true).expect("permission");
    workflow
        .accept_capture(CaptureSource::Camera, test_images::jpeg(4, 4))
        .expect("capture");
    assert!(!workflow.can_submit());

    workflow.provide_email(email()).expect("email");
    if with_token {
        workflow.provide_verification_token(token()).expect("token");
    }

    assert_eq!(workflow.state(), &WorkflowState::AwaitingVerification);
    assert_eq!(workflow.can_submit(), expected);
}

#[rstest]
#[tokio::test]
async fn submit_without_token_is_rejected_without_state_change(flags: WorkflowFlags) {
    let (mut workflow, _) = workflow_with(flags, silent_evaluator(), MockSubmissionRepository::new());
    workflow.resolve_permission(true).expect("permission");
    workflow
        .accept_capture(CaptureSource::Camera, test_images::jpeg(4, 4))
        .expect("capture");
    workflow.provide_email(email()).expect("email");

    let err = workflow
        .submit(&mut SubmissionSession::default(), &CancellationToken::new())
        .await
        .expect_err("token missing");

    assert!(matches!(err, SubmissionError::Validation { .. }));
    assert_eq!(workflow.state(), &WorkflowState::AwaitingVerification);
}

#[rstest]
#[tokio::test]
async fn out_of_range_score_is_clamped_before_persistence(flags: WorkflowFlags) {
    let mut repository = MockSubmissionRepository::new();
    repository
        .expect_exists_for_email()
        .times(1)
        .returning(|_| Ok(false));
    repository
        .expect_insert()
        .withf(|submission| submission.evaluation.score().value() == 10.0)
        .times(1)
        .returning(|submission| Ok(SubmissionRecord::new(Uuid::new_v4(), submission.clone(), Utc::now())));
    let evaluator = evaluator_replying(r#"{"score": 11, "nickname": "X", "roast": "Y"}"#, 1);
    let (mut workflow, feed) = workflow_with(flags, evaluator, repository);
    let mut updates = feed.subscribe();
    let mut session = SubmissionSession::default();
    ready(&mut workflow);

    let record = workflow
        .submit(&mut session, &CancellationToken::new())
        .await
        .expect("submission succeeds");

    assert_eq!(record.score().value(), 10.0);
    assert_eq!(workflow.state(), &WorkflowState::Completed);
    assert!(session.already_submitted());
    assert_eq!(updates.try_recv().expect("leaderboard notified"), record.id());
}

#[rstest]
#[case(r#"{"nickname": "X", "roast": "Y"}"#)]
#[case(r#"{"score": 9, "roast": "Y"}"#)]
#[case(r#"{"score": 9, "nickname": "X"}"#)]
#[case("I refuse.")]
#[tokio::test]
async fn incomplete_reply_fails_without_write(flags: WorkflowFlags, #[case] reply: &'static str) {
    let mut repository = MockSubmissionRepository::new();
    repository
        .expect_exists_for_email()
        .returning(|_| Ok(false));
    repository.expect_insert().times(0);
    let (mut workflow, _) = workflow_with(flags, evaluator_replying(reply, 1), repository);
    let mut session = SubmissionSession::default();
    ready(&mut workflow);

    let err = workflow
        .submit(&mut session, &CancellationToken::new())
        .await
        .expect_err("incomplete reply");

    assert!(matches!(err, SubmissionError::Upstream { .. }));
    assert!(matches!(workflow.state(), WorkflowState::Failed { .. }));
    assert!(!session.already_submitted());
}

#[rstest]
#[tokio::test]
async fn session_guard_blocks_without_network_call(flags: WorkflowFlags) {
    let mut repository = MockSubmissionRepository::new();
    repository.expect_exists_for_email().times(0);
    repository.expect_insert().times(0);
    let (mut workflow, _) = workflow_with(flags, silent_evaluator(), repository);
    let mut session = SubmissionSession::default();
    session.mark_submitted(Utc::now());
    ready(&mut workflow);

    let err = workflow
        .submit(&mut session, &CancellationToken::new())
        .await
        .expect_err("already submitted");

    assert_eq!(
        err,
        SubmissionError::DuplicateSubmission {
            guard: DuplicateGuard::Session
        }
    );
    assert_eq!(workflow.state(), &WorkflowState::AwaitingVerification);
}

#[rstest]
#[tokio::test]
async fn remote_guard_blocks_known_email(flags: WorkflowFlags) {
    let mut repository = MockSubmissionRepository::new();
    repository
        .expect_exists_for_email()
        .times(1)
        .returning(|_| Ok(true));
    repository.expect_insert().times(0);
    let (mut workflow, _) = workflow_with(flags, silent_evaluator(), repository);
    ready(&mut workflow);

    let err = workflow
        .submit(&mut SubmissionSession::default(), &CancellationToken::new())
        .await
        .expect_err("email known");

    assert_eq!(
        err,
        SubmissionError::DuplicateSubmission {
            guard: DuplicateGuard::Remote
        }
    );
    assert_eq!(workflow.state(), &WorkflowState::AwaitingVerification);
}

#[rstest]
#[tokio::test]
async fn unreadable_store_aborts_before_evaluation(flags: WorkflowFlags) {
    let mut repository = MockSubmissionRepository::new();
    repository
        .expect_exists_for_email()
        .times(1)
        .returning(|_| Err(SubmissionRepositoryError::connection("pool timed out")));
    repository.expect_insert().times(0);
    let (mut workflow, _) = workflow_with(flags, silent_evaluator(), repository);
    ready(&mut workflow);

    let err = workflow
        .submit(&mut SubmissionSession::default(), &CancellationToken::new())
        .await
        .expect_err("store unreadable");

    assert!(matches!(err, SubmissionError::DuplicateCheckUnavailable { .. }));
    assert_eq!(workflow.state(), &WorkflowState::AwaitingVerification);
    let mapped = Error::from(err);
    assert_eq!(mapped.code(), ErrorCode::ServiceUnavailable);
    assert!(!mapped.message().contains("could not save"));
}

#[rstest]
#[tokio::test]
async fn disabled_guards_skip_both_checks(flags: WorkflowFlags) {
    let flags = WorkflowFlags {
        duplicate_check: DuplicateCheckStrategy::None,
        ..flags
    };
    let mut repository = MockSubmissionRepository::new();
    repository.expect_exists_for_email().times(0);
    repository
        .expect_insert()
        .times(1)
        .returning(|submission| Ok(SubmissionRecord::new(Uuid::new_v4(), submission.clone(), Utc::now())));
    let (mut workflow, _) = workflow_with(flags, evaluator_replying(VALID_REPLY, 1), repository);
    let mut session = SubmissionSession::default();
    session.mark_submitted(Utc::now());
    ready(&mut workflow);

    workflow
        .submit(&mut session, &CancellationToken::new())
        .await
        .expect("guards disabled");
}

#[rstest]
#[tokio::test]
async fn store_uniqueness_violation_is_a_duplicate(flags: WorkflowFlags) {
    let mut repository = MockSubmissionRepository::new();
    repository
        .expect_exists_for_email()
        .returning(|_| Ok(false));
    repository
        .expect_insert()
        .times(1)
        .returning(|submission| Err(SubmissionRepositoryError::duplicate(submission.email.scope())));
    let (mut workflow, _) = workflow_with(flags, evaluator_replying(VALID_REPLY, 1), repository);
    ready(&mut workflow);

    let err = workflow
        .submit(&mut SubmissionSession::default(), &CancellationToken::new())
        .await
        .expect_err("store rejects");

    assert_eq!(
        err,
        SubmissionError::DuplicateSubmission {
            guard: DuplicateGuard::Store
        }
    );
}

#[rstest]
#[tokio::test]
async fn upstream_error_moves_to_failed(flags: WorkflowFlags) {
    let mut evaluator = MockRoastEvaluator::new();
    evaluator
        .expect_evaluate()
        .times(1)
        .returning(|_| Err(RoastEvaluatorError::timeout("30s elapsed")));
    let mut repository = MockSubmissionRepository::new();
    repository
        .expect_exists_for_email()
        .returning(|_| Ok(false));
    repository.expect_insert().times(0);
    let (mut workflow, _) = workflow_with(flags, evaluator, repository);
    ready(&mut workflow);

    let err = workflow
        .submit(&mut SubmissionSession::default(), &CancellationToken::new())
        .await
        .expect_err("timeout");

    assert!(matches!(err, SubmissionError::Upstream { .. }));
    assert_eq!(workflow.state(), &WorkflowState::Failed { error: err });
}

#[rstest]
#[tokio::test]
async fn retry_after_write_failure_only_repeats_the_write(flags: WorkflowFlags) {
    let mut repository = MockSubmissionRepository::new();
    repository
        .expect_exists_for_email()
        .times(2)
        .returning(|_| Ok(false));
    let mut attempts = 0;
    repository
        .expect_insert()
        .times(2)
        .returning(move |submission| {
            attempts += 1;
            if attempts == 1 {
                Err(SubmissionRepositoryError::connection("pool exhausted"))
            } else {
                Ok(SubmissionRecord::new(Uuid::new_v4(), submission.clone(), Utc::now()))
            }
        });
    let (mut workflow, _) = workflow_with(flags, evaluator_replying(VALID_REPLY, 1), repository);
    let mut session = SubmissionSession::default();
    ready(&mut workflow);

    let err = workflow
        .submit(&mut session, &CancellationToken::new())
        .await
        .expect_err("write fails");
    let SubmissionError::Persistence { evaluation, .. } = &err else {
        panic!("expected persistence failure, got {err:?}");
    };
    assert_eq!(evaluation.as_ref().map(|e| e.nickname()), Some("Sir Squint"));

    workflow.retry().expect("retry");
    assert_eq!(workflow.state(), &WorkflowState::Captured);
    assert!(workflow.image().is_some());
    assert_eq!(workflow.email(), Some(&email()));
    assert!(!workflow.can_submit(), "token must be supplied again");

    workflow.provide_verification_token(token()).expect("token");
    let record = workflow
        .submit(&mut session, &CancellationToken::new())
        .await
        .expect("second write succeeds");

    assert_eq!(record.nickname(), "Sir Squint");
    assert!(session.already_submitted());
}

#[rstest]
#[tokio::test]
async fn restored_evaluation_skips_the_evaluator(flags: WorkflowFlags) {
    let (mut workflow, _) = workflow_with(flags, silent_evaluator(), storing_repository());
    ready(&mut workflow);
    let evaluation = parse_evaluation(VALID_REPLY)
        .into_result()
        .expect("valid reply");
    workflow
        .restore_evaluation(evaluation.clone())
        .expect("restore");

    let record = workflow
        .submit(&mut SubmissionSession::default(), &CancellationToken::new())
        .await
        .expect("write succeeds");

    assert_eq!(record.evaluation(), &evaluation);
}

#[rstest]
#[tokio::test]
async fn cancelled_before_evaluation_makes_no_calls(flags: WorkflowFlags) {
    let mut repository = MockSubmissionRepository::new();
    repository
        .expect_exists_for_email()
        .returning(|_| Ok(false));
    repository.expect_insert().times(0);
    let mut evaluator = MockRoastEvaluator::new();
    evaluator
        .expect_evaluate()
        .returning(|_| Ok(VALID_REPLY.to_owned()));
    let (mut workflow, _) = workflow_with(flags, evaluator, repository);
    ready(&mut workflow);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = workflow
        .submit(&mut SubmissionSession::default(), &cancel)
        .await
        .expect_err("cancelled");

    assert_eq!(err, SubmissionError::Cancelled);
}

struct CancellingEvaluator(CancellationToken);

#[async_trait]
impl RoastEvaluator for CancellingEvaluator {
    async fn evaluate(&self, _image: &CapturedImage) -> Result<String, RoastEvaluatorError> {
        self.0.cancel();
        Ok(VALID_REPLY.to_owned())
    }
}

#[rstest]
#[tokio::test]
async fn cancellation_is_rechecked_before_the_write(flags: WorkflowFlags) {
    let cancel = CancellationToken::new();
    let mut repository = MockSubmissionRepository::new();
    repository
        .expect_exists_for_email()
        .returning(|_| Ok(false));
    repository.expect_insert().times(0);
    let deps = WorkflowDeps {
        evaluator: Arc::new(CancellingEvaluator(cancel.clone())),
        repository: Arc::new(repository),
        feed: LeaderboardFeed::default(),
    };
    let mut workflow = SubmissionWorkflow::new(flags, deps);
    ready(&mut workflow);

    let err = workflow
        .submit(&mut SubmissionSession::default(), &cancel)
        .await
        .expect_err("cancelled mid-flight");

    assert_eq!(err, SubmissionError::Cancelled);
    assert!(workflow.evaluation().is_some());
}

#[rstest]
fn retry_is_only_valid_after_failure(flags: WorkflowFlags) {
    let (mut workflow, _) = workflow_with(flags, silent_evaluator(), MockSubmissionRepository::new());
    let err = workflow.retry().expect_err("not failed");
    assert!(matches!(err, SubmissionError::InvalidState { .. }));
}

#[test]
fn persistence_error_carries_evaluation_in_details() {
    let evaluation = parse_evaluation(VALID_REPLY)
        .into_result()
        .expect("valid reply");
    let err: Error = SubmissionError::Persistence {
        message: "pool exhausted".into(),
        evaluation: Some(evaluation),
    }
    .into();

    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    let details = err.details().expect("details attached");
    assert_eq!(details["evaluation"]["nickname"], "Sir Squint");
    assert_eq!(details["evaluation"]["score"], 8.4);
}

#[rstest]
#[case(SubmissionError::PermissionDenied, ErrorCode::Forbidden)]
#[case(SubmissionError::Validation { message: "bad".into() }, ErrorCode::InvalidRequest)]
#[case(SubmissionError::DuplicateSubmission { guard: DuplicateGuard::Session }, ErrorCode::Conflict)]
#[case(SubmissionError::Upstream { message: "down".into() }, ErrorCode::UpstreamError)]
#[case(SubmissionError::DuplicateCheckUnavailable { message: "down".into() }, ErrorCode::ServiceUnavailable)]
#[case(SubmissionError::Cancelled, ErrorCode::ServiceUnavailable)]
fn submission_errors_map_to_codes(#[case] error: SubmissionError, #[case] expected: ErrorCode) {
    assert_eq!(Error::from(error).code(), expected);
}
