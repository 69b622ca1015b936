//! Domain primitives, aggregates and services.
//!
//! Purpose: model the roast submission flow independently of transport and
//! storage. Inbound adapters call the driving ports in [`ports`]; outbound
//! adapters implement the driven ones.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - CapturedImage, ContactEmail, ProfileHandle: validated inputs.
//! - EvaluationResult / parse_evaluation: the untrusted model reply, checked.
//! - SubmissionWorkflow: the capture-to-leaderboard state machine.
//! - RoastSubmissionServiceImpl, LeaderboardService: driving port services.

pub mod capture;
pub mod compression;
pub mod email;
pub mod error;
pub mod evaluation;
pub mod image;
pub mod leaderboard;
pub mod leaderboard_service;
pub mod ports;
pub mod presenter;
pub mod profile;
pub mod roast_submission_service;
pub mod session;
pub mod submission;
pub mod trace_id;
pub mod workflow;

pub use self::capture::{CaptureController, CaptureError, CaptureSource, UploadedFile};
pub use self::compression::{
    CompressionError, CompressionPolicy, DEFAULT_MAX_BYTES, DEFAULT_MAX_EDGE,
};
pub use self::email::{CONTACT_EMAIL_MAX, ContactEmail, ContactEmailError};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::evaluation::{
    EvaluationOutcome, EvaluationRejection, EvaluationResult, RoastScore, SCORE_MAX, SCORE_MIN,
    parse_evaluation,
};
pub use self::image::{
    CapturedImage, ImageContentType, ImageError, MAX_CAPTURE_BYTES, decode_data_url,
};
pub use self::leaderboard::{
    DEFAULT_LEADERBOARD_LIMIT, LeaderboardEntry, LeaderboardFeed, LeaderboardLimit,
    LeaderboardLimitError, MAX_LEADERBOARD_LIMIT, rank_entries,
};
pub use self::leaderboard_service::LeaderboardService;
pub use self::presenter::{IMAGE_DISCARDED_NOTICE, RoastPresentation, present};
pub use self::profile::{PROFILE_HANDLE_MAX, ProfileHandle, ProfileHandleError, SocialPlatform};
pub use self::roast_submission_service::RoastSubmissionServiceImpl;
pub use self::session::{PendingWrite, SubmissionSession};
pub use self::submission::{NewSubmission, SubmissionRecord};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::workflow::{
    CaptureBranch, DuplicateCheckStrategy, DuplicateGuard, ParseDuplicateCheckError,
    SubmissionError, SubmissionWorkflow, VerificationToken, WorkflowDeps, WorkflowFlags,
    WorkflowState,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use roasted::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<()> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
