//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod camera_device;
mod leaderboard_query;
mod profile_image_source;
mod roast_evaluator;
mod roast_submission;
mod submission_repository;

pub use camera_device::{CameraDevice, CameraError, MediaStream};
#[cfg(test)]
pub use camera_device::{MockCameraDevice, MockMediaStream};
#[cfg(test)]
pub use leaderboard_query::MockLeaderboardQuery;
pub use leaderboard_query::{FixtureLeaderboardQuery, LeaderboardQuery, LeaderboardStream};
#[cfg(test)]
pub use profile_image_source::MockProfileImageSource;
pub use profile_image_source::{
    FixtureProfileImageSource, ProfileImage, ProfileImageSource, ProfileImageSourceError,
};
#[cfg(test)]
pub use roast_evaluator::MockRoastEvaluator;
pub use roast_evaluator::{
    FIXTURE_EVALUATION_REPLY, FixtureRoastEvaluator, RoastEvaluator, RoastEvaluatorError,
};
#[cfg(test)]
pub use roast_submission::MockRoastSubmissionService;
pub use roast_submission::{
    CaptureInput, CaptureOptions, FixtureRoastSubmissionService, RoastSubmissionRequest,
    RoastSubmissionResponse, RoastSubmissionService,
};
#[cfg(test)]
pub use submission_repository::MockSubmissionRepository;
pub use submission_repository::{
    FixtureSubmissionRepository, SubmissionRepository, SubmissionRepositoryError,
};
