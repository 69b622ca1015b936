//! Driven port for roast submission persistence.

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::{ContactEmail, NewSubmission, SubmissionRecord};

use super::define_port_error;

define_port_error! {
    /// Errors raised by submission repository adapters.
    pub enum SubmissionRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "submission repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "submission repository query failed: {message}",
        /// A record for the email already exists.
        Duplicate { email_scope: String } =>
            "submission already recorded for email scope {email_scope}",
    }
}

/// Port for writing submissions and reading the leaderboard projection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Whether a submission for `email` already exists (exact match).
    async fn exists_for_email(
        &self,
        email: &ContactEmail,
    ) -> Result<bool, SubmissionRepositoryError>;

    /// Persist a submission, assigning its id and creation time.
    async fn insert(
        &self,
        submission: &NewSubmission,
    ) -> Result<SubmissionRecord, SubmissionRepositoryError>;

    /// Highest scores first, earlier submissions winning ties.
    async fn top_scores(&self, limit: usize)
    -> Result<Vec<SubmissionRecord>, SubmissionRepositoryError>;

    /// Round-trip check against the backing store.
    async fn ping(&self) -> Result<(), SubmissionRepositoryError>;
}

/// Fixture implementation for tests that do not exercise persistence.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureSubmissionRepository;

#[async_trait]
impl SubmissionRepository for FixtureSubmissionRepository {
    async fn exists_for_email(
        &self,
        _email: &ContactEmail,
    ) -> Result<bool, SubmissionRepositoryError> {
        Ok(false)
    }

    async fn insert(
        &self,
        submission: &NewSubmission,
    ) -> Result<SubmissionRecord, SubmissionRepositoryError> {
        Ok(SubmissionRecord::new(
            Uuid::new_v4(),
            submission.clone(),
            Utc::now(),
        ))
    }

    async fn top_scores(
        &self,
        _limit: usize,
    ) -> Result<Vec<SubmissionRecord>, SubmissionRepositoryError> {
        Ok(Vec::new())
    }

    async fn ping(&self) -> Result<(), SubmissionRepositoryError> {
        Ok(())
    }
}
