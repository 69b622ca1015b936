//! Persisted roast submissions.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{ContactEmail, EvaluationResult, RoastScore};

/// Data handed to the repository for a new submission.
///
/// The identifier and creation timestamp are assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSubmission {
    pub email: ContactEmail,
    pub evaluation: EvaluationResult,
}

/// Immutable record of one successful evaluation.
///
/// ## Invariants
/// - Created exactly once per successful evaluation.
/// - At most one record exists per [`ContactEmail`].
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionRecord {
    id: Uuid,
    email: ContactEmail,
    evaluation: EvaluationResult,
    created_at: DateTime<Utc>,
}

impl SubmissionRecord {
    /// Assemble a stored record.
    pub fn new(id: Uuid, submission: NewSubmission, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            email: submission.email,
            evaluation: submission.evaluation,
            created_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn email(&self) -> &ContactEmail {
        &self.email
    }

    pub fn evaluation(&self) -> &EvaluationResult {
        &self.evaluation
    }

    pub fn score(&self) -> RoastScore {
        self.evaluation.score()
    }

    pub fn nickname(&self) -> &str {
        self.evaluation.nickname()
    }

    pub fn roast(&self) -> &str {
        self.evaluation.roast()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
