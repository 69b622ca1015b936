//! Per-browser session context consulted by the duplicate guard.
//!
//! The HTTP adapter keeps this value in the encrypted session cookie. It
//! carries the "already submitted" marker and, after a failed write, the
//! evaluation that still needs persisting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ContactEmail, EvaluationResult};

/// Evaluation retained after the store rejected the write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingWrite {
    pub email: ContactEmail,
    pub evaluation: EvaluationResult,
}

/// Explicit session flags for one visitor.
///
/// # Examples
/// ```
/// use chrono::Utc;
/// use roasted::domain::SubmissionSession;
///
/// let mut session = SubmissionSession::default();
/// assert!(!session.already_submitted());
/// session.mark_submitted(Utc::now());
/// assert!(session.already_submitted());
/// session.reset();
/// assert!(!session.already_submitted());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionSession {
    #[serde(default)]
    submitted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pending: Option<PendingWrite>,
}

impl SubmissionSession {
    pub fn already_submitted(&self) -> bool {
        self.submitted_at.is_some()
    }

    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submitted_at
    }

    /// Record a committed submission and drop any pending write.
    pub fn mark_submitted(&mut self, at: DateTime<Utc>) {
        self.submitted_at = Some(at);
        self.pending = None;
    }

    /// Clear every flag.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Keep an evaluation whose write failed so a retry skips the evaluator.
    pub fn retain_pending(&mut self, email: ContactEmail, evaluation: EvaluationResult) {
        self.pending = Some(PendingWrite { email, evaluation });
    }

    /// Pending evaluation for `email`, if one was retained for that address.
    pub fn pending_for(&self, email: &ContactEmail) -> Option<&EvaluationResult> {
        self.pending
            .as_ref()
            .filter(|pending| &pending.email == email)
            .map(|pending| &pending.evaluation)
    }

    /// Whether an evaluation is waiting to be written.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn clear_pending(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RoastScore;

    fn evaluation() -> EvaluationResult {
        EvaluationResult::new(
            RoastScore::clamped(8.0).expect("finite"),
            "Sir Squint",
            "Nice.",
        )
        .expect("valid evaluation")
    }

    #[test]
    fn pending_write_is_scoped_to_its_email() {
        let ada = ContactEmail::new("ada@example.com").expect("valid email");
        let bob = ContactEmail::new("bob@example.com").expect("valid email");
        let mut session = SubmissionSession::default();

        session.retain_pending(ada.clone(), evaluation());

        assert_eq!(session.pending_for(&ada), Some(&evaluation()));
        assert!(session.pending_for(&bob).is_none());
    }

    #[test]
    fn marking_submitted_drops_pending_write() {
        let ada = ContactEmail::new("ada@example.com").expect("valid email");
        let mut session = SubmissionSession::default();
        session.retain_pending(ada.clone(), evaluation());

        session.mark_submitted(Utc::now());

        assert!(session.already_submitted());
        assert!(session.pending_for(&ada).is_none());
    }

    #[test]
    fn deserialises_empty_cookie_payload() {
        let session: SubmissionSession = serde_json::from_str("{}").expect("empty object");
        assert_eq!(session, SubmissionSession::default());
    }
}
