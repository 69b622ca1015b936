//! Process-local `SubmissionRepository` used when no database is configured.
//!
//! Records live only as long as the process. The email uniqueness constraint
//! can be switched off to reproduce the check-then-act race the domain
//! guard alone leaves open.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use mockable::Clock;
use uuid::Uuid;

use crate::domain::ports::{SubmissionRepository, SubmissionRepositoryError};
use crate::domain::{ContactEmail, NewSubmission, SubmissionRecord};

/// In-memory submission store.
#[derive(Clone)]
pub struct InMemorySubmissionRepository {
    records: Arc<Mutex<Vec<SubmissionRecord>>>,
    clock: Arc<dyn Clock>,
    unique_email: bool,
}

impl InMemorySubmissionRepository {
    /// Store enforcing one record per email, like the PostgreSQL index.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: Arc::default(),
            clock,
            unique_email: true,
        }
    }

    /// Store without the uniqueness constraint.
    pub fn without_unique_email(clock: Arc<dyn Clock>) -> Self {
        Self {
            unique_email: false,
            ..Self::new(clock)
        }
    }

    pub fn len(&self) -> usize {
        self.lock().map(|records| records.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<SubmissionRecord>>, SubmissionRepositoryError> {
        self.records
            .lock()
            .map_err(|_| SubmissionRepositoryError::query("in-memory store poisoned"))
    }
}

#[async_trait]
impl SubmissionRepository for InMemorySubmissionRepository {
    async fn exists_for_email(
        &self,
        email: &ContactEmail,
    ) -> Result<bool, SubmissionRepositoryError> {
        Ok(self.lock()?.iter().any(|record| record.email() == email))
    }

    async fn insert(
        &self,
        submission: &NewSubmission,
    ) -> Result<SubmissionRecord, SubmissionRepositoryError> {
        let mut records = self.lock()?;
        if self.unique_email && records.iter().any(|r| r.email() == &submission.email) {
            return Err(SubmissionRepositoryError::duplicate(submission.email.scope()));
        }
        let record = SubmissionRecord::new(Uuid::new_v4(), submission.clone(), self.clock.utc());
        records.push(record.clone());
        Ok(record)
    }

    async fn top_scores(
        &self,
        limit: usize,
    ) -> Result<Vec<SubmissionRecord>, SubmissionRepositoryError> {
        let mut records = self.lock()?.clone();
        records.sort_by(|a, b| {
            b.score()
                .value()
                .total_cmp(&a.score().value())
                .then_with(|| a.created_at().cmp(&b.created_at()))
        });
        records.truncate(limit);
        Ok(records)
    }

    async fn ping(&self) -> Result<(), SubmissionRepositoryError> {
        self.lock().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, Local, TimeZone, Utc};
    use rstest::{fixture, rstest};

    use super::*;
    use crate::domain::{EvaluationResult, RoastScore};

    struct TickingClock {
        start: DateTime<Utc>,
        ticks: Mutex<i64>,
    }

    impl Clock for TickingClock {
        fn local(&self) -> DateTime<Local> {
            self.utc().with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            let mut ticks = self.ticks.lock().expect("clock lock");
            *ticks += 1;
            self.start + Duration::seconds(*ticks)
        }
    }

    #[fixture]
    fn clock() -> Arc<dyn Clock> {
        Arc::new(TickingClock {
            start: Utc
                .with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
                .single()
                .expect("valid fixture timestamp"),
            ticks: Mutex::new(0),
        })
    }

    fn submission(email: &str, score: f64) -> NewSubmission {
        NewSubmission {
            email: ContactEmail::new(email).expect("email"),
            evaluation: EvaluationResult::new(
                RoastScore::clamped(score).expect("score"),
                format!("nick {email}"),
                "roast",
            )
            .expect("evaluation"),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn insert_stamps_clock_time_and_is_visible(clock: Arc<dyn Clock>) {
        let repository = InMemorySubmissionRepository::new(clock);

        let record = repository
            .insert(&submission("ada@example.com", 9.0))
            .await
            .expect("insert");

        assert_eq!(record.created_at().to_rfc3339(), "2026-03-01T09:00:01+00:00");
        let email = ContactEmail::new("ADA@example.com").expect("email");
        assert!(repository.exists_for_email(&email).await.expect("lookup"));
        assert_eq!(repository.len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn second_insert_for_email_is_a_duplicate(clock: Arc<dyn Clock>) {
        let repository = InMemorySubmissionRepository::new(clock);
        repository
            .insert(&submission("ada@example.com", 9.0))
            .await
            .expect("first insert");

        let err = repository
            .insert(&submission("ada@example.com", 8.0))
            .await
            .expect_err("duplicate");

        assert!(matches!(err, SubmissionRepositoryError::Duplicate { .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn interleaved_check_then_act_writes_twice_without_constraint(
        clock: Arc<dyn Clock>,
    ) {
        let repository = InMemorySubmissionRepository::without_unique_email(clock);
        let email = ContactEmail::new("ada@example.com").expect("email");

        // Both callers pass the guard before either writes.
        assert!(!repository.exists_for_email(&email).await.expect("first check"));
        assert!(!repository.exists_for_email(&email).await.expect("second check"));
        repository
            .insert(&submission("ada@example.com", 9.0))
            .await
            .expect("first write");
        repository
            .insert(&submission("ada@example.com", 8.0))
            .await
            .expect("second write");

        assert_eq!(repository.len(), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn top_scores_orders_and_truncates(clock: Arc<dyn Clock>) {
        let repository = InMemorySubmissionRepository::new(clock);
        for (i, score) in [9.5, 7.0, 10.0, 8.2, 9.5].into_iter().enumerate() {
            repository
                .insert(&submission(&format!("u{i}@example.com"), score))
                .await
                .expect("insert");
        }

        let top = repository.top_scores(3).await.expect("top");

        let scores: Vec<f64> = top.iter().map(|r| r.score().value()).collect();
        assert_eq!(scores, vec![10.0, 9.5, 9.5]);
        assert_eq!(top[1].email().as_ref(), "u0@example.com");
    }
}
