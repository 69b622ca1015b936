//! PostgreSQL-backed `SubmissionRepository` implementation using Diesel ORM.
//!
//! Rows are rebuilt into domain records through the validating constructors,
//! so a row edited by hand into an invalid state surfaces as a query error
//! instead of reaching the leaderboard.

use async_trait::async_trait;
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{SubmissionRepository, SubmissionRepositoryError};
use crate::domain::{
    ContactEmail, EvaluationResult, NewSubmission, RoastScore, SubmissionRecord,
};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{NewRoastRow, RoastRow};
use super::pool::DbPool;
use super::schema::roasts;

/// Diesel-backed implementation of the submission repository port.
#[derive(Clone)]
pub struct DieselSubmissionRepository {
    pool: DbPool,
}

impl DieselSubmissionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_record(row: RoastRow) -> Result<SubmissionRecord, SubmissionRepositoryError> {
    let RoastRow {
        id,
        email,
        score,
        nickname,
        roast,
        created_at,
    } = row;

    let email = ContactEmail::new(email)
        .map_err(|err| SubmissionRepositoryError::query(format!("row {id}: {err}")))?;
    let score = RoastScore::clamped(score)
        .map_err(|err| SubmissionRepositoryError::query(format!("row {id}: {err}")))?;
    let evaluation = EvaluationResult::new(score, nickname, roast)
        .map_err(|err| SubmissionRepositoryError::query(format!("row {id}: {err}")))?;
    Ok(SubmissionRecord::new(
        id,
        NewSubmission { email, evaluation },
        created_at,
    ))
}

#[async_trait]
impl SubmissionRepository for DieselSubmissionRepository {
    async fn exists_for_email(
        &self,
        email: &ContactEmail,
    ) -> Result<bool, SubmissionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::select(exists(
            roasts::table.filter(roasts::email.eq(email.as_ref())),
        ))
        .get_result::<bool>(&mut conn)
        .await
        .map_err(|err| map_diesel_error(err, None))
    }

    async fn insert(
        &self,
        submission: &NewSubmission,
    ) -> Result<SubmissionRecord, SubmissionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let evaluation = &submission.evaluation;
        let row = NewRoastRow {
            id: Uuid::new_v4(),
            email: submission.email.as_ref(),
            score: evaluation.score().value(),
            nickname: evaluation.nickname(),
            roast: evaluation.roast(),
        };

        let stored = diesel::insert_into(roasts::table)
            .values(&row)
            .returning(RoastRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, Some(&submission.email)))?;
        row_to_record(stored)
    }

    async fn top_scores(
        &self,
        limit: usize,
    ) -> Result<Vec<SubmissionRecord>, SubmissionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let limit = i64::try_from(limit)
            .map_err(|_| SubmissionRepositoryError::query("leaderboard limit overflow"))?;
        let rows: Vec<RoastRow> = roasts::table
            .order((roasts::score.desc(), roasts::created_at.asc()))
            .limit(limit)
            .select(RoastRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, None))?;

        rows.into_iter().map(row_to_record).collect()
    }

    async fn ping(&self) -> Result<(), SubmissionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::sql_query("SELECT 1")
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| map_diesel_error(err, None))
    }
}
