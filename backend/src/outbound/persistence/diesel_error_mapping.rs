//! Shared Diesel error mapping for the submission repository.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use crate::domain::ContactEmail;
use crate::domain::ports::SubmissionRepositoryError;

use super::pool::PoolError;

pub(crate) fn map_pool_error(error: PoolError) -> SubmissionRepositoryError {
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    SubmissionRepositoryError::connection(message)
}

/// Map Diesel failures; a unique violation on insert means the email is
/// already recorded.
pub(crate) fn map_diesel_error(
    error: DieselError,
    email: Option<&ContactEmail>,
) -> SubmissionRepositoryError {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match (error, email) {
        (DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _), Some(email)) => {
            SubmissionRepositoryError::duplicate(email.scope())
        }
        (DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _), _) => {
            SubmissionRepositoryError::connection("database connection error")
        }
        (DieselError::NotFound, _) => SubmissionRepositoryError::query("record not found"),
        (DieselError::QueryBuilderError(_), _) => {
            SubmissionRepositoryError::query("database query error")
        }
        _ => SubmissionRepositoryError::query("database error"),
    }
}
