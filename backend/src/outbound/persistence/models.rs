//! Internal Diesel row structs for the `roasts` table.
//!
//! These types never leave the persistence layer.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::roasts;

/// Row struct for reading from the roasts table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = roasts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RoastRow {
    pub id: Uuid,
    pub email: String,
    pub score: f64,
    pub nickname: String,
    pub roast: String,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for new roast records; `created_at` comes from the
/// column default.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = roasts)]
pub(crate) struct NewRoastRow<'a> {
    pub id: Uuid,
    pub email: &'a str,
    pub score: f64,
    pub nickname: &'a str,
    pub roast: &'a str,
}
