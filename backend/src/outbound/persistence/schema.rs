//! Diesel table definitions for the PostgreSQL schema.
//!
//! Must match `backend/migrations` exactly; regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// One row per roasted submission.
    ///
    /// `email` carries a unique index; `(score DESC, created_at ASC)` backs
    /// the leaderboard read.
    roasts (id) {
        id -> Uuid,
        /// Lower-cased contact email (max 254 characters).
        email -> Varchar,
        /// Clamped score in `[7.0, 10.0]`.
        score -> Float8,
        nickname -> Text,
        roast -> Text,
        /// Server-assigned creation timestamp.
        created_at -> Timestamptz,
    }
}
