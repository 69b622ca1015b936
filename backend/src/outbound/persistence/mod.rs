//! Persistence adapters for the submission repository port.
//!
//! - **Diesel**: PostgreSQL via `diesel-async` with a `bb8` pool. A unique
//!   index on `email` turns the domain's check-then-act window into a
//!   `Duplicate` error at write time.
//! - **Memory**: process-local store used when no database is configured.
//!
//! Diesel row structs (`models.rs`) and the table definition (`schema.rs`)
//! stay private to this module.
//!
//! # Example
//!
//! ```ignore
//! use roasted::outbound::persistence::{DbPool, DieselSubmissionRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/roasted")).await?;
//! let repository = DieselSubmissionRepository::new(pool);
//! ```

mod diesel_error_mapping;
mod diesel_submission_repository;
mod memory_submission_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_submission_repository::DieselSubmissionRepository;
pub use memory_submission_repository::InMemorySubmissionRepository;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
