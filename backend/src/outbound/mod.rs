//! Outbound adapters implementing the driven domain ports.
//!
//! - **openai**: chat-completions client behind `RoastEvaluator`
//! - **profile_source**: avatar resolver client behind `ProfileImageSource`
//! - **persistence**: PostgreSQL and in-memory `SubmissionRepository`s
//!
//! Adapters translate between wire or row formats and domain types. They
//! contain no business logic.

pub mod openai;
pub mod persistence;
pub mod profile_source;
