//! Request middleware.
//!
//! Purpose: attach a trace identifier to every request so logs, error
//! payloads and response headers can be correlated.

pub mod trace;

pub use trace::Trace;
