//! OpenAI-compatible outbound adapters.
//!
//! This module provides a thin HTTP implementation of the `RoastEvaluator`
//! port against a chat completions endpoint.

mod dto;
mod http_evaluator;

pub use http_evaluator::{OpenAiEvaluatorConfig, OpenAiHttpEvaluator, ROAST_INSTRUCTION};
