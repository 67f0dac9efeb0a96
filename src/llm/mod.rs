//! Text-generation model access.
//!
//! The pipeline only needs "prompt in, raw text out"; everything about the
//! wire protocol lives behind [`CompletionModel`].

pub mod client;

#[cfg(test)]
pub mod testing;

pub use client::HttpCompletionModel;

use crate::error::ModelError;
use async_trait::async_trait;

/// Per-call generation parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionParams {
    /// Model identifier understood by the backend.
    pub model: String,
    /// Sampling temperature; kept low for repeatable scores.
    pub temperature: f32,
}

/// A text-generation backend.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Send a single user prompt and return the raw reply text.
    async fn complete(&self, prompt: &str, params: &CompletionParams) -> Result<String, ModelError>;
}
