//! Error types for the analysis pipeline.
//!
//! Each collaborator has its own error so callers can decide what is fatal:
//! extraction aborts a run, fetch and chunk-scoring failures are skipped,
//! and summarization failures are replaced by a deterministic fallback.

use thiserror::Error;

/// Failure to turn an uploaded document into text.
#[derive(Debug, Error)]
#[error("Failed to extract text from document: {0}")]
pub struct ExtractionError(pub String);

/// Failure to fetch web content for a URL.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Scrape API error {status} for {url}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Scrape of {url} failed: {message}")]
    Unsuccessful { url: String, message: String },

    #[error("Scrape of {0} returned no markdown content")]
    NoContent(String),
}

/// Failure of the text-generation model call itself.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Cannot connect to model API at {0}")]
    Connect(String),

    #[error("Failed to send request: {0}")]
    Transport(String),

    #[error("Model API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse model API response: {0}")]
    Decode(String),

    #[error("Model returned an empty reply")]
    EmptyReply,

    #[error("Model API key is not configured (set {0})")]
    MissingApiKey(String),
}

/// Failure to score a single chunk.
#[derive(Debug, Error)]
pub enum ScoreError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Invalid JSON from model for {dimension} chunk: {cleaned}")]
    InvalidModelOutput { dimension: String, cleaned: String },
}

/// Run-level failure surfaced to the caller together with the run id.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Unsupported ticker")]
    UnsupportedTicker(String),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("{0}")]
    Internal(String),
}

impl AnalysisError {
    /// Whether the failure was caused by the caller's input.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AnalysisError::BadRequest(_) | AnalysisError::UnsupportedTicker(_)
        )
    }
}
