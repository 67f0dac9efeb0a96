//! Data models for the analysis pipeline.
//!
//! This module contains the data structures passed between the chunker,
//! scorer, aggregator and summarizer, plus the response shapes returned
//! to HTTP and CLI callers.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identity of one end-to-end analysis run.
///
/// Formatted as an RFC 3339 timestamp with `:` and `.` replaced by `-`,
/// followed by `_` and a random UUID, so ids sort by start time and are
/// safe to use as file names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    /// Generate a fresh run id for a run starting now.
    pub fn generate() -> Self {
        Self::generate_at(Utc::now())
    }

    /// Generate a run id for a run starting at `started_at`.
    pub fn generate_at(started_at: DateTime<Utc>) -> Self {
        let timestamp = started_at
            .to_rfc3339_opts(SecondsFormat::Millis, true)
            .replace([':', '.'], "-");
        Self(format!("{}_{}", timestamp, Uuid::new_v4()))
    }

    /// Parse an id received from a caller.
    ///
    /// Only ASCII alphanumerics, `-` and `_` are accepted.
    pub fn parse(raw: &str) -> Option<Self> {
        let valid = !raw.is_empty()
            && raw.len() <= 128
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        valid.then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated score for one chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkScore {
    /// Score in 0..=100.
    pub score: u8,
    /// The model's short explanation.
    pub justification: String,
}

/// Result of scoring every chunk of one document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AggregateResult {
    /// Rounded mean of successful chunk scores, 0 if none succeeded.
    pub score: u8,
    /// Justifications of successful chunks in chunk order.
    pub justifications: Vec<String>,
    /// Number of chunks submitted.
    pub chunks_total: usize,
    /// Number of chunks whose scoring failed.
    pub chunks_failed: usize,
}

impl AggregateResult {
    pub fn chunks_succeeded(&self) -> usize {
        self.chunks_total - self.chunks_failed
    }
}

/// Human-readable summary for one dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResult {
    pub overall_justification: String,
    pub recommendations: Vec<String>,
}

/// Everything produced for one scoring dimension.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionOutcome {
    /// Machine name of the dimension (`trust`, `growth`).
    pub name: String,
    /// Display label (`Trust`, `Growth`).
    pub label: String,
    pub aggregate: AggregateResult,
    pub summary: SummaryResult,
}

/// Successful response of a full analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub ticker: String,
    pub trust_score: u8,
    pub trust_justification: String,
    pub trust_recommendations: Vec<String>,
    pub growth_score: u8,
    pub growth_justification: String,
    pub growth_recommendations: Vec<String>,
    pub summary: String,
    pub run_id: RunId,
}

impl AnalysisResponse {
    /// Build the caller-facing response from the two dimension outcomes.
    pub fn from_outcomes(
        ticker: &str,
        run_id: RunId,
        trust: &DimensionOutcome,
        growth: &DimensionOutcome,
    ) -> Self {
        Self {
            ticker: ticker.to_string(),
            trust_score: trust.aggregate.score,
            trust_justification: trust.summary.overall_justification.clone(),
            trust_recommendations: trust.summary.recommendations.clone(),
            growth_score: growth.aggregate.score,
            growth_justification: growth.summary.overall_justification.clone(),
            growth_recommendations: growth.summary.recommendations.clone(),
            summary: summary_line(ticker, trust.aggregate.score, growth.aggregate.score),
            run_id,
        }
    }
}

/// The one-line summary shown to callers.
pub fn summary_line(ticker: &str, trust: u8, growth: u8) -> String {
    format!("For {}: Trust={}, Growth={}.", ticker, trust, growth)
}

/// Error body returned to callers. Carries the run id whenever one exists
/// so the audit log can be retrieved.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<RunId>,
}

/// Metadata about a CLI report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Ticker that was analyzed.
    pub ticker: String,
    /// Run identifier (name of the audit log file).
    pub run_id: RunId,
    /// Date and time of the analysis.
    pub analysis_date: DateTime<Utc>,
    /// Name of the LLM model used.
    pub model_used: String,
    /// Number of documents that were extracted.
    pub documents: usize,
    /// Number of URLs that were fetched successfully.
    pub sources_fetched: usize,
    /// Number of URLs configured for the ticker.
    pub sources_total: usize,
    /// Duration of the analysis in seconds.
    pub duration_seconds: f64,
}

/// The complete report written by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub summary: String,
    pub dimensions: Vec<DimensionOutcome>,
}
