//! Per-chunk scoring against the text-generation model.
//!
//! The model is asked for `{"score": <0-100>, "justification": "..."}`.
//! Replies are often wrapped in Markdown code fences; those are removed
//! before decoding. Anything that does not decode into that shape is an
//! [`ScoreError::InvalidModelOutput`].

use super::dimension::Dimension;
use crate::error::ScoreError;
use crate::llm::{CompletionModel, CompletionParams};
use crate::models::ChunkScore;
use serde_json::Value;

/// A scored chunk with the reply it was parsed from.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    /// Trimmed model reply, before fence stripping.
    pub raw: String,
    pub parsed: ChunkScore,
}

/// Remove a surrounding Markdown code fence.
///
/// Only applies when the trimmed text both starts and ends with a triple
/// backtick. The opening line (with an optional language tag) is dropped,
/// as is a closing line consisting only of the fence.
pub fn strip_code_fences(raw: &str) -> String {
    let s = raw.trim();
    if !(s.starts_with("```") && s.ends_with("```")) {
        return s.to_string();
    }

    let mut lines: Vec<&str> = s.split('\n').collect();
    if lines.first().is_some_and(|l| l.starts_with("```")) {
        lines.remove(0);
    }
    if lines.last().is_some_and(|l| l.trim() == "```") {
        lines.pop();
    }
    lines.join("\n").trim().to_string()
}

/// Decode a cleaned reply into a [`ChunkScore`].
///
/// The reply must be a JSON object. Accepts numeric scores and numeric
/// strings; rounds fractions and clamps to 0..=100.
pub fn parse_chunk_score(cleaned: &str) -> Option<ChunkScore> {
    let value: Value = serde_json::from_str(cleaned).ok()?;
    let object = value.as_object()?;

    let justification = object.get("justification")?.as_str()?.to_string();
    let score = match object.get("score")? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !score.is_finite() {
        return None;
    }

    Some(ChunkScore {
        score: score.round().clamp(0.0, 100.0) as u8,
        justification,
    })
}

/// Score one chunk for one dimension.
pub async fn score_chunk(
    model: &dyn CompletionModel,
    params: &CompletionParams,
    dimension: &Dimension,
    chunk: &str,
) -> Result<ScoredChunk, ScoreError> {
    let prompt = dimension.scoring_prompt(chunk);
    let raw = model.complete(&prompt, params).await?.trim().to_string();
    let cleaned = strip_code_fences(&raw);

    match parse_chunk_score(&cleaned) {
        Some(parsed) => Ok(ScoredChunk { raw, parsed }),
        None => Err(ScoreError::InvalidModelOutput {
            dimension: dimension.name.to_string(),
            cleaned,
        }),
    }
}
