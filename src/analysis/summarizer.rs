//! Second-pass summarization of chunk observations.
//!
//! Turns an aggregate score and the chunk justifications into an overall
//! justification and a list of recommendations. If the model call fails or
//! its reply is not the expected JSON shape, a deterministic summary is
//! built from the inputs instead; this function never fails.

use super::dimension::Dimension;
use super::scoring::strip_code_fences;
use crate::llm::{CompletionModel, CompletionParams};
use crate::models::SummaryResult;
use crate::runlog::RunLog;
use serde_json::Value;
use tracing::warn;

/// Justifications selected for the prompt plus a note about the rest.
struct Observations<'a> {
    included: &'a [String],
    omitted_note: String,
}

impl<'a> Observations<'a> {
    fn select(justifications: &'a [String], max: usize) -> Self {
        let included = &justifications[..justifications.len().min(max)];
        let omitted = justifications.len() - included.len();
        let omitted_note = if omitted > 0 {
            format!("\n...and {} more observations omitted for brevity.", omitted)
        } else {
            String::new()
        };
        Self {
            included,
            omitted_note,
        }
    }

    fn as_bullets(&self) -> String {
        let list = self
            .included
            .iter()
            .enumerate()
            .map(|(i, j)| format!("- Chunk {}: {}", i + 1, j))
            .collect::<Vec<_>>()
            .join("\n");
        format!("{}{}", list, self.omitted_note)
    }
}

/// Decode a cleaned summary reply.
///
/// The reply must be a JSON object with a string `overallJustification` and
/// an array `recommendations`. Non-string recommendations are kept as their
/// JSON text. Extra fields are ignored.
fn parse_summary_reply(cleaned: &str) -> Result<SummaryResult, String> {
    let value: Value = serde_json::from_str(cleaned).map_err(|e| e.to_string())?;
    let object = value
        .as_object()
        .ok_or_else(|| "reply is not a JSON object".to_string())?;

    let overall_justification = object
        .get("overallJustification")
        .and_then(Value::as_str)
        .ok_or_else(|| "overallJustification is not a string".to_string())?
        .to_string();
    let recommendations = object
        .get("recommendations")
        .and_then(Value::as_array)
        .ok_or_else(|| "recommendations is not an array".to_string())?
        .iter()
        .map(|rec| match rec {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect();

    Ok(SummaryResult {
        overall_justification,
        recommendations,
    })
}

/// Summarize one dimension's aggregate result.
pub async fn summarize(
    model: &dyn CompletionModel,
    params: &CompletionParams,
    dimension: &Dimension,
    score: u8,
    justifications: &[String],
    log: &RunLog,
) -> SummaryResult {
    let observations = Observations::select(justifications, dimension.max_summary_justifications);
    let prompt = dimension.summary_prompt(score, &observations.as_bullets());

    let failure = match model.complete(&prompt, params).await {
        Ok(raw) => {
            let cleaned = strip_code_fences(&raw);
            log.line(format!("{} summary raw response:\n{}", dimension.label, cleaned))
                .await;

            match parse_summary_reply(&cleaned) {
                Ok(summary) => return summary,
                Err(e) => format!("Unexpected JSON shape for {} summary: {}", dimension.label, e),
            }
        }
        Err(e) => e.to_string(),
    };

    warn!("Error summarizing {} insights: {}", dimension.label, failure);
    log.line(format!(
        "{} summary fell back to deterministic text: {}",
        dimension.label, failure
    ))
    .await;
    fallback_summary(dimension, score, &observations)
}

fn fallback_summary(dimension: &Dimension, score: u8, observations: &Observations<'_>) -> SummaryResult {
    SummaryResult {
        overall_justification: format!(
            "{} score is {}/100. Observations: {}{}",
            dimension.label,
            score,
            observations.included.join(" | "),
            observations.omitted_note
        ),
        recommendations: Vec::new(),
    }
}
