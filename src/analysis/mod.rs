//! Chunked scoring pipeline.
//!
//! One dimension runs as: split text into chunks, score each chunk,
//! aggregate the scores, then summarize the result.

pub mod aggregator;
pub mod chunker;
pub mod dimension;
pub mod scoring;
pub mod summarizer;

pub use aggregator::{aggregate, ChunkScorer, ModelScorer};
pub use chunker::split_into_chunks;
pub use dimension::{standard_dimensions, Dimension};
pub use summarizer::summarize;

use crate::llm::{CompletionModel, CompletionParams};
use crate::models::DimensionOutcome;
use crate::runlog::RunLog;

/// Run the full pipeline for one dimension over `text`.
pub async fn run_dimension(
    model: &dyn CompletionModel,
    params: &CompletionParams,
    dimension: &Dimension,
    text: &str,
    log: &RunLog,
) -> DimensionOutcome {
    let chunks = split_into_chunks(text, dimension.max_chunk_chars);
    log.line(format!(
        "Beginning {} scoring ({}): {} chunk(s)",
        dimension.label,
        dimension.quality,
        chunks.len()
    ))
    .await;

    let scorer = ModelScorer {
        model,
        params,
        dimension,
    };
    let aggregate = aggregate(&chunks, &scorer, log).await;
    log.line(format!(
        "Completed {} scoring: score={} ({} of {} chunks succeeded)",
        dimension.label,
        aggregate.score,
        aggregate.chunks_succeeded(),
        aggregate.chunks_total
    ))
    .await;

    log.line(format!("Beginning {} summarization", dimension.label))
        .await;
    let summary = summarize(
        model,
        params,
        dimension,
        aggregate.score,
        &aggregate.justifications,
        log,
    )
    .await;

    DimensionOutcome {
        name: dimension.name.to_string(),
        label: dimension.label.to_string(),
        aggregate,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChunkingConfig;
    use crate::llm::testing::{params, ScriptedModel};
    use crate::models::RunId;
    use crate::runlog::RunLogger;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_run_dimension_end_to_end() {
        let temp = TempDir::new().unwrap();
        let log = RunLogger::new(temp.path(), 2000).for_run(RunId::parse("dim_run").unwrap());
        let model = ScriptedModel::new(|prompt| {
            if prompt.contains("overallJustification") {
                Ok(r#"{"overallJustification": "Solid.", "recommendations": ["a", "b"]}"#.to_string())
            } else {
                Ok(r#"{"score": 90, "justification": "candid"}"#.to_string())
            }
        });
        let chunking = ChunkingConfig {
            max_chunk_chars: 20,
            ..ChunkingConfig::default()
        };
        let dim = Dimension::trust(&chunking);

        let outcome = run_dimension(
            &model,
            &params(),
            &dim,
            "Sentence one. Sentence two. Sentence three.",
            &log,
        )
        .await;

        // three chunks plus one summary call
        assert_eq!(model.calls(), 4);
        assert_eq!(outcome.name, "trust");
        assert_eq!(outcome.aggregate.score, 90);
        assert_eq!(outcome.aggregate.justifications.len(), 3);
        assert_eq!(outcome.summary.overall_justification, "Solid.");
        assert_eq!(outcome.summary.recommendations, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_empty_text_still_summarizes() {
        let temp = TempDir::new().unwrap();
        let log = RunLogger::new(temp.path(), 2000).for_run(RunId::parse("dim_empty").unwrap());
        let model = ScriptedModel::constant("garbage");
        let dim = Dimension::growth(&ChunkingConfig::default());

        let outcome = run_dimension(&model, &params(), &dim, "", &log).await;

        assert_eq!(model.calls(), 1);
        assert_eq!(outcome.aggregate.score, 0);
        assert!(outcome.summary.overall_justification.contains("0/100"));
    }
}
