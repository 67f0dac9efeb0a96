//! Chunk score aggregation.
//!
//! Scores every chunk of a document one after another, records each
//! outcome in the run log, and reduces the successful scores to a single
//! rounded mean. A failing chunk is logged and left out; it never aborts
//! the remaining chunks.

use super::dimension::Dimension;
use super::scoring::{score_chunk, ScoredChunk};
use crate::error::ScoreError;
use crate::llm::{CompletionModel, CompletionParams};
use crate::models::{AggregateResult, ChunkScore};
use crate::runlog::RunLog;
use async_trait::async_trait;
use tracing::{debug, warn};

/// Something that can score a single chunk.
#[async_trait]
pub trait ChunkScorer: Send + Sync {
    /// Phase name used in run log records.
    fn phase(&self) -> &str;

    async fn score(&self, chunk: &str) -> Result<ScoredChunk, ScoreError>;
}

/// Scores chunks by asking the model with a dimension's prompt.
pub struct ModelScorer<'a> {
    pub model: &'a dyn CompletionModel,
    pub params: &'a CompletionParams,
    pub dimension: &'a Dimension,
}

#[async_trait]
impl<'a> ChunkScorer for ModelScorer<'a> {
    fn phase(&self) -> &str {
        self.dimension.name
    }

    async fn score(&self, chunk: &str) -> Result<ScoredChunk, ScoreError> {
        score_chunk(self.model, self.params, self.dimension, chunk).await
    }
}

/// Score `chunks` in order and aggregate the successful results.
pub async fn aggregate(
    chunks: &[String],
    scorer: &dyn ChunkScorer,
    log: &RunLog,
) -> AggregateResult {
    let mut results: Vec<ChunkScore> = Vec::with_capacity(chunks.len());

    for (index, chunk) in chunks.iter().enumerate() {
        match scorer.score(chunk).await {
            Ok(scored) => {
                debug!(
                    "{} chunk {} scored {}",
                    scorer.phase(),
                    index + 1,
                    scored.parsed.score
                );
                log.chunk(scorer.phase(), index, chunk, &scored.raw, Some(&scored.parsed))
                    .await;
                results.push(scored.parsed);
            }
            Err(e) => {
                let message = e.to_string();
                log.chunk(
                    scorer.phase(),
                    index,
                    chunk,
                    &format!("Error: {}", message),
                    None,
                )
                .await;
                warn!("{} chunk {} error: {}", scorer.phase(), index + 1, message);
            }
        }
    }

    AggregateResult {
        score: mean_score(&results),
        chunks_total: chunks.len(),
        chunks_failed: chunks.len() - results.len(),
        justifications: results.into_iter().map(|r| r.justification).collect(),
    }
}

/// Rounded arithmetic mean of chunk scores, 0 for an empty slice.
pub fn mean_score(results: &[ChunkScore]) -> u8 {
    if results.is_empty() {
        return 0;
    }
    let sum: u32 = results.iter().map(|r| u32::from(r.score)).sum();
    let mean = f64::from(sum) / results.len() as f64;
    mean.round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::models::RunId;
    use crate::runlog::RunLogger;
    use tempfile::TempDir;

    /// Scores each chunk by parsing it as `"<score>|<justification>"`;
    /// chunks starting with `fail` return a model error.
    struct FakeScorer;

    #[async_trait]
    impl ChunkScorer for FakeScorer {
        fn phase(&self) -> &str {
            "trust"
        }

        async fn score(&self, chunk: &str) -> Result<ScoredChunk, ScoreError> {
            if chunk.starts_with("fail") {
                return Err(ModelError::Timeout(30).into());
            }
            let (score, justification) = chunk.split_once('|').unwrap();
            Ok(ScoredChunk {
                raw: chunk.to_string(),
                parsed: ChunkScore {
                    score: score.parse().unwrap(),
                    justification: justification.to_string(),
                },
            })
        }
    }

    fn test_log(temp: &TempDir) -> RunLog {
        RunLogger::new(temp.path(), 2000).for_run(RunId::parse("agg_run").unwrap())
    }

    fn chunks(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_failed_middle_chunk_is_skipped() {
        let temp = TempDir::new().unwrap();
        let log = test_log(&temp);

        let result = aggregate(&chunks(&["70|first", "fail", "81|third"]), &FakeScorer, &log).await;

        // (70 + 81) / 2 = 75.5 rounds up
        assert_eq!(result.score, 76);
        assert_eq!(result.justifications, vec!["first", "third"]);
        assert_eq!(result.chunks_total, 3);
        assert_eq!(result.chunks_failed, 1);
    }

    #[tokio::test]
    async fn test_all_failed_scores_zero() {
        let temp = TempDir::new().unwrap();
        let log = test_log(&temp);

        let result = aggregate(&chunks(&["fail a", "fail b", "fail c"]), &FakeScorer, &log).await;

        assert_eq!(result.score, 0);
        assert!(result.justifications.is_empty());
        assert_eq!(result.chunks_failed, 3);
    }

    #[tokio::test]
    async fn test_no_chunks() {
        let temp = TempDir::new().unwrap();
        let log = test_log(&temp);

        let result = aggregate(&[], &FakeScorer, &log).await;
        assert_eq!(result, AggregateResult::default());
    }

    #[tokio::test]
    async fn test_every_chunk_is_logged_in_order() {
        let temp = TempDir::new().unwrap();
        let log = test_log(&temp);

        aggregate(&chunks(&["10|a", "fail", "30|c"]), &FakeScorer, &log).await;

        let content = RunLogger::new(temp.path(), 2000)
            .read_log(log.run_id())
            .await
            .unwrap()
            .unwrap();
        let first = content.find("TRUST Chunk 1").unwrap();
        let second = content.find("TRUST Chunk 2").unwrap();
        let third = content.find("TRUST Chunk 3").unwrap();
        assert!(first < second && second < third);
        assert!(content.contains("Raw LLM response:\nError: Request timed out after 30s"));
        assert!(content.contains("Parsed result: score=30, justification=\"c\""));
    }

    #[tokio::test]
    async fn test_model_scorer_uses_dimension_prompt() {
        use crate::config::ChunkingConfig;
        use crate::llm::testing::{params, ScriptedModel};

        let temp = TempDir::new().unwrap();
        let log = test_log(&temp);
        let model = ScriptedModel::new(|prompt| {
            if prompt.contains("second") {
                Ok("not json".to_string())
            } else {
                Ok(r#"{"score": 40, "justification": "fine"}"#.to_string())
            }
        });
        let dim = Dimension::growth(&ChunkingConfig::default());
        let params = params();
        let scorer = ModelScorer {
            model: &model,
            params: &params,
            dimension: &dim,
        };

        let result = aggregate(&chunks(&["first.", "second.", "third."]), &scorer, &log).await;

        assert_eq!(model.calls(), 3);
        assert_eq!(result.score, 40);
        assert_eq!(result.justifications.len(), 2);
        assert_eq!(scorer.phase(), "growth");
    }

    #[test]
    fn test_mean_score_rounding() {
        let scores = |values: &[u8]| -> Vec<ChunkScore> {
            values
                .iter()
                .map(|&score| ChunkScore {
                    score,
                    justification: String::new(),
                })
                .collect()
        };
        assert_eq!(mean_score(&scores(&[])), 0);
        assert_eq!(mean_score(&scores(&[100])), 100);
        assert_eq!(mean_score(&scores(&[1, 2])), 2);
        assert_eq!(mean_score(&scores(&[10, 10, 11])), 10);
        assert_eq!(mean_score(&scores(&[100, 100, 99])), 100);
    }
}
