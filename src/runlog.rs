//! Append-only per-run audit log.
//!
//! Every run writes `<log_dir>/<runId>.log`. Each entry is written with a
//! single append so entries from concurrently running dimensions never
//! interleave mid-entry. Write failures only produce a warning; the audit
//! log must never abort an analysis.

use crate::models::{ChunkScore, RunId};
use chrono::{SecondsFormat, Utc};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::warn;

/// Shared writer for run log files.
#[derive(Debug, Clone)]
pub struct RunLogger {
    log_dir: PathBuf,
    max_chunk_chars: usize,
}

impl RunLogger {
    pub fn new(log_dir: impl Into<PathBuf>, max_chunk_chars: usize) -> Self {
        Self {
            log_dir: log_dir.into(),
            max_chunk_chars,
        }
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    fn path_for(&self, run_id: &RunId) -> PathBuf {
        self.log_dir.join(format!("{}.log", run_id))
    }

    /// Bind this logger to one run.
    pub fn for_run(&self, run_id: RunId) -> RunLog {
        RunLog {
            logger: self.clone(),
            run_id,
        }
    }

    /// Append a timestamped line.
    pub async fn append_line(&self, run_id: &RunId, message: &str) {
        let entry = format!("[{}] {}\n", timestamp(), message);
        if let Err(e) = self.append(run_id, &entry).await {
            warn!("Failed to write log message: {}", e);
        }
    }

    /// Append the full record of one chunk scoring attempt.
    ///
    /// The chunk text is cut to the configured bound; its real length is
    /// always recorded.
    pub async fn append_chunk_record(
        &self,
        run_id: &RunId,
        phase: &str,
        chunk_index: usize,
        chunk_text: &str,
        raw_response: &str,
        parsed: Option<&ChunkScore>,
    ) {
        let entry = format_chunk_record(
            phase,
            chunk_index,
            chunk_text,
            raw_response,
            parsed,
            self.max_chunk_chars,
        );
        if let Err(e) = self.append(run_id, &entry).await {
            warn!("Failed to write chunk log: {}", e);
        }
    }

    /// Read a run's log, `Ok(None)` if it does not exist.
    pub async fn read_log(&self, run_id: &RunId) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path_for(run_id)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn append(&self, run_id: &RunId, entry: &str) -> io::Result<()> {
        fs::create_dir_all(&self.log_dir).await?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path_for(run_id))
            .await?;
        file.write_all(entry.as_bytes()).await?;
        file.flush().await
    }
}

/// A [`RunLogger`] bound to one run id.
#[derive(Debug, Clone)]
pub struct RunLog {
    logger: RunLogger,
    run_id: RunId,
}

impl RunLog {
    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub async fn line(&self, message: impl AsRef<str>) {
        self.logger.append_line(&self.run_id, message.as_ref()).await;
    }

    pub async fn chunk(
        &self,
        phase: &str,
        chunk_index: usize,
        chunk_text: &str,
        raw_response: &str,
        parsed: Option<&ChunkScore>,
    ) {
        self.logger
            .append_chunk_record(&self.run_id, phase, chunk_index, chunk_text, raw_response, parsed)
            .await;
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn format_chunk_record(
    phase: &str,
    chunk_index: usize,
    chunk_text: &str,
    raw_response: &str,
    parsed: Option<&ChunkScore>,
    max_chunk_chars: usize,
) -> String {
    let total_chars = chunk_text.chars().count();
    let displayed = if total_chars > max_chunk_chars {
        let head: String = chunk_text.chars().take(max_chunk_chars).collect();
        format!("{}...[truncated]", head)
    } else {
        chunk_text.to_string()
    };

    let parsed_info = match parsed {
        Some(result) => format!(
            "Parsed result: score={}, justification=\"{}\"",
            result.score, result.justification
        ),
        None => "Parsed result: <none or parse error>".to_string(),
    };

    [
        format!(
            "[{}] === {} Chunk {} ===",
            timestamp(),
            phase.to_uppercase(),
            chunk_index + 1
        ),
        format!(
            "Chunk text length: {} chars (showing up to {}):\n{}",
            total_chars, max_chunk_chars, displayed
        ),
        format!("Raw LLM response:\n{}", raw_response),
        parsed_info,
        String::new(),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn run_id() -> RunId {
        RunId::parse("2024-05-01T10-22-03-000Z_test").unwrap()
    }

    #[tokio::test]
    async fn test_append_line_creates_dir_and_file() {
        let temp = TempDir::new().unwrap();
        let logger = RunLogger::new(temp.path().join("logs"), 2000);

        logger.append_line(&run_id(), "Starting analysis").await;
        logger.append_line(&run_id(), "Done").await;

        let content = logger.read_log(&run_id()).await.unwrap().unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('['));
        assert!(lines[0].ends_with("] Starting analysis"));
        assert!(lines[1].ends_with("] Done"));
    }

    #[tokio::test]
    async fn test_chunk_record_truncates_text() {
        let temp = TempDir::new().unwrap();
        let logger = RunLogger::new(temp.path(), 5);
        let parsed = ChunkScore {
            score: 80,
            justification: "ok".to_string(),
        };

        logger
            .append_chunk_record(&run_id(), "trust", 0, "abcdefghij", "{\"score\":80}", Some(&parsed))
            .await;

        let content = logger.read_log(&run_id()).await.unwrap().unwrap();
        assert!(content.contains("=== TRUST Chunk 1 ==="));
        assert!(content.contains("Chunk text length: 10 chars (showing up to 5):\nabcde...[truncated]"));
        assert!(content.contains("Raw LLM response:\n{\"score\":80}"));
        assert!(content.contains("Parsed result: score=80, justification=\"ok\""));
    }

    #[tokio::test]
    async fn test_chunk_record_without_parse() {
        let temp = TempDir::new().unwrap();
        let log = RunLogger::new(temp.path(), 2000).for_run(run_id());

        log.chunk("growth", 2, "short", "Error: timed out", None).await;

        let content = RunLogger::new(temp.path(), 2000)
            .read_log(&run_id())
            .await
            .unwrap()
            .unwrap();
        assert!(content.contains("=== GROWTH Chunk 3 ==="));
        assert!(content.contains("Chunk text length: 5 chars (showing up to 2000):\nshort\n"));
        assert!(content.contains("Parsed result: <none or parse error>"));
    }

    #[tokio::test]
    async fn test_read_missing_log() {
        let temp = TempDir::new().unwrap();
        let logger = RunLogger::new(temp.path(), 2000);
        assert!(logger.read_log(&run_id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unwritable_dir_is_swallowed() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();

        // log_dir is a regular file, so every write fails
        let logger = RunLogger::new(&blocker, 2000);
        logger.append_line(&run_id(), "ignored").await;
        logger
            .append_chunk_record(&run_id(), "trust", 0, "x", "y", None)
            .await;
    }

    #[tokio::test]
    async fn test_concurrent_entries_stay_whole() {
        let temp = TempDir::new().unwrap();
        let logger = RunLogger::new(temp.path(), 2000);

        let writes = (0..20).map(|i| {
            let logger = logger.clone();
            async move {
                let phase = if i % 2 == 0 { "trust" } else { "growth" };
                logger
                    .append_chunk_record(&run_id(), phase, i, "text", "raw", None)
                    .await;
            }
        });
        futures::future::join_all(writes).await;

        let content = logger.read_log(&run_id()).await.unwrap().unwrap();
        assert_eq!(content.matches("=== ").count(), 20);
        // every header is followed by its own body
        for block in content.split("\n[").skip(1) {
            assert!(block.contains("Chunk text length: 4 chars"));
            assert!(block.contains("Parsed result: <none or parse error>"));
        }
    }
}
