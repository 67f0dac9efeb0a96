//! End-to-end analysis runs.
//!
//! A run validates the request, extracts document text, fetches the
//! ticker's web sources, and then scores the trust and growth dimensions.
//! Every step is written to the run's audit log.

use crate::analysis::{run_dimension, standard_dimensions, Dimension};
use crate::config::Config;
use crate::error::AnalysisError;
use crate::llm::{CompletionModel, CompletionParams};
use crate::models::{AnalysisResponse, DimensionOutcome, RunId};
use crate::runlog::{RunLog, RunLogger};
use crate::sources::{ContentFetcher, DocumentExtractor};
use std::sync::Arc;
use tracing::{info, warn};

/// One uploaded document.
#[derive(Debug, Clone)]
pub struct Document {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Caller input for a run.
#[derive(Debug, Clone, Default)]
pub struct AnalysisRequest {
    pub ticker: String,
    pub documents: Vec<Document>,
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct CompletedRun {
    pub response: AnalysisResponse,
    pub trust: DimensionOutcome,
    pub growth: DimensionOutcome,
    pub documents: usize,
    pub sources_fetched: usize,
    pub sources_total: usize,
}

/// A failed run, still carrying its id so the audit log can be found.
#[derive(Debug)]
pub struct RunFailure {
    pub run_id: RunId,
    pub error: AnalysisError,
}

/// Runs analyses against a fixed set of collaborators.
pub struct Analyzer {
    model: Arc<dyn CompletionModel>,
    extractor: Arc<dyn DocumentExtractor>,
    fetcher: Arc<dyn ContentFetcher>,
    logger: RunLogger,
    params: CompletionParams,
    trust: Dimension,
    growth: Dimension,
    config: Config,
}

impl Analyzer {
    pub fn new(
        config: &Config,
        model: Arc<dyn CompletionModel>,
        extractor: Arc<dyn DocumentExtractor>,
        fetcher: Arc<dyn ContentFetcher>,
    ) -> Self {
        let [trust, growth] = standard_dimensions(&config.chunking);
        Self {
            model,
            extractor,
            fetcher,
            logger: RunLogger::new(&config.logging.log_dir, config.chunking.max_log_chunk_chars),
            params: CompletionParams {
                model: config.model.name.clone(),
                temperature: config.model.temperature,
            },
            trust,
            growth,
            config: config.clone(),
        }
    }

    pub fn logger(&self) -> &RunLogger {
        &self.logger
    }

    pub fn model_name(&self) -> &str {
        &self.params.model
    }

    /// Run a full analysis under `run_id`.
    pub async fn analyze(
        &self,
        run_id: RunId,
        request: AnalysisRequest,
    ) -> Result<CompletedRun, RunFailure> {
        let log = self.logger.for_run(run_id.clone());

        match self.run(&log, request).await {
            Ok(completed) => Ok(completed),
            Err(error) => {
                log.line(format!("Analysis failed with error: {}", error)).await;
                warn!("Run {} failed: {}", run_id, error);
                Err(RunFailure { run_id, error })
            }
        }
    }

    async fn run(&self, log: &RunLog, request: AnalysisRequest) -> Result<CompletedRun, AnalysisError> {
        let ticker = request.ticker.trim().to_uppercase();
        if ticker.is_empty() || request.documents.is_empty() {
            log.line("Invalid request: missing ticker or PDF files.").await;
            return Err(AnalysisError::BadRequest(
                "ticker + at least 1 PDF file required".to_string(),
            ));
        }
        if request.documents.len() > self.config.server.max_files {
            log.line(format!(
                "Invalid request: {} files exceeds limit of {}",
                request.documents.len(),
                self.config.server.max_files
            ))
            .await;
            return Err(AnalysisError::BadRequest(format!(
                "at most {} PDF files allowed",
                self.config.server.max_files
            )));
        }

        info!("Starting analysis {} for {}", log.run_id(), ticker);
        log.line(format!("Starting analysis for ticker={}", ticker)).await;

        let urls = match self.config.urls_for(&ticker) {
            Some(urls) => urls,
            None => {
                log.line(format!("Unsupported ticker: {}", ticker)).await;
                return Err(AnalysisError::UnsupportedTicker(ticker));
            }
        };

        let documents = request.documents.len();
        let report_text = self.extract_documents(log, &request.documents).await?;
        let (web_text, sources_fetched) = self.fetch_sources(log, urls).await;

        let model = self.model.as_ref();
        let (trust, growth) = futures::future::join(
            run_dimension(model, &self.params, &self.trust, &report_text, log),
            run_dimension(model, &self.params, &self.growth, &web_text, log),
        )
        .await;

        let response = AnalysisResponse::from_outcomes(&ticker, log.run_id().clone(), &trust, &growth);
        log.line(format!("Summary: {}", response.summary)).await;
        log.line("Analysis completed successfully").await;
        info!("{}", response.summary);

        Ok(CompletedRun {
            response,
            trust,
            growth,
            documents,
            sources_fetched,
            sources_total: urls.len(),
        })
    }

    /// Extract every document; the first failure aborts the run.
    async fn extract_documents(
        &self,
        log: &RunLog,
        documents: &[Document],
    ) -> Result<String, AnalysisError> {
        log.line(format!(
            "Beginning PDF extraction for {} file(s)",
            documents.len()
        ))
        .await;

        let mut texts = Vec::with_capacity(documents.len());
        for (i, document) in documents.iter().enumerate() {
            match self.extractor.extract_text(&document.bytes).await {
                Ok(text) => {
                    log.line(format!(
                        "Extracted PDF file {} ({}): {} chars",
                        i + 1,
                        document.name,
                        text.chars().count()
                    ))
                    .await;
                    texts.push(text);
                }
                Err(e) => {
                    log.line(format!("Error extracting PDF file {}: {}", i + 1, e))
                        .await;
                    return Err(e.into());
                }
            }
        }

        let combined = texts.join("\n\n");
        log.line(format!(
            "Combined PDF text length: {} chars",
            combined.chars().count()
        ))
        .await;
        Ok(combined)
    }

    /// Fetch every URL; failures and empty pages are skipped.
    async fn fetch_sources(&self, log: &RunLog, urls: &[String]) -> (String, usize) {
        log.line(format!("Beginning scraping of {} URL(s)", urls.len()))
            .await;

        let mut texts = Vec::with_capacity(urls.len());
        for (i, url) in urls.iter().enumerate() {
            log.line(format!("Scraping URL {}: {}", i + 1, url)).await;
            match self.fetcher.fetch_content(url).await {
                Ok(text) => {
                    log.line(format!(
                        "Scraped URL {}: {} chars",
                        i + 1,
                        text.chars().count()
                    ))
                    .await;
                    if !text.is_empty() {
                        texts.push(text);
                    }
                }
                Err(e) => {
                    warn!("Scrape of {} failed: {}", url, e);
                    log.line(format!("Error scraping URL {}: {}", i + 1, e)).await;
                }
            }
        }

        let fetched = texts.len();
        let combined = texts.join("\n\n");
        log.line(format!(
            "Combined scraped text length: {} chars",
            combined.chars().count()
        ))
        .await;
        (combined, fetched)
    }
}
