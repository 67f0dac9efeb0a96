//! TickerLens - LLM-powered trust and growth scoring
//!
//! Scores a listed company along two dimensions: Trust (transparency of
//! its annual reports) and Growth (differentiation of its public web
//! content). Runs as an HTTP API or as a one-shot CLI analysis.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (config, model client, analysis failure, etc.)

mod analysis;
mod cli;
mod config;
mod error;
mod llm;
mod models;
mod orchestrator;
mod report;
mod runlog;
mod server;
mod sources;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use cli::{Args, Command, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use indicatif::{ProgressBar, ProgressStyle};
use llm::HttpCompletionModel;
use models::{Report, ReportMetadata, RunId};
use orchestrator::{AnalysisRequest, Analyzer, Document};
use sources::{CachedFetcher, FirecrawlFetcher, PdfExtractor};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Secrets may live in a local .env file
    dotenvy::dotenv().ok();

    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("TickerLens v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args).await {
        error!("TickerLens failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .tickerlens.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize the model, tickers, and log directory.");
    println!("   API keys are read from OPENAI_API_KEY and FIRECRAWL_API_KEY.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

async fn run(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let analyzer = Arc::new(build_analyzer(&config)?);

    match args.command {
        Some(Command::Serve { bind }) => {
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            let state = server::AppState { analyzer };
            let router = server::build_router(state, &config.server)?;

            println!("🚀 TickerLens API listening on {}", bind);
            println!("   Model: {} ({:?})", config.model.name, config.model.provider);
            println!("   Run logs: {}", config.logging.log_dir.display());
            server::serve(router, &bind).await
        }
        Some(Command::Analyze {
            ticker,
            pdfs,
            output,
            format,
        }) => run_analyze(&analyzer, ticker, &pdfs, &output, format).await,
        None => bail!("A subcommand is required (serve or analyze)"),
    }
}

/// Wire the production collaborators.
fn build_analyzer(config: &Config) -> Result<Analyzer> {
    let model = HttpCompletionModel::from_config(&config.model, config.model_api_key())
        .context("Failed to create model client")?;

    let scraper_key = config.scraper_api_key();
    if scraper_key.is_none() {
        warn!(
            "{} is not set; web sources will likely fail to fetch",
            config.scraper.api_key_env
        );
    }
    let scraper = FirecrawlFetcher::from_config(&config.scraper, scraper_key)
        .context("Failed to create scrape client")?;
    let fetcher = CachedFetcher::new(
        scraper,
        Duration::from_secs(config.scraper.cache_ttl_seconds),
    );

    Ok(Analyzer::new(
        config,
        Arc::new(model),
        Arc::new(PdfExtractor),
        Arc::new(fetcher),
    ))
}

/// Analyze local PDFs for one ticker and write a report.
async fn run_analyze(
    analyzer: &Analyzer,
    ticker: String,
    pdfs: &[PathBuf],
    output: &Path,
    format: OutputFormat,
) -> Result<()> {
    let start_time = Instant::now();

    let mut documents = Vec::with_capacity(pdfs.len());
    for path in pdfs {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        documents.push(Document {
            name: path.display().to_string(),
            bytes,
        });
    }

    let run_id = RunId::generate();
    println!("🔬 Analyzing {} ({} document(s))", ticker.trim().to_uppercase(), documents.len());
    println!("   Run ID: {}", run_id);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("Extracting, fetching, and scoring...");
    spinner.enable_steady_tick(Duration::from_millis(120));

    let result = analyzer
        .analyze(run_id, AnalysisRequest { ticker, documents })
        .await;
    spinner.finish_and_clear();

    let run = match result {
        Ok(run) => run,
        Err(failure) => {
            let log_path = analyzer
                .logger()
                .log_dir()
                .join(format!("{}.log", failure.run_id));
            bail!(
                "{} (run log: {})",
                failure.error,
                log_path.display()
            );
        }
    };

    println!("\n📝 Generating report...");

    let duration = start_time.elapsed().as_secs_f64();
    let report = Report {
        metadata: ReportMetadata {
            ticker: run.response.ticker.clone(),
            run_id: run.response.run_id.clone(),
            analysis_date: Utc::now(),
            model_used: analyzer.model_name().to_string(),
            documents: run.documents,
            sources_fetched: run.sources_fetched,
            sources_total: run.sources_total,
            duration_seconds: duration,
        },
        summary: run.response.summary.clone(),
        dimensions: vec![run.trust, run.growth],
    };

    let content = match format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    std::fs::write(output, &content)
        .with_context(|| format!("Failed to write report to {}", output.display()))?;

    println!("\n📊 {}", report.summary);
    for dimension in &report.dimensions {
        println!(
            "   {}: {}/100 ({} of {} chunks scored)",
            dimension.label,
            dimension.aggregate.score,
            dimension.aggregate.chunks_succeeded(),
            dimension.aggregate.chunks_total
        );
    }
    println!(
        "   Web sources: {} of {} fetched",
        report.metadata.sources_fetched, report.metadata.sources_total
    );
    println!("   Duration: {:.1}s", duration);
    println!("\n✅ Analysis complete! Report saved to: {}", output.display());

    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
