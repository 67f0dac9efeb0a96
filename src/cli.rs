//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::config::ModelProvider;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// TickerLens - LLM-powered trust and growth scoring for listed companies
///
/// Scores how transparent a company's annual reports are (Trust) and how
/// differentiated its public communications are (Growth).
///
/// Examples:
///   tickerlens serve
///   tickerlens serve --bind 127.0.0.1:8080
///   tickerlens analyze --ticker HM-B --pdf annual-report.pdf
///   tickerlens analyze --ticker VOLV-B --pdf a.pdf --pdf b.pdf --format json -o volvo.json
///   tickerlens --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .tickerlens.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Model backend (openai, ollama)
    #[arg(long, value_name = "PROVIDER", global = true)]
    pub provider: Option<ModelProvider>,

    /// Model to use for scoring and summaries
    #[arg(short, long, env = "TICKERLENS_MODEL", global = true)]
    pub model: Option<String>,

    /// Base URL of the model API
    #[arg(long, value_name = "URL", env = "TICKERLENS_MODEL_URL", global = true)]
    pub model_url: Option<String>,

    /// Temperature for LLM responses (0.0 - 1.0)
    #[arg(long, global = true)]
    pub temperature: Option<f32>,

    /// Model request timeout in seconds
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Maximum characters per scored chunk
    #[arg(long, value_name = "CHARS", global = true)]
    pub max_chunk_chars: Option<usize>,

    /// Directory for per-run audit logs
    #[arg(long, value_name = "DIR", global = true)]
    pub log_dir: Option<PathBuf>,

    /// How long scraped pages stay cached, in seconds
    #[arg(long, value_name = "SECS", global = true)]
    pub cache_ttl: Option<u64>,

    /// Generate a default .tickerlens.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP API
    Serve {
        /// Address to bind (overrides config)
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },

    /// Analyze local PDF files for one ticker and write a report
    Analyze {
        /// Ticker symbol, e.g. HM-B
        #[arg(short, long)]
        ticker: String,

        /// PDF file to analyze (repeatable)
        #[arg(long = "pdf", value_name = "FILE", required = true)]
        pdfs: Vec<PathBuf>,

        /// Output file path for the report
        #[arg(
            short,
            long,
            default_value = "tickerlens_report.md",
            value_name = "FILE"
        )]
        output: PathBuf,

        /// Output format (markdown, json)
        #[arg(long, default_value = "markdown", value_name = "FORMAT")]
        format: OutputFormat,
    },
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        let command = self
            .command
            .as_ref()
            .ok_or_else(|| "A subcommand is required (serve or analyze)".to_string())?;

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref url) = self.model_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Model URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=1.0).contains(&temperature) {
                return Err("Temperature must be between 0.0 and 1.0".to_string());
            }
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if self.max_chunk_chars == Some(0) {
            return Err("Max chunk chars must be at least 1".to_string());
        }

        if let Command::Analyze { ticker, pdfs, .. } = command {
            if ticker.trim().is_empty() {
                return Err("Ticker must not be empty".to_string());
            }
            for pdf in pdfs {
                if !pdf.is_file() {
                    return Err(format!("PDF file does not exist: {}", pdf.display()));
                }
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
