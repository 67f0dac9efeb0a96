//! Markdown report generation.
//!
//! This module renders a finished analysis run as a Markdown or JSON
//! report for the CLI.

use crate::models::{DimensionOutcome, Report, ReportMetadata};
use anyhow::Result;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str(&format!("# TickerLens Report: {}\n\n", report.metadata.ticker));

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_table_of_contents(report));
    output.push_str(&generate_summary_section(&report.summary, &report.dimensions));

    for dimension in &report.dimensions {
        output.push_str(&generate_dimension_section(dimension));
    }

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Ticker:** {}\n", metadata.ticker));
    section.push_str(&format!("- **Run ID:** `{}`\n", metadata.run_id));
    section.push_str(&format!(
        "- **Analysis Date:** {}\n",
        metadata.analysis_date.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Model Used:** `{}`\n", metadata.model_used));
    section.push_str(&format!("- **Documents:** {}\n", metadata.documents));
    section.push_str(&format!(
        "- **Web Sources:** {} of {} fetched\n",
        metadata.sources_fetched, metadata.sources_total
    ));
    section.push_str(&format!(
        "- **Analysis Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the table of contents.
fn generate_table_of_contents(report: &Report) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    toc.push_str("- [Summary](#summary)\n");
    for dimension in &report.dimensions {
        toc.push_str(&format!(
            "- [{}](#{})\n",
            dimension.label,
            dimension.label.to_lowercase()
        ));
    }
    toc.push('\n');

    toc
}

/// Generate the score overview.
fn generate_summary_section(summary: &str, dimensions: &[DimensionOutcome]) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str(&format!("**{}**\n\n", summary));

    section.push_str("| Dimension | Score | Chunks Scored |\n");
    section.push_str("|:---|:---:|:---:|\n");
    for dimension in dimensions {
        section.push_str(&format!(
            "| {} | {} {}/100 | {}/{} |\n",
            dimension.label,
            score_badge(dimension.aggregate.score),
            dimension.aggregate.score,
            dimension.aggregate.chunks_succeeded(),
            dimension.aggregate.chunks_total
        ));
    }
    section.push('\n');

    section
}

/// Generate the section for one dimension.
fn generate_dimension_section(dimension: &DimensionOutcome) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", dimension.label));
    section.push_str(&format!(
        "*Score: {}/100 | Chunks: {} | Failed: {}*\n\n",
        dimension.aggregate.score,
        dimension.aggregate.chunks_total,
        dimension.aggregate.chunks_failed
    ));

    if !dimension.summary.overall_justification.is_empty() {
        section.push_str(&format!(
            "**Justification:** {}\n\n",
            dimension.summary.overall_justification
        ));
    }

    if !dimension.summary.recommendations.is_empty() {
        section.push_str("### Recommendations\n\n");
        for (i, rec) in dimension.summary.recommendations.iter().enumerate() {
            section.push_str(&format!("{}. {}\n", i + 1, rec));
        }
        section.push('\n');
    }

    if !dimension.aggregate.justifications.is_empty() {
        section.push_str("<details>\n<summary>Chunk Observations</summary>\n\n");
        for (i, justification) in dimension.aggregate.justifications.iter().enumerate() {
            section.push_str(&format!("- Chunk {}: {}\n", i + 1, justification));
        }
        section.push_str("\n</details>\n\n");
    }

    section
}

fn score_badge(score: u8) -> &'static str {
    match score {
        70..=100 => "🟢",
        40..=69 => "🟡",
        _ => "🔴",
    }
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str("*Report generated by TickerLens*\n");

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AggregateResult, RunId, SummaryResult};
    use chrono::Utc;

    fn create_test_report() -> Report {
        let metadata = ReportMetadata {
            ticker: "VOLV-B".to_string(),
            run_id: RunId::parse("2024-05-01T10-22-03-000Z_abc").unwrap(),
            analysis_date: Utc::now(),
            model_used: "test-model".to_string(),
            documents: 2,
            sources_fetched: 2,
            sources_total: 3,
            duration_seconds: 12.5,
        };

        Report {
            metadata,
            summary: "For VOLV-B: Trust=72, Growth=35.".to_string(),
            dimensions: vec![
                DimensionOutcome {
                    name: "trust".to_string(),
                    label: "Trust".to_string(),
                    aggregate: AggregateResult {
                        score: 72,
                        justifications: vec!["discusses supply risk".to_string()],
                        chunks_total: 2,
                        chunks_failed: 1,
                    },
                    summary: SummaryResult {
                        overall_justification: "Fairly candid.".to_string(),
                        recommendations: vec!["Publish emissions data".to_string()],
                    },
                },
                DimensionOutcome {
                    name: "growth".to_string(),
                    label: "Growth".to_string(),
                    aggregate: AggregateResult::default(),
                    summary: SummaryResult {
                        overall_justification: String::new(),
                        recommendations: vec![],
                    },
                },
            ],
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("# TickerLens Report: VOLV-B"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("## Summary"));
        assert!(markdown.contains("**For VOLV-B: Trust=72, Growth=35.**"));
        assert!(markdown.contains("## Trust"));
        assert!(markdown.contains("## Growth"));
        assert!(markdown.contains("1. Publish emissions data"));
        assert!(markdown.contains("- Chunk 1: discusses supply risk"));
    }

    #[test]
    fn test_generate_metadata_section() {
        let report = create_test_report();
        let section = generate_metadata_section(&report.metadata);

        assert!(section.contains("`2024-05-01T10-22-03-000Z_abc`"));
        assert!(section.contains("test-model"));
        assert!(section.contains("2 of 3 fetched"));
        assert!(section.contains("12.5s"));
    }

    #[test]
    fn test_summary_table_rows() {
        let report = create_test_report();
        let section = generate_summary_section(&report.summary, &report.dimensions);

        assert!(section.contains("| Trust | 🟢 72/100 | 1/2 |"));
        assert!(section.contains("| Growth | 🔴 0/100 | 0/0 |"));
    }

    #[test]
    fn test_empty_dimension_has_no_recommendations() {
        let report = create_test_report();
        let section = generate_dimension_section(&report.dimensions[1]);

        assert!(section.starts_with("## Growth"));
        assert!(!section.contains("### Recommendations"));
        assert!(!section.contains("<details>"));
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report();
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"ticker\": \"VOLV-B\""));
        assert!(json.contains("\"dimensions\""));
        assert!(json.contains("\"overallJustification\""));
    }
}
