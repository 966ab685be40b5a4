//! Markdown and JSON report generation.
//!
//! This module renders a [`LoadReport`] for humans (Markdown) or tools (JSON).

use super::{LoadReport, ReportEntry, ReportMetadata};
use crate::cli::ReportFormat;
use crate::models::{Channel, LoadSummary};
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

/// Render a report in the requested format.
pub fn render(report: &LoadReport, format: ReportFormat, include_resources: bool) -> Result<String> {
    match format {
        ReportFormat::Markdown => Ok(generate_markdown_report(report, include_resources)),
        ReportFormat::Json => generate_json_report(report),
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &LoadReport, include_resources: bool) -> String {
    let mut output = String::new();

    output.push_str("# Preload Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_summary_section(&report.summary));
    output.push_str(&generate_failures_section(report));

    if include_resources {
        output.push_str(&generate_timeline_section(&report.entries));
    }

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Mode:** {}\n", metadata.mode));
    section.push_str(&format!(
        "- **Duration:** {:.2}s\n",
        metadata.duration_seconds
    ));
    section.push_str(&format!(
        "- **Bytes Loaded:** {}\n",
        metadata.bytes_loaded
    ));
    if let Some(ref last) = metadata.completed_by {
        section.push_str(&format!("- **Completed By:** `{}`\n", last));
    }
    section.push('\n');

    section
}

/// Generate the summary section.
fn generate_summary_section(summary: &LoadSummary) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str("| ✅ Loaded | ❌ Failed | **Total** |\n");
    section.push_str("|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | **{}** |\n\n",
        summary.loaded,
        summary.failed.len(),
        summary.total
    ));

    section
}

/// Generate the failures section.
fn generate_failures_section(report: &LoadReport) -> String {
    let mut section = String::new();

    section.push_str("## Failures\n\n");

    let failures: Vec<&ReportEntry> = report.failures().collect();
    if failures.is_empty() {
        section.push_str("Every resource loaded.\n\n");
        return section;
    }

    section.push_str("| Resource | Reason |\n");
    section.push_str("|:---|:---|\n");
    for entry in failures {
        section.push_str(&format!(
            "| `{}` | {} |\n",
            entry.identifier,
            entry.error.as_deref().unwrap_or("unknown")
        ));
    }
    section.push('\n');

    section
}

/// Generate the per-item timeline.
fn generate_timeline_section(entries: &[ReportEntry]) -> String {
    if entries.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Resources\n\n");
    section.push_str("| # | Status | Resource | Progress | Kind | Bytes |\n");
    section.push_str("|:---:|:---:|:---|:---:|:---:|---:|\n");

    for entry in entries {
        let status = match entry.channel {
            Channel::Progress => "✅",
            Channel::Error => "❌",
            Channel::Complete => "🏁",
        };
        let progress = entry
            .percent_complete
            .map(|p| format!("{:.0}%", p * 100.0))
            .unwrap_or_else(|| "-".to_string());
        let kind = entry
            .kind
            .map(|k| k.to_string())
            .unwrap_or_else(|| "-".to_string());
        let bytes = entry
            .bytes
            .map(|b| b.to_string())
            .unwrap_or_else(|| "-".to_string());

        section.push_str(&format!(
            "| {} | {} | `{}` | {} | {} | {} |\n",
            entry.order, status, entry.identifier, progress, kind, bytes
        ));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    format!("---\n\n*Report generated by preloader v{}*\n", env!("CARGO_PKG_VERSION"))
}

/// Generate a JSON report.
pub fn generate_json_report(report: &LoadReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write rendered report content to a file.
pub fn save_report(path: &Path, content: &str) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create report file: {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write report to {}", path.display()))?;

    Ok(())
}
