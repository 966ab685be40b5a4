//! Load run reports.
//!
//! A [`LoadReport`] is assembled from the notifications of one run (or the
//! positional results of a collect run) and rendered by [`generator`].

pub mod generator;

pub use generator::{generate_json_report, generate_markdown_report, render, save_report};

use crate::error::LoadFailure;
use crate::models::{Artifact, ArtifactKind, Channel, Identifier, LoadSummary, Notification};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Metadata about one load run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Delivery mode the run used.
    pub mode: String,
    /// Wall-clock duration of the run in seconds.
    pub duration_seconds: f64,
    /// Total payload bytes loaded.
    pub bytes_loaded: u64,
    /// Identifier whose settlement completed the run, if it completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_by: Option<Identifier>,
}

/// One settled item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEntry {
    /// Position in the report (settlement order for event runs, input order for collect runs).
    pub order: usize,
    /// Channel the item was reported on.
    pub channel: Channel,
    pub identifier: Identifier,
    /// Completion fraction at settlement; absent for collect runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_complete: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ArtifactKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The complete report of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadReport {
    pub metadata: ReportMetadata,
    pub summary: LoadSummary,
    pub entries: Vec<ReportEntry>,
}

impl LoadReport {
    /// Entries reported on the error channel.
    pub fn failures(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(|e| e.channel == Channel::Error)
    }
}

/// Accumulates entries while a run is in progress.
#[derive(Debug)]
pub struct ReportBuilder {
    mode: String,
    started_at: std::time::Instant,
    entries: Vec<ReportEntry>,
    bytes_loaded: u64,
    completed_by: Option<Identifier>,
}

impl ReportBuilder {
    pub fn new(mode: impl Into<String>) -> Self {
        Self {
            mode: mode.into(),
            started_at: std::time::Instant::now(),
            entries: Vec::new(),
            bytes_loaded: 0,
            completed_by: None,
        }
    }

    /// Record one notification from an event run.
    pub fn record(&mut self, notification: &Notification) {
        let event = &notification.event;

        if notification.channel == Channel::Complete {
            self.completed_by = Some(event.identifier.clone());
            return;
        }

        self.push(
            notification.channel,
            event.identifier.clone(),
            Some(event.percent_complete),
            event.resource.as_ref(),
            notification.failure.as_ref(),
        );
    }

    /// Record one positional result from a collect run.
    pub fn record_result(
        &mut self,
        identifier: &Identifier,
        result: &Result<Arc<Artifact>, LoadFailure>,
    ) {
        match result {
            Ok(artifact) => self.push(
                Channel::Progress,
                identifier.clone(),
                None,
                Some(artifact),
                None,
            ),
            Err(failure) => self.push(Channel::Error, identifier.clone(), None, None, Some(failure)),
        }
    }

    fn push(
        &mut self,
        channel: Channel,
        identifier: Identifier,
        percent_complete: Option<f64>,
        resource: Option<&Arc<Artifact>>,
        failure: Option<&LoadFailure>,
    ) {
        if let Some(artifact) = resource {
            self.bytes_loaded += artifact.len() as u64;
        }

        self.entries.push(ReportEntry {
            order: self.entries.len() + 1,
            channel,
            identifier,
            percent_complete,
            bytes: resource.map(|a| a.len()),
            kind: resource.map(|a| a.kind),
            error: failure.map(|f| f.reason.to_string()),
        });
    }

    /// Finish the report with the run's summary.
    pub fn finish(self, summary: LoadSummary) -> LoadReport {
        LoadReport {
            metadata: ReportMetadata {
                generated_at: Utc::now(),
                mode: self.mode,
                duration_seconds: self.started_at.elapsed().as_secs_f64(),
                bytes_loaded: self.bytes_loaded,
                completed_by: self.completed_by,
            },
            summary,
            entries: self.entries,
        }
    }
}
