//! Data models for the preloader.
//!
//! This module contains the core data structures shared by the fetcher,
//! the aggregator and the report layer: identifiers, loaded artifacts,
//! fetch outcomes and the progress events emitted while a run settles.

use crate::error::LoadFailure;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Opaque name of a loadable resource (a URL or a local path).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Creates an identifier from anything string-like.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier names a remote HTTP(S) resource.
    pub fn is_remote(&self) -> bool {
        self.0.starts_with("http://") || self.0.starts_with("https://")
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Identifier {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Kind of payload detected from the leading bytes of an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Png,
    Jpeg,
    Gif,
    Webp,
    Bmp,
    /// Anything without a recognised image signature.
    Other,
}

impl ArtifactKind {
    /// Detect the kind from magic bytes.
    pub fn sniff(data: &[u8]) -> Self {
        if data.starts_with(b"\x89PNG\r\n\x1a\n") {
            ArtifactKind::Png
        } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            ArtifactKind::Jpeg
        } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            ArtifactKind::Gif
        } else if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            ArtifactKind::Webp
        } else if data.starts_with(b"BM") {
            ArtifactKind::Bmp
        } else {
            ArtifactKind::Other
        }
    }

    /// Whether this kind is a decodable image format.
    pub fn is_image(&self) -> bool {
        !matches!(self, ArtifactKind::Other)
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Png => write!(f, "PNG"),
            ArtifactKind::Jpeg => write!(f, "JPEG"),
            ArtifactKind::Gif => write!(f, "GIF"),
            ArtifactKind::Webp => write!(f, "WebP"),
            ArtifactKind::Bmp => write!(f, "BMP"),
            ArtifactKind::Other => write!(f, "Other"),
        }
    }
}

/// A successfully loaded resource held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Identifier the artifact was loaded from.
    pub identifier: Identifier,
    /// Detected payload kind.
    pub kind: ArtifactKind,
    /// Content type reported by the source, if any.
    pub content_type: Option<String>,
    /// Raw payload bytes.
    pub data: Vec<u8>,
}

impl Artifact {
    /// Builds an artifact, sniffing its kind from the payload.
    pub fn new(identifier: Identifier, content_type: Option<String>, data: Vec<u8>) -> Self {
        Self {
            kind: ArtifactKind::sniff(&data),
            identifier,
            content_type,
            data,
        }
    }

    /// Payload size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// The single result of fetching one identifier.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Loaded(Arc<Artifact>),
    Failed(LoadFailure),
}

impl FetchOutcome {
    /// Identifier this outcome belongs to.
    pub fn identifier(&self) -> &Identifier {
        match self {
            FetchOutcome::Loaded(artifact) => &artifact.identifier,
            FetchOutcome::Failed(failure) => &failure.identifier,
        }
    }

    /// Whether the fetch succeeded.
    pub fn is_loaded(&self) -> bool {
        matches!(self, FetchOutcome::Loaded(_))
    }

    /// Converts into a `Result`, the shape callers of the promise-style API expect.
    pub fn into_result(self) -> Result<Arc<Artifact>, LoadFailure> {
        match self {
            FetchOutcome::Loaded(artifact) => Ok(artifact),
            FetchOutcome::Failed(failure) => Err(failure),
        }
    }
}

/// Notification stream an event is delivered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// One item loaded.
    Progress,
    /// One item failed to load.
    Error,
    /// Every item has settled.
    Complete,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Progress => write!(f, "progress"),
            Channel::Error => write!(f, "error"),
            Channel::Complete => write!(f, "complete"),
        }
    }
}

/// Payload delivered on every channel.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    /// The loaded artifact; `None` on error notifications.
    pub resource: Option<Arc<Artifact>>,
    /// Identifier of the item that settled.
    pub identifier: Identifier,
    /// `settled / total` at the moment of emission.
    pub percent_complete: f64,
    /// Number of items settled so far, this one included.
    pub settled: usize,
    /// Number of items in the run.
    pub total: usize,
}

/// An event paired with the channel it was emitted on.
#[derive(Debug, Clone)]
pub struct Notification {
    pub channel: Channel,
    pub event: ProgressEvent,
    /// Failure detail for error notifications.
    pub failure: Option<LoadFailure>,
}

/// What a finished run reports back to its caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadSummary {
    /// Number of identifiers in the run.
    pub total: usize,
    /// Number of identifiers that loaded.
    pub loaded: usize,
    /// Identifiers that failed, in settlement order.
    pub failed: Vec<Identifier>,
}

impl LoadSummary {
    /// Whether every identifier loaded.
    pub fn all_loaded(&self) -> bool {
        self.failed.is_empty() && self.loaded == self.total
    }
}
