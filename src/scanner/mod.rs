//! Directory scanner for collecting identifiers.
//!
//! Walks a directory tree and turns every matching image file into an
//! [`Identifier`], honouring configured extensions, excludes and a file cap.

use crate::models::Identifier;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Configuration for directory scanning.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// File extensions to include, compared case-insensitively.
    pub extensions: Vec<String>,
    /// Directory or file names to skip.
    pub excludes: Vec<String>,
    /// Maximum number of files to collect.
    pub max_files: Option<usize>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::from(&crate::config::ScannerConfig::default())
    }
}

impl From<&crate::config::ScannerConfig> for ScanConfig {
    fn from(config: &crate::config::ScannerConfig) -> Self {
        Self {
            extensions: config.extensions.clone(),
            excludes: config.excludes.clone(),
            max_files: Some(config.max_files),
        }
    }
}

/// Collects image files below a root directory.
pub struct DirectoryScanner {
    config: ScanConfig,
    root: PathBuf,
}

impl DirectoryScanner {
    /// Create a new scanner.
    pub fn new(root: PathBuf, config: ScanConfig) -> Self {
        Self { config, root }
    }

    /// Scan for matching files, sorted by path so runs are repeatable.
    pub fn scan(&self) -> Result<Vec<Identifier>> {
        let mut paths = Vec::new();

        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.is_excluded(entry));

        for entry in walker {
            let entry = entry
                .with_context(|| format!("Failed to scan directory: {}", self.root.display()))?;

            if entry.file_type().is_file() && self.matches(entry.path()) {
                paths.push(entry.into_path());
            }
        }

        paths.sort();
        if let Some(max) = self.config.max_files {
            if paths.len() > max {
                debug!("Truncating {} files to {}", paths.len(), max);
                paths.truncate(max);
            }
        }

        Ok(paths
            .into_iter()
            .map(|p| Identifier::new(p.to_string_lossy().to_string()))
            .collect())
    }

    /// Check if a file has one of the configured extensions.
    fn matches(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.config
            .extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ext))
    }

    /// Hidden entries and explicit excludes are skipped.
    fn is_excluded(&self, entry: &DirEntry) -> bool {
        let name = entry.file_name().to_string_lossy();
        name.starts_with('.') || self.config.excludes.iter().any(|pattern| name == pattern.as_str())
    }
}
