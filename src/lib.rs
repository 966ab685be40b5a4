//! Preloader - parallel resource loading with progress aggregation
//!
//! Loads a list of resources concurrently and reports each settlement as
//! it happens. The same loads are available in four shapes:
//!
//! - [`LoadAggregator`]: `progress`, `error` and `complete` notifications
//!   delivered to subscribed handlers or forwarded to a channel.
//! - [`load_each`]: one callback per settled item.
//! - [`load`], [`settle_all`] and [`load_all`]: plain futures, with
//!   results kept in input order.
//!
//! Fetching itself sits behind the [`Fetch`] trait; [`SourceFetcher`]
//! handles HTTP(S) URLs and local files.

pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod loader;
pub mod models;
pub mod report;
pub mod scanner;

pub use error::{FailureReason, LoadFailure, LoaderError};
pub use fetch::{Fetch, FetchOptions, SourceFetcher};
pub use loader::{load, load_all, load_each, settle_all, LoadAggregator};
pub use models::{
    Artifact, ArtifactKind, Channel, FetchOutcome, Identifier, LoadSummary, Notification,
    ProgressEvent,
};
