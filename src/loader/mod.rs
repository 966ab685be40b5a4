//! Parallel loading with progress, error and completion notifications.
//!
//! [`LoadAggregator`] launches one fetch per identifier, all at once, and
//! reports each settlement on the `progress` or `error` channel followed by
//! a single `complete` notification. The [`collect`] functions offer the
//! same loads as plain futures and callbacks.

pub mod aggregator;
pub mod collect;
pub mod dispatcher;

pub use aggregator::AggregatorState;
pub use collect::{load, load_all, load_each, settle_all};
pub use dispatcher::{Dispatcher, Handler, Signal};

use crate::error::LoaderError;
use crate::fetch::Fetch;
use crate::models::{Channel, FetchOutcome, Identifier, LoadSummary, Notification, ProgressEvent};
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

/// One load run over a fixed, non-empty list of identifiers.
///
/// Subscribe first, then call [`run`](Self::run). All bookkeeping and
/// handler calls happen on the task driving `run`, between polls of the
/// fetch futures, so handlers never run concurrently with each other.
pub struct LoadAggregator<F> {
    fetcher: F,
    identifiers: Vec<Identifier>,
    state: AggregatorState,
    dispatcher: Dispatcher,
    forwarders: Vec<UnboundedSender<Notification>>,
}

impl<F: Fetch> LoadAggregator<F> {
    /// Create an aggregator for `identifiers`.
    ///
    /// An empty list is rejected: a run with nothing to settle would never
    /// produce its completion notification.
    pub fn new<I>(fetcher: F, identifiers: I) -> Result<Self, LoaderError>
    where
        I: IntoIterator,
        I::Item: Into<Identifier>,
    {
        let identifiers: Vec<Identifier> = identifiers.into_iter().map(Into::into).collect();
        if identifiers.is_empty() {
            return Err(LoaderError::NoIdentifiers);
        }

        Ok(Self {
            fetcher,
            state: AggregatorState::new(identifiers.len()),
            identifiers,
            dispatcher: Dispatcher::new(),
            forwarders: Vec::new(),
        })
    }

    pub fn identifiers(&self) -> &[Identifier] {
        &self.identifiers
    }

    pub fn total(&self) -> usize {
        self.state.total()
    }

    /// Subscribe `handler` to `channel`.
    pub fn on<H>(&mut self, channel: Channel, handler: H) -> &mut Self
    where
        H: FnMut(&ProgressEvent) + Send + 'static,
    {
        self.dispatcher.subscribe(channel, handler);
        self
    }

    /// Called once per item that loaded.
    pub fn on_progress<H>(&mut self, handler: H) -> &mut Self
    where
        H: FnMut(&ProgressEvent) + Send + 'static,
    {
        self.on(Channel::Progress, handler)
    }

    /// Called once per item that failed.
    pub fn on_error<H>(&mut self, handler: H) -> &mut Self
    where
        H: FnMut(&ProgressEvent) + Send + 'static,
    {
        self.on(Channel::Error, handler)
    }

    /// Called exactly once, after the last item settles.
    pub fn on_complete<H>(&mut self, handler: H) -> &mut Self
    where
        H: FnMut(&ProgressEvent) + Send + 'static,
    {
        self.on(Channel::Complete, handler)
    }

    /// Forward every notification, failure detail included, to `sender`.
    ///
    /// A dropped receiver is ignored.
    pub fn forward_to(&mut self, sender: UnboundedSender<Notification>) -> &mut Self {
        self.forwarders.push(sender);
        self
    }

    /// Load every identifier and deliver notifications until all have settled.
    pub async fn run(self) -> LoadSummary {
        let Self {
            fetcher,
            identifiers,
            mut state,
            mut dispatcher,
            forwarders,
        } = self;

        info!("Loading {} resources", identifiers.len());

        let mut pending: FuturesUnordered<_> = identifiers
            .into_iter()
            .map(|identifier| fetcher.fetch(identifier))
            .collect();

        let mut summary = LoadSummary {
            total: state.total(),
            ..LoadSummary::default()
        };

        while let Some(outcome) = pending.next().await {
            match &outcome {
                FetchOutcome::Loaded(_) => summary.loaded += 1,
                FetchOutcome::Failed(failure) => summary.failed.push(failure.identifier.clone()),
            }

            for notification in state.settle(outcome) {
                debug!(
                    "{} {} ({}/{})",
                    notification.channel,
                    notification.event.identifier,
                    notification.event.settled,
                    notification.event.total
                );

                dispatcher.emit(notification.channel, &notification.event);

                for sender in &forwarders {
                    let _ = sender.send(notification.clone());
                }
            }
        }

        info!(
            "Load complete: {} loaded, {} failed",
            summary.loaded,
            summary.failed.len()
        );

        summary
    }
}
