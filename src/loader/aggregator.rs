//! Settlement bookkeeping and percentage computation.
//!
//! [`AggregatorState`] turns each fetch outcome into the notifications it
//! produces. It owns no handlers and does no I/O, so the whole counting
//! contract can be exercised synchronously.

use crate::models::{Channel, FetchOutcome, Notification, ProgressEvent};

/// Per-run counters.
///
/// `settled` only grows, one step per settlement, and never passes
/// `total`. The state turns terminal exactly once, on the settlement that
/// makes `settled == total`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatorState {
    total: usize,
    settled: usize,
}

impl AggregatorState {
    /// Create state for a run of `total` items.
    pub fn new(total: usize) -> Self {
        Self { total, settled: 0 }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn settled(&self) -> usize {
        self.settled
    }

    /// Whether the completion notification has already been produced.
    pub fn is_terminal(&self) -> bool {
        self.total > 0 && self.settled == self.total
    }

    /// Fraction of items settled so far.
    pub fn percent_complete(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.settled as f64 / self.total as f64
    }

    /// Record one settlement and return the notifications it triggers, in
    /// emission order: the per-item notification, then `complete` if this
    /// was the last item.
    ///
    /// Returns an empty list once the state is terminal.
    pub fn settle(&mut self, outcome: FetchOutcome) -> Vec<Notification> {
        if self.is_terminal() || self.total == 0 {
            return Vec::new();
        }

        self.settled += 1;

        let identifier = outcome.identifier().clone();
        let (channel, resource, failure) = match outcome {
            FetchOutcome::Loaded(artifact) => (Channel::Progress, Some(artifact), None),
            FetchOutcome::Failed(failure) => (Channel::Error, None, Some(failure)),
        };

        let event = ProgressEvent {
            resource,
            identifier,
            percent_complete: self.percent_complete(),
            settled: self.settled,
            total: self.total,
        };

        let mut notifications = Vec::with_capacity(2);

        if self.settled == self.total {
            // The item that completes the run is also the payload of `complete`.
            let complete = ProgressEvent {
                percent_complete: 1.0,
                ..event.clone()
            };
            notifications.push(Notification {
                channel,
                event,
                failure: failure.clone(),
            });
            notifications.push(Notification {
                channel: Channel::Complete,
                event: complete,
                failure,
            });
        } else {
            notifications.push(Notification {
                channel,
                event,
                failure,
            });
        }

        notifications
    }
}
