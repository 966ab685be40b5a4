//! Per-channel observer lists.
//!
//! A [`Signal`] is one list of handlers; a [`Dispatcher`] owns one signal
//! per [`Channel`] and is owned in turn by a single aggregator, so no
//! handler outlives or is shared across runs.

use crate::models::{Channel, ProgressEvent};
use tracing::warn;

/// A subscriber callback.
pub type Handler = Box<dyn FnMut(&ProgressEvent) + Send>;

/// Ordered list of handlers for one channel.
#[derive(Default)]
pub struct Signal {
    handlers: Vec<Handler>,
}

impl Signal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. Handlers run in registration order.
    pub fn add<H>(&mut self, handler: H)
    where
        H: FnMut(&ProgressEvent) + Send + 'static,
    {
        self.handlers.push(Box::new(handler));
    }

    /// Call every handler with `event`.
    pub fn dispatch(&mut self, event: &ProgressEvent) {
        for handler in &mut self.handlers {
            handler(event);
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// The progress, error and complete signals of one run.
///
/// After the complete signal has been dispatched the dispatcher is closed
/// and drops any further emission.
#[derive(Default)]
pub struct Dispatcher {
    progress: Signal,
    error: Signal,
    complete: Signal,
    closed: bool,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` on `channel`.
    pub fn subscribe<H>(&mut self, channel: Channel, handler: H)
    where
        H: FnMut(&ProgressEvent) + Send + 'static,
    {
        self.signal_mut(channel).add(handler);
    }

    /// Deliver `event` to every handler on `channel`.
    ///
    /// Returns `false` if the dispatcher was already closed.
    pub fn emit(&mut self, channel: Channel, event: &ProgressEvent) -> bool {
        if self.closed {
            warn!(
                "Dropping {} notification for {} after completion",
                channel, event.identifier
            );
            return false;
        }

        self.signal_mut(channel).dispatch(event);

        if channel == Channel::Complete {
            self.closed = true;
        }
        true
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Number of handlers registered on `channel`.
    pub fn handler_count(&self, channel: Channel) -> usize {
        self.signal(channel).len()
    }

    fn signal(&self, channel: Channel) -> &Signal {
        match channel {
            Channel::Progress => &self.progress,
            Channel::Error => &self.error,
            Channel::Complete => &self.complete,
        }
    }

    fn signal_mut(&mut self, channel: Channel) -> &mut Signal {
        match channel {
            Channel::Progress => &mut self.progress,
            Channel::Error => &mut self.error,
            Channel::Complete => &mut self.complete,
        }
    }
}
