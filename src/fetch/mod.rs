//! Resource fetching.
//!
//! The aggregator only sees the [`Fetch`] trait: given one identifier it
//! eventually yields exactly one [`FetchOutcome`]. [`SourceFetcher`] is the
//! implementation the CLI uses for HTTP(S) URLs and local paths.

pub mod source;

pub use source::{FetchOptions, SourceFetcher};

use crate::models::{FetchOutcome, Identifier};
use futures::future::BoxFuture;

/// An asynchronous load of one resource with two possible outcomes.
///
/// Implementations must resolve exactly once per call and must not retry.
pub trait Fetch: Send + Sync {
    fn fetch(&self, identifier: Identifier) -> BoxFuture<'_, FetchOutcome>;
}

impl<F: Fetch + ?Sized> Fetch for std::sync::Arc<F> {
    fn fetch(&self, identifier: Identifier) -> BoxFuture<'_, FetchOutcome> {
        (**self).fetch(identifier)
    }
}

#[cfg(test)]
pub mod testing {
    //! A fetcher whose outcomes and settlement times are scripted per identifier.

    use super::Fetch;
    use crate::error::{FailureReason, LoadFailure};
    use crate::models::{Artifact, FetchOutcome, Identifier};
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    #[derive(Debug, Clone)]
    struct Script {
        delay: Duration,
        succeed: bool,
    }

    #[derive(Debug, Default)]
    pub struct ScriptedFetcher {
        scripts: HashMap<Identifier, Script>,
        calls: AtomicUsize,
    }

    impl ScriptedFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        /// Identifier loads after `delay_ms` milliseconds.
        pub fn ok(mut self, identifier: &str, delay_ms: u64) -> Self {
            self.scripts.insert(
                identifier.into(),
                Script {
                    delay: Duration::from_millis(delay_ms),
                    succeed: true,
                },
            );
            self
        }

        /// Identifier fails after `delay_ms` milliseconds.
        pub fn fail(mut self, identifier: &str, delay_ms: u64) -> Self {
            self.scripts.insert(
                identifier.into(),
                Script {
                    delay: Duration::from_millis(delay_ms),
                    succeed: false,
                },
            );
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Fetch for ScriptedFetcher {
        fn fetch(&self, identifier: Identifier) -> BoxFuture<'_, FetchOutcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let script = self.scripts.get(&identifier).cloned();
            async move {
                let Some(script) = script else {
                    return FetchOutcome::Failed(LoadFailure::new(
                        identifier,
                        FailureReason::Io("not scripted".to_string()),
                    ));
                };
                tokio::time::sleep(script.delay).await;
                if script.succeed {
                    FetchOutcome::Loaded(Arc::new(Artifact::new(
                        identifier,
                        Some("image/png".to_string()),
                        PNG_BYTES.to_vec(),
                    )))
                } else {
                    FetchOutcome::Failed(LoadFailure::new(identifier, FailureReason::Status(404)))
                }
            }
            .boxed()
        }
    }
}
