//! Future- and callback-shaped loading.
//!
//! These forms skip the notification channels: [`load`] resolves one
//! identifier, [`settle_all`] and [`load_all`] resolve a whole list into a
//! positional vector, and [`load_each`] reports every settlement to a
//! single callback.

use crate::error::LoadFailure;
use crate::fetch::Fetch;
use crate::models::{Artifact, Identifier};
use futures::future::join_all;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tracing::debug;

/// Load one identifier. A failure carries the identifier that failed.
pub async fn load<F>(fetcher: &F, identifier: Identifier) -> Result<Arc<Artifact>, LoadFailure>
where
    F: Fetch + ?Sized,
{
    fetcher.fetch(identifier).await.into_result()
}

/// Load every identifier concurrently and keep each result, in input order.
///
/// Resolves once every fetch has settled; never fails as a whole.
pub async fn settle_all<F>(
    fetcher: &F,
    identifiers: &[Identifier],
) -> Vec<Result<Arc<Artifact>, LoadFailure>>
where
    F: Fetch + ?Sized,
{
    debug!("Settling {} resources", identifiers.len());
    join_all(
        identifiers
            .iter()
            .cloned()
            .map(|identifier| load(fetcher, identifier)),
    )
    .await
}

/// Load every identifier concurrently; position `i` holds the artifact
/// for `identifiers[i]`, or `None` if it failed.
///
/// An empty list resolves immediately to an empty vector.
pub async fn load_all<F>(fetcher: &F, identifiers: &[Identifier]) -> Vec<Option<Arc<Artifact>>>
where
    F: Fetch + ?Sized,
{
    settle_all(fetcher, identifiers)
        .await
        .into_iter()
        .map(Result::ok)
        .collect()
}

/// Load every identifier concurrently, calling `callback` once per item as
/// it settles with either the artifact or the failure.
///
/// Returns the number of items that loaded.
pub async fn load_each<F, C>(fetcher: &F, identifiers: &[Identifier], mut callback: C) -> usize
where
    F: Fetch + ?Sized,
    C: FnMut(Result<Arc<Artifact>, LoadFailure>),
{
    let mut pending: FuturesUnordered<_> = identifiers
        .iter()
        .cloned()
        .map(|identifier| fetcher.fetch(identifier))
        .collect();

    let mut loaded = 0;
    while let Some(outcome) = pending.next().await {
        if outcome.is_loaded() {
            loaded += 1;
        }
        callback(outcome.into_result());
    }

    loaded
}
