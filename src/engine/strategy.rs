//! The three caching strategies
//!
//! Every strategy applies the same success predicate (2xx) before storing,
//! and never surfaces a network failure: the worst outcome is the synthesized
//! 408 response. Storage failures are logged and the response is still served.

use crate::engine::partition::{PartitionKind, PartitionNames};
use crate::engine::rules::Strategy;
use crate::engine::{Served, Source};
use crate::error::SwResult;
use crate::fetch::Fetcher;
use crate::http::{Request, Response};
use crate::storage::{CacheHit, CacheStorage};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Background cache refresh spawned by stale-while-revalidate
pub(crate) type Revalidation = BoxFuture<'static, ()>;

/// What a strategy needs; cheap to clone into background tasks
#[derive(Clone)]
pub(crate) struct Context {
    pub(crate) storage: CacheStorage,
    pub(crate) fetcher: Arc<dyn Fetcher>,
    pub(crate) names: PartitionNames,
}

impl Context {
    /// Global lookup over the live partitions in fixed order
    async fn lookup(&self, request: &Request) -> Option<CacheHit> {
        match self
            .storage
            .match_in(&self.names.lookup_order(), request)
            .await
        {
            Ok(hit) => hit,
            Err(e) => {
                warn!("Cache lookup for {} failed: {}", request.url, e);
                None
            }
        }
    }

    /// Store a copy of `response`; failures are logged, never returned
    async fn store(&self, kind: PartitionKind, request: &Request, response: &Response) {
        let name = self.names.name(kind);
        let result = async {
            let partition = self.storage.open(&name).await?;
            partition.put(request, response).await
        }
        .await;

        if let Err(e) = result {
            warn!("Not caching {} in {}: {}", request.url, name, e);
        }
    }

    /// Fetch, storing 2xx responses in `dynamic`
    async fn fetch_into_dynamic(&self, request: &Request) -> SwResult<Response> {
        let response = self.fetcher.fetch(request).await?;
        if response.is_success() {
            self.store(PartitionKind::Dynamic, request, &response).await;
        }
        Ok(response)
    }
}

fn cached(hit: CacheHit, strategy: Strategy) -> Served {
    Served {
        response: hit.response,
        source: Source::Cache(hit.partition),
        strategy: Some(strategy),
    }
}

fn network(response: Response, strategy: Strategy) -> Served {
    Served {
        response,
        source: Source::Network,
        strategy: Some(strategy),
    }
}

fn synthesized(strategy: Strategy) -> Served {
    Served {
        response: Response::network_error(),
        source: Source::Synthesized,
        strategy: Some(strategy),
    }
}

/// Serve from cache; on a miss fetch and keep 2xx results in `static`
pub(crate) async fn cache_first(ctx: &Context, request: &Request) -> Served {
    const STRATEGY: Strategy = Strategy::CacheFirst;

    if let Some(hit) = ctx.lookup(request).await {
        return cached(hit, STRATEGY);
    }

    match ctx.fetcher.fetch(request).await {
        Ok(response) => {
            if response.is_success() {
                ctx.store(PartitionKind::Static, request, &response).await;
            }
            network(response, STRATEGY)
        }
        Err(e) => {
            debug!("cache-first miss and network failure for {}: {}", request.url, e);
            synthesized(STRATEGY)
        }
    }
}

/// Prefer the network (kept in `dynamic`); fall back to cache, then 408
pub(crate) async fn network_first(ctx: &Context, request: &Request) -> Served {
    const STRATEGY: Strategy = Strategy::NetworkFirst;

    match ctx.fetcher.fetch(request).await {
        Ok(response) if response.is_success() => {
            ctx.store(PartitionKind::Dynamic, request, &response).await;
            return network(response, STRATEGY);
        }
        Ok(response) => debug!(
            "network-first got {} for {}, trying cache",
            response.status, request.url
        ),
        Err(e) => debug!("network-first failed for {}: {}, trying cache", request.url, e),
    }

    match ctx.lookup(request).await {
        Some(hit) => cached(hit, STRATEGY),
        None => synthesized(STRATEGY),
    }
}

/// Serve the cached entry at once and refresh `dynamic` in the background.
///
/// On a hit the refresh is returned as a task for the caller to spawn; on a
/// miss the fetch is awaited and its outcome served.
pub(crate) async fn stale_while_revalidate(
    ctx: Context,
    request: &Request,
) -> (Served, Option<Revalidation>) {
    const STRATEGY: Strategy = Strategy::StaleWhileRevalidate;

    match ctx.lookup(request).await {
        Some(hit) => {
            let request = request.clone();
            let task = async move {
                if let Err(e) = ctx.fetch_into_dynamic(&request).await {
                    debug!("Background revalidation of {} failed: {}", request.url, e);
                }
            }
            .boxed();
            (cached(hit, STRATEGY), Some(task))
        }
        None => match ctx.fetch_into_dynamic(request).await {
            Ok(response) => (network(response, STRATEGY), None),
            Err(e) => {
                debug!("stale-while-revalidate miss and network failure for {}: {}", request.url, e);
                (synthesized(STRATEGY), None)
            }
        },
    }
}
