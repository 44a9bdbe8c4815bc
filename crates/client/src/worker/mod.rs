//! Offline-caching worker.
//!
//! ### Lifecycle
//! - `install` pre-caches the manifest's core assets into the current
//!   generation; any failed asset fails the whole install.
//! - `activate` waits for install, deletes every other generation
//!   (best-effort) and starts controlling requests.
//!
//! ### Fetch interception
//! - Navigation → network first, offline document on failure.
//! - Style/script/image/font → stale-while-revalidate.
//! - Everything else → network first, cached copy only on failure.
//!
//! Each intercepted request is an independent task; the only shared state
//! is the cache storage and the lifecycle state.

pub mod lifecycle;
pub mod manifest;
pub mod router;
pub mod strategy;
pub mod tasks;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shellkeep_core::{CacheStorage, Error, Request, RequestKey, StoredResponse};
use tokio::sync::watch;
use url::Url;

use crate::fetch::{Fetcher, resolve};

pub use lifecycle::{ActivationReport, InstallReport, LifecycleState};
pub use manifest::{CACHE_NAME, CORE_ASSETS, Manifest, OFFLINE_PATH};
pub use router::{Route, classify};
pub use tasks::BackgroundTasks;

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Network,
    Cache,
    OfflineFallback,
}

/// The single response produced for an intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served {
    pub response: StoredResponse,
    pub source: Source,
}

impl Served {
    pub fn network(response: StoredResponse) -> Self {
        Self { response, source: Source::Network }
    }

    pub fn cache(response: StoredResponse) -> Self {
        Self { response, source: Source::Cache }
    }

    pub fn offline_fallback(response: StoredResponse) -> Self {
        Self { response, source: Source::OfflineFallback }
    }
}

/// Outcome of one intercepted request together with the route that
/// produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interception {
    /// `None` when the agent was not controlling and the request passed
    /// straight through to the network.
    pub route: Option<Route>,
    pub served: Option<Served>,
}

/// Request-interception context with an explicit lifecycle.
pub struct CacheAgent {
    manifest: Manifest,
    origin: Url,
    offline_key: RequestKey,
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    state: watch::Sender<LifecycleState>,
    background: BackgroundTasks,
}

impl CacheAgent {
    /// Create an agent in the `Uninitialized` state.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidUrl` if the offline document path does not
    /// resolve against `origin`.
    pub fn new(
        manifest: Manifest, origin: Url, storage: Arc<dyn CacheStorage>, fetcher: Arc<dyn Fetcher>,
    ) -> Result<Self, Error> {
        let offline_url = resolve(&origin, &manifest.offline_path)
            .map_err(|e| Error::InvalidUrl(format!("{}: {e}", manifest.offline_path)))?;
        let offline_key = RequestKey::get(&offline_url);
        let (state, _) = watch::channel(LifecycleState::Uninitialized);

        Ok(Self { manifest, origin, offline_key, storage, fetcher, state, background: BackgroundTasks::new() })
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Receiver that observes every lifecycle transition.
    pub fn watch_state(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// Whether intercepted requests go through the caching strategies.
    pub fn is_controlling(&self) -> bool {
        self.state() == LifecycleState::Active
    }

    /// Resolve a request target against the application origin.
    pub fn resolve(&self, target: &str) -> Result<Url, Error> {
        resolve(&self.origin, target).map_err(|e| Error::InvalidUrl(format!("{target}: {e}")))
    }

    /// Handle one intercepted request.
    ///
    /// Produces exactly one outcome: a response, an absent response
    /// (navigation failed and no offline document is cached), or an error.
    /// Requests arriving while the agent is not active go straight to the
    /// network.
    pub async fn intercept(&self, request: &Request) -> Result<Option<Served>, Error> {
        self.dispatch(request).await.map(|outcome| outcome.served)
    }

    /// Like [`CacheAgent::intercept`], also reporting the route taken.
    ///
    /// The lifecycle state is read once, so the route always describes the
    /// path that produced the response even if the state changes meanwhile.
    pub async fn dispatch(&self, request: &Request) -> Result<Interception, Error> {
        let state = self.state();
        if state != LifecycleState::Active {
            tracing::debug!(url = %request.url, state = %state, "not controlling; passing through");
            let response = self.fetcher.fetch(request).await?;
            return Ok(Interception { route: None, served: Some(Served::network(response)) });
        }

        let route = classify(request);
        tracing::debug!(
            url = %request.url,
            destination = %request.destination,
            strategy = route.strategy(),
            "routing intercepted request"
        );

        let served = match route {
            Route::Navigation => self.network_first_with_fallback(request).await?,
            Route::StaticAsset => Some(self.stale_while_revalidate(request).await?),
            Route::Default => Some(self.network_first(request).await?),
        };
        Ok(Interception { route: Some(route), served })
    }

    /// Wait for every background cache write spawned so far.
    pub async fn settle(&self) {
        self.background.settle().await;
    }

    /// Background writes not yet reaped.
    pub fn pending_writes(&self) -> usize {
        self.background.pending()
    }
}
