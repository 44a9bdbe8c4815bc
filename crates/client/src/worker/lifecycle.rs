//! Install and activate transitions.

use std::fmt;

use futures_util::future::{join_all, try_join_all};
use serde::{Deserialize, Serialize};
use shellkeep_core::{Destination, Error, Request, RequestKey};

use super::CacheAgent;

/// Lifecycle of a request-interception context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Uninitialized,
    Installing,
    /// Pre-cache committed; eligible to activate immediately.
    Installed,
    Activating,
    /// Controlling intercepted requests.
    Active,
    Superseded,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Uninitialized => "uninitialized",
            LifecycleState::Installing => "installing",
            LifecycleState::Installed => "installed",
            LifecycleState::Activating => "activating",
            LifecycleState::Active => "active",
            LifecycleState::Superseded => "superseded",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a successful install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallReport {
    pub cache_name: String,
    /// Number of core assets stored.
    pub assets: usize,
}

/// Outcome of activation. Deletion failures are reported, not raised.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationReport {
    pub cache_name: String,
    pub deleted: Vec<String>,
    pub failed: Vec<String>,
}

impl CacheAgent {
    /// Move to `to` if the current state is one of `from`.
    fn transition(&self, from: &[LifecycleState], to: LifecycleState) -> Result<(), Error> {
        let mut outcome = Ok(());
        self.state.send_if_modified(|state| {
            if from.contains(state) {
                *state = to;
                true
            } else {
                outcome = Err(Error::InvalidState(format!("cannot move to {to} while {state}")));
                false
            }
        });
        outcome
    }

    /// Pre-cache every core asset into the current generation.
    ///
    /// All assets are fetched before anything is written, and the write is
    /// a single all-or-nothing batch. Any fetch failure or non-2xx status
    /// fails the install and leaves the agent ineligible to activate.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidState` unless the agent is `Uninitialized` or
    /// `Installed`, and `Error::InstallFailed` naming the first asset that
    /// could not be fetched.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        self.transition(&[LifecycleState::Uninitialized, LifecycleState::Installed], LifecycleState::Installing)?;

        tracing::info!(
            cache = %self.manifest.cache_name,
            assets = self.manifest.core_assets.len(),
            "install: caching core assets"
        );

        match self.precache().await {
            Ok(report) => {
                self.state.send_replace(LifecycleState::Installed);
                tracing::info!(cache = %report.cache_name, assets = report.assets, "install complete; skipping wait");
                Ok(report)
            }
            Err(err) => {
                self.state.send_replace(LifecycleState::Uninitialized);
                tracing::error!(cache = %self.manifest.cache_name, error = %err, "pre-caching failed");
                Err(err)
            }
        }
    }

    async fn precache(&self) -> Result<InstallReport, Error> {
        let name = &self.manifest.cache_name;
        self.storage.open(name).await?;

        let requests = self
            .manifest
            .core_assets
            .iter()
            .map(|path| self.resolve(path).map(|url| (path.as_str(), Request::get(url, Destination::Empty))))
            .collect::<Result<Vec<_>, _>>()?;

        let fetches = requests.iter().map(|(path, request)| async move {
            let response = self
                .fetcher
                .fetch(request)
                .await
                .map_err(|e| Error::InstallFailed { asset: path.to_string(), reason: e.to_string() })?;

            if !response.is_ok() {
                return Err(Error::InstallFailed {
                    asset: path.to_string(),
                    reason: format!("status {}", response.status),
                });
            }

            Ok((RequestKey::get(&request.url), response))
        });

        let entries = try_join_all(fetches).await?;
        self.storage.put_all(name, &entries).await?;

        Ok(InstallReport { cache_name: name.clone(), assets: entries.len() })
    }

    /// Delete every other cache generation and start controlling requests.
    ///
    /// Waits for an in-flight install to finish first. Stale stores that
    /// fail to delete are logged and listed in the report; the rest are
    /// still removed.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidState` unless install has completed, or the
    /// storage error if the store names cannot be enumerated.
    pub async fn activate(&self) -> Result<ActivationReport, Error> {
        let mut state = self.state.subscribe();
        state
            .wait_for(|s| *s != LifecycleState::Installing)
            .await
            .map_err(|_| Error::InvalidState("lifecycle closed".into()))?;
        drop(state);

        self.transition(&[LifecycleState::Installed], LifecycleState::Activating)?;

        let current = &self.manifest.cache_name;
        tracing::info!(cache = %current, "activate: cleaning old caches");

        let names = match self.storage.keys().await {
            Ok(names) => names,
            Err(err) => {
                self.state.send_replace(LifecycleState::Installed);
                tracing::error!(error = %err, "could not enumerate caches");
                return Err(err);
            }
        };

        let deletions = names
            .iter()
            .filter(|name| *name != current)
            .map(|name| async move {
                tracing::info!("deleting old cache: {}", name);
                (name, self.storage.delete(name).await)
            });

        let mut report = ActivationReport { cache_name: current.clone(), ..Default::default() };
        for (name, result) in join_all(deletions).await {
            match result {
                Ok(true) => report.deleted.push(name.clone()),
                Ok(false) => tracing::debug!(cache = %name, "stale cache already gone"),
                Err(err) => {
                    tracing::warn!(cache = %name, error = %err, "failed to delete stale cache");
                    report.failed.push(name.clone());
                }
            }
        }

        self.state.send_replace(LifecycleState::Active);
        tracing::info!(
            cache = %current,
            deleted = report.deleted.len(),
            failed = report.failed.len(),
            "activated; claiming clients"
        );

        Ok(report)
    }

    /// Install, then activate.
    pub async fn register(&self) -> Result<ActivationReport, Error> {
        self.install().await?;
        self.activate().await
    }

    /// Stop controlling requests; a newer generation has taken over.
    pub fn supersede(&self) -> Result<(), Error> {
        self.transition(&[LifecycleState::Active], LifecycleState::Superseded)?;
        tracing::info!(cache = %self.manifest.cache_name, "superseded");
        Ok(())
    }
}
