//! sw_status tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use serde::{Deserialize, Serialize};
use shellkeep_client::{CacheAgent, LifecycleState};
use shellkeep_core::CacheStorage;

use super::json_result;

/// Output from the sw_status tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusOutput {
    /// Current lifecycle state.
    pub state: LifecycleState,
    /// Whether intercepted requests go through the caching strategies.
    pub controlling: bool,
    pub origin: String,
    /// Name of the current cache generation.
    pub cache_name: String,
    /// Every cache generation present in storage, oldest first.
    pub caches: Vec<String>,
    /// Entries stored in the current generation.
    pub entries: usize,
    /// Background cache writes still in flight.
    pub pending_writes: usize,
}

/// Implementation of the sw_status tool.
pub async fn status_impl(agent: &CacheAgent) -> Result<CallToolResult, McpError> {
    let cache_name = agent.manifest().cache_name.clone();
    let caches = agent.storage().keys().await?;
    let entries = agent.storage().requests(&cache_name).await?.len();

    let output = StatusOutput {
        state: agent.state(),
        controlling: agent.is_controlling(),
        origin: agent.origin().to_string(),
        cache_name,
        caches,
        entries,
        pending_writes: agent.pending_writes(),
    };

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{CACHE, SiteFetcher, agent, output};

    #[tokio::test]
    async fn test_status_impl_fresh_agent() {
        let (agent, _) = agent(SiteFetcher::new()).await;

        let out = output(&status_impl(&agent).await.unwrap());
        assert_eq!(out["state"], "uninitialized");
        assert_eq!(out["controlling"], false);
        assert_eq!(out["origin"], "https://shell.test/");
        assert_eq!(out["caches"], serde_json::json!([]));
        assert_eq!(out["entries"], 0);
    }

    #[tokio::test]
    async fn test_status_impl_after_register() {
        let (agent, _) = agent(SiteFetcher::new()).await;
        agent.register().await.unwrap();

        let out = output(&status_impl(&agent).await.unwrap());
        assert_eq!(out["state"], "active");
        assert_eq!(out["controlling"], true);
        assert_eq!(out["cache_name"], CACHE);
        assert_eq!(out["caches"], serde_json::json!([CACHE]));
        assert_eq!(out["entries"], 3);
    }
}
