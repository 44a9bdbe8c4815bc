//! sw_install tool implementation.
//!
//! Pre-caches the core assets into the current cache generation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use shellkeep_client::CacheAgent;

use super::json_result;

/// Implementation of the sw_install tool.
pub async fn install_impl(agent: &CacheAgent) -> Result<CallToolResult, McpError> {
    let report = agent.install().await?;
    json_result(&report)
}
