//! sw_activate tool implementation.
//!
//! Deletes stale cache generations and starts controlling requests.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use shellkeep_client::CacheAgent;

use super::json_result;

/// Implementation of the sw_activate tool.
pub async fn activate_impl(agent: &CacheAgent) -> Result<CallToolResult, McpError> {
    let report = agent.activate().await?;
    json_result(&report)
}
