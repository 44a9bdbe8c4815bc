//! MCP tool implementations.
//!
//! This module contains all tools exposed by the shellkeep server.

pub mod activate;
pub mod cache;
pub mod fetch;
pub mod install;
pub mod status;

#[cfg(test)]
pub(crate) mod testing;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use crate::error::ToolError;

pub use activate::activate_impl;
pub use fetch::{SwFetchParams, fetch_impl};
pub use install::install_impl;
pub use status::status_impl;

/// Render a tool output as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output).map_err(|e| ToolError::OutputFailed(e.to_string()))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
