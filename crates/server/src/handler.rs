//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the caching worker.
use std::sync::Arc;

use crate::tools::{
    SwFetchParams, activate_impl,
    cache::{CacheGetParams, get_impl},
    fetch_impl, install_impl, status_impl,
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use shellkeep_client::CacheAgent;

/// The main MCP server handler for shellkeep.
#[derive(Clone)]
pub struct ShellkeepServer {
    agent: Arc<CacheAgent>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl ShellkeepServer {
    /// Create a new server handler around a worker.
    pub fn new(agent: Arc<CacheAgent>) -> Self {
        Self { agent, tool_router: Self::tool_router() }
    }

    #[tool(description = "Pre-cache the core app-shell assets into the current cache generation. Fails if any asset fails.")]
    async fn sw_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.agent).await
    }

    #[tool(description = "Delete every other cache generation and start intercepting requests. Requires a completed install.")]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.agent).await
    }

    #[tool(description = "Report lifecycle state, cache generations and pending background writes.")]
    async fn sw_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.agent).await
    }

    /// Route a request through the worker.
    ///
    /// Navigation requests go network first with an offline fallback, static
    /// assets are served stale-while-revalidate, everything else goes network
    /// first with a cached copy only on failure.
    #[tool(
        description = "Issue a request through the offline-caching worker. Returns the response and whether it came from the network, the cache, or the offline fallback."
    )]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.agent, params.0).await
    }

    #[tool(description = "Look up a stored response by URL, in one cache generation or across all of them.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.agent, params.0).await
    }
}

impl ServerHandler for ShellkeepServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "shellkeep".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Offline-caching worker for a web application. Run sw_install then sw_activate (or rely on \
                 auto-registration), then issue requests with sw_fetch."
                    .into(),
            ),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
