//! sw_fetch tool implementation.
//!
//! Hands a request to the worker as if the application had issued it, and
//! reports which source answered.

use std::collections::BTreeMap;

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellkeep_client::{CacheAgent, Route, Source, fetch::is_valid_header_name};
use shellkeep_core::{Destination, Request};

use super::json_result;
use crate::error::ToolError;

/// Input parameters for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Absolute URL, or a path resolved against the application origin.
    pub url: String,

    /// Fetch destination: "document", "style", "script", "image", "font",
    /// or anything else (default: empty).
    #[serde(default)]
    pub destination: String,

    /// HTTP method (default: GET).
    #[serde(default)]
    pub method: Option<String>,

    /// Request headers.
    #[serde(default)]
    pub headers: Option<BTreeMap<String, String>>,
}

/// Output structure for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwFetchOutput {
    /// The resolved request URL.
    pub url: String,
    /// Strategy chosen by the router, or "passthrough" when not controlling.
    pub strategy: String,
    /// Whether a response was produced at all.
    pub served: bool,
    pub source: Option<Source>,
    pub status: Option<u16>,
    /// URL of the response after redirects.
    pub response_url: Option<String>,
    pub content_type: Option<String>,
    pub headers: Vec<(String, String)>,
    /// Body decoded as UTF-8, lossily.
    pub body: Option<String>,
    pub body_bytes: usize,
}

fn build_request(agent: &CacheAgent, params: &SwFetchParams) -> Result<Request, McpError> {
    if params.url.trim().is_empty() {
        return Err(ToolError::InvalidInput("url cannot be empty".into()).into());
    }

    let url = agent.resolve(params.url.trim())?;
    let destination = Destination::from(params.destination.as_str());
    let mut request = match params.method.as_deref() {
        Some(method) => Request::with_method(url, destination, method)?,
        None => Request::get(url, destination),
    };

    for (name, value) in params.headers.iter().flatten() {
        if !is_valid_header_name(name) {
            return Err(ToolError::InvalidInput(format!("invalid header name: {name:?}")).into());
        }
        request = request.with_header(name, value);
    }

    Ok(request)
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl(agent: &CacheAgent, params: SwFetchParams) -> Result<CallToolResult, McpError> {
    let request = build_request(agent, &params)?;
    let outcome = agent.dispatch(&request).await?;
    let strategy = outcome.route.as_ref().map_or("passthrough", Route::strategy);

    let output = match outcome.served {
        Some(served) => SwFetchOutput {
            url: request.url.to_string(),
            strategy: strategy.to_string(),
            served: true,
            source: Some(served.source),
            status: Some(served.response.status),
            response_url: Some(served.response.url.clone()),
            content_type: served.response.content_type().map(str::to_string),
            body: Some(String::from_utf8_lossy(&served.response.body).into_owned()),
            body_bytes: served.response.body.len(),
            headers: served.response.headers,
        },
        None => SwFetchOutput {
            url: request.url.to_string(),
            strategy: strategy.to_string(),
            served: false,
            source: None,
            status: None,
            response_url: None,
            content_type: None,
            headers: Vec::new(),
            body: None,
            body_bytes: 0,
        },
    };

    json_result(&output)
}
