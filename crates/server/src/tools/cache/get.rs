//! cache_get tool implementation.
//!
//! Retrieves a stored response by URL, from one generation or from any.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellkeep_client::CacheAgent;
use shellkeep_core::{CacheStorage, Error, RequestKey};

use crate::tools::json_result;

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Absolute URL, or a path resolved against the application origin.
    pub url: String,

    /// Cache generation to read. Searches every generation when omitted.
    #[serde(default)]
    pub cache_name: Option<String>,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheGetOutput {
    pub key: RequestKey,
    /// SHA-256 storage key.
    pub hash: String,
    pub cache_name: Option<String>,
    pub status: u16,
    pub response_url: String,
    pub headers: Vec<(String, String)>,
    /// Body decoded as UTF-8, lossily.
    pub body: String,
    pub body_bytes: usize,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(agent: &CacheAgent, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let url = agent.resolve(params.url.trim())?;
    let key = RequestKey::get(&url);

    let found = match params.cache_name.as_deref() {
        Some(name) => agent.storage().lookup(name, &key).await?,
        None => agent.storage().lookup_any(&key).await?,
    };
    let response = found.ok_or_else(|| Error::CacheMiss(key.to_string()))?;

    let output = CacheGetOutput {
        hash: key.hash(),
        key,
        cache_name: params.cache_name,
        status: response.status,
        response_url: response.url,
        body: String::from_utf8_lossy(&response.body).into_owned(),
        body_bytes: response.body.len(),
        headers: response.headers,
    };

    json_result(&output)
}
