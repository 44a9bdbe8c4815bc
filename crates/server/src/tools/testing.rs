//! Agent fixtures for tool tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rmcp::model::CallToolResult;
use shellkeep_client::{CacheAgent, Fetcher, Manifest};
use shellkeep_core::{CacheDb, CacheStorage, Error, Request, StoredResponse};
use url::Url;

pub const ORIGIN: &str = "https://shell.test";
pub const CACHE: &str = "shell-test";

/// Serves a fixed site; paths taken down fail at the transport.
pub struct SiteFetcher {
    pages: HashMap<String, &'static str>,
    down: Mutex<Vec<String>>,
}

impl SiteFetcher {
    pub fn new() -> Arc<Self> {
        let pages = [
            ("/", "<main>home</main>"),
            ("/offline.html", "<main>offline</main>"),
            ("/app.css", "body{}"),
            ("/api/ping", "pong"),
        ]
        .into_iter()
        .map(|(path, body)| (format!("{ORIGIN}{path}"), body))
        .collect();
        Arc::new(Self { pages, down: Mutex::new(Vec::new()) })
    }

    pub fn down(&self, path: &str) {
        self.down.lock().unwrap().push(format!("{ORIGIN}{path}"));
    }
}

#[async_trait]
impl Fetcher for SiteFetcher {
    async fn fetch(&self, request: &Request) -> Result<StoredResponse, Error> {
        let target = request.url.to_string();
        if self.down.lock().unwrap().contains(&target) {
            return Err(Error::Network(format!("{target}: unreachable")));
        }
        Ok(match self.pages.get(&target) {
            Some(body) => StoredResponse::new(target, 200)
                .with_header("content-type", "text/plain")
                .with_body(body.to_string()),
            None => StoredResponse::new(target, 404),
        })
    }
}

pub async fn agent(fetcher: Arc<SiteFetcher>) -> (Arc<CacheAgent>, CacheDb) {
    let db = CacheDb::open_in_memory().await.unwrap();
    let storage: Arc<dyn CacheStorage> = Arc::new(db.clone());
    let manifest = Manifest::new(CACHE, "/offline.html", &["/", "/offline.html", "/app.css"]);
    let agent = CacheAgent::new(manifest, Url::parse(ORIGIN).unwrap(), storage, fetcher).unwrap();
    (Arc::new(agent), db)
}

/// Parse the JSON text content of a tool result.
pub fn output(result: &CallToolResult) -> serde_json::Value {
    let text = result
        .content
        .first()
        .and_then(|c| c.as_text())
        .expect("expected text content");
    serde_json::from_str(&text.text).unwrap()
}
