//! Scripted collaborators for worker tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use shellkeep_core::{CacheDb, CacheStorage, Destination, Error, Request, RequestKey, StoredResponse};
use tokio::sync::Semaphore;
use url::Url;

use super::{CacheAgent, Manifest};
use crate::fetch::Fetcher;

pub const ORIGIN: &str = "https://app.test";
pub const TEST_CACHE: &str = "shell-v2";
pub const TEST_ASSETS: &[&str] = &["/", "/index.html", "/offline.html", "/app.css"];

pub fn url(path: &str) -> Url {
    Url::parse(ORIGIN).unwrap().join(path).unwrap()
}

pub fn request(path: &str, destination: Destination) -> Request {
    Request::get(url(path), destination)
}

pub fn key(path: &str) -> RequestKey {
    RequestKey::get(&url(path))
}

pub fn page(path: &str, body: &str) -> StoredResponse {
    StoredResponse::new(url(path).to_string(), 200).with_body(body.to_string())
}

/// Network double: per-URL responses, failures, call counting and an
/// optional gate that holds every fetch open until released.
#[derive(Default)]
pub struct MockFetcher {
    responses: Mutex<HashMap<String, StoredResponse>>,
    failing: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
    gate: Mutex<Option<Arc<Semaphore>>>,
}

impl MockFetcher {
    pub fn respond(&self, path: &str, body: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(url(path).to_string(), page(path, body));
    }

    pub fn respond_with(&self, path: &str, response: StoredResponse) {
        self.responses.lock().unwrap().insert(url(path).to_string(), response);
    }

    pub fn fail(&self, path: &str) {
        self.failing.lock().unwrap().insert(url(path).to_string());
    }

    pub fn recover(&self, path: &str) {
        self.failing.lock().unwrap().remove(&url(path).to_string());
    }

    /// Hold all subsequent fetches until [`MockFetcher::release`].
    pub fn hold(&self) {
        *self.gate.lock().unwrap() = Some(Arc::new(Semaphore::new(0)));
    }

    pub fn release(&self) {
        if let Some(gate) = self.gate.lock().unwrap().take() {
            gate.add_permits(Semaphore::MAX_PERMITS / 2);
        }
    }

    pub fn calls_for(&self, path: &str) -> usize {
        let target = url(path).to_string();
        self.calls.lock().unwrap().iter().filter(|c| **c == target).count()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, request: &Request) -> Result<StoredResponse, Error> {
        let target = request.url.to_string();
        self.calls.lock().unwrap().push(target.clone());

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            let _permit = gate.acquire().await;
        }

        if self.failing.lock().unwrap().contains(&target) {
            return Err(Error::Network(format!("{target}: connection refused")));
        }

        let found = self.responses.lock().unwrap().get(&target).cloned();
        Ok(found.unwrap_or_else(|| StoredResponse::new(target, 404)))
    }
}

/// Fetcher that serves every test core asset.
pub fn shell_fetcher() -> Arc<MockFetcher> {
    let fetcher = MockFetcher::default();
    fetcher.respond("/", "<main>root</main>");
    fetcher.respond("/index.html", "<main>index</main>");
    fetcher.respond("/offline.html", "<main>offline</main>");
    fetcher.respond("/app.css", "body{color:red}");
    Arc::new(fetcher)
}

/// Storage wrapper that fails chosen operations.
pub struct FlakyStorage {
    pub inner: CacheDb,
    pub fail_delete: HashSet<String>,
    pub fail_keys: bool,
}

impl FlakyStorage {
    pub fn new(inner: CacheDb) -> Self {
        Self { inner, fail_delete: HashSet::new(), fail_keys: false }
    }
}

#[async_trait]
impl CacheStorage for FlakyStorage {
    async fn open(&self, name: &str) -> Result<(), Error> {
        self.inner.open(name).await
    }

    async fn put(&self, name: &str, key: &RequestKey, response: &StoredResponse) -> Result<(), Error> {
        self.inner.put(name, key, response).await
    }

    async fn put_all(&self, name: &str, entries: &[(RequestKey, StoredResponse)]) -> Result<(), Error> {
        self.inner.put_all(name, entries).await
    }

    async fn lookup(&self, name: &str, key: &RequestKey) -> Result<Option<StoredResponse>, Error> {
        self.inner.lookup(name, key).await
    }

    async fn lookup_any(&self, key: &RequestKey) -> Result<Option<StoredResponse>, Error> {
        self.inner.lookup_any(key).await
    }

    async fn requests(&self, name: &str) -> Result<Vec<RequestKey>, Error> {
        self.inner.requests(name).await
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        if self.fail_keys {
            return Err(Error::InvalidState("storage unavailable".into()));
        }
        self.inner.keys().await
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        if self.fail_delete.contains(name) {
            return Err(Error::InvalidState(format!("{name} is locked")));
        }
        self.inner.delete(name).await
    }
}

pub fn test_manifest() -> Manifest {
    Manifest::new(TEST_CACHE, "/offline.html", TEST_ASSETS)
}

/// Agent over an in-memory database. The database handle shares the
/// agent's connection, so tests can inspect what the agent wrote.
pub async fn agent_with(fetcher: Arc<MockFetcher>) -> (Arc<CacheAgent>, CacheDb, Arc<MockFetcher>) {
    agent_with_manifest(fetcher, test_manifest()).await
}

pub async fn agent_with_manifest(
    fetcher: Arc<MockFetcher>, manifest: Manifest,
) -> (Arc<CacheAgent>, CacheDb, Arc<MockFetcher>) {
    let db = CacheDb::open_in_memory().await.unwrap();
    let storage: Arc<dyn CacheStorage> = Arc::new(db.clone());
    let agent = CacheAgent::new(manifest, Url::parse(ORIGIN).unwrap(), storage, fetcher.clone()).unwrap();
    (Arc::new(agent), db, fetcher)
}

pub async fn agent_over(storage: Arc<dyn CacheStorage>, fetcher: Arc<MockFetcher>) -> Arc<CacheAgent> {
    Arc::new(CacheAgent::new(test_manifest(), Url::parse(ORIGIN).unwrap(), storage, fetcher).unwrap())
}

/// Agent that has completed install and activation.
pub async fn active_agent(fetcher: Arc<MockFetcher>) -> (Arc<CacheAgent>, CacheDb, Arc<MockFetcher>) {
    let (agent, db, fetcher) = agent_with(fetcher).await;
    agent.register().await.unwrap();
    (agent, db, fetcher)
}
