//! Build-time description of the cache generation this binary ships.

/// Version-qualified name of the current cache generation.
///
/// Every release gets a fresh generation, so activation of a new build
/// garbage-collects the previous one.
pub const CACHE_NAME: &str = concat!("shellkeep-v", env!("CARGO_PKG_VERSION"));

/// Document served when a navigation cannot reach the network.
pub const OFFLINE_PATH: &str = "/offline.html";

/// App-shell assets required for minimal offline operation.
///
/// External CDN bundles are left out on purpose; they are large and the
/// browser usually caches them already.
pub const CORE_ASSETS: &[&str] = &["/", "/index.html", OFFLINE_PATH, "/manifest.json", "/pwa-register.js"];

/// Cache generation name, offline document and ordered core asset list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub cache_name: String,
    pub offline_path: String,
    pub core_assets: Vec<String>,
}

impl Manifest {
    pub fn new(cache_name: impl Into<String>, offline_path: impl Into<String>, core_assets: &[&str]) -> Self {
        Self {
            cache_name: cache_name.into(),
            offline_path: offline_path.into(),
            core_assets: core_assets.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for Manifest {
    fn default() -> Self {
        Self::new(CACHE_NAME, OFFLINE_PATH, CORE_ASSETS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_manifest() {
        let manifest = Manifest::default();
        assert!(manifest.cache_name.starts_with("shellkeep-v"));
        assert_eq!(manifest.offline_path, "/offline.html");
        assert_eq!(manifest.core_assets.len(), 5);
        assert_eq!(manifest.core_assets[0], "/");
    }

    #[test]
    fn test_offline_document_is_precached() {
        let manifest = Manifest::default();
        assert!(manifest.core_assets.contains(&manifest.offline_path));
    }

    #[test]
    fn test_cache_name_is_versioned() {
        assert_eq!(CACHE_NAME, format!("shellkeep-v{}", env!("CARGO_PKG_VERSION")));
    }
}
