//! Request classification.
//!
//! A pure function of the request's destination and URL path; no I/O.

use shellkeep_core::{Destination, Request};

/// Which caching strategy handles a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Documents and directory-style URLs: network first, offline document on failure.
    Navigation,
    /// Stylesheets, scripts, images, fonts: stale-while-revalidate.
    StaticAsset,
    /// Everything else (API calls, manifests, ...): network first, cache only on failure.
    Default,
}

impl Route {
    pub fn strategy(&self) -> &'static str {
        match self {
            Route::Navigation => "network-first-offline-fallback",
            Route::StaticAsset => "stale-while-revalidate",
            Route::Default => "network-first",
        }
    }
}

/// Classify a request. Navigation is tested first.
pub fn classify(request: &Request) -> Route {
    if request.destination == Destination::Document || request.url.path().ends_with('/') {
        return Route::Navigation;
    }

    match request.destination {
        Destination::Style | Destination::Script | Destination::Image | Destination::Font => Route::StaticAsset,
        _ => Route::Default,
    }
}
