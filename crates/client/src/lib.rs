//! Client code for shellkeep.
//!
//! This crate provides the network fetcher and the offline-caching worker
//! (lifecycle, request routing and caching strategies) driven by the server.

pub mod fetch;
pub mod worker;

pub use fetch::{FetchClient, FetchConfig, Fetcher};
pub use worker::{
    ActivationReport, BackgroundTasks, CacheAgent, InstallReport, Interception, LifecycleState, Manifest, Route, Served,
    Source,
};
