//! Core types and shared functionality for shellkeep.
//!
//! This crate provides:
//! - Request/response types and cache identity
//! - Cache storage adapter trait with SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod request;
pub mod response;

pub use cache::{CacheDb, CacheStorage};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use request::{Destination, Request, RequestKey};
pub use response::StoredResponse;
