//! SQLite-backed cache storage for versioned cache generations.
//!
//! This module provides the store adapter the worker reads and writes
//! through, using SQLite with async access via tokio-rusqlite. It supports:
//!
//! - Named stores, one per cache generation
//! - Request-addressed entries keyed by SHA-256 of the request identity
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod storage;

pub use crate::Error;

pub use connection::CacheDb;
pub use storage::CacheStorage;
