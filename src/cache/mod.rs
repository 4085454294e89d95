//! Durable snapshot storage for coupon data
//!
//! This module provides the storage layer behind the coupon cache: a
//! `SnapshotStore` key-value abstraction, a filesystem-backed implementation
//! that persists snapshots as JSON files, and an in-memory implementation for
//! tests and ephemeral use. Expired snapshots are deliberately kept readable
//! so the cache can degrade gracefully when the remote source is unavailable.

mod store;

pub use store::{CacheSnapshot, FileStore, MemoryStore, SnapshotStore};
