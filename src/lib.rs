//! Coupon Cache Library
//!
//! This module exposes the cache, data, manager, and source modules for use
//! by the CLI binary and integration tests.

pub mod cache;
pub mod cli;
pub mod data;
pub mod manager;
pub mod source;
