//! Command-line interface parsing for the coupon cache CLI
//!
//! This module handles parsing of CLI arguments using clap, including the
//! subcommands for listing coupons, checking a code against an amount,
//! forcing a refresh, and clearing the persisted snapshot.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use thiserror::Error;

/// Default coupon-listing endpoint used when none is supplied
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080/api/coupons";

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The amount argument is not a positive finite number
    #[error("Invalid amount: '{0}'. Amounts must be positive numbers")]
    InvalidAmount(String),
}

/// Coupon Cache CLI - look up coupons through a retrying, fallback-aware cache
#[derive(Parser, Debug)]
#[command(name = "couponcache")]
#[command(about = "Coupon lookup backed by a retrying, fallback-aware cache")]
#[command(version)]
pub struct Cli {
    /// Coupon listing endpoint to fetch from
    #[arg(long, value_name = "URL", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Directory for the persisted coupon snapshot (defaults to the
    /// platform cache directory)
    #[arg(long, value_name = "PATH")]
    pub cache_dir: Option<PathBuf>,

    /// Enable verbose diagnostics logging
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List coupons from the cache
    List {
        /// Only show coupons that are currently available
        #[arg(long)]
        available: bool,
    },
    /// Check whether a coupon code applies to an order amount
    Check {
        /// The redemption code to look up
        code: String,
        /// The order amount to check against
        #[arg(long, value_name = "AMOUNT")]
        amount: String,
    },
    /// Force a reload from the remote source, bypassing the fresh snapshot
    Refresh,
    /// Delete the persisted snapshot and reset state
    Clear,
}

/// Parses an order amount argument into a positive finite number.
///
/// # Arguments
/// * `s` - The amount string from the CLI
///
/// # Returns
/// * `Ok(f64)` if the string is a positive finite number
/// * `Err(CliError::InvalidAmount)` otherwise
pub fn parse_amount_arg(s: &str) -> Result<f64, CliError> {
    s.parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite() && *amount > 0.0)
        .ok_or_else(|| CliError::InvalidAmount(s.to_string()))
}
