//! Coupon Cache CLI - look up coupons through a fallback-aware cache
//!
//! A command-line front end over the coupon cache library. All caching,
//! retry, and fallback behavior lives in the library; this binary only
//! parses arguments, builds the cache, and formats results.

use std::process::ExitCode;

use clap::Parser;

use couponcache::cache::FileStore;
use couponcache::cli::{parse_amount_arg, Cli, Command};
use couponcache::data::{Coupon, DiscountType, ManagerState};
use couponcache::manager::{CacheConfig, CouponCache};
use couponcache::source::HttpCouponSource;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_default_env();
    if cli.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    let store = match cli.cache_dir.clone() {
        Some(dir) => FileStore::with_dir(dir),
        None => FileStore::new().unwrap_or_else(|| {
            eprintln!("warning: no platform cache directory; using a temporary one");
            FileStore::with_dir(std::env::temp_dir().join("couponcache"))
        }),
    };

    let config = CacheConfig {
        enable_diagnostics: cli.verbose,
        ..CacheConfig::default()
    };
    let cache = CouponCache::with_config(HttpCouponSource::new(&cli.endpoint), store, config);

    match cli.command {
        Command::List { available } => {
            let state = cache.load_coupons().await;
            print_notice(&state);
            let coupons = if available {
                cache.available_coupons()
            } else {
                state.coupons
            };
            print_coupons(&coupons);
            ExitCode::SUCCESS
        }
        Command::Check { code, amount } => {
            let amount = match parse_amount_arg(&amount) {
                Ok(amount) => amount,
                Err(err) => {
                    eprintln!("{}", err);
                    return ExitCode::FAILURE;
                }
            };

            let state = cache.load_coupons().await;
            print_notice(&state);

            let Some(coupon) = state.coupons.iter().find(|c| c.code == code) else {
                eprintln!("coupon code '{}' not found", code);
                return ExitCode::FAILURE;
            };

            if cache.applicable_coupons(amount).iter().any(|c| c.id == coupon.id) {
                let discount = cache.calculate_discount(coupon, amount);
                println!(
                    "{} applies to {:.2}: discount {:.2}, total {:.2}",
                    coupon.code,
                    amount,
                    discount,
                    amount - discount
                );
                ExitCode::SUCCESS
            } else {
                println!("{} does not apply to {:.2}", coupon.code, amount);
                ExitCode::FAILURE
            }
        }
        Command::Refresh => {
            let state = cache.reload().await;
            print_notice(&state);
            println!("loaded {} coupons", state.coupons.len());
            ExitCode::SUCCESS
        }
        Command::Clear => {
            cache.clear_cache();
            println!("coupon cache cleared");
            ExitCode::SUCCESS
        }
    }
}

/// Prints a non-blocking notice when the returned data is not confirmed fresh
fn print_notice(state: &ManagerState) {
    if state.fallback_mode {
        if let Some(error) = &state.error {
            eprintln!("note: {} (data may be stale or limited)", error);
        }
    }
}

/// Prints a one-line summary per coupon
fn print_coupons(coupons: &[Coupon]) {
    if coupons.is_empty() {
        println!("no coupons");
        return;
    }
    for coupon in coupons {
        let discount = match coupon.discount_type {
            DiscountType::Percentage => format!("{}% off", coupon.discount),
            DiscountType::Fixed => format!("{} off", coupon.discount),
        };
        let min = match coupon.min_amount {
            Some(min) => format!(", min {:.2}", min),
            None => String::new(),
        };
        println!(
            "{:<12} {:<10} valid until {}{}  {}",
            coupon.code,
            discount,
            coupon.valid_to.format("%Y-%m-%d"),
            min,
            coupon.title
        );
    }
}
