//! End-to-end tests of the coupon cache through the public API
//!
//! Exercises the full degradation ladder (live data, persisted snapshot,
//! static fallback) and snapshot sharing across cache instances, using a
//! scripted source and stores from the library itself. No live network.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use couponcache::cache::{FileStore, MemoryStore, SnapshotStore};
use couponcache::manager::{CacheConfig, CouponCache};
use couponcache::source::{CouponSource, RawPayload, SourceError};

const COUPON_BODY: &str = r#"[
    {"id":"c1","code":"TEN","title":"Ten percent","discount":10.0,
     "discountType":"percentage","validFrom":"2020-01-01T00:00:00Z",
     "validTo":"2099-01-01T00:00:00Z","isActive":true,"minAmount":100.0}
]"#;

/// Scripted source: serves a fixed body while healthy, transport errors when
/// not, and counts every call
struct FlakySource {
    healthy: std::sync::atomic::AtomicBool,
    calls: AtomicUsize,
}

impl FlakySource {
    fn new(healthy: bool) -> Self {
        Self {
            healthy: std::sync::atomic::AtomicBool::new(healthy),
            calls: AtomicUsize::new(0),
        }
    }

    fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CouponSource for FlakySource {
    async fn fetch(&self) -> Result<RawPayload, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.healthy.load(Ordering::SeqCst) {
            Ok(RawPayload {
                status: 200,
                content_type: Some("application/json".to_string()),
                body: COUPON_BODY.to_string(),
            })
        } else {
            Err(SourceError::Transport("connection refused".to_string()))
        }
    }
}

fn fast_config() -> CacheConfig {
    CacheConfig {
        retry_delay: Duration::from_millis(1),
        ..CacheConfig::default()
    }
}

#[tokio::test]
async fn test_degradation_ladder_live_then_cached_then_static() {
    let source = Arc::new(FlakySource::new(true));
    let store = Arc::new(MemoryStore::new());
    let cache = CouponCache::with_config(source.clone(), store.clone(), fast_config());

    // Tier 1: live data.
    let live = cache.load_coupons().await;
    assert!(!live.fallback_mode);
    assert_eq!(live.coupons.len(), 1);

    // Tier 2: source goes down; a forced reload degrades to the snapshot
    // written by the successful load.
    source.set_healthy(false);
    let cached = cache.reload().await;
    assert!(cached.fallback_mode);
    assert_eq!(cached.coupons, live.coupons);
    assert_eq!(cached.error.as_deref(), Some("using cached coupon data"));

    // Tier 3: with the snapshot gone, only the static list remains.
    cache.clear_cache();
    let static_fallback = cache.load_coupons().await;
    assert!(static_fallback.fallback_mode);
    assert!(static_fallback
        .coupons
        .iter()
        .any(|c| c.code == "WELCOME10"));
    let error = static_fallback.error.expect("fallback must carry an error");
    assert!(error.starts_with("network error"), "unexpected error: {}", error);
}

#[tokio::test]
async fn test_second_instance_reads_first_instances_snapshot() {
    let store = Arc::new(MemoryStore::new());

    let writer = CouponCache::with_config(
        Arc::new(FlakySource::new(true)),
        store.clone(),
        fast_config(),
    );
    let written = writer.load_coupons().await;
    assert!(!written.fallback_mode);

    // A second instance over the same store with a dead source still serves
    // the first instance's coupons.
    let reader_source = Arc::new(FlakySource::new(false));
    let reader = CouponCache::with_config(reader_source.clone(), store, fast_config());
    let read = reader.load_coupons().await;

    assert_eq!(read.coupons, written.coupons);
    assert!(!read.fallback_mode, "fresh shared snapshot is not fallback");
    assert_eq!(
        reader_source.call_count(),
        0,
        "fresh snapshot must short-circuit the source"
    );
}

#[tokio::test]
async fn test_sequential_loads_within_timeout_fetch_once() {
    let source = Arc::new(FlakySource::new(true));
    let cache = CouponCache::with_config(source.clone(), MemoryStore::new(), fast_config());

    cache.load_coupons().await;
    cache.load_coupons().await;
    cache.load_coupons().await;

    assert_eq!(source.call_count(), 1);
}

#[tokio::test]
async fn test_reload_failure_keeps_snapshot_for_later_loads() {
    let source = Arc::new(FlakySource::new(true));
    let store = Arc::new(MemoryStore::new());
    let cache = CouponCache::with_config(source.clone(), store.clone(), fast_config());

    cache.load_coupons().await;
    assert!(store.get("coupons").is_some());

    // A failed forced reload must not delete the persisted snapshot.
    source.set_healthy(false);
    let degraded = cache.reload().await;
    assert!(degraded.fallback_mode);
    assert!(store.get("coupons").is_some(), "snapshot must survive a failed reload");
}

#[tokio::test]
async fn test_file_store_snapshot_survives_cache_instances() {
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp directory");

    {
        let cache = CouponCache::with_config(
            Arc::new(FlakySource::new(true)),
            FileStore::with_dir(temp_dir.path().to_path_buf()),
            fast_config(),
        );
        let state = cache.load_coupons().await;
        assert!(!state.fallback_mode);
    }

    // A brand-new instance over the same directory, with a dead source,
    // comes up serving the persisted coupons.
    let revived = CouponCache::with_config(
        Arc::new(FlakySource::new(false)),
        FileStore::with_dir(temp_dir.path().to_path_buf()),
        fast_config(),
    );
    let state = revived.load_coupons().await;
    assert_eq!(state.coupons.len(), 1);
    assert_eq!(state.coupons[0].code, "TEN");
}

#[tokio::test]
async fn test_state_accessor_matches_last_load() {
    let cache = CouponCache::with_config(
        Arc::new(FlakySource::new(true)),
        MemoryStore::new(),
        fast_config(),
    );

    let loaded = cache.load_coupons().await;
    let observed = cache.state();

    assert_eq!(observed, loaded);
    assert!(!observed.is_loading);
}
