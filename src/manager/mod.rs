//! Coupon cache manager
//!
//! `CouponCache` owns the lifecycle of coupon data: fetch-with-retry from a
//! remote source, validation of the raw payload, persistence of a snapshot
//! to a durable store, and graceful degradation through three tiers when the
//! source misbehaves: live data, then any persisted snapshot (even an
//! expired one), then a static built-in list.

pub mod validate;

use chrono::Utc;
use log::{debug, warn};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex as AsyncMutex;

use crate::cache::{CacheSnapshot, SnapshotStore};
use crate::data::{default_fallback_coupons, Coupon, ManagerState};
use crate::source::{CouponSource, SourceError};

/// Store key under which the coupon snapshot is persisted
const SNAPSHOT_KEY: &str = "coupons";

/// Configuration for a `CouponCache`
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long a persisted snapshot is considered fresh
    pub cache_timeout: Duration,
    /// Retry attempts after the first failed fetch
    pub max_retries: u32,
    /// Base delay between retries, scaled linearly per attempt
    pub retry_delay: Duration,
    /// Static last-resort coupon list
    pub fallback_coupons: Vec<Coupon>,
    /// Emit verbose debug logging; never affects behavior or outputs
    pub enable_diagnostics: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_timeout: Duration::from_secs(300), // 5 minutes
            max_retries: 2,
            retry_delay: Duration::from_millis(300),
            fallback_coupons: default_fallback_coupons(),
            enable_diagnostics: false,
        }
    }
}

/// Classified failure of one fetch attempt
///
/// Never escapes the public load operations; the final failure is folded
/// into `ManagerState::error` with `fallback_mode` set.
#[derive(Debug, Error)]
pub enum FetchFailure {
    /// The source answered, but not with usable JSON (typically an HTML
    /// error page served behind a misconfigured gateway)
    #[error("coupon service temporarily unavailable: {0}")]
    Service(String),

    /// Transport-level failure (connection refused, timeout, DNS)
    #[error("network error while loading coupon data: {0}")]
    Network(String),

    /// The body claimed to be JSON but did not parse
    #[error("coupon data format error: {0}")]
    Format(String),
}

impl FetchFailure {
    /// Format errors fail fast: retrying an unchanging malformed payload
    /// cannot succeed, so only service and network failures consume the
    /// retry budget.
    fn is_retryable(&self) -> bool {
        !matches!(self, Self::Format(_))
    }
}

/// Phases of one load's fetch sequence
///
/// The loop in `run_fetch` steps through these with a bounded attempt
/// counter, which keeps the retry accounting explicit and testable.
enum FetchPhase {
    /// About to call the source; `attempts` counts completed calls so far
    Fetching { attempts: u32 },
    /// Waiting out the delay before attempt number `attempts + 1`
    RetryWait { attempts: u32 },
    /// Retries exhausted (or failure not retryable); degrade
    Fallback { attempts: u32, failure: FetchFailure },
    /// Terminal state carrying the result
    Done(ManagerState),
}

/// An always-available, best-effort-fresh coupon cache
///
/// The source and store are injected at construction, so tests can swap in
/// scripted fakes and two instances can share one persisted snapshot through
/// a common store. All state lives behind interior mutability; every public
/// accessor returns an owned copy.
pub struct CouponCache<S, P> {
    source: S,
    store: P,
    config: CacheConfig,
    state: Mutex<ManagerState>,
    /// Serializes loads so overlapping callers coalesce onto one fetch
    load_guard: AsyncMutex<()>,
}

impl<S: CouponSource, P: SnapshotStore> CouponCache<S, P> {
    /// Creates a cache with the default configuration
    pub fn new(source: S, store: P) -> Self {
        Self::with_config(source, store, CacheConfig::default())
    }

    /// Creates a cache with a custom configuration
    pub fn with_config(source: S, store: P, config: CacheConfig) -> Self {
        Self {
            source,
            store,
            config,
            state: Mutex::new(ManagerState::default()),
            load_guard: AsyncMutex::new(()),
        }
    }

    /// Loads the coupon list, serving from the persisted snapshot when it is
    /// still fresh and falling back through cached and static tiers when the
    /// source is degraded. Never returns an error; failures are represented
    /// in the returned state.
    pub async fn load_coupons(&self) -> ManagerState {
        self.load(false).await
    }

    /// Forces a fetch from the source even if a fresh snapshot exists.
    ///
    /// The persisted snapshot is left in place, so a failed reload can still
    /// degrade to it.
    pub async fn reload(&self) -> ManagerState {
        self.load(true).await
    }

    /// Deletes the persisted snapshot and resets the in-memory state to its
    /// construction-time value. Synchronous and infallible.
    pub fn clear_cache(&self) {
        self.store.remove(SNAPSHOT_KEY);
        *self.state_guard() = ManagerState::default();
    }

    /// Returns a copy of the last computed state
    ///
    /// Callers observing mid-flight will see `is_loading == true`; states
    /// returned from the load operations themselves never do.
    pub fn state(&self) -> ManagerState {
        self.state_guard().clone()
    }

    /// Coupons from the current state that are active and inside their
    /// validity window right now
    pub fn available_coupons(&self) -> Vec<Coupon> {
        let now = Utc::now();
        self.state_guard()
            .coupons
            .iter()
            .filter(|coupon| coupon.is_available(now))
            .cloned()
            .collect()
    }

    /// Available coupons whose minimum-amount constraint (if any) is met by
    /// `amount`
    pub fn applicable_coupons(&self, amount: f64) -> Vec<Coupon> {
        let now = Utc::now();
        self.state_guard()
            .coupons
            .iter()
            .filter(|coupon| coupon.is_applicable(amount, now))
            .cloned()
            .collect()
    }

    /// Discount the coupon grants on `amount` right now; zero when the
    /// coupon is not applicable, never negative, never above `amount`
    pub fn calculate_discount(&self, coupon: &Coupon, amount: f64) -> f64 {
        coupon.discount_for(amount, Utc::now())
    }

    async fn load(&self, force: bool) -> ManagerState {
        // Overlapping loads queue here; whoever arrives second re-checks
        // freshness below and is served from the snapshot the first caller
        // just wrote, so one burst of callers costs one source call.
        let _guard = self.load_guard.lock().await;

        if !force {
            if let Some(snapshot) = self.read_snapshot() {
                if !snapshot.is_expired(self.cache_timeout(), Utc::now()) {
                    if self.config.enable_diagnostics {
                        debug!(
                            "serving {} coupons from fresh snapshot",
                            snapshot.coupons.len()
                        );
                    }
                    let state = ManagerState {
                        coupons: snapshot.coupons,
                        ..ManagerState::default()
                    };
                    *self.state_guard() = state.clone();
                    return state;
                }
            }
        }

        self.state_guard().is_loading = true;
        let state = self.run_fetch().await;
        *self.state_guard() = state.clone();
        state
    }

    /// Drives the fetch state machine to completion
    async fn run_fetch(&self) -> ManagerState {
        let mut phase = FetchPhase::Fetching { attempts: 0 };
        loop {
            phase = match phase {
                FetchPhase::Fetching { attempts } => match self.fetch_once().await {
                    Ok(coupons) => {
                        self.persist(&coupons);
                        FetchPhase::Done(ManagerState {
                            coupons,
                            retry_count: attempts,
                            ..ManagerState::default()
                        })
                    }
                    Err(failure) => {
                        let attempts = attempts + 1;
                        if failure.is_retryable() && attempts <= self.config.max_retries {
                            if self.config.enable_diagnostics {
                                debug!("fetch attempt {} failed: {}", attempts, failure);
                            }
                            FetchPhase::RetryWait { attempts }
                        } else {
                            FetchPhase::Fallback { attempts, failure }
                        }
                    }
                },
                FetchPhase::RetryWait { attempts } => {
                    tokio::time::sleep(self.config.retry_delay * attempts).await;
                    FetchPhase::Fetching { attempts }
                }
                FetchPhase::Fallback { attempts, failure } => {
                    FetchPhase::Done(self.fallback_state(attempts, &failure))
                }
                FetchPhase::Done(state) => return state,
            };
        }
    }

    /// Performs one source call and classifies the outcome
    async fn fetch_once(&self) -> Result<Vec<Coupon>, FetchFailure> {
        let payload = self.source.fetch().await.map_err(|err| match err {
            SourceError::Transport(detail) => FetchFailure::Network(detail),
        })?;

        if !payload.is_success() {
            return Err(FetchFailure::Service(format!(
                "status {}",
                payload.status
            )));
        }
        if !payload.looks_like_json() {
            return Err(FetchFailure::Service(
                "non-JSON response body".to_string(),
            ));
        }

        let value: serde_json::Value = serde_json::from_str(&payload.body)
            .map_err(|err| FetchFailure::Format(err.to_string()))?;

        let report = validate::validate_payload(&value);
        if self.config.enable_diagnostics {
            debug!(
                "validated {} of {} coupon records ({} rejected)",
                report.coupons.len(),
                report.total(),
                report.rejected.len()
            );
        }
        Ok(report.coupons)
    }

    /// Builds the degraded state after retries are exhausted
    ///
    /// A persisted snapshot wins over the static list even when expired;
    /// the static list is served only when no snapshot exists at all.
    fn fallback_state(&self, attempts: u32, failure: &FetchFailure) -> ManagerState {
        if let Some(snapshot) = self.read_snapshot() {
            if self.config.enable_diagnostics {
                debug!("source unavailable, serving stale snapshot: {}", failure);
            }
            return ManagerState {
                coupons: snapshot.coupons,
                error: Some("using cached coupon data".to_string()),
                fallback_mode: true,
                retry_count: attempts,
                ..ManagerState::default()
            };
        }

        ManagerState {
            coupons: self.config.fallback_coupons.clone(),
            error: Some(failure.to_string()),
            fallback_mode: true,
            retry_count: attempts,
            ..ManagerState::default()
        }
    }

    fn read_snapshot(&self) -> Option<CacheSnapshot> {
        let raw = self.store.get(SNAPSHOT_KEY)?;
        serde_json::from_str(&raw).ok()
    }

    fn persist(&self, coupons: &[Coupon]) {
        let snapshot = CacheSnapshot::new(coupons.to_vec());
        match serde_json::to_string(&snapshot) {
            Ok(json) => {
                if let Err(err) = self.store.set(SNAPSHOT_KEY, &json) {
                    warn!("failed to persist coupon snapshot: {}", err);
                }
            }
            Err(err) => warn!("failed to serialize coupon snapshot: {}", err),
        }
    }

    fn cache_timeout(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.config.cache_timeout)
            .unwrap_or(chrono::Duration::MAX)
    }

    fn state_guard(&self) -> MutexGuard<'_, ManagerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
