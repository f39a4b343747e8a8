//! Cached catalog of active pricing regions.
//!
//! The region list and the instant it was fetched live in one immutable
//! snapshot behind an `Arc`. A refresh builds a new snapshot and swaps the
//! pointer, so readers see either the old pair or the new pair, never a mix.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{AppError, Result};

use super::models::PricingRegion;
use super::sources::RegionSource;

/// Default time-to-live of the region list
pub const REGION_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug)]
struct RegionSnapshot {
    regions: Arc<Vec<PricingRegion>>,
    fetched_at: DateTime<Utc>,
}

pub struct RegionCatalog {
    source: Arc<dyn RegionSource>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    snapshot: RwLock<Option<Arc<RegionSnapshot>>>,
    /// Serializes refreshes so concurrent misses share one fetch
    refresh: Mutex<()>,
}

impl RegionCatalog {
    pub fn new(source: Arc<dyn RegionSource>, clock: Arc<dyn Clock>) -> Self {
        Self::with_ttl(source, clock, REGION_CACHE_TTL)
    }

    pub fn with_ttl(source: Arc<dyn RegionSource>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            source,
            clock,
            ttl,
            snapshot: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_snapshot_fresh(&self, snapshot: &RegionSnapshot, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(snapshot.fetched_at);
        match age.to_std() {
            Ok(age) => age < self.ttl,
            // Fetched "in the future" (clock moved back): still fresh
            Err(_) => true,
        }
    }

    async fn current(&self) -> Option<Arc<RegionSnapshot>> {
        self.snapshot.read().await.clone()
    }

    /// Whether a cached list exists and is inside the TTL. No side effects.
    pub async fn is_fresh(&self) -> bool {
        let now = self.clock.now();
        match self.current().await {
            Some(snapshot) => self.is_snapshot_fresh(&snapshot, now),
            None => false,
        }
    }

    /// When the cached list was fetched, if any
    pub async fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.current().await.map(|s| s.fetched_at)
    }

    /// Active regions sorted by name.
    ///
    /// Within the TTL this returns the cached `Arc` without touching the
    /// source. A failed refresh returns the error and keeps the old snapshot.
    #[instrument(skip(self))]
    pub async fn regions(&self) -> Result<Arc<Vec<PricingRegion>>> {
        if let Some(snapshot) = self.current().await {
            if self.is_snapshot_fresh(&snapshot, self.clock.now()) {
                debug!(count = snapshot.regions.len(), "Region cache HIT");
                return Ok(snapshot.regions.clone());
            }
        }

        let _guard = self.refresh.lock().await;

        // Another caller may have refreshed while we waited
        if let Some(snapshot) = self.current().await {
            if self.is_snapshot_fresh(&snapshot, self.clock.now()) {
                debug!("Region cache refreshed by concurrent caller");
                return Ok(snapshot.regions.clone());
            }
        }

        debug!("Region cache MISS, fetching");
        self.fetch_and_swap().await
    }

    /// Refetch now, regardless of the TTL.
    ///
    /// The cached list is replaced only when the fetch succeeds; on failure
    /// the previous list keeps serving.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<Arc<Vec<PricingRegion>>> {
        let _guard = self.refresh.lock().await;
        self.fetch_and_swap().await
    }

    /// Caller must hold `self.refresh`
    async fn fetch_and_swap(&self) -> Result<Arc<Vec<PricingRegion>>> {
        let mut regions = self.source.fetch_active_regions().await.map_err(|e| {
            warn!("Failed to refresh pricing regions: {}", e);
            match e {
                AppError::Database(db) => AppError::BackendUnavailable(db.to_string()),
                other => other,
            }
        })?;
        regions.retain(|r| r.active);
        regions.sort_by(|a, b| a.name.cmp(&b.name));

        let snapshot = Arc::new(RegionSnapshot {
            regions: Arc::new(regions),
            fetched_at: self.clock.now(),
        });
        *self.snapshot.write().await = Some(snapshot.clone());

        info!(count = snapshot.regions.len(), "Pricing regions refreshed");
        Ok(snapshot.regions.clone())
    }

    /// Look up one region; `RegionNotFound` when it is unknown or inactive
    pub async fn region_by_id(&self, region_id: Uuid) -> Result<PricingRegion> {
        let regions = self.regions().await?;
        regions
            .iter()
            .find(|r| r.id == region_id)
            .cloned()
            .ok_or_else(|| AppError::RegionNotFound(region_id.to_string()))
    }

    /// Drop the cached list; the next read refetches
    pub async fn invalidate(&self) {
        *self.snapshot.write().await = None;
        debug!("Region cache invalidated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::testing::{region, ManualClock, MemoryStore};
    use rust_decimal_macros::dec;

    fn catalog(store: &Arc<MemoryStore>, clock: &Arc<ManualClock>) -> RegionCatalog {
        RegionCatalog::new(store.clone(), clock.clone())
    }

    #[tokio::test]
    async fn test_regions_sorted_and_active_only() {
        let store = Arc::new(MemoryStore::default());
        store.add_region(region("Rosario", dec!(90)));
        store.add_region(region("Buenos Aires", dec!(100)));
        let mut closed = region("Mendoza", dec!(80));
        closed.active = false;
        store.add_region(closed);

        let clock = Arc::new(ManualClock::default());
        let regions = catalog(&store, &clock).regions().await.unwrap();

        let names: Vec<&str> = regions.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Buenos Aires", "Rosario"]);
    }

    #[tokio::test]
    async fn test_within_ttl_returns_identical_list_without_fetch() {
        let store = Arc::new(MemoryStore::default());
        store.add_region(region("Buenos Aires", dec!(100)));
        let clock = Arc::new(ManualClock::default());
        let catalog = catalog(&store, &clock);

        let first = catalog.regions().await.unwrap();
        clock.advance(chrono::Duration::seconds(299));
        let second = catalog.regions().await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.region_fetches(), 1);
        assert!(catalog.is_fresh().await);
    }

    #[tokio::test]
    async fn test_expiry_triggers_exactly_one_refresh() {
        let store = Arc::new(MemoryStore::default());
        store.add_region(region("Buenos Aires", dec!(100)));
        let clock = Arc::new(ManualClock::default());
        let catalog = catalog(&store, &clock);

        catalog.regions().await.unwrap();
        clock.advance(chrono::Duration::minutes(5));
        assert!(!catalog.is_fresh().await);

        catalog.regions().await.unwrap();
        catalog.regions().await.unwrap();
        assert_eq!(store.region_fetches(), 2);
        assert_eq!(catalog.last_refreshed().await, Some(clock.now()));
    }

    #[tokio::test]
    async fn test_concurrent_misses_share_one_fetch() {
        let store = Arc::new(MemoryStore::default());
        store.add_region(region("Buenos Aires", dec!(100)));
        let clock = Arc::new(ManualClock::default());
        let catalog = Arc::new(catalog(&store, &clock));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let catalog = catalog.clone();
                tokio::spawn(async move { catalog.regions().await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.region_fetches(), 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_snapshot() {
        let store = Arc::new(MemoryStore::default());
        store.add_region(region("Buenos Aires", dec!(100)));
        let clock = Arc::new(ManualClock::default());
        let catalog = catalog(&store, &clock);

        let first = catalog.regions().await.unwrap();
        let fetched_at = catalog.last_refreshed().await;

        clock.advance(chrono::Duration::minutes(6));
        store.fail_regions(true);
        let err = catalog.regions().await.unwrap_err();
        assert!(matches!(err, AppError::BackendUnavailable(_)));

        // Old pair untouched
        assert_eq!(catalog.last_refreshed().await, fetched_at);

        store.fail_regions(false);
        let refreshed = catalog.regions().await.unwrap();
        assert_eq!(*first, *refreshed);
        assert_eq!(store.region_fetches(), 3);
    }

    #[tokio::test]
    async fn test_forced_refresh_failure_keeps_valid_cache() {
        let store = Arc::new(MemoryStore::default());
        let ba = region("Buenos Aires", dec!(100));
        let ba_id = ba.id;
        store.add_region(ba);
        let clock = Arc::new(ManualClock::default());
        let catalog = catalog(&store, &clock);

        catalog.regions().await.unwrap();
        store.fail_regions(true);
        assert!(catalog.refresh().await.is_err());

        assert!(catalog.is_fresh().await);
        assert_eq!(catalog.region_by_id(ba_id).await.unwrap().name, "Buenos Aires");
        assert_eq!(store.region_fetches(), 2);
    }

    #[tokio::test]
    async fn test_forced_refresh_ignores_ttl() {
        let store = Arc::new(MemoryStore::default());
        store.add_region(region("Buenos Aires", dec!(100)));
        let clock = Arc::new(ManualClock::default());
        let catalog = catalog(&store, &clock);

        let first = catalog.regions().await.unwrap();
        store.add_region(region("Córdoba", dec!(80)));
        let refreshed = catalog.refresh().await.unwrap();

        assert!(!Arc::ptr_eq(&first, &refreshed));
        assert_eq!(refreshed.len(), 2);
        assert_eq!(catalog.regions().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_region_by_id() {
        let store = Arc::new(MemoryStore::default());
        let ba = region("Buenos Aires", dec!(100));
        let ba_id = ba.id;
        store.add_region(ba);
        let clock = Arc::new(ManualClock::default());
        let catalog = catalog(&store, &clock);

        assert_eq!(catalog.region_by_id(ba_id).await.unwrap().name, "Buenos Aires");
        let err = catalog.region_by_id(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::RegionNotFound(_)));
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let store = Arc::new(MemoryStore::default());
        store.add_region(region("Buenos Aires", dec!(100)));
        let clock = Arc::new(ManualClock::default());
        let catalog = catalog(&store, &clock);

        catalog.regions().await.unwrap();
        catalog.invalidate().await;
        assert!(!catalog.is_fresh().await);
        catalog.regions().await.unwrap();
        assert_eq!(store.region_fetches(), 2);
    }
}
