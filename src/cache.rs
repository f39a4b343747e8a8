//! In-memory caching using moka
//!
//! Vehicle categories change only when the catalog is edited, so they are
//! cached aggressively. Regions have their own TTL snapshot in
//! `pricing::regions`; the warmer below keeps both hot.

use moka::future::Cache;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{info, warn};

use crate::pricing::models::VehicleCategory;
use crate::AppState;

const CATEGORIES_KEY: &str = "vehicle_categories";

/// Application cache holding slow-moving reference data
#[derive(Clone)]
pub struct AppCache {
    /// Active vehicle categories (singleton)
    pub categories: Cache<String, Arc<Vec<VehicleCategory>>>,
}

impl AppCache {
    /// Create a new cache instance with configured TTLs
    pub fn new() -> Self {
        Self {
            // Categories: 1 entry, 1 hour TTL
            categories: Cache::builder()
                .max_capacity(1)
                .time_to_live(Duration::from_secs(60 * 60))
                .build(),
        }
    }

    pub fn categories_key() -> String {
        CATEGORIES_KEY.to_string()
    }

    /// Get cache statistics for monitoring
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            categories_cached: self.categories.entry_count() > 0,
        }
    }
}

impl Default for AppCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics for monitoring endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub categories_cached: bool,
}

/// Start background cache warmer
///
/// Warms the caches on startup and refreshes them every `every`.
pub async fn start_cache_warmer(state: AppState, every: Duration) {
    let mut interval = interval(every);
    loop {
        // First tick fires immediately
        interval.tick().await;
        warm_cache(&state).await;
    }
}

/// Reload regions and categories
pub async fn warm_cache(state: &AppState) {
    info!("Starting cache warm-up...");

    // A failed reload keeps the current list serving
    match state.catalog.refresh().await {
        Ok(regions) => info!(count = regions.len(), "Region catalog warmed"),
        Err(e) => warn!("Failed to warm region catalog: {}", e),
    }

    if let Err(e) = state.valuator.refresh_categories().await {
        warn!("Failed to warm categories cache: {}", e);
    }

    info!("Cache warm-up complete. Stats: {:?}", state.cache.stats());
}
