//! Dynamic pricing and quoting engine for the car rental marketplace.

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod pricing;

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::cache::AppCache;
use crate::clock::Clock;
use crate::config::Config;
use crate::error::Result;
use crate::pricing::sources::{
    BookingQuoteSource, CarDirectory, DemandSource, EventSource, PricingHistorySink,
    RegionSource, RenterHistory, ValuationSource,
};
use crate::pricing::{
    BatchPricer, BookingQuoter, DemandTracker, DistanceFeeCalculator, EventOverlay,
    PriceCalculator, RegionCatalog, Valuator,
};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<RegionCatalog>,
    pub calculator: Arc<PriceCalculator>,
    pub batch: BatchPricer,
    pub bookings: BookingQuoter,
    pub valuator: Valuator,
    pub distance: DistanceFeeCalculator,
    pub history: Arc<dyn PricingHistorySink>,
    pub cache: AppCache,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Wire every component to one store implementing all sources
    pub fn build<S>(store: Arc<S>, config: &Config, clock: Arc<dyn Clock>) -> Result<Self>
    where
        S: RegionSource
            + DemandSource
            + EventSource
            + RenterHistory
            + CarDirectory
            + BookingQuoteSource
            + ValuationSource
            + PricingHistorySink
            + 'static,
    {
        let distance = DistanceFeeCalculator::new(config.distance.clone())?;
        let cache = AppCache::new();

        let catalog = Arc::new(RegionCatalog::with_ttl(
            store.clone(),
            clock.clone(),
            config.pricing.region_cache_ttl,
        ));
        let calculator = Arc::new(PriceCalculator::new(
            catalog.clone(),
            DemandTracker::new(store.clone()),
            EventOverlay::new(store.clone()),
            store.clone(),
            config.pricing.clone(),
        ));

        Ok(Self {
            batch: BatchPricer::new(calculator.clone(), clock.clone()),
            bookings: BookingQuoter::new(store.clone(), store.clone(), distance.clone()),
            valuator: Valuator::new(store.clone(), cache.clone()),
            history: store,
            catalog,
            calculator,
            distance,
            cache,
            clock,
        })
    }
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "regions_fresh": state.catalog.is_fresh().await,
        "cache": state.cache.stats(),
    }))
}

/// Full application router
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/pricing", pricing::router())
        .with_state(state)
}
