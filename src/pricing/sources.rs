//! Data sources the pricing engine reads from.
//!
//! Services depend on these traits rather than on a pool so every
//! component can be wired with the Postgres store in production and with
//! in-memory fakes in tests.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, Result};

use super::models::{
    BookingQuoteRow, CarLocation, DemandSnapshot, PricingRegion, SpecialEvent, VehicleCategory,
    VehicleValueRow,
};
use super::queries;
use super::requests::PricingRequest;
use super::responses::PricingResponse;

#[async_trait]
pub trait RegionSource: Send + Sync {
    /// Active regions sorted by name
    async fn fetch_active_regions(&self) -> Result<Vec<PricingRegion>>;
}

#[async_trait]
pub trait DemandSource: Send + Sync {
    async fn latest_snapshot(&self, region_id: Uuid) -> Result<Option<DemandSnapshot>>;
}

#[async_trait]
pub trait EventSource: Send + Sync {
    /// Events touching any local calendar day in `first_day..=last_day`
    async fn events_in_window(
        &self,
        region_id: Uuid,
        first_day: NaiveDate,
        last_day: NaiveDate,
    ) -> Result<Vec<SpecialEvent>>;
}

#[async_trait]
pub trait RenterHistory: Send + Sync {
    async fn completed_rentals(&self, user_id: Uuid) -> Result<i64>;
}

#[async_trait]
pub trait CarDirectory: Send + Sync {
    async fn car_location(&self, car_id: Uuid) -> Result<Option<CarLocation>>;
}

#[async_trait]
pub trait BookingQuoteSource: Send + Sync {
    async fn base_quote(
        &self,
        car_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        promo_code: Option<&str>,
    ) -> Result<Option<BookingQuoteRow>>;
}

#[async_trait]
pub trait ValuationSource: Send + Sync {
    async fn estimate_vehicle_value(
        &self,
        brand: &str,
        model: &str,
        year: i32,
    ) -> Result<Option<VehicleValueRow>>;

    async fn vehicle_categories(&self) -> Result<Vec<VehicleCategory>>;
}

#[async_trait]
pub trait PricingHistorySink: Send + Sync {
    async fn record_quote(
        &self,
        user_id: Option<Uuid>,
        request: &PricingRequest,
        response: &PricingResponse,
    ) -> Result<()>;
}

/// Postgres-backed implementation of every source
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Database failures surface as backend outages to the engine
fn backend(err: AppError) -> AppError {
    match err {
        AppError::Database(e) => AppError::BackendUnavailable(e.to_string()),
        other => other,
    }
}

#[async_trait]
impl RegionSource for PgStore {
    async fn fetch_active_regions(&self) -> Result<Vec<PricingRegion>> {
        queries::get_active_regions(&self.pool).await.map_err(backend)
    }
}

#[async_trait]
impl DemandSource for PgStore {
    async fn latest_snapshot(&self, region_id: Uuid) -> Result<Option<DemandSnapshot>> {
        queries::get_latest_demand_snapshot(&self.pool, region_id)
            .await
            .map_err(backend)
    }
}

#[async_trait]
impl EventSource for PgStore {
    async fn events_in_window(
        &self,
        region_id: Uuid,
        first_day: NaiveDate,
        last_day: NaiveDate,
    ) -> Result<Vec<SpecialEvent>> {
        queries::find_overlapping_events(&self.pool, region_id, first_day, last_day)
            .await
            .map_err(backend)
    }
}

#[async_trait]
impl RenterHistory for PgStore {
    async fn completed_rentals(&self, user_id: Uuid) -> Result<i64> {
        queries::count_completed_rentals(&self.pool, user_id)
            .await
            .map_err(backend)
    }
}

#[async_trait]
impl CarDirectory for PgStore {
    async fn car_location(&self, car_id: Uuid) -> Result<Option<CarLocation>> {
        queries::get_car_location(&self.pool, car_id)
            .await
            .map_err(backend)
    }
}

#[async_trait]
impl BookingQuoteSource for PgStore {
    async fn base_quote(
        &self,
        car_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        promo_code: Option<&str>,
    ) -> Result<Option<BookingQuoteRow>> {
        queries::quote_booking(&self.pool, car_id, start, end, promo_code)
            .await
            .map_err(backend)
    }
}

#[async_trait]
impl ValuationSource for PgStore {
    async fn estimate_vehicle_value(
        &self,
        brand: &str,
        model: &str,
        year: i32,
    ) -> Result<Option<VehicleValueRow>> {
        queries::estimate_vehicle_value(&self.pool, brand, model, year)
            .await
            .map_err(backend)
    }

    async fn vehicle_categories(&self) -> Result<Vec<VehicleCategory>> {
        queries::get_vehicle_categories(&self.pool)
            .await
            .map_err(backend)
    }
}

#[async_trait]
impl PricingHistorySink for PgStore {
    async fn record_quote(
        &self,
        user_id: Option<Uuid>,
        request: &PricingRequest,
        response: &PricingResponse,
    ) -> Result<()> {
        queries::insert_pricing_history(&self.pool, user_id, request, response)
            .await
            .map_err(backend)
    }
}
