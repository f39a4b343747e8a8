//! In-memory sources and a manual clock for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{AppError, Result};

use super::models::{
    BookingQuoteRow, CarLocation, DemandSnapshot, PricingRegion, SpecialEvent, VehicleCategory,
    VehicleValueRow,
};
use super::requests::PricingRequest;
use super::responses::PricingResponse;
use super::sources::{
    BookingQuoteSource, CarDirectory, DemandSource, EventSource, PricingHistorySink,
    RegionSource, RenterHistory, ValuationSource,
};

/// Region with neutral fuel and inflation, UTC local time
pub fn region(name: &str, base_price_per_hour: Decimal) -> PricingRegion {
    PricingRegion {
        id: Uuid::new_v4(),
        name: name.to_string(),
        country_code: "AR".to_string(),
        currency: "ARS".to_string(),
        base_price_per_hour,
        fuel_cost_multiplier: Decimal::ONE,
        inflation_rate: Decimal::ZERO,
        active: true,
        utc_offset_minutes: 0,
    }
}

pub fn snapshot_at(
    region_id: Uuid,
    demand_ratio: f64,
    surge_factor: f64,
    timestamp: DateTime<Utc>,
) -> DemandSnapshot {
    DemandSnapshot {
        region_id,
        available_cars: 10,
        active_bookings: 5,
        pending_requests: 5,
        demand_ratio,
        surge_factor,
        timestamp,
    }
}

pub fn event(region_id: Uuid, start_date: NaiveDate, end_date: NaiveDate, factor: f64) -> SpecialEvent {
    SpecialEvent {
        id: Uuid::new_v4(),
        region_id,
        name: "Carnaval".to_string(),
        start_date,
        end_date,
        factor,
        active: true,
    }
}

/// Clock that only moves when told to.
///
/// Starts on Wednesday 2025-03-05 12:00 UTC: weekday, off-peak.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::at(Utc.with_ymd_and_hms(2025, 3, 5, 12, 0, 0).unwrap())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Quote recorded through [`PricingHistorySink`]
#[derive(Debug, Clone)]
pub struct RecordedQuote {
    pub user_id: Option<Uuid>,
    pub region_id: Uuid,
    pub total_price: Decimal,
}

/// Every source trait backed by plain collections, with failure switches
/// and call counters.
#[derive(Default)]
pub struct MemoryStore {
    regions: Mutex<Vec<PricingRegion>>,
    snapshots: Mutex<Vec<DemandSnapshot>>,
    events: Mutex<Vec<SpecialEvent>>,
    rentals: Mutex<HashMap<Uuid, i64>>,
    cars: Mutex<HashMap<Uuid, CarLocation>>,
    quotes: Mutex<HashMap<Uuid, BookingQuoteRow>>,
    categories: Mutex<Vec<VehicleCategory>>,
    valuations: Mutex<HashMap<(String, String, i32), VehicleValueRow>>,
    history: Mutex<Vec<RecordedQuote>>,

    fail_regions: AtomicBool,
    fail_demand: AtomicBool,
    fail_events: AtomicBool,
    fail_rentals: AtomicBool,
    fail_history: AtomicBool,
    fail_cars: AtomicBool,
    fail_categories: AtomicBool,

    region_fetches: AtomicUsize,
    category_fetches: AtomicUsize,
    demand_in_flight: AtomicUsize,
    demand_peak: AtomicUsize,
}

fn outage(what: &str) -> AppError {
    AppError::BackendUnavailable(format!("{} store offline", what))
}

impl MemoryStore {
    pub fn add_region(&self, region: PricingRegion) {
        self.regions.lock().unwrap().push(region);
    }

    pub fn add_snapshot(&self, snapshot: DemandSnapshot) {
        self.snapshots.lock().unwrap().push(snapshot);
    }

    pub fn add_event(&self, event: SpecialEvent) {
        self.events.lock().unwrap().push(event);
    }

    pub fn set_rentals(&self, user_id: Uuid, completed: i64) {
        self.rentals.lock().unwrap().insert(user_id, completed);
    }

    pub fn add_car(&self, car: CarLocation) {
        self.cars.lock().unwrap().insert(car.id, car);
    }

    pub fn set_base_quote(&self, car_id: Uuid, quote: BookingQuoteRow) {
        self.quotes.lock().unwrap().insert(car_id, quote);
    }

    pub fn add_category(&self, category: VehicleCategory) {
        self.categories.lock().unwrap().push(category);
    }

    pub fn set_valuation(&self, brand: &str, model: &str, year: i32, row: VehicleValueRow) {
        self.valuations
            .lock()
            .unwrap()
            .insert((brand.to_lowercase(), model.to_lowercase(), year), row);
    }

    pub fn fail_regions(&self, fail: bool) {
        self.fail_regions.store(fail, Ordering::SeqCst);
    }

    pub fn fail_demand(&self, fail: bool) {
        self.fail_demand.store(fail, Ordering::SeqCst);
    }

    pub fn fail_events(&self, fail: bool) {
        self.fail_events.store(fail, Ordering::SeqCst);
    }

    pub fn fail_rentals(&self, fail: bool) {
        self.fail_rentals.store(fail, Ordering::SeqCst);
    }

    pub fn fail_history(&self, fail: bool) {
        self.fail_history.store(fail, Ordering::SeqCst);
    }

    pub fn fail_cars(&self, fail: bool) {
        self.fail_cars.store(fail, Ordering::SeqCst);
    }

    pub fn fail_categories(&self, fail: bool) {
        self.fail_categories.store(fail, Ordering::SeqCst);
    }

    /// Most demand lookups ever running at once
    pub fn peak_demand_lookups(&self) -> usize {
        self.demand_peak.load(Ordering::SeqCst)
    }

    pub fn region_fetches(&self) -> usize {
        self.region_fetches.load(Ordering::SeqCst)
    }

    pub fn category_fetches(&self) -> usize {
        self.category_fetches.load(Ordering::SeqCst)
    }

    pub fn recorded_quotes(&self) -> Vec<RecordedQuote> {
        self.history.lock().unwrap().clone()
    }
}

#[async_trait]
impl RegionSource for MemoryStore {
    async fn fetch_active_regions(&self) -> Result<Vec<PricingRegion>> {
        self.region_fetches.fetch_add(1, Ordering::SeqCst);
        // Give concurrent callers a chance to pile up behind the refresh
        tokio::task::yield_now().await;
        if self.fail_regions.load(Ordering::SeqCst) {
            return Err(outage("region"));
        }
        Ok(self.regions.lock().unwrap().clone())
    }
}

#[async_trait]
impl DemandSource for MemoryStore {
    async fn latest_snapshot(&self, region_id: Uuid) -> Result<Option<DemandSnapshot>> {
        let running = self.demand_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.demand_peak.fetch_max(running, Ordering::SeqCst);
        // Hold the slot across a few polls so overlapping lookups show up
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        self.demand_in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_demand.load(Ordering::SeqCst) {
            return Err(outage("demand"));
        }
        Ok(self
            .snapshots
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.region_id == region_id)
            .max_by_key(|s| s.timestamp)
            .cloned())
    }
}

#[async_trait]
impl EventSource for MemoryStore {
    async fn events_in_window(
        &self,
        _region_id: Uuid,
        _first_day: NaiveDate,
        _last_day: NaiveDate,
    ) -> Result<Vec<SpecialEvent>> {
        if self.fail_events.load(Ordering::SeqCst) {
            return Err(outage("event"));
        }
        // Unfiltered on purpose: the overlay owns the window logic
        Ok(self.events.lock().unwrap().clone())
    }
}

#[async_trait]
impl RenterHistory for MemoryStore {
    async fn completed_rentals(&self, user_id: Uuid) -> Result<i64> {
        if self.fail_rentals.load(Ordering::SeqCst) {
            return Err(outage("rental history"));
        }
        Ok(self.rentals.lock().unwrap().get(&user_id).copied().unwrap_or(0))
    }
}

#[async_trait]
impl CarDirectory for MemoryStore {
    async fn car_location(&self, car_id: Uuid) -> Result<Option<CarLocation>> {
        if self.fail_cars.load(Ordering::SeqCst) {
            return Err(outage("car"));
        }
        Ok(self.cars.lock().unwrap().get(&car_id).cloned())
    }
}

#[async_trait]
impl BookingQuoteSource for MemoryStore {
    async fn base_quote(
        &self,
        car_id: Uuid,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
        _promo_code: Option<&str>,
    ) -> Result<Option<BookingQuoteRow>> {
        Ok(self.quotes.lock().unwrap().get(&car_id).cloned())
    }
}

#[async_trait]
impl ValuationSource for MemoryStore {
    async fn estimate_vehicle_value(
        &self,
        brand: &str,
        model: &str,
        year: i32,
    ) -> Result<Option<VehicleValueRow>> {
        let key = (brand.to_lowercase(), model.to_lowercase(), year);
        Ok(self.valuations.lock().unwrap().get(&key).cloned())
    }

    async fn vehicle_categories(&self) -> Result<Vec<VehicleCategory>> {
        self.category_fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_categories.load(Ordering::SeqCst) {
            return Err(outage("category"));
        }
        Ok(self.categories.lock().unwrap().clone())
    }
}

#[async_trait]
impl PricingHistorySink for MemoryStore {
    async fn record_quote(
        &self,
        user_id: Option<Uuid>,
        request: &PricingRequest,
        response: &PricingResponse,
    ) -> Result<()> {
        if self.fail_history.load(Ordering::SeqCst) {
            return Err(outage("history"));
        }
        self.history.lock().unwrap().push(RecordedQuote {
            user_id,
            region_id: request.region_id,
            total_price: response.total_price,
        });
        Ok(())
    }
}
