//! Database models for pricing queries.
//!
//! These models use sqlx's FromRow derive for direct database deserialization.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Demand ratio reported when a region has demand but no available cars
pub const MAX_DEMAND_RATIO: f64 = 10.0;

/// Pricing region from pricing_regions
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct PricingRegion {
    pub id: Uuid,
    pub name: String,
    pub country_code: String,
    pub currency: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub base_price_per_hour: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub fuel_cost_multiplier: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub inflation_rate: Decimal,
    pub active: bool,
    /// Offset of the region's local time from UTC
    pub utc_offset_minutes: i32,
}

impl PricingRegion {
    /// Base hourly price adjusted for fuel cost and inflation, before surge.
    pub fn adjusted_base_price(&self) -> Decimal {
        self.base_price_per_hour * self.fuel_cost_multiplier * (Decimal::ONE + self.inflation_rate)
    }

    /// Convert a UTC instant to the region's wall clock.
    pub fn local_time(&self, at: DateTime<Utc>) -> DateTime<FixedOffset> {
        let offset =
            FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix());
        at.with_timezone(&offset)
    }
}

/// Demand snapshot from pricing_demand_snapshots
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct DemandSnapshot {
    pub region_id: Uuid,
    pub available_cars: i32,
    pub active_bookings: i32,
    pub pending_requests: i32,
    pub demand_ratio: f64,
    pub surge_factor: f64,
    pub timestamp: DateTime<Utc>,
}

impl DemandSnapshot {
    /// Ratio of outstanding demand (pending + active) to available supply.
    ///
    /// Never negative. A region with demand and no cars reports
    /// [`MAX_DEMAND_RATIO`].
    pub fn compute_ratio(available_cars: i32, active_bookings: i32, pending_requests: i32) -> f64 {
        // Two saturated i32 counts overflow an i32 sum
        let demand =
            (i64::from(pending_requests.max(0)) + i64::from(active_bookings.max(0))) as f64;
        if available_cars <= 0 {
            return if demand > 0.0 { MAX_DEMAND_RATIO } else { 0.0 };
        }
        (demand / available_cars as f64).clamp(0.0, MAX_DEMAND_RATIO)
    }
}

/// Special event from pricing_special_events
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct SpecialEvent {
    pub id: Uuid,
    pub region_id: Uuid,
    pub name: String,
    pub start_date: NaiveDate,
    /// Inclusive
    pub end_date: NaiveDate,
    pub factor: f64,
    pub active: bool,
}

impl SpecialEvent {
    /// Check whether the event runs on any day from `first_day` to `last_day`
    /// (bounds inclusive). Days are the region's local calendar dates.
    pub fn overlaps(&self, first_day: NaiveDate, last_day: NaiveDate) -> bool {
        self.active && self.start_date <= last_day && self.end_date >= first_day
    }
}

/// Vehicle category from vehicle_categories
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct VehicleCategory {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    /// Share of the vehicle value charged per rental day
    #[serde(with = "rust_decimal::serde::str")]
    pub base_rate_multiplier: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub depreciation_rate_annual: Decimal,
    pub display_order: i32,
    pub active: bool,
}

/// Car position and pricing region from cars
#[derive(Debug, Clone, FromRow)]
pub struct CarLocation {
    pub id: Uuid,
    pub region_id: Option<Uuid>,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
}

impl CarLocation {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.location_lat, self.location_lng) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        }
    }
}

/// Row returned by the quote_booking() database function
#[derive(Debug, Clone, FromRow)]
pub struct BookingQuoteRow {
    pub price_subtotal_cents: i64,
    pub discount_cents: i64,
    pub service_fee_cents: i64,
    pub total_cents: i64,
}

/// Row returned by the estimate_vehicle_value_usd() database function
#[derive(Debug, Clone, FromRow)]
pub struct VehicleValueRow {
    pub estimated_value: Option<Decimal>,
    pub confidence_level: String,
    pub data_source: String,
    pub category_id: Option<Uuid>,
}
