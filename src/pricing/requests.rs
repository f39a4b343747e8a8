//! Request DTOs for pricing API endpoints.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Quote a rental window in one region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingRequest {
    pub region_id: Uuid,
    pub rental_start: DateTime<Utc>,
    pub rental_hours: i32,
    #[serde(default)]
    pub car_id: Option<Uuid>,
}

impl PricingRequest {
    pub fn new(region_id: Uuid, rental_start: DateTime<Utc>, rental_hours: i32) -> Self {
        Self {
            region_id,
            rental_start,
            rental_hours,
            car_id: None,
        }
    }

    pub fn with_car(mut self, car_id: Uuid) -> Self {
        self.car_id = Some(car_id);
        self
    }
}

/// Reject non-positive rental durations
pub fn validate_rental_hours(rental_hours: i32) -> Result<()> {
    if rental_hours <= 0 {
        return Err(AppError::InvalidRequest(format!(
            "rental_hours must be positive, got {}",
            rental_hours
        )));
    }
    Ok(())
}

/// Body of POST /api/pricing/quote
#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    #[serde(flatten)]
    pub request: PricingRequest,
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

/// Body of POST /api/pricing/quote-many
#[derive(Debug, Deserialize)]
pub struct QuoteManyRequest {
    pub region_ids: Vec<Uuid>,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    /// Defaults to now
    #[serde(default)]
    pub rental_start: Option<DateTime<Utc>>,
    pub rental_hours: i32,
}

/// A car to price for a list or map view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CarRef {
    pub id: Uuid,
    pub region_id: Uuid,
}

/// Body of POST /api/pricing/quick-prices
#[derive(Debug, Deserialize)]
pub struct QuickPricesRequest {
    pub cars: Vec<CarRef>,
}

/// Latitude/longitude pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationCoords {
    pub lat: f64,
    pub lng: f64,
}

/// Body of POST /api/pricing/distance-fee
#[derive(Debug, Deserialize)]
pub struct DistanceFeeRequest {
    #[serde(default)]
    pub pickup_lat: Option<f64>,
    #[serde(default)]
    pub pickup_lng: Option<f64>,
    #[serde(default)]
    pub dropoff_lat: Option<f64>,
    #[serde(default)]
    pub dropoff_lng: Option<f64>,
}

/// Body of POST /api/pricing/booking-quote
#[derive(Debug, Clone, Deserialize)]
pub struct BookingQuoteRequest {
    pub car_id: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub promo_code: Option<String>,
    #[serde(default)]
    pub user_location: Option<LocationCoords>,
}

/// Body of POST /api/pricing/vehicle-value
#[derive(Debug, Deserialize)]
pub struct VehicleValueRequest {
    pub brand: String,
    pub model: String,
    pub year: i32,
    #[serde(default)]
    pub country: Option<String>,
}

/// Body of POST /api/pricing/suggested-rate
#[derive(Debug, Deserialize)]
pub struct SuggestedRateRequest {
    pub category_id: Uuid,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub estimated_value_usd: Option<Decimal>,
}

/// Body of POST /api/pricing/compare
#[derive(Debug, Deserialize)]
pub struct PriceCompareRequest {
    #[serde(flatten)]
    pub request: PricingRequest,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    /// Flat hourly rate the owner would otherwise charge
    #[serde(with = "rust_decimal::serde::str")]
    pub fixed_price_per_hour: Decimal,
}

/// Body of POST /api/pricing/lock
#[derive(Debug, Deserialize)]
pub struct PriceLockRequest {
    pub car_id: Uuid,
    pub user_id: Uuid,
    pub region_id: Uuid,
    pub rental_start: DateTime<Utc>,
    pub rental_hours: i32,
}
