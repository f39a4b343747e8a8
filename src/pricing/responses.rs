//! Response DTOs for pricing API endpoints.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::calculators::PriceComparison;
use super::distance::DistanceTier;
use super::lock::PriceLock;
use super::surge::SurgePricingInfo;

/// Per-factor view of how a price was reached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingBreakdown {
    /// Region hourly base after fuel and inflation adjustments
    #[serde(with = "rust_decimal::serde::str")]
    pub base_price: Decimal,
    pub day_factor: f64,
    pub hour_factor: f64,
    pub user_factor: f64,
    pub demand_factor: f64,
    pub event_factor: f64,
    pub total_multiplier: f64,
}

/// Context the factors were derived from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingDetails {
    pub user_rentals: i64,
    /// 0 = Sunday
    pub day_of_week: u32,
    pub hour_of_day: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_cars: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_bookings: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_requests: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demand_ratio: Option<f64>,
    pub region_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_name: Option<String>,
}

/// A priced quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingResponse {
    /// Set on batch results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_id: Option<Uuid>,
    #[serde(with = "rust_decimal::serde::str")]
    pub price_per_hour: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_price: Decimal,
    pub currency: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::str_option"
    )]
    pub price_in_usd: Option<Decimal>,
    pub breakdown: PricingBreakdown,
    pub details: PricingDetails,
    pub surge_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surge_message: Option<String>,
    /// Demand-only view of the surge, for badges
    pub surge_info: SurgePricingInfo,
}

/// Dynamic quote next to a fixed hourly rate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceCompareResponse {
    pub comparison: PriceComparison,
    pub quote: PricingResponse,
}

/// Issued lock with its remaining lifetime
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceLockResponse {
    #[serde(flatten)]
    pub lock: PriceLock,
    pub expires_in_secs: i64,
}

/// Cheap per-car price for list and map views
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuickPrice {
    #[serde(with = "rust_decimal::serde::str")]
    pub price_per_hour: Decimal,
    /// 24-hour quote evaluated now
    #[serde(with = "rust_decimal::serde::str")]
    pub price_per_day: Decimal,
    pub currency: String,
    pub surge_active: bool,
}

/// Booking quote with optional delivery surcharge, all amounts in cents
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingQuote {
    pub price_subtotal_cents: i64,
    pub discount_cents: i64,
    pub service_fee_cents: i64,
    pub total_cents: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_fee_cents: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_distance_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_risk_tier: Option<DistanceTier>,
}

/// How much a vehicle estimate can be trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueConfidence {
    High,
    Medium,
    Low,
    None,
}

impl ValueConfidence {
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "high" => ValueConfidence::High,
            "medium" => ValueConfidence::Medium,
            "low" => ValueConfidence::Low,
            _ => ValueConfidence::None,
        }
    }
}

/// Result of the vehicle value estimation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleValueEstimation {
    #[serde(with = "rust_decimal::serde::str")]
    pub estimated_value_usd: Decimal,
    pub confidence: ValueConfidence,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::str_option"
    )]
    pub suggested_daily_rate_usd: Option<Decimal>,
}

/// Response for suggested daily rate
#[derive(Debug, Serialize)]
pub struct SuggestedRateResponse {
    pub category_id: Uuid,
    #[serde(with = "rust_decimal::serde::str")]
    pub suggested_daily_rate_usd: Decimal,
}

/// Generic pricing error response
#[derive(Debug, Serialize)]
pub struct PricingErrorResponse {
    pub error_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}
