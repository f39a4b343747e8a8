//! Database queries for pricing engine.
//!
//! All queries use sqlx with runtime-bound parameters.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;

use super::models::{
    BookingQuoteRow, CarLocation, DemandSnapshot, PricingRegion, SpecialEvent, VehicleCategory,
    VehicleValueRow,
};
use super::requests::PricingRequest;
use super::responses::PricingResponse;

/// Get all active pricing regions ordered by name
pub async fn get_active_regions(pool: &PgPool) -> Result<Vec<PricingRegion>, AppError> {
    let regions = sqlx::query_as::<_, PricingRegion>(
        r#"
        SELECT
            id, name, country_code, currency,
            base_price_per_hour, fuel_cost_multiplier, inflation_rate,
            active, COALESCE(utc_offset_minutes, 0) AS utc_offset_minutes
        FROM pricing_regions
        WHERE active = true
        ORDER BY name
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(regions)
}

/// Get the most recent demand snapshot for a region
pub async fn get_latest_demand_snapshot(
    pool: &PgPool,
    region_id: Uuid,
) -> Result<Option<DemandSnapshot>, AppError> {
    let snapshot = sqlx::query_as::<_, DemandSnapshot>(
        r#"
        SELECT
            region_id, available_cars, active_bookings, pending_requests,
            demand_ratio::float8 AS demand_ratio,
            surge_factor::float8 AS surge_factor,
            timestamp
        FROM pricing_demand_snapshots
        WHERE region_id = $1
        ORDER BY timestamp DESC
        LIMIT 1
        "#,
    )
    .bind(region_id)
    .fetch_optional(pool)
    .await?;

    Ok(snapshot)
}

/// Find active special events intersecting [first_day, last_day]
pub async fn find_overlapping_events(
    pool: &PgPool,
    region_id: Uuid,
    first_day: NaiveDate,
    last_day: NaiveDate,
) -> Result<Vec<SpecialEvent>, AppError> {
    let events = sqlx::query_as::<_, SpecialEvent>(
        r#"
        SELECT
            id, region_id, name, start_date, end_date,
            factor::float8 AS factor, active
        FROM pricing_special_events
        WHERE region_id = $1
          AND active = true
          AND start_date <= $3::date
          AND end_date >= $2::date
        ORDER BY start_date
        "#,
    )
    .bind(region_id)
    .bind(first_day)
    .bind(last_day)
    .fetch_all(pool)
    .await?;

    Ok(events)
}

/// Count a renter's completed rentals
pub async fn count_completed_rentals(pool: &PgPool, user_id: Uuid) -> Result<i64, AppError> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM bookings
        WHERE renter_id = $1
          AND status = 'completed'
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Get a car's coordinates and pricing region
pub async fn get_car_location(
    pool: &PgPool,
    car_id: Uuid,
) -> Result<Option<CarLocation>, AppError> {
    let car = sqlx::query_as::<_, CarLocation>(
        r#"
        SELECT id, region_id, location_lat, location_lng
        FROM cars
        WHERE id = $1
        "#,
    )
    .bind(car_id)
    .fetch_optional(pool)
    .await?;

    Ok(car)
}

/// Base booking quote from the quote_booking() function
pub async fn quote_booking(
    pool: &PgPool,
    car_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    promo_code: Option<&str>,
) -> Result<Option<BookingQuoteRow>, AppError> {
    let row = sqlx::query_as::<_, BookingQuoteRow>(
        r#"
        SELECT
            price_subtotal_cents::int8 AS price_subtotal_cents,
            discount_cents::int8 AS discount_cents,
            service_fee_cents::int8 AS service_fee_cents,
            total_cents::int8 AS total_cents
        FROM quote_booking($1, $2, $3, $4)
        LIMIT 1
        "#,
    )
    .bind(car_id)
    .bind(start)
    .bind(end)
    .bind(promo_code)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Vehicle value estimate from the estimate_vehicle_value_usd() function
pub async fn estimate_vehicle_value(
    pool: &PgPool,
    brand: &str,
    model: &str,
    year: i32,
) -> Result<Option<VehicleValueRow>, AppError> {
    let row = sqlx::query_as::<_, VehicleValueRow>(
        r#"
        SELECT estimated_value, confidence_level, data_source, category_id
        FROM estimate_vehicle_value_usd($1, $2, $3)
        LIMIT 1
        "#,
    )
    .bind(brand)
    .bind(model)
    .bind(year)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Get all active vehicle categories (for cache warming)
pub async fn get_vehicle_categories(pool: &PgPool) -> Result<Vec<VehicleCategory>, AppError> {
    let categories = sqlx::query_as::<_, VehicleCategory>(
        r#"
        SELECT
            id, code, name,
            base_daily_rate_pct AS base_rate_multiplier,
            depreciation_rate_annual, display_order, active
        FROM vehicle_categories
        WHERE active = true
        ORDER BY display_order
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(categories)
}

/// Append a computed quote to the audit trail
pub async fn insert_pricing_history(
    pool: &PgPool,
    user_id: Option<Uuid>,
    request: &PricingRequest,
    response: &PricingResponse,
) -> Result<(), AppError> {
    let breakdown = serde_json::to_value(&response.breakdown)
        .map_err(|e| AppError::Internal(format!("Failed to serialize breakdown: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO pricing_calculations (
            id, region_id, car_id, user_id,
            rental_start, rental_hours,
            price_per_hour, total_price, currency,
            total_multiplier, breakdown, surge_active, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, NOW())
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(request.region_id)
    .bind(request.car_id)
    .bind(user_id)
    .bind(request.rental_start)
    .bind(request.rental_hours)
    .bind(response.price_per_hour)
    .bind(response.total_price)
    .bind(&response.currency)
    .bind(response.breakdown.total_multiplier)
    .bind(breakdown)
    .bind(response.surge_active)
    .execute(pool)
    .await?;

    Ok(())
}
