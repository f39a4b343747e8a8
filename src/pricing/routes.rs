//! HTTP handlers for the pricing API.

use std::collections::HashMap;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use tracing::warn;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::AppState;

use super::calculators::{compare_prices, total_price};
use super::distance::DistanceFeeResult;
use super::lock::PriceLock;
use super::models::PricingRegion;
use super::requests::{
    BookingQuoteRequest, DistanceFeeRequest, PriceCompareRequest, PriceLockRequest,
    PricingRequest, QuickPricesRequest, QuoteManyRequest, QuoteRequest, SuggestedRateRequest,
    VehicleValueRequest,
};
use super::responses::{
    BookingQuote, PriceCompareResponse, PriceLockResponse, PricingResponse, QuickPrice,
    SuggestedRateResponse, VehicleValueEstimation,
};

/// Routes mounted under `/api/pricing`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/regions", get(regions))
        .route("/quote", post(quote))
        .route("/quote-many", post(quote_many))
        .route("/quick-prices", post(quick_prices))
        .route("/compare", post(compare))
        .route("/distance-fee", post(distance_fee))
        .route("/booking-quote", post(booking_quote))
        .route("/vehicle-value", post(vehicle_value))
        .route("/suggested-rate", post(suggested_rate))
        .route("/lock", post(lock_price))
}

/// Audit a served quote. A failed write never fails the request.
async fn record_quote(
    state: &AppState,
    user_id: Option<Uuid>,
    request: &PricingRequest,
    response: &PricingResponse,
) {
    if let Err(e) = state.history.record_quote(user_id, request, response).await {
        warn!(region_id = %request.region_id, "Failed to record pricing history: {}", e);
    }
}

async fn regions(State(state): State<AppState>) -> Result<Json<Vec<PricingRegion>>> {
    let regions = state.catalog.regions().await?;
    Ok(Json(regions.as_ref().clone()))
}

async fn quote(
    State(state): State<AppState>,
    Json(body): Json<QuoteRequest>,
) -> Result<Json<PricingResponse>> {
    let response = state.calculator.quote(&body.request, body.user_id).await?;
    record_quote(&state, body.user_id, &body.request, &response).await;
    Ok(Json(response))
}

async fn quote_many(
    State(state): State<AppState>,
    Json(body): Json<QuoteManyRequest>,
) -> Result<Json<HashMap<Uuid, PricingResponse>>> {
    let start = body.rental_start.unwrap_or_else(|| state.clock.now());
    let quotes = state
        .calculator
        .quote_many(&body.region_ids, body.user_id, start, body.rental_hours)
        .await?;
    Ok(Json(quotes))
}

async fn quick_prices(
    State(state): State<AppState>,
    Json(body): Json<QuickPricesRequest>,
) -> Json<HashMap<Uuid, QuickPrice>> {
    Json(state.batch.batch_prices(&body.cars).await)
}

/// Dynamic total for the window against the same hours at a fixed rate
async fn compare(
    State(state): State<AppState>,
    Json(body): Json<PriceCompareRequest>,
) -> Result<Json<PriceCompareResponse>> {
    if body.fixed_price_per_hour < Decimal::ZERO {
        return Err(AppError::InvalidRequest(
            "fixed_price_per_hour must not be negative".to_string(),
        ));
    }
    let quote = state.calculator.quote(&body.request, body.user_id).await?;
    let fixed_total = total_price(body.fixed_price_per_hour, body.request.rental_hours);
    let comparison = compare_prices(fixed_total, quote.total_price);
    Ok(Json(PriceCompareResponse { comparison, quote }))
}

async fn distance_fee(
    State(state): State<AppState>,
    Json(body): Json<DistanceFeeRequest>,
) -> Result<Json<DistanceFeeResult>> {
    let result = state.distance.calculate_optional(
        body.pickup_lat,
        body.pickup_lng,
        body.dropoff_lat,
        body.dropoff_lng,
    )?;
    Ok(Json(result))
}

async fn booking_quote(
    State(state): State<AppState>,
    Json(body): Json<BookingQuoteRequest>,
) -> Result<Json<BookingQuote>> {
    Ok(Json(state.bookings.quote_booking(&body).await?))
}

async fn vehicle_value(
    State(state): State<AppState>,
    Json(body): Json<VehicleValueRequest>,
) -> Result<Json<VehicleValueEstimation>> {
    Ok(Json(state.valuator.estimate_vehicle_value(&body).await?))
}

async fn suggested_rate(
    State(state): State<AppState>,
    Json(body): Json<SuggestedRateRequest>,
) -> Result<Json<SuggestedRateResponse>> {
    let rate = state
        .valuator
        .suggested_rate(body.category_id, body.estimated_value_usd)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(SuggestedRateResponse {
        category_id: body.category_id,
        suggested_daily_rate_usd: rate,
    }))
}

async fn lock_price(
    State(state): State<AppState>,
    Json(body): Json<PriceLockRequest>,
) -> Result<Json<PriceLockResponse>> {
    let request = PricingRequest::new(body.region_id, body.rental_start, body.rental_hours)
        .with_car(body.car_id);
    let response = state.calculator.quote(&request, Some(body.user_id)).await?;
    record_quote(&state, Some(body.user_id), &request, &response).await;

    let now = state.clock.now();
    let lock = PriceLock::issue(response, body.car_id, body.user_id, request, now);
    Ok(Json(PriceLockResponse {
        expires_in_secs: lock.expires_in_secs(now),
        lock,
    }))
}
