//! Booking quotes with an optional car-delivery surcharge.

use std::sync::Arc;

use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::error::{AppError, Result};

use super::distance::{DistanceFeeCalculator, DistanceFeeResult};
use super::requests::{BookingQuoteRequest, LocationCoords};
use super::responses::BookingQuote;
use super::sources::{BookingQuoteSource, CarDirectory};

#[derive(Clone)]
pub struct BookingQuoter {
    quotes: Arc<dyn BookingQuoteSource>,
    cars: Arc<dyn CarDirectory>,
    distance: DistanceFeeCalculator,
}

impl BookingQuoter {
    pub fn new(
        quotes: Arc<dyn BookingQuoteSource>,
        cars: Arc<dyn CarDirectory>,
        distance: DistanceFeeCalculator,
    ) -> Self {
        Self {
            quotes,
            cars,
            distance,
        }
    }

    /// Base quote from the booking backend plus delivery when the renter
    /// gave a location and the car has coordinates.
    #[instrument(skip(self, request), fields(car_id = %request.car_id))]
    pub async fn quote_booking(&self, request: &BookingQuoteRequest) -> Result<BookingQuote> {
        if request.end <= request.start {
            return Err(AppError::InvalidRequest(
                "booking must end after it starts".to_string(),
            ));
        }

        let base = self
            .quotes
            .base_quote(
                request.car_id,
                request.start,
                request.end,
                request.promo_code.as_deref(),
            )
            .await?
            .ok_or(AppError::NotFound)?;

        let mut quote = BookingQuote {
            price_subtotal_cents: base.price_subtotal_cents,
            discount_cents: base.discount_cents,
            service_fee_cents: base.service_fee_cents,
            total_cents: base.total_cents,
            delivery_fee_cents: None,
            delivery_distance_km: None,
            distance_risk_tier: None,
        };

        if let Some(location) = request.user_location {
            if let Some(delivery) = self.delivery_fee(request.car_id, location).await? {
                quote.total_cents += delivery.delivery_fee_cents;
                quote.delivery_fee_cents = Some(delivery.delivery_fee_cents);
                quote.delivery_distance_km = Some(delivery.distance_km);
                quote.distance_risk_tier = Some(delivery.tier);
            }
        }

        Ok(quote)
    }

    /// Delivery leg from the car to the renter; `None` when the car has no
    /// known position or its location cannot be looked up.
    pub async fn delivery_fee(
        &self,
        car_id: Uuid,
        to: LocationCoords,
    ) -> Result<Option<DistanceFeeResult>> {
        let car = match self.cars.car_location(car_id).await {
            Ok(Some(car)) => car,
            Ok(None) => {
                warn!(%car_id, "Car not found for delivery fee");
                return Ok(None);
            }
            Err(e) => {
                warn!(%car_id, "Car location unavailable, skipping delivery fee: {}", e);
                return Ok(None);
            }
        };
        let Some(from) = car.coordinates() else {
            debug!(%car_id, "Car has no coordinates, skipping delivery fee");
            return Ok(None);
        };

        let result = self.distance.calculate_optional(
            Some(from.0),
            Some(from.1),
            Some(to.lat),
            Some(to.lng),
        )?;
        debug!(
            %car_id,
            distance_km = result.distance_km,
            fee_cents = result.delivery_fee_cents,
            "Delivery fee computed"
        );
        Ok(Some(result))
    }
}
