//! Quote engine combining region, demand, event and renter data.
//!
//! Only the region lookup and request validation are hard failures. Demand,
//! events and renter history are auxiliary: when their backend is down the
//! quote is still produced with a neutral factor and a warning is logged.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::PricingConfig;
use crate::error::Result;

use super::calculators::{clamp_multiplier, price_per_hour, to_usd, total_price, FactorSet};
use super::demand::DemandTracker;
use super::events::EventOverlay;
use super::factors::{FactorModel, ReferenceFactors};
use super::models::{DemandSnapshot, SpecialEvent};
use super::regions::RegionCatalog;
use super::requests::{validate_rental_hours, PricingRequest};
use super::responses::{PricingBreakdown, PricingDetails, PricingResponse};
use super::sources::RenterHistory;
use super::surge::SurgePricingInfo;

pub struct PriceCalculator {
    catalog: Arc<RegionCatalog>,
    demand: DemandTracker,
    events: EventOverlay,
    history: Arc<dyn RenterHistory>,
    factors: Arc<dyn FactorModel>,
    config: PricingConfig,
}

impl PriceCalculator {
    pub fn new(
        catalog: Arc<RegionCatalog>,
        demand: DemandTracker,
        events: EventOverlay,
        history: Arc<dyn RenterHistory>,
        config: PricingConfig,
    ) -> Self {
        Self {
            catalog,
            demand,
            events,
            history,
            factors: Arc::new(ReferenceFactors),
            config,
        }
    }

    /// Swap the factor curves
    pub fn with_factors(mut self, factors: Arc<dyn FactorModel>) -> Self {
        self.factors = factors;
        self
    }

    pub fn catalog(&self) -> &Arc<RegionCatalog> {
        &self.catalog
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Price one rental window in one region.
    #[instrument(skip(self, request), fields(region_id = %request.region_id, hours = request.rental_hours))]
    pub async fn quote(&self, request: &PricingRequest, user_id: Option<Uuid>) -> Result<PricingResponse> {
        validate_rental_hours(request.rental_hours)?;
        let user_rentals = self.user_rentals(user_id).await;
        self.quote_with_rentals(request, user_rentals).await
    }

    /// Quote several regions for the same window.
    ///
    /// Duplicate ids are quoted once. Regions whose quote fails are left out
    /// of the map; every returned response carries its `region_id`.
    #[instrument(skip(self, region_ids), fields(regions = region_ids.len()))]
    pub async fn quote_many(
        &self,
        region_ids: &[Uuid],
        user_id: Option<Uuid>,
        rental_start: DateTime<Utc>,
        rental_hours: i32,
    ) -> Result<HashMap<Uuid, PricingResponse>> {
        validate_rental_hours(rental_hours)?;
        let user_rentals = self.user_rentals(user_id).await;

        let mut seen = HashSet::new();
        let unique: Vec<Uuid> = region_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();

        let results: Vec<(Uuid, Result<PricingResponse>)> = stream::iter(unique)
            .map(|region_id| async move {
                let request = PricingRequest::new(region_id, rental_start, rental_hours);
                (region_id, self.quote_with_rentals(&request, user_rentals).await)
            })
            .buffer_unordered(self.config.batch_concurrency.max(1))
            .collect()
            .await;

        let mut quotes = HashMap::with_capacity(results.len());
        for (region_id, result) in results {
            match result {
                Ok(mut response) => {
                    response.region_id = Some(region_id);
                    quotes.insert(region_id, response);
                }
                Err(e) => warn!(%region_id, "Skipping region in batch quote: {}", e),
            }
        }

        info!(requested = region_ids.len(), quoted = quotes.len(), "Batch quote complete");
        Ok(quotes)
    }

    async fn quote_with_rentals(
        &self,
        request: &PricingRequest,
        user_rentals: i64,
    ) -> Result<PricingResponse> {
        validate_rental_hours(request.rental_hours)?;
        let region = self.catalog.region_by_id(request.region_id).await?;

        // Day, hour and event dates all follow the region's wall clock
        let window_end = request.rental_start + Duration::hours(i64::from(request.rental_hours));
        let local = region.local_time(request.rental_start);
        let local_end = region.local_time(window_end);
        let (snapshot, events) = tokio::join!(
            self.demand_snapshot(region.id),
            self.window_events(region.id, local.date_naive(), local_end.date_naive()),
        );

        let day_of_week = local.weekday().num_days_from_sunday();
        let hour_of_day = local.hour();

        let factors = FactorSet {
            day: self.factors.day_factor(day_of_week),
            hour: self.factors.hour_factor(hour_of_day),
            user: self.factors.user_factor(user_rentals),
            demand: self.factors.demand_factor(snapshot.as_ref()),
            event: self.factors.event_factor(&events),
        };
        let total_multiplier = clamp_multiplier(
            factors.product(),
            self.config.min_multiplier,
            self.config.max_multiplier,
        );

        let per_hour = price_per_hour(&region, total_multiplier)?;
        let total = total_price(per_hour, request.rental_hours);
        let badge = self.config.surge.classify(total_multiplier);
        let price_in_usd = self
            .config
            .usd_rate(&region.currency)
            .and_then(|rate| to_usd(total, rate));

        debug!(
            region = %region.name,
            total_multiplier,
            %per_hour,
            "Quote computed"
        );

        Ok(PricingResponse {
            region_id: None,
            price_per_hour: per_hour,
            total_price: total,
            currency: region.currency.clone(),
            price_in_usd,
            breakdown: PricingBreakdown {
                base_price: region.adjusted_base_price(),
                day_factor: factors.day,
                hour_factor: factors.hour,
                user_factor: factors.user,
                demand_factor: factors.demand,
                event_factor: factors.event,
                total_multiplier,
            },
            details: PricingDetails {
                user_rentals,
                day_of_week,
                hour_of_day,
                available_cars: snapshot.as_ref().map(|s| s.available_cars),
                active_bookings: snapshot.as_ref().map(|s| s.active_bookings),
                pending_requests: snapshot.as_ref().map(|s| s.pending_requests),
                demand_ratio: snapshot.as_ref().map(|s| s.demand_ratio),
                region_id: region.id,
                region_name: Some(region.name.clone()),
            },
            surge_active: badge.is_surge(),
            surge_message: badge.message(total_multiplier),
            surge_info: SurgePricingInfo::from_demand_factor(factors.demand),
        })
    }

    async fn user_rentals(&self, user_id: Option<Uuid>) -> i64 {
        let Some(user_id) = user_id else {
            return 0;
        };
        match self.history.completed_rentals(user_id).await {
            Ok(count) => count.max(0),
            Err(e) => {
                warn!(%user_id, "Rental history unavailable, pricing as new renter: {}", e);
                0
            }
        }
    }

    async fn demand_snapshot(&self, region_id: Uuid) -> Option<DemandSnapshot> {
        match self.demand.latest(region_id).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(%region_id, "Demand lookup failed, using neutral demand: {}", e);
                None
            }
        }
    }

    async fn window_events(
        &self,
        region_id: Uuid,
        first_day: NaiveDate,
        last_day: NaiveDate,
    ) -> Vec<SpecialEvent> {
        match self.events.active_events(region_id, first_day, last_day).await {
            Ok(events) => events,
            Err(e) => {
                warn!(%region_id, "Event lookup failed, ignoring events: {}", e);
                Vec::new()
            }
        }
    }
}
