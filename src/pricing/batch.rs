//! Listing-page prices for many cars at once.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, instrument};
use uuid::Uuid;

use crate::clock::Clock;

use super::requests::CarRef;
use super::responses::{PricingResponse, QuickPrice};
use super::services::PriceCalculator;

/// Window used for quick prices: "rent it now for a day"
pub const QUICK_PRICE_HOURS: i32 = 24;

#[derive(Clone)]
pub struct BatchPricer {
    calculator: Arc<PriceCalculator>,
    clock: Arc<dyn Clock>,
}

impl BatchPricer {
    pub fn new(calculator: Arc<PriceCalculator>, clock: Arc<dyn Clock>) -> Self {
        Self { calculator, clock }
    }

    /// Price one car; `None` when its region cannot be quoted
    pub async fn quick_price(&self, car_id: Uuid, region_id: Uuid) -> Option<QuickPrice> {
        let car = CarRef { id: car_id, region_id };
        self.batch_prices(&[car]).await.remove(&car_id)
    }

    /// Price every car, one quote per distinct region.
    ///
    /// Cars in regions that fail are absent from the result.
    #[instrument(skip(self, cars), fields(cars = cars.len()))]
    pub async fn batch_prices(&self, cars: &[CarRef]) -> HashMap<Uuid, QuickPrice> {
        if cars.is_empty() {
            return HashMap::new();
        }

        let mut region_ids: Vec<Uuid> = cars.iter().map(|c| c.region_id).collect();
        region_ids.sort();
        region_ids.dedup();

        let quotes = match self
            .calculator
            .quote_many(&region_ids, None, self.clock.now(), QUICK_PRICE_HOURS)
            .await
        {
            Ok(quotes) => quotes,
            Err(e) => {
                debug!("Quick prices unavailable: {}", e);
                return HashMap::new();
            }
        };

        let prices: HashMap<Uuid, QuickPrice> = cars
            .iter()
            .filter_map(|car| {
                quotes
                    .get(&car.region_id)
                    .map(|quote| (car.id, quick_price_from(quote)))
            })
            .collect();

        debug!(
            regions = region_ids.len(),
            priced = prices.len(),
            "Quick prices computed"
        );
        prices
    }
}

fn quick_price_from(quote: &PricingResponse) -> QuickPrice {
    QuickPrice {
        price_per_hour: quote.price_per_hour,
        price_per_day: quote.total_price,
        currency: quote.currency.clone(),
        surge_active: quote.surge_active,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PricingConfig;
    use crate::pricing::demand::DemandTracker;
    use crate::pricing::events::EventOverlay;
    use crate::pricing::regions::RegionCatalog;
    use crate::pricing::testing::{region, ManualClock, MemoryStore};
    use rust_decimal_macros::dec;
    use std::collections::HashSet;

    fn pricer(store: &Arc<MemoryStore>) -> BatchPricer {
        let clock = Arc::new(ManualClock::default());
        let catalog = Arc::new(RegionCatalog::new(store.clone(), clock.clone()));
        let calculator = PriceCalculator::new(
            catalog,
            DemandTracker::new(store.clone()),
            EventOverlay::new(store.clone()),
            store.clone(),
            PricingConfig::default(),
        );
        BatchPricer::new(Arc::new(calculator), clock)
    }

    #[tokio::test]
    async fn test_quick_price_is_a_day_at_current_time() {
        let store = Arc::new(MemoryStore::default());
        let r = region("Buenos Aires", dec!(100));
        store.add_region(r.clone());

        let price = pricer(&store).quick_price(Uuid::new_v4(), r.id).await.unwrap();

        // Anonymous renter: +5%
        assert_eq!(price.price_per_hour, dec!(105.00));
        assert_eq!(price.price_per_day, dec!(2520.00));
        assert_eq!(price.currency, "ARS");
        assert!(!price.surge_active);
    }

    #[tokio::test]
    async fn test_quick_price_unknown_region_is_none() {
        let store = Arc::new(MemoryStore::default());
        assert!(pricer(&store)
            .quick_price(Uuid::new_v4(), Uuid::new_v4())
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_batch_keys_subset_of_inputs_without_failed_cars() {
        let store = Arc::new(MemoryStore::default());
        let ba = region("Buenos Aires", dec!(100));
        let mdz = region("Mendoza", dec!(70));
        store.add_region(ba.clone());
        store.add_region(mdz.clone());

        let cars = vec![
            CarRef { id: Uuid::new_v4(), region_id: ba.id },
            CarRef { id: Uuid::new_v4(), region_id: ba.id },
            CarRef { id: Uuid::new_v4(), region_id: mdz.id },
            CarRef { id: Uuid::new_v4(), region_id: Uuid::new_v4() },
        ];
        let failing = cars[3].id;

        let prices = pricer(&store).batch_prices(&cars).await;

        let input: HashSet<Uuid> = cars.iter().map(|c| c.id).collect();
        assert!(prices.keys().all(|id| input.contains(id)));
        assert!(!prices.contains_key(&failing));
        assert_eq!(prices.len(), 3);
        assert_eq!(prices[&cars[0].id], prices[&cars[1].id]);
    }

    #[tokio::test]
    async fn test_batch_groups_by_region() {
        let store = Arc::new(MemoryStore::default());
        let ba = region("Buenos Aires", dec!(100));
        store.add_region(ba.clone());

        let cars: Vec<CarRef> = (0..20)
            .map(|_| CarRef { id: Uuid::new_v4(), region_id: ba.id })
            .collect();
        let prices = pricer(&store).batch_prices(&cars).await;

        assert_eq!(prices.len(), 20);
        assert_eq!(store.region_fetches(), 1);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let store = Arc::new(MemoryStore::default());
        assert!(pricer(&store).batch_prices(&[]).await.is_empty());
        assert_eq!(store.region_fetches(), 0);
    }

    #[tokio::test]
    async fn test_region_outage_yields_empty_map() {
        let store = Arc::new(MemoryStore::default());
        let ba = region("Buenos Aires", dec!(100));
        store.add_region(ba.clone());
        store.fail_regions(true);

        let cars = [CarRef { id: Uuid::new_v4(), region_id: ba.id }];
        assert!(pricer(&store).batch_prices(&cars).await.is_empty());
    }
}
