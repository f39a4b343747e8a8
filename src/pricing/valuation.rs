//! Vehicle value estimates and owner-facing daily rate suggestions.

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::cache::AppCache;
use crate::error::{AppError, Result};

use super::calculators::round_money;
use super::models::VehicleCategory;
use super::requests::VehicleValueRequest;
use super::responses::{ValueConfidence, VehicleValueEstimation};
use super::sources::ValuationSource;

/// Daily rate suggested for an estimate: 0.3% of the vehicle value
pub const DAILY_RATE_OF_VALUE: Decimal = dec!(0.003);

/// Typical USD value of a category when the owner gave none
pub fn category_average_value(code: &str) -> Decimal {
    match code {
        "economy" => dec!(8000),
        "standard" => dec!(15000),
        "premium" => dec!(35000),
        "luxury" => dec!(80000),
        _ => dec!(15000),
    }
}

async fn load_categories(source: Arc<dyn ValuationSource>) -> Result<Arc<Vec<VehicleCategory>>> {
    let mut categories = source.vehicle_categories().await?;
    categories.retain(|c| c.active);
    categories.sort_by_key(|c| c.display_order);
    debug!(count = categories.len(), "Vehicle categories loaded");
    Ok(Arc::new(categories))
}

#[derive(Clone)]
pub struct Valuator {
    source: Arc<dyn ValuationSource>,
    cache: AppCache,
}

impl Valuator {
    pub fn new(source: Arc<dyn ValuationSource>, cache: AppCache) -> Self {
        Self { source, cache }
    }

    /// Active categories in display order, cached
    pub async fn categories(&self) -> Result<Arc<Vec<VehicleCategory>>> {
        let source = self.source.clone();
        self.cache
            .categories
            .try_get_with(AppCache::categories_key(), load_categories(source))
            .await
            .map_err(|e: Arc<AppError>| AppError::BackendUnavailable(e.to_string()))
    }

    /// Reload categories; the cached list is replaced only on success
    pub async fn refresh_categories(&self) -> Result<Arc<Vec<VehicleCategory>>> {
        let categories = load_categories(self.source.clone()).await?;
        self.cache
            .categories
            .insert(AppCache::categories_key(), categories.clone())
            .await;
        Ok(categories)
    }

    async fn category(&self, category_id: Uuid) -> Result<Option<VehicleCategory>> {
        Ok(self
            .categories()
            .await?
            .iter()
            .find(|c| c.id == category_id)
            .cloned())
    }

    /// Estimate the USD value of a vehicle; `NotFound` when the backend has
    /// no estimate for it.
    #[instrument(skip(self, request), fields(brand = %request.brand, model = %request.model, year = request.year))]
    pub async fn estimate_vehicle_value(
        &self,
        request: &VehicleValueRequest,
    ) -> Result<VehicleValueEstimation> {
        if request.brand.trim().is_empty() || request.model.trim().is_empty() {
            return Err(AppError::InvalidRequest(
                "brand and model are required".to_string(),
            ));
        }

        let row = self
            .source
            .estimate_vehicle_value(request.brand.trim(), request.model.trim(), request.year)
            .await?
            .ok_or(AppError::NotFound)?;
        let estimated_value = row.estimated_value.ok_or(AppError::NotFound)?;

        // Name comes from the cached list, not a per-row query
        let category_name = match row.category_id {
            Some(id) => self.category(id).await?.map(|c| c.name),
            None => None,
        };

        Ok(VehicleValueEstimation {
            estimated_value_usd: estimated_value,
            confidence: ValueConfidence::parse(&row.confidence_level),
            source: row.data_source,
            category_id: row.category_id,
            category_name,
            suggested_daily_rate_usd: Some(round_money(estimated_value * DAILY_RATE_OF_VALUE, 2)),
        })
    }

    /// Daily rate for a category: `value × base_rate_multiplier`, falling
    /// back to the category's average value. `None` for unknown categories.
    pub async fn suggested_rate(
        &self,
        category_id: Uuid,
        estimated_value_usd: Option<Decimal>,
    ) -> Result<Option<Decimal>> {
        if matches!(estimated_value_usd, Some(v) if v < Decimal::ZERO) {
            return Err(AppError::InvalidRequest(
                "estimated_value_usd must not be negative".to_string(),
            ));
        }

        let Some(category) = self.category(category_id).await? else {
            return Ok(None);
        };
        let value = estimated_value_usd.unwrap_or_else(|| category_average_value(&category.code));
        Ok(Some(round_money(value * category.base_rate_multiplier, 2)))
    }
}
