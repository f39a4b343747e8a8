//! Great-circle distance and delivery fees.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Distance bracket that drives the delivery fee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceTier {
    Local,
    Regional,
    LongDistance,
}

/// Fee schedule and tier thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceFeeConfig {
    pub base_fee_cents: f64,
    pub per_km_fee_cents: f64,
    pub local_max_km: f64,
    pub regional_max_km: f64,
}

impl Default for DistanceFeeConfig {
    fn default() -> Self {
        Self {
            base_fee_cents: 0.0,
            per_km_fee_cents: 50.0,
            local_max_km: 20.0,
            regional_max_km: 100.0,
        }
    }
}

/// Distance, fee and tier for one pickup/drop-off pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistanceFeeResult {
    pub distance_km: f64,
    pub delivery_fee_cents: i64,
    pub tier: DistanceTier,
}

/// Haversine distance in kilometers
pub fn haversine_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    // Rounding can push `a` a hair above 1 for antipodal points
    let c = 2.0 * a.clamp(0.0, 1.0).sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Maps distances to fees and tiers.
///
/// Thresholds are validated on construction, so every instance satisfies
/// `0 <= local_max_km < regional_max_km`.
#[derive(Debug, Clone)]
pub struct DistanceFeeCalculator {
    config: DistanceFeeConfig,
}

impl DistanceFeeCalculator {
    pub fn new(config: DistanceFeeConfig) -> Result<Self> {
        let DistanceFeeConfig {
            base_fee_cents,
            per_km_fee_cents,
            local_max_km,
            regional_max_km,
        } = config;

        let all_finite = [base_fee_cents, per_km_fee_cents, local_max_km, regional_max_km]
            .iter()
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(AppError::StaleConfiguration(
                "distance fee settings must be finite numbers".to_string(),
            ));
        }
        if base_fee_cents < 0.0 || per_km_fee_cents < 0.0 {
            return Err(AppError::StaleConfiguration(format!(
                "delivery fees must be non-negative (base={}, per_km={})",
                base_fee_cents, per_km_fee_cents
            )));
        }
        if local_max_km < 0.0 || local_max_km >= regional_max_km {
            return Err(AppError::StaleConfiguration(format!(
                "tier thresholds must satisfy 0 <= local_max_km < regional_max_km (got {} and {})",
                local_max_km, regional_max_km
            )));
        }

        Ok(Self { config })
    }

    pub fn config(&self) -> &DistanceFeeConfig {
        &self.config
    }

    pub fn distance_km(&self, lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
        haversine_distance(lat1, lng1, lat2, lng2)
    }

    /// `base + per_km * km`, rounded up to a whole cent and never negative
    pub fn delivery_fee_cents(&self, distance_km: f64) -> i64 {
        let km = if distance_km.is_finite() {
            distance_km.max(0.0)
        } else {
            0.0
        };
        let fee = self.config.base_fee_cents + self.config.per_km_fee_cents * km;
        fee.max(0.0).ceil() as i64
    }

    pub fn tier(&self, distance_km: f64) -> DistanceTier {
        if distance_km <= self.config.local_max_km {
            DistanceTier::Local
        } else if distance_km <= self.config.regional_max_km {
            DistanceTier::Regional
        } else {
            DistanceTier::LongDistance
        }
    }

    /// Distance, fee and tier between two points
    pub fn calculate(&self, from: (f64, f64), to: (f64, f64)) -> DistanceFeeResult {
        let distance_km = self.distance_km(from.0, from.1, to.0, to.1);
        DistanceFeeResult {
            distance_km,
            delivery_fee_cents: self.delivery_fee_cents(distance_km),
            tier: self.tier(distance_km),
        }
    }

    /// Same as [`calculate`](Self::calculate) for coordinates that may be absent
    pub fn calculate_optional(
        &self,
        pickup_lat: Option<f64>,
        pickup_lng: Option<f64>,
        dropoff_lat: Option<f64>,
        dropoff_lng: Option<f64>,
    ) -> Result<DistanceFeeResult> {
        let coords = [pickup_lat, pickup_lng, dropoff_lat, dropoff_lng];
        let [Some(lat1), Some(lng1), Some(lat2), Some(lng2)] = coords else {
            return Err(AppError::InvalidRequest(
                "pickup and drop-off coordinates are required".to_string(),
            ));
        };
        validate_coordinate(lat1, lng1)?;
        validate_coordinate(lat2, lng2)?;
        Ok(self.calculate((lat1, lng1), (lat2, lng2)))
    }
}

fn validate_coordinate(lat: f64, lng: f64) -> Result<()> {
    if !lat.is_finite() || !lng.is_finite() || lat.abs() > 90.0 || lng.abs() > 180.0 {
        return Err(AppError::InvalidRequest(format!(
            "invalid coordinate ({}, {})",
            lat, lng
        )));
    }
    Ok(())
}
