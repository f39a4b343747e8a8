//! Environment-driven configuration.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::{AppError, Result};
use crate::pricing::calculators::{DEFAULT_MAX_MULTIPLIER, DEFAULT_MIN_MULTIPLIER};
use crate::pricing::distance::DistanceFeeConfig;
use crate::pricing::regions::REGION_CACHE_TTL;
use crate::pricing::surge::SurgeThresholds;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_BATCH_CONCURRENCY: usize = 8;
const DEFAULT_CACHE_WARM_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Tunables of the quote engine
#[derive(Debug, Clone)]
pub struct PricingConfig {
    pub region_cache_ttl: Duration,
    pub min_multiplier: f64,
    pub max_multiplier: f64,
    pub surge: SurgeThresholds,
    /// Max regions quoted at once by `quote_many`
    pub batch_concurrency: usize,
    /// Units of local currency per USD
    pub usd_rates: HashMap<String, Decimal>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        let usd_rates = HashMap::from([
            ("USD".to_string(), dec!(1)),
            ("ARS".to_string(), dec!(1000)),
            ("BRL".to_string(), dec!(5)),
            ("MXN".to_string(), dec!(17)),
            ("UYU".to_string(), dec!(40)),
            ("CLP".to_string(), dec!(950)),
        ]);

        Self {
            region_cache_ttl: REGION_CACHE_TTL,
            min_multiplier: DEFAULT_MIN_MULTIPLIER,
            max_multiplier: DEFAULT_MAX_MULTIPLIER,
            surge: SurgeThresholds::default(),
            batch_concurrency: DEFAULT_BATCH_CONCURRENCY,
            usd_rates,
        }
    }
}

impl PricingConfig {
    pub fn usd_rate(&self, currency: &str) -> Option<Decimal> {
        self.usd_rates.get(currency).copied()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub database_url: String,
    pub database_max_connections: u32,
    pub cache_warm_interval: Duration,
    pub pricing: PricingConfig,
    pub distance: DistanceFeeConfig,
}

impl Config {
    /// Load `.env` (if present) and read the process environment
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys fall back to defaults,
    /// unparseable ones are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or_else(|| {
            AppError::StaleConfiguration("DATABASE_URL must be set".to_string())
        })?;

        let mut pricing = PricingConfig::default();
        if let Some(secs) = parse::<u64, _>(&lookup, "REGION_CACHE_TTL_SECS")? {
            pricing.region_cache_ttl = Duration::from_secs(secs);
        }
        if let Some(n) = parse::<usize, _>(&lookup, "BATCH_CONCURRENCY")? {
            if n == 0 {
                return Err(AppError::StaleConfiguration(
                    "BATCH_CONCURRENCY must be at least 1".to_string(),
                ));
            }
            pricing.batch_concurrency = n;
        }

        let defaults = DistanceFeeConfig::default();
        let distance = DistanceFeeConfig {
            base_fee_cents: parse(&lookup, "DELIVERY_BASE_FEE_CENTS")?
                .unwrap_or(defaults.base_fee_cents),
            per_km_fee_cents: parse(&lookup, "DELIVERY_PER_KM_CENTS")?
                .unwrap_or(defaults.per_km_fee_cents),
            local_max_km: parse(&lookup, "DELIVERY_LOCAL_MAX_KM")?
                .unwrap_or(defaults.local_max_km),
            regional_max_km: parse(&lookup, "DELIVERY_REGIONAL_MAX_KM")?
                .unwrap_or(defaults.regional_max_km),
        };

        let cache_warm_interval = parse::<u64, _>(&lookup, "CACHE_WARM_INTERVAL_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_CACHE_WARM_INTERVAL);

        Ok(Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            database_url,
            database_max_connections: parse(&lookup, "DATABASE_MAX_CONNECTIONS")?
                .unwrap_or(DEFAULT_MAX_CONNECTIONS),
            cache_warm_interval,
            pricing,
            distance,
        })
    }
}

fn parse<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            AppError::StaleConfiguration(format!("{} has an invalid value: {:?}", key, raw))
        }),
    }
}
