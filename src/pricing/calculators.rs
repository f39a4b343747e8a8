//! Core pricing calculation functions.
//!
//! Pure functions for pricing math - no database access.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{AppError, Result};

use super::models::PricingRegion;

pub const DEFAULT_MIN_MULTIPLIER: f64 = 0.5;
pub const DEFAULT_MAX_MULTIPLIER: f64 = 3.0;

/// Round to specified decimal places using banker's rounding (ROUND_HALF_EVEN).
///
/// Banker's rounding rounds to the nearest even number when the value is exactly
/// halfway between two possibilities. This reduces cumulative rounding bias.
///
/// # Examples
/// ```
/// use rust_decimal_macros::dec;
/// use rental_pricing::pricing::round_money;
///
/// assert_eq!(round_money(dec!(2.5), 0), dec!(2));   // rounds to even
/// assert_eq!(round_money(dec!(3.5), 0), dec!(4));   // rounds to even
/// assert_eq!(round_money(dec!(1.234), 2), dec!(1.23));
/// ```
pub fn round_money(amount: Decimal, places: u32) -> Decimal {
    amount.round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven)
}

/// The five signed factors of one quote
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FactorSet {
    pub day: f64,
    pub hour: f64,
    pub user: f64,
    pub demand: f64,
    pub event: f64,
}

impl FactorSet {
    /// `Π(1 + factor)` over all five factors, unclamped
    pub fn product(&self) -> f64 {
        [self.day, self.hour, self.user, self.demand, self.event]
            .iter()
            .map(|f| 1.0 + f)
            .product()
    }
}

/// Keep the multiplier inside `[min, max]`
pub fn clamp_multiplier(multiplier: f64, min: f64, max: f64) -> f64 {
    if !multiplier.is_finite() {
        return 1.0_f64.clamp(min, max);
    }
    multiplier.clamp(min, max)
}

/// Hourly price for a region at the given multiplier, rounded to cents.
pub fn price_per_hour(region: &PricingRegion, total_multiplier: f64) -> Result<Decimal> {
    let multiplier = Decimal::from_f64(total_multiplier).ok_or_else(|| {
        AppError::Internal(format!(
            "multiplier {} is not representable",
            total_multiplier
        ))
    })?;
    Ok(round_money(region.adjusted_base_price() * multiplier, 2))
}

/// Price for the whole rental
pub fn total_price(price_per_hour: Decimal, rental_hours: i32) -> Decimal {
    price_per_hour * Decimal::from(rental_hours)
}

/// Convert an amount using a currency-per-USD rate
pub fn to_usd(amount: Decimal, units_per_usd: Decimal) -> Option<Decimal> {
    if units_per_usd <= Decimal::ZERO {
        return None;
    }
    Some(round_money(amount / units_per_usd, 2))
}

/// Fixed vs dynamic price comparison
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceComparison {
    #[serde(with = "rust_decimal::serde::str")]
    pub fixed_price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub dynamic_price: Decimal,
    /// Negative when dynamic is cheaper
    #[serde(with = "rust_decimal::serde::str")]
    pub difference: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub percentage_diff: Decimal,
    pub is_cheaper: bool,
    pub is_more_expensive: bool,
    pub tone: ComparisonTone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonTone {
    Success,
    Warning,
    Danger,
    Neutral,
}

/// Compare a dynamic price against a fixed one.
///
/// Cheaper is `Success`; up to 10% dearer is `Warning`, beyond that `Danger`.
pub fn compare_prices(fixed_price: Decimal, dynamic_price: Decimal) -> PriceComparison {
    let difference = dynamic_price - fixed_price;
    let percentage_diff = if fixed_price.is_zero() {
        Decimal::ZERO
    } else {
        round_money(difference / fixed_price * Decimal::ONE_HUNDRED, 2)
    };

    let tone = if difference < Decimal::ZERO {
        ComparisonTone::Success
    } else if percentage_diff > Decimal::TEN {
        ComparisonTone::Danger
    } else if percentage_diff > Decimal::ZERO {
        ComparisonTone::Warning
    } else {
        ComparisonTone::Neutral
    };

    PriceComparison {
        fixed_price,
        dynamic_price,
        difference,
        percentage_diff,
        is_cheaper: difference < Decimal::ZERO,
        is_more_expensive: difference > Decimal::ZERO,
        tone,
    }
}
