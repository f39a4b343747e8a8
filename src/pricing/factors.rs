//! Factor functions feeding the price multiplier.
//!
//! Each factor is a signed fraction: `0.10` means +10%, `-0.15` means -15%.
//! The calculator only multiplies `(1 + factor)` terms together, so the
//! curves here can be swapped without touching the combination logic.

use super::events::resolve_event_factor;
use super::models::{DemandSnapshot, SpecialEvent};

pub trait FactorModel: Send + Sync {
    /// `day_of_week`: 0 = Sunday .. 6 = Saturday
    fn day_factor(&self, day_of_week: u32) -> f64;

    /// `hour_of_day`: 0..=23, region local time
    fn hour_factor(&self, hour_of_day: u32) -> f64;

    fn user_factor(&self, completed_rentals: i64) -> f64;

    fn demand_factor(&self, snapshot: Option<&DemandSnapshot>) -> f64;

    fn event_factor(&self, events: &[SpecialEvent]) -> f64 {
        resolve_event_factor(events)
    }
}

pub const WEEKEND_SURCHARGE: f64 = 0.10;
pub const EARLY_MORNING_DISCOUNT: f64 = -0.10;
pub const PEAK_HOUR_SURCHARGE: f64 = 0.15;
pub const NEW_USER_PREMIUM: f64 = 0.05;
pub const REGULAR_USER_DISCOUNT: f64 = -0.05;
pub const FREQUENT_USER_DISCOUNT: f64 = -0.10;
pub const FREQUENT_USER_RENTALS: i64 = 10;

const DEMAND_RATIO_WEIGHT: f64 = 0.10;
const DEMAND_RATIO_MIN: f64 = -0.10;
const DEMAND_RATIO_MAX: f64 = 0.15;
const DEMAND_FACTOR_MIN: f64 = -0.10;
const DEMAND_FACTOR_MAX: f64 = 0.25;

/// Default curves: weekend and commuter-peak surcharges, early-morning and
/// loyalty discounts, demand-driven surge.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReferenceFactors;

impl FactorModel for ReferenceFactors {
    fn day_factor(&self, day_of_week: u32) -> f64 {
        match day_of_week {
            // Friday, Saturday, Sunday
            5 | 6 | 0 => WEEKEND_SURCHARGE,
            _ => 0.0,
        }
    }

    fn hour_factor(&self, hour_of_day: u32) -> f64 {
        match hour_of_day {
            0..=5 => EARLY_MORNING_DISCOUNT,
            6..=9 | 17..=21 => PEAK_HOUR_SURCHARGE,
            _ => 0.0,
        }
    }

    fn user_factor(&self, completed_rentals: i64) -> f64 {
        match completed_rentals {
            r if r <= 0 => NEW_USER_PREMIUM,
            1..=4 => 0.0,
            5..=9 => REGULAR_USER_DISCOUNT,
            _ => FREQUENT_USER_DISCOUNT,
        }
    }

    fn demand_factor(&self, snapshot: Option<&DemandSnapshot>) -> f64 {
        let Some(snapshot) = snapshot else {
            return 0.0;
        };
        let ratio = if snapshot.demand_ratio.is_finite() {
            snapshot.demand_ratio.max(0.0)
        } else {
            0.0
        };
        let surge = if snapshot.surge_factor.is_finite() {
            snapshot.surge_factor
        } else {
            0.0
        };
        let from_ratio =
            ((ratio - 1.0) * DEMAND_RATIO_WEIGHT).clamp(DEMAND_RATIO_MIN, DEMAND_RATIO_MAX);
        (surge + from_ratio).clamp(DEMAND_FACTOR_MIN, DEMAND_FACTOR_MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn snapshot(demand_ratio: f64, surge_factor: f64) -> DemandSnapshot {
        DemandSnapshot {
            region_id: Uuid::new_v4(),
            available_cars: 10,
            active_bookings: 0,
            pending_requests: 0,
            demand_ratio,
            surge_factor,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_day_factor_weekend() {
        let f = ReferenceFactors;
        assert_eq!(f.day_factor(0), WEEKEND_SURCHARGE);
        assert_eq!(f.day_factor(5), WEEKEND_SURCHARGE);
        assert_eq!(f.day_factor(6), WEEKEND_SURCHARGE);
        for midweek in 1..=4 {
            assert_eq!(f.day_factor(midweek), 0.0);
        }
    }

    #[test]
    fn test_hour_factor_bands() {
        let f = ReferenceFactors;
        assert_eq!(f.hour_factor(0), EARLY_MORNING_DISCOUNT);
        assert_eq!(f.hour_factor(5), EARLY_MORNING_DISCOUNT);
        assert_eq!(f.hour_factor(6), PEAK_HOUR_SURCHARGE);
        assert_eq!(f.hour_factor(9), PEAK_HOUR_SURCHARGE);
        assert_eq!(f.hour_factor(10), 0.0);
        assert_eq!(f.hour_factor(16), 0.0);
        assert_eq!(f.hour_factor(17), PEAK_HOUR_SURCHARGE);
        assert_eq!(f.hour_factor(21), PEAK_HOUR_SURCHARGE);
        assert_eq!(f.hour_factor(22), 0.0);
        assert_eq!(f.hour_factor(23), 0.0);
    }

    #[test]
    fn test_user_factor_loyalty() {
        let f = ReferenceFactors;
        assert_eq!(f.user_factor(0), NEW_USER_PREMIUM);
        assert_eq!(f.user_factor(3), 0.0);
        assert_eq!(f.user_factor(7), REGULAR_USER_DISCOUNT);
        assert_eq!(f.user_factor(FREQUENT_USER_RENTALS), FREQUENT_USER_DISCOUNT);
        assert_eq!(f.user_factor(250), FREQUENT_USER_DISCOUNT);
    }

    #[test]
    fn test_demand_factor_without_snapshot() {
        assert_eq!(ReferenceFactors.demand_factor(None), 0.0);
    }

    #[test]
    fn test_demand_factor_balanced_market() {
        let s = snapshot(1.0, 0.0);
        assert_eq!(ReferenceFactors.demand_factor(Some(&s)), 0.0);
    }

    #[test]
    fn test_demand_factor_increases_with_ratio_and_surge() {
        let f = ReferenceFactors;
        let low = f.demand_factor(Some(&snapshot(1.2, 0.0)));
        let high = f.demand_factor(Some(&snapshot(2.0, 0.0)));
        let surged = f.demand_factor(Some(&snapshot(2.0, 0.05)));
        assert!(low < high);
        assert!(high < surged);
    }

    #[test]
    fn test_demand_factor_bounded() {
        let f = ReferenceFactors;
        assert_eq!(f.demand_factor(Some(&snapshot(50.0, 1.0))), 0.25);
        assert_eq!(f.demand_factor(Some(&snapshot(0.0, -1.0))), -0.10);
        assert_eq!(f.demand_factor(Some(&snapshot(f64::NAN, f64::NAN))), -0.10);
    }
}
