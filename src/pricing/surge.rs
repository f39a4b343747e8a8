//! User-facing surge and discount classification.

use serde::{Deserialize, Serialize};

pub const DEFAULT_SURGE_THRESHOLD: f64 = 1.15;
pub const DEFAULT_DISCOUNT_THRESHOLD: f64 = 0.95;

/// Badge shown next to a price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurgeBadge {
    Surge,
    Discount,
    Neutral,
}

/// Multipliers strictly above `surge_above` surge; strictly below
/// `discount_below` discount.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurgeThresholds {
    pub surge_above: f64,
    pub discount_below: f64,
}

impl Default for SurgeThresholds {
    fn default() -> Self {
        Self {
            surge_above: DEFAULT_SURGE_THRESHOLD,
            discount_below: DEFAULT_DISCOUNT_THRESHOLD,
        }
    }
}

impl SurgeThresholds {
    pub fn classify(&self, total_multiplier: f64) -> SurgeBadge {
        if total_multiplier > self.surge_above {
            SurgeBadge::Surge
        } else if total_multiplier < self.discount_below {
            SurgeBadge::Discount
        } else {
            SurgeBadge::Neutral
        }
    }
}

/// Classify with the default thresholds
pub fn classify(total_multiplier: f64) -> SurgeBadge {
    SurgeThresholds::default().classify(total_multiplier)
}

impl SurgeBadge {
    pub fn is_surge(self) -> bool {
        self == SurgeBadge::Surge
    }

    /// Message for surge and discount badges
    pub fn message(self, total_multiplier: f64) -> Option<String> {
        let pct = ((total_multiplier - 1.0) * 100.0).round() as i64;
        match self {
            SurgeBadge::Surge => Some(format!("High demand: prices are {}% above normal", pct)),
            SurgeBadge::Discount => Some(format!(
                "Low demand: prices are {}% below normal",
                pct.abs()
            )),
            SurgeBadge::Neutral => None,
        }
    }
}

/// Demand intensity bucket derived from the demand factor alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurgeTier {
    None,
    Low,
    Medium,
    High,
    Extreme,
}

impl SurgeTier {
    pub fn from_demand_factor(demand_factor: f64) -> Self {
        if demand_factor >= 0.25 {
            SurgeTier::Extreme
        } else if demand_factor >= 0.15 {
            SurgeTier::High
        } else if demand_factor >= 0.05 {
            SurgeTier::Medium
        } else if demand_factor > 0.0 {
            SurgeTier::Low
        } else {
            SurgeTier::None
        }
    }

    pub fn badge_color(self) -> BadgeColor {
        match self {
            SurgeTier::None => BadgeColor::Green,
            SurgeTier::Low => BadgeColor::Yellow,
            SurgeTier::Medium => BadgeColor::Orange,
            SurgeTier::High | SurgeTier::Extreme => BadgeColor::Red,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeColor {
    Red,
    Orange,
    Yellow,
    Green,
}

/// Demand surge summary for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurgePricingInfo {
    pub is_active: bool,
    pub tier: SurgeTier,
    pub factor: f64,
    pub message: String,
    pub badge_color: BadgeColor,
}

impl SurgePricingInfo {
    pub fn from_demand_factor(demand_factor: f64) -> Self {
        let tier = SurgeTier::from_demand_factor(demand_factor);
        let pct = (demand_factor * 100.0).round() as i64;
        let message = match tier {
            SurgeTier::None => "Normal price".to_string(),
            SurgeTier::Low => format!("Light demand (+{}%)", pct),
            SurgeTier::Medium => format!("Moderate demand (+{}%)", pct),
            SurgeTier::High => format!("High demand (+{}%)", pct),
            SurgeTier::Extreme => format!("Extreme demand (+{}%)", pct),
        };

        Self {
            is_active: tier != SurgeTier::None,
            tier,
            factor: demand_factor,
            message,
            badge_color: tier.badge_color(),
        }
    }
}
