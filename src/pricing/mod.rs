//! Pricing engine module for the rental marketplace.
//!
//! Turns a region, a rental window, a renter's history and live market
//! signals into an hourly price, a total and a factor breakdown.

pub mod batch;
pub mod booking;
pub mod calculators;
pub mod demand;
pub mod distance;
pub mod events;
pub mod factors;
pub mod lock;
pub mod models;
pub mod queries;
pub mod regions;
pub mod requests;
pub mod responses;
pub mod routes;
pub mod services;
pub mod sources;
pub mod surge;
pub mod valuation;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used items
pub use batch::BatchPricer;
pub use booking::BookingQuoter;
pub use calculators::round_money;
pub use demand::DemandTracker;
pub use distance::{DistanceFeeCalculator, DistanceFeeConfig, DistanceTier};
pub use events::{resolve_event_factor, EventOverlay};
pub use factors::{FactorModel, ReferenceFactors};
pub use lock::PriceLock;
pub use regions::RegionCatalog;
pub use routes::router;
pub use services::PriceCalculator;
pub use sources::PgStore;
pub use surge::{classify, SurgeBadge};
pub use valuation::Valuator;
