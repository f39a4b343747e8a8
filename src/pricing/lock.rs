//! Short-lived price guarantees between quote and checkout.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::requests::PricingRequest;
use super::responses::PricingResponse;

/// How long a locked price stays valid
pub const PRICE_LOCK_MINUTES: i64 = 15;

/// A quote frozen for one renter and one car
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceLock {
    pub token: Uuid,
    pub car_id: Uuid,
    pub user_id: Uuid,
    pub locked_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub request: PricingRequest,
    pub response: PricingResponse,
}

impl PriceLock {
    pub fn issue(
        response: PricingResponse,
        car_id: Uuid,
        user_id: Uuid,
        request: PricingRequest,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            token: Uuid::new_v4(),
            car_id,
            user_id,
            locked_at: now,
            expires_at: now + Duration::minutes(PRICE_LOCK_MINUTES),
            request,
            response,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Seconds left, never negative
    pub fn expires_in_secs(&self, now: DateTime<Utc>) -> i64 {
        if self.is_expired(now) {
            return 0;
        }
        (self.expires_at - now).num_seconds()
    }
}
