//! Latest demand snapshot per region.

use std::sync::Arc;

use tracing::{debug, instrument};
use uuid::Uuid;

use crate::error::Result;

use super::models::DemandSnapshot;
use super::sources::DemandSource;

/// Reads the newest demand snapshot for a region. Never cached: demand
/// moves faster than any TTL worth having.
#[derive(Clone)]
pub struct DemandTracker {
    source: Arc<dyn DemandSource>,
}

impl DemandTracker {
    pub fn new(source: Arc<dyn DemandSource>) -> Self {
        Self { source }
    }

    /// `Ok(None)` when the region never recorded a snapshot
    #[instrument(skip(self))]
    pub async fn latest(&self, region_id: Uuid) -> Result<Option<DemandSnapshot>> {
        let snapshot = self.source.latest_snapshot(region_id).await?;
        match &snapshot {
            Some(s) => debug!(
                %region_id,
                demand_ratio = s.demand_ratio,
                surge_factor = s.surge_factor,
                "Demand snapshot found"
            ),
            None => debug!(%region_id, "No demand snapshot recorded"),
        }
        Ok(snapshot)
    }
}
