//! Special-event multipliers overlapping a rental window.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::error::{AppError, Result};

use super::models::SpecialEvent;
use super::sources::EventSource;

#[derive(Clone)]
pub struct EventOverlay {
    source: Arc<dyn EventSource>,
}

impl EventOverlay {
    pub fn new(source: Arc<dyn EventSource>) -> Self {
        Self { source }
    }

    /// Active events whose inclusive date range intersects
    /// `first_day..=last_day`, ordered by start date. Days are the region's
    /// local calendar dates.
    #[instrument(skip(self))]
    pub async fn active_events(
        &self,
        region_id: Uuid,
        first_day: NaiveDate,
        last_day: NaiveDate,
    ) -> Result<Vec<SpecialEvent>> {
        if last_day < first_day {
            return Err(AppError::InvalidRequest(
                "event window ends before it starts".to_string(),
            ));
        }

        let mut events: Vec<SpecialEvent> = self
            .source
            .events_in_window(region_id, first_day, last_day)
            .await?
            .into_iter()
            .filter(|e| e.region_id == region_id && e.overlaps(first_day, last_day))
            .collect();
        events.sort_by_key(|e| e.start_date);

        debug!(%region_id, count = events.len(), "Resolved special events");
        Ok(events)
    }
}

/// Collapse overlapping events into one signed factor.
///
/// The factor with the largest magnitude wins; on a tie the surcharge wins.
/// Events never stack.
pub fn resolve_event_factor(events: &[SpecialEvent]) -> f64 {
    events
        .iter()
        .map(|e| e.factor)
        .filter(|f| f.is_finite())
        .fold(0.0_f64, |best, f| {
            if f.abs() > best.abs() || (f.abs() == best.abs() && f > best) {
                f
            } else {
                best
            }
        })
}
