use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One immutable price/stock observation for an external offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferSnapshot {
    /// External offer id assigned by the offer provider.
    pub offer_id: Uuid,
    /// Price in the smallest currency unit.
    pub price: i64,
    pub items_in_stock: i64,
    pub created_at: DateTime<Utc>,
}

/// Inclusive time range over snapshot creation times. A missing bound is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeWindow {
    #[must_use]
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    /// Window with no bounds on either side.
    #[must_use]
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Both bounds, when both are present and `start` is after `end`.
    #[must_use]
    pub fn reversed_bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if start > end => Some((start, end)),
            _ => None,
        }
    }
}
