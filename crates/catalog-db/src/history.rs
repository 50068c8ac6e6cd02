//! Store-backed offer history and price trend queries.

use catalog_core::{page_history, price_trend, OfferSnapshot, PagedHistory, TimeWindow, TrendError};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::offers::offer_history;
use crate::DbError;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("no offer history for {0} in the requested window")]
    NotFound(Uuid),
    #[error("invalid time range: start {start} is after end {end}")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    #[error(transparent)]
    Trend(#[from] TrendError),
    #[error(transparent)]
    Db(DbError),
}

impl From<DbError> for HistoryError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::InvalidRange { start, end } => Self::InvalidRange { start, end },
            other => Self::Db(other),
        }
    }
}

/// Percentage price change of an offer across a window, with the history it
/// was computed from.
#[derive(Debug, Clone, Serialize)]
pub struct OfferTrend {
    pub offer_id: Uuid,
    /// `(last - first) / first * 100`, two decimal places.
    pub trend: Decimal,
    pub start_price: i64,
    pub end_price: i64,
    pub history: Vec<OfferSnapshot>,
}

/// One page of an offer's snapshots inside `window`.
///
/// # Errors
///
/// Returns [`HistoryError::NotFound`] when the window holds no snapshots,
/// [`HistoryError::InvalidRange`] for a reversed window, or
/// [`HistoryError::Db`] on query failure.
pub async fn get_offer_history(
    pool: &PgPool,
    offer_id: Uuid,
    window: TimeWindow,
    offset: i64,
    limit: i64,
) -> Result<PagedHistory, HistoryError> {
    let history = offer_history(pool, offer_id, window).await?;
    if history.total == 0 {
        return Err(HistoryError::NotFound(offer_id));
    }

    Ok(page_history(history.snapshots, offset, limit))
}

/// Price trend between the earliest and latest snapshot inside `window`.
///
/// # Errors
///
/// Returns [`HistoryError::NotFound`] when the window holds no snapshots,
/// [`HistoryError::Trend`] when the earliest price is zero,
/// [`HistoryError::InvalidRange`] for a reversed window, or
/// [`HistoryError::Db`] on query failure.
pub async fn get_offer_trend(
    pool: &PgPool,
    offer_id: Uuid,
    window: TimeWindow,
) -> Result<OfferTrend, HistoryError> {
    let history = offer_history(pool, offer_id, window).await?;
    if history.total == 0 {
        return Err(HistoryError::NotFound(offer_id));
    }

    let (Some(first), Some(last)) = (history.snapshots.first(), history.snapshots.last()) else {
        return Err(HistoryError::NotFound(offer_id));
    };
    let (start_price, end_price) = (first.price, last.price);
    let trend = price_trend(start_price, end_price)?;

    Ok(OfferTrend {
        offer_id,
        trend,
        start_price,
        end_price,
        history: history.snapshots,
    })
}
