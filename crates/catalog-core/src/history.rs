use serde::Serialize;

use crate::offers::OfferSnapshot;
use crate::pagination::Pagination;

/// One page of an offer's chronological history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PagedHistory {
    pub items: Vec<OfferSnapshot>,
    pub paging: Pagination,
}

/// Slices `[offset, offset + limit)` out of an already-ordered history.
///
/// Pagination is computed over the full, unsliced length. A window that runs
/// past the end yields fewer (or zero) items; a negative offset starts at the
/// beginning and a non-positive limit yields no items.
#[must_use]
pub fn page_history(snapshots: Vec<OfferSnapshot>, offset: i64, limit: i64) -> PagedHistory {
    let total = i64::try_from(snapshots.len()).unwrap_or(i64::MAX);
    let paging = Pagination::new(total, offset, limit);

    let start = usize::try_from(offset.max(0)).unwrap_or(usize::MAX);
    let take = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);

    let items = snapshots.into_iter().skip(start).take(take).collect();

    PagedHistory { items, paging }
}
