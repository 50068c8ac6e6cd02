//! Page metadata derived from an offset/limit window over a counted result set.

use serde::Serialize;

/// Paging block attached to every paginated response.
///
/// Offsets and limits arrive straight from URL path segments, so they are
/// signed: a negative or zero `limit` is not an error, it collapses to a
/// single page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub total_items: i64,
    pub offset: i64,
    pub limit: i64,
    pub page: i64,
    pub total_pages: i64,
}

impl Pagination {
    #[must_use]
    pub fn new(total_items: i64, offset: i64, limit: i64) -> Self {
        let (page, total_pages) = if limit <= 0 {
            (1, 1)
        } else {
            (
                offset.div_euclid(limit).saturating_add(1),
                total_items
                    .div_euclid(limit)
                    .saturating_add(i64::from(total_items.rem_euclid(limit) != 0)),
            )
        };

        Self {
            total_items,
            offset,
            limit,
            page,
            total_pages,
        }
    }

    #[must_use]
    pub fn page(&self) -> i64 {
        self.page
    }

    #[must_use]
    pub fn total_pages(&self) -> i64 {
        self.total_pages
    }
}
