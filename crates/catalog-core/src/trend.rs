use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrendError {
    #[error("price trend is undefined when the first price is zero")]
    DivisionUndefined,
}

/// Percentage change from `first` to `last`, rounded half away from zero and
/// always carrying exactly two decimal places.
///
/// # Errors
///
/// Returns [`TrendError::DivisionUndefined`] when `first` is zero.
pub fn price_trend(first: i64, last: i64) -> Result<Decimal, TrendError> {
    if first == 0 {
        return Err(TrendError::DivisionUndefined);
    }

    let first = Decimal::from(first);
    let last = Decimal::from(last);
    let mut pct = ((last - first) / first * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    pct.rescale(2);

    Ok(pct)
}
