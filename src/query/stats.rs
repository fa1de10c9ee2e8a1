//! Summary statistics over a price series
//!
//! All arithmetic is exact decimal. Rounding is half-to-even at two
//! places; the median is left unrounded.

use super::types::StatsError;
use rust_decimal::{Decimal, MathematicalOps};

const ROUND_DP: u32 = 2;

/// Result of [`summarize`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceSummary {
    pub average: Decimal,
    pub median: Decimal,
    pub standard_deviation: Decimal,
    pub percentage_change: Decimal,
}

/// Summarize a price series
///
/// The standard deviation is the population deviation around the rounded
/// average. The percentage change runs from the lowest to the highest
/// price, not from the first to the last observation.
pub fn summarize(mut prices: Vec<Decimal>) -> Result<PriceSummary, StatsError> {
    if prices.is_empty() {
        return Err(StatsError::EmptySeries);
    }
    prices.sort_unstable();

    let n = prices.len();
    let count = Decimal::from(n as u64);

    let sum = prices
        .iter()
        .try_fold(Decimal::ZERO, |acc, p| acc.checked_add(*p))
        .ok_or(StatsError::Overflow)?;
    let average = sum
        .checked_div(count)
        .ok_or(StatsError::Overflow)?
        .round_dp(ROUND_DP);

    let mid = n / 2;
    let median = if n % 2 == 0 {
        prices[mid - 1]
            .checked_add(prices[mid])
            .and_then(|s| s.checked_div(Decimal::TWO))
            .ok_or(StatsError::Overflow)?
    } else {
        prices[mid]
    };

    let squares = prices
        .iter()
        .try_fold(Decimal::ZERO, |acc, p| {
            let diff = p.checked_sub(average)?;
            acc.checked_add(diff.checked_mul(diff)?)
        })
        .ok_or(StatsError::Overflow)?;
    let standard_deviation = squares
        .checked_div(count)
        .and_then(|variance| variance.sqrt())
        .ok_or(StatsError::Overflow)?
        .round_dp(ROUND_DP);

    let low = prices[0];
    let high = prices[n - 1];
    if low.is_zero() {
        return Err(StatsError::ZeroBasePrice);
    }
    let percentage_change = (high - low)
        .checked_div(low)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .ok_or(StatsError::Overflow)?
        .round_dp(ROUND_DP);

    Ok(PriceSummary {
        average,
        median,
        standard_deviation,
        percentage_change,
    })
}
