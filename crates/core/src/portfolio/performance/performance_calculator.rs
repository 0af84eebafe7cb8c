//! Current value, total return and windowed returns of a holding set.

use chrono::{DateTime, Utc};
use log::debug;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::{Performance, ReturnWindow, WindowValues};
use crate::constants::DISPLAY_DECIMAL_PRECISION;
use crate::errors::{Error, Result};
use crate::holdings::Holding;

/// `(current - base) / base * 100`, or zero when `base` is zero.
pub fn percent_change(current: Decimal, base: Decimal) -> Result<Decimal> {
    if base.is_zero() {
        return Ok(Decimal::ZERO);
    }
    (current - base)
        .checked_div(base)
        .and_then(|ratio| ratio.checked_mul(dec!(100)))
        .ok_or_else(|| {
            Error::Computation(format!("percent change of {} over {}", current, base))
        })
}

fn overflow(what: &str) -> Error {
    Error::Computation(format!("decimal overflow while computing {}", what))
}

/// Computes performance for `holdings` at `now`.
///
/// `history` holds the portfolio value at each window's start date as
/// reported by the holdings store; a window without data returns zero.
/// Every holding is validated first, so a zero cost basis fails here with
/// `InvalidInput` instead of reaching a division.
pub fn calculate_performance(
    holdings: &[Holding],
    history: &WindowValues,
    now: DateTime<Utc>,
) -> Result<Performance> {
    if holdings.is_empty() {
        return Ok(Performance::empty(now));
    }

    let mut total_value = Decimal::ZERO;
    let mut total_cost = Decimal::ZERO;
    for holding in holdings {
        holding.validate(now)?;
        total_value = total_value
            .checked_add(holding.current_value()?)
            .ok_or_else(|| overflow("total value"))?;
        total_cost = total_cost
            .checked_add(holding.total_cost()?)
            .ok_or_else(|| overflow("total cost"))?;
    }

    let total_return = percent_change(total_value, total_cost)?;

    let window = |w: ReturnWindow| -> Result<Decimal> {
        match history.get(&w).copied().flatten() {
            Some(base) => percent_change(total_value, base),
            None => {
                debug!("No historical value for {:?} window, reporting 0", w);
                Ok(Decimal::ZERO)
            }
        }
    };

    let round = |d: Decimal| d.round_dp(DISPLAY_DECIMAL_PRECISION);

    Ok(Performance {
        total_value: round(total_value),
        total_cost: round(total_cost),
        total_gain: round(total_value - total_cost),
        total_return_percent: round(total_return),
        daily_return: round(window(ReturnWindow::Day)?),
        weekly_return: round(window(ReturnWindow::Week)?),
        monthly_return: round(window(ReturnWindow::Month)?),
        yearly_return: round(window(ReturnWindow::Year)?),
        ytd_return: round(window(ReturnWindow::YearToDate)?),
        last_calculated: now,
    })
}
