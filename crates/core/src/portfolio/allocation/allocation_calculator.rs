//! Converts a holding set into normalized percentages by asset class.

use log::debug;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::Allocation;
use crate::constants::{ALLOCATION_PRECISION, ALLOCATION_SUM_TOLERANCE};
use crate::errors::{Error, Result};
use crate::holdings::{AssetClass, Holding};

/// Computes the allocation of `holdings`.
///
/// Percentages are rounded to 4 decimals. When rounding leaves the total more
/// than 0.01 away from 100, every class is rescaled by `100 / raw_sum`.
/// An empty set or a zero total value yields an all-zero allocation.
///
/// Fails with `InvalidInput` when any holding is unpriced or has a
/// non-positive price.
pub fn calculate_allocation(holdings: &[Holding]) -> Result<Allocation> {
    let mut values = Allocation::default();
    let mut total_value = Decimal::ZERO;
    for holding in holdings {
        let value = holding.current_value()?;
        let class_value = values.get_mut(holding.asset_class);
        *class_value = class_value
            .checked_add(value)
            .ok_or_else(|| overflow(holding.asset_class))?;
        total_value = total_value
            .checked_add(value)
            .ok_or_else(|| overflow(holding.asset_class))?;
    }

    if total_value <= Decimal::ZERO {
        return Ok(Allocation::default());
    }

    let mut allocation = Allocation::default();
    for class in AssetClass::ALL {
        let pct = values
            .get(class)
            .checked_div(total_value)
            .and_then(|share| share.checked_mul(dec!(100)))
            .ok_or_else(|| overflow(class))?;
        *allocation.get_mut(class) = pct.round_dp(ALLOCATION_PRECISION);
    }

    let raw_sum = allocation.sum();
    if (raw_sum - dec!(100)).abs() > ALLOCATION_SUM_TOLERANCE {
        debug!("Rescaling allocation, raw sum was {}", raw_sum);
        let factor = dec!(100) / raw_sum;
        for class in AssetClass::ALL {
            let scaled = allocation.get(class) * factor;
            *allocation.get_mut(class) = scaled.round_dp(ALLOCATION_PRECISION);
        }
    }

    Ok(allocation)
}

fn overflow(class: AssetClass) -> Error {
    Error::Computation(format!("allocation overflow for {}", class))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::InvalidInputError;
    use chrono::{Duration, Utc};

    fn holding(class: AssetClass, quantity: Decimal, price: Option<Decimal>) -> Holding {
        let now = Utc::now();
        Holding {
            id: format!("{}-{}", class, quantity),
            owner_id: "owner".to_string(),
            asset_class: class,
            symbol: class.as_str().to_string(),
            quantity,
            cost_basis: dec!(1),
            current_price: price,
            purchase_date: now - Duration::days(10),
            last_updated: now,
        }
    }

    #[test]
    fn mixed_portfolio_allocation() {
        let holdings = vec![
            holding(AssetClass::Stock, dec!(100), Some(dec!(160))),
            holding(AssetClass::Bond, dec!(200), Some(dec!(52))),
            holding(AssetClass::Etf, dec!(50), Some(dec!(420))),
        ];

        let allocation = calculate_allocation(&holdings).unwrap();

        assert!((allocation.stocks - dec!(33.76)).abs() <= dec!(0.01));
        assert!((allocation.bonds - dec!(21.94)).abs() <= dec!(0.01));
        assert!((allocation.etfs - dec!(44.30)).abs() <= dec!(0.01));
        assert_eq!(allocation.mutual_funds, Decimal::ZERO);
        assert!((allocation.sum() - dec!(100)).abs() <= dec!(0.01));
    }

    #[test]
    fn thirds_still_sum_to_hundred() {
        let holdings = vec![
            holding(AssetClass::Stock, dec!(1), Some(dec!(1))),
            holding(AssetClass::Bond, dec!(1), Some(dec!(1))),
            holding(AssetClass::MutualFund, dec!(1), Some(dec!(1))),
        ];

        let allocation = calculate_allocation(&holdings).unwrap();
        assert_eq!(allocation.stocks, dec!(33.3333));
        assert!((allocation.sum() - dec!(100)).abs() <= dec!(0.01));
    }

    #[test]
    fn same_class_holdings_are_summed() {
        let holdings = vec![
            holding(AssetClass::Etf, dec!(2), Some(dec!(10))),
            holding(AssetClass::Etf, dec!(3), Some(dec!(10))),
        ];
        let allocation = calculate_allocation(&holdings).unwrap();
        assert_eq!(allocation.etfs, dec!(100));
    }

    #[test]
    fn overflowing_total_is_a_computation_error() {
        let huge = Decimal::from(1_000_000_000_000_000i64);
        let holdings = vec![holding(AssetClass::Stock, huge, Some(huge))];
        assert!(matches!(
            calculate_allocation(&holdings),
            Err(Error::Computation(_))
        ));

        // Each value fits, their sum does not.
        let big = Decimal::from(200_000_000_000_000i64);
        let holdings = vec![
            holding(AssetClass::Stock, big, Some(big)),
            holding(AssetClass::Bond, big, Some(big)),
        ];
        assert!(matches!(
            calculate_allocation(&holdings),
            Err(Error::Computation(_))
        ));
    }

    #[test]
    fn empty_set_yields_zero_allocation() {
        let allocation = calculate_allocation(&[]).unwrap();
        assert!(allocation.is_zero());
    }

    #[test]
    fn missing_price_is_invalid_input() {
        let holdings = vec![
            holding(AssetClass::Stock, dec!(1), Some(dec!(1))),
            holding(AssetClass::Bond, dec!(1), None),
        ];
        assert!(matches!(
            calculate_allocation(&holdings),
            Err(Error::InvalidInput(InvalidInputError::MissingPrice { .. }))
        ));
    }

    #[test]
    fn zero_price_is_invalid_input() {
        let holdings = vec![holding(AssetClass::Stock, dec!(1), Some(Decimal::ZERO))];
        assert!(matches!(
            calculate_allocation(&holdings),
            Err(Error::InvalidInput(InvalidInputError::NonPositive { .. }))
        ));
    }
}
