//! Target allocation validation and deviation-triggered recommendations.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::{
    AllocationDeviation, RebalanceAction, RebalanceAnalysis, RebalanceRecommendation,
    TargetAllocation,
};
use crate::constants::{
    ALLOCATION_SUM_TOLERANCE, DISPLAY_DECIMAL_PRECISION, MAX_REBALANCE_THRESHOLD,
    MIN_REBALANCE_THRESHOLD,
};
use crate::errors::{Error, Result, ValidationError};
use crate::holdings::AssetClass;
use crate::portfolio::allocation::Allocation;

/// Each class must be within [0, 100] and the total within 100 ± 0.01.
pub fn validate_target_allocation(target: &TargetAllocation) -> Result<()> {
    for class in AssetClass::ALL {
        let value = target.get(class);
        if !(Decimal::ZERO..=dec!(100)).contains(&value) {
            return Err(ValidationError::OutOfRange {
                field: TargetAllocation::field_name(class),
                value,
                min: Decimal::ZERO,
                max: dec!(100),
            }
            .into());
        }
    }

    let sum = target.sum();
    if (sum - dec!(100)).abs() > ALLOCATION_SUM_TOLERANCE {
        return Err(ValidationError::AllocationSum { sum }.into());
    }
    Ok(())
}

pub fn validate_rebalance_threshold(threshold: Decimal) -> Result<()> {
    if !(MIN_REBALANCE_THRESHOLD..=MAX_REBALANCE_THRESHOLD).contains(&threshold) {
        return Err(ValidationError::OutOfRange {
            field: "rebalanceThreshold",
            value: threshold,
            min: MIN_REBALANCE_THRESHOLD,
            max: MAX_REBALANCE_THRESHOLD,
        }
        .into());
    }
    Ok(())
}

/// Compares `current` against `target`.
///
/// Rebalancing is required when any class deviates by more than `threshold`
/// percentage points. Each such class gets a BUY (underweight) or SELL
/// (overweight) recommendation for `|target - current| / 100 * total_value`.
pub fn analyze_rebalance(
    current: &Allocation,
    target: &TargetAllocation,
    threshold: Decimal,
    total_value: Decimal,
) -> Result<RebalanceAnalysis> {
    validate_target_allocation(target)?;
    validate_rebalance_threshold(threshold)?;

    let mut deviations = Vec::with_capacity(AssetClass::ALL.len());
    let mut recommendations = Vec::new();

    for class in AssetClass::ALL {
        let current_percent = current.get(class);
        let target_percent = target.get(class);
        let deviation = (current_percent - target_percent).abs();

        if deviation > threshold {
            let delta = ((target_percent - current_percent) / dec!(100))
                .checked_mul(total_value)
                .ok_or_else(|| {
                    Error::Computation(format!("rebalance amount overflow for {}", class))
                })?;
            let action = if current_percent < target_percent {
                RebalanceAction::Buy
            } else {
                RebalanceAction::Sell
            };
            recommendations.push(RebalanceRecommendation {
                asset_class: class,
                action,
                amount: delta.abs().round_dp(DISPLAY_DECIMAL_PRECISION),
            });
        }

        deviations.push(AllocationDeviation {
            asset_class: class,
            current_percent,
            target_percent,
            deviation,
        });
    }

    Ok(RebalanceAnalysis {
        required: !recommendations.is_empty(),
        threshold,
        deviations,
        recommendations,
    })
}
