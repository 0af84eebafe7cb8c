use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::utils::time_utils;

/// Fixed look-back windows for return figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReturnWindow {
    Day,
    Week,
    Month,
    Year,
    YearToDate,
}

impl ReturnWindow {
    pub const ALL: [ReturnWindow; 5] = [
        ReturnWindow::Day,
        ReturnWindow::Week,
        ReturnWindow::Month,
        ReturnWindow::Year,
        ReturnWindow::YearToDate,
    ];

    /// The valuation date the window compares against.
    pub fn start_date(&self, now: DateTime<Utc>) -> NaiveDate {
        match self {
            ReturnWindow::Day => time_utils::days_before(now, 1),
            ReturnWindow::Week => time_utils::days_before(now, 7),
            ReturnWindow::Month => time_utils::days_before(now, 30),
            ReturnWindow::Year => time_utils::days_before(now, 365),
            ReturnWindow::YearToDate => time_utils::start_of_year(now),
        }
    }
}

/// Historical portfolio values at each window's start date. A missing entry
/// or `None` means the store had no data at or before that date.
pub type WindowValues = HashMap<ReturnWindow, Option<Decimal>>;

/// Value and return figures. Percentages are rounded to 2 decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Performance {
    pub total_value: Decimal,
    pub total_cost: Decimal,
    pub total_gain: Decimal,
    pub total_return_percent: Decimal,
    pub daily_return: Decimal,
    pub weekly_return: Decimal,
    pub monthly_return: Decimal,
    pub yearly_return: Decimal,
    pub ytd_return: Decimal,
    pub last_calculated: DateTime<Utc>,
}

impl Performance {
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            total_value: Decimal::ZERO,
            total_cost: Decimal::ZERO,
            total_gain: Decimal::ZERO,
            total_return_percent: Decimal::ZERO,
            daily_return: Decimal::ZERO,
            weekly_return: Decimal::ZERO,
            monthly_return: Decimal::ZERO,
            yearly_return: Decimal::ZERO,
            ytd_return: Decimal::ZERO,
            last_calculated: now,
        }
    }
}
