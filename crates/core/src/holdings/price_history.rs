//! Historical prices with a nearest-prior-date lookup policy.
//!
//! A date without an exact observation takes the most recent price at or
//! before it. There is no interpolation between observations, and a date
//! before the first observation has no price at all.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::Holding;

#[derive(Debug, Clone, Default)]
pub struct PriceHistory {
    prices: HashMap<String, BTreeMap<NaiveDate, Decimal>>,
}

impl PriceHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: &str, date: NaiveDate, price: Decimal) {
        self.prices
            .entry(symbol.to_string())
            .or_default()
            .insert(date, price);
    }

    pub fn extend<I>(&mut self, symbol: &str, points: I)
    where
        I: IntoIterator<Item = (NaiveDate, Decimal)>,
    {
        let series = self.prices.entry(symbol.to_string()).or_default();
        series.extend(points);
    }

    /// Most recent price for `symbol` on or before `date`.
    pub fn price_on_or_before(&self, symbol: &str, date: NaiveDate) -> Option<Decimal> {
        self.prices
            .get(symbol)?
            .range(..=date)
            .next_back()
            .map(|(_, price)| *price)
    }

    /// Value of `holdings` as of `date`.
    ///
    /// Holdings purchased after `date` are excluded. Holdings without a price
    /// on or before `date` contribute nothing. Returns `None` when no holding
    /// could be valued at all.
    pub fn portfolio_value_as_of(&self, holdings: &[Holding], date: NaiveDate) -> Option<Decimal> {
        let mut total = Decimal::ZERO;
        let mut valued_any = false;

        for holding in holdings {
            if holding.purchase_date.date_naive() > date {
                continue;
            }
            if let Some(price) = self.price_on_or_before(&holding.symbol, date) {
                total += holding.quantity * price;
                valued_any = true;
            }
        }

        valued_any.then_some(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holdings::AssetClass;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn holding(symbol: &str, quantity: Decimal, bought_day: u32) -> Holding {
        let bought = Utc.with_ymd_and_hms(2024, 3, bought_day, 12, 0, 0).unwrap();
        Holding {
            id: symbol.to_string(),
            owner_id: "owner".to_string(),
            asset_class: AssetClass::Stock,
            symbol: symbol.to_string(),
            quantity,
            cost_basis: dec!(1),
            current_price: None,
            purchase_date: bought,
            last_updated: bought,
        }
    }

    #[test]
    fn gap_uses_nearest_prior_observation() {
        let mut history = PriceHistory::new();
        history.extend("AAA", [(d(1), dec!(10)), (d(5), dec!(12))]);

        assert_eq!(history.price_on_or_before("AAA", d(1)), Some(dec!(10)));
        assert_eq!(history.price_on_or_before("AAA", d(4)), Some(dec!(10)));
        assert_eq!(history.price_on_or_before("AAA", d(9)), Some(dec!(12)));
    }

    #[test]
    fn date_before_first_observation_has_no_price() {
        let mut history = PriceHistory::new();
        history.insert("AAA", d(10), dec!(10));
        assert_eq!(history.price_on_or_before("AAA", d(9)), None);
        assert_eq!(history.price_on_or_before("ZZZ", d(20)), None);
    }

    #[test]
    fn portfolio_value_skips_later_purchases_and_unpriced_symbols() {
        let mut history = PriceHistory::new();
        history.extend("AAA", [(d(1), dec!(10)), (d(6), dec!(11))]);
        history.insert("BBB", d(1), dec!(50));

        let holdings = vec![
            holding("AAA", dec!(2), 1),
            holding("BBB", dec!(1), 8),
            holding("CCC", dec!(4), 1),
        ];

        assert_eq!(history.portfolio_value_as_of(&holdings, d(7)), Some(dec!(22)));
        assert_eq!(history.portfolio_value_as_of(&holdings, d(9)), Some(dec!(72)));
        assert_eq!(history.portfolio_value_as_of(&[], d(9)), None);
    }
}
