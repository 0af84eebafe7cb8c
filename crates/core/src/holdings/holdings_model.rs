use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, InvalidInputError, Result, ValidationError};

/// Closed set of asset classes. Unknown values are rejected, never mapped to
/// a catch-all bucket.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetClass {
    Stock,
    Bond,
    MutualFund,
    Etf,
}

impl AssetClass {
    pub const ALL: [AssetClass; 4] = [
        AssetClass::Stock,
        AssetClass::Bond,
        AssetClass::MutualFund,
        AssetClass::Etf,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetClass::Stock => "STOCK",
            AssetClass::Bond => "BOND",
            AssetClass::MutualFund => "MUTUAL_FUND",
            AssetClass::Etf => "ETF",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetClass {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "STOCK" => Ok(AssetClass::Stock),
            "BOND" => Ok(AssetClass::Bond),
            "MUTUAL_FUND" => Ok(AssetClass::MutualFund),
            "ETF" => Ok(AssetClass::Etf),
            _ => Err(InvalidInputError::UnknownAssetClass(s.to_string()).into()),
        }
    }
}

/// One investment position.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub id: String,
    pub owner_id: String,
    pub asset_class: AssetClass,
    pub symbol: String,
    pub quantity: Decimal,
    /// Price per unit at acquisition.
    pub cost_basis: Decimal,
    /// `None` until the first price refresh.
    pub current_price: Option<Decimal>,
    pub purchase_date: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl Holding {
    /// Checks the stored invariants. Calculators call this before any
    /// division by `cost_basis` can happen.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<()> {
        check_fields(
            &self.id,
            &self.symbol,
            self.quantity,
            self.cost_basis,
            self.current_price,
            self.purchase_date,
            now,
        )
    }

    /// The current price, failing when the holding has never been priced.
    pub fn priced(&self) -> Result<Decimal> {
        match self.current_price {
            Some(price) if price > Decimal::ZERO => Ok(price),
            Some(price) => Err(InvalidInputError::NonPositive {
                holding_id: self.id.clone(),
                field: "currentPrice",
                value: price,
            }
            .into()),
            None => Err(InvalidInputError::MissingPrice {
                holding_id: self.id.clone(),
            }
            .into()),
        }
    }

    /// `quantity * current_price`. Fails when unpriced or on overflow.
    pub fn current_value(&self) -> Result<Decimal> {
        let price = self.priced()?;
        self.quantity
            .checked_mul(price)
            .ok_or_else(|| overflow(&self.id, "current value"))
    }

    pub fn total_cost(&self) -> Result<Decimal> {
        self.quantity
            .checked_mul(self.cost_basis)
            .ok_or_else(|| overflow(&self.id, "total cost"))
    }

    pub fn unrealized_gain(&self) -> Result<Decimal> {
        let price = self.priced()?;
        self.quantity
            .checked_mul(price - self.cost_basis)
            .ok_or_else(|| overflow(&self.id, "unrealized gain"))
    }

    /// `(current_price - cost_basis) / cost_basis`.
    pub fn return_fraction(&self) -> Result<Decimal> {
        let price = self.priced()?;
        ensure_positive(&self.id, "costBasis", self.cost_basis)?;
        (price - self.cost_basis)
            .checked_div(self.cost_basis)
            .ok_or_else(|| overflow(&self.id, "return fraction"))
    }
}

fn overflow(holding_id: &str, what: &str) -> Error {
    Error::Computation(format!(
        "decimal overflow while computing {} of holding {}",
        what, holding_id
    ))
}

/// Input for creating a holding.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewHolding {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id: Option<String>,
    pub asset_class: AssetClass,
    pub symbol: String,
    pub quantity: Decimal,
    pub cost_basis: Decimal,
    #[serde(default)]
    pub current_price: Option<Decimal>,
    pub purchase_date: DateTime<Utc>,
}

impl NewHolding {
    pub fn validate(&self, now: DateTime<Utc>) -> Result<()> {
        let id = self.id.as_deref().unwrap_or(self.symbol.as_str());
        check_fields(
            id,
            &self.symbol,
            self.quantity,
            self.cost_basis,
            self.current_price,
            self.purchase_date,
            now,
        )?;
        // Calculators never skip a holding, so an unpriced one could not be
        // valued after the update.
        if self.current_price.is_none() {
            return Err(InvalidInputError::MissingPrice {
                holding_id: id.to_string(),
            }
            .into());
        }
        Ok(())
    }

    pub fn into_holding(self, owner_id: &str, now: DateTime<Utc>) -> Holding {
        Holding {
            id: self
                .id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            owner_id: owner_id.to_string(),
            asset_class: self.asset_class,
            symbol: self.symbol.trim().to_string(),
            quantity: self.quantity,
            cost_basis: self.cost_basis,
            current_price: self.current_price,
            purchase_date: self.purchase_date,
            last_updated: now,
        }
    }
}

/// Partial update of an existing holding.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct HoldingUpdate {
    pub id: String,
    #[serde(default)]
    pub quantity: Option<Decimal>,
    #[serde(default)]
    pub cost_basis: Option<Decimal>,
    #[serde(default)]
    pub current_price: Option<Decimal>,
}

impl HoldingUpdate {
    pub fn price(id: impl Into<String>, price: Decimal) -> Self {
        Self {
            id: id.into(),
            current_price: Some(price),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(InvalidInputError::EmptyField("id").into());
        }
        let fields = [
            ("quantity", self.quantity),
            ("costBasis", self.cost_basis),
            ("currentPrice", self.current_price),
        ];
        for (field, value) in fields {
            if let Some(v) = value {
                ensure_positive(&self.id, field, v)?;
            }
        }
        Ok(())
    }

    fn apply_to(&self, holding: &mut Holding, now: DateTime<Utc>) {
        if let Some(quantity) = self.quantity {
            holding.quantity = quantity;
        }
        if let Some(cost_basis) = self.cost_basis {
            holding.cost_basis = cost_basis;
        }
        if let Some(price) = self.current_price {
            holding.current_price = Some(price);
            holding.last_updated = now;
        }
    }
}

/// A set of holding mutations applied as one unit.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct HoldingsDelta {
    #[serde(default)]
    pub create: Vec<NewHolding>,
    #[serde(default)]
    pub update: Vec<HoldingUpdate>,
    #[serde(default)]
    pub delete: Vec<String>,
}

impl HoldingsDelta {
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.update.is_empty() && self.delete.is_empty()
    }

    /// Validates every entry without touching any holding.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<()> {
        for new_holding in &self.create {
            new_holding.validate(now)?;
        }
        let mut seen = HashSet::new();
        for update in &self.update {
            update.validate()?;
            if !seen.insert(update.id.as_str()) {
                return Err(ValidationError::DuplicateHolding(update.id.clone()).into());
            }
        }
        for id in &self.delete {
            if !seen.insert(id.as_str()) {
                return Err(ValidationError::DuplicateHolding(id.clone()).into());
            }
        }
        Ok(())
    }

    /// Produces the holding set that results from applying this delta to
    /// `current`. `current` is left untouched; unknown ids fail the whole delta.
    pub fn apply_to(
        &self,
        owner_id: &str,
        current: &[Holding],
        now: DateTime<Utc>,
    ) -> Result<Vec<Holding>> {
        let mut next: Vec<Holding> = current.to_vec();

        for update in &self.update {
            let holding = next
                .iter_mut()
                .find(|h| h.id == update.id)
                .ok_or_else(|| ValidationError::UnknownHolding(update.id.clone()))?;
            update.apply_to(holding, now);
        }

        for id in &self.delete {
            let before = next.len();
            next.retain(|h| &h.id != id);
            if next.len() == before {
                return Err(ValidationError::UnknownHolding(id.clone()).into());
            }
        }

        for new_holding in &self.create {
            let holding = new_holding.clone().into_holding(owner_id, now);
            if next.iter().any(|h| h.id == holding.id) {
                return Err(ValidationError::DuplicateHolding(holding.id).into());
            }
            next.push(holding);
        }

        Ok(next)
    }
}

fn ensure_positive(holding_id: &str, field: &'static str, value: Decimal) -> Result<()> {
    if value <= Decimal::ZERO {
        return Err(InvalidInputError::NonPositive {
            holding_id: holding_id.to_string(),
            field,
            value,
        }
        .into());
    }
    Ok(())
}

fn check_fields(
    id: &str,
    symbol: &str,
    quantity: Decimal,
    cost_basis: Decimal,
    current_price: Option<Decimal>,
    purchase_date: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<()> {
    if symbol.trim().is_empty() {
        return Err(InvalidInputError::EmptyField("symbol").into());
    }
    ensure_positive(id, "quantity", quantity)?;
    ensure_positive(id, "costBasis", cost_basis)?;
    if let Some(price) = current_price {
        ensure_positive(id, "currentPrice", price)?;
    }
    if purchase_date > now {
        return Err(InvalidInputError::FutureDate {
            holding_id: id.to_string(),
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn holding(quantity: Decimal, cost_basis: Decimal, price: Option<Decimal>) -> Holding {
        let now = Utc::now();
        Holding {
            id: "H1".to_string(),
            owner_id: "owner".to_string(),
            asset_class: AssetClass::Stock,
            symbol: "AAPL".to_string(),
            quantity,
            cost_basis,
            current_price: price,
            purchase_date: now - Duration::days(30),
            last_updated: now,
        }
    }

    fn new_holding(cost_basis: Decimal) -> NewHolding {
        NewHolding {
            id: None,
            asset_class: AssetClass::Bond,
            symbol: "BND".to_string(),
            quantity: dec!(10),
            cost_basis,
            current_price: Some(dec!(72)),
            purchase_date: Utc::now() - Duration::days(1),
        }
    }

    #[test]
    fn derived_values_for_priced_holding() {
        let h = holding(dec!(100), dec!(150), Some(dec!(160)));
        assert_eq!(h.current_value().unwrap(), dec!(16000));
        assert_eq!(h.unrealized_gain().unwrap(), dec!(1000));
        assert_eq!(h.return_fraction().unwrap().round_dp(4), dec!(0.0667));
        assert!(h.validate(Utc::now()).is_ok());
    }

    #[test]
    fn unpriced_holding_has_no_value() {
        let h = holding(dec!(5), dec!(20), None);
        assert!(matches!(
            h.current_value(),
            Err(Error::InvalidInput(InvalidInputError::MissingPrice { .. }))
        ));
        assert!(h.return_fraction().is_err());
        assert!(matches!(
            h.priced(),
            Err(Error::InvalidInput(InvalidInputError::MissingPrice { .. }))
        ));
    }

    #[test]
    fn zero_cost_basis_is_rejected_at_creation() {
        let err = new_holding(Decimal::ZERO).validate(Utc::now()).unwrap_err();
        match err {
            Error::InvalidInput(InvalidInputError::NonPositive { field, .. }) => {
                assert_eq!(field, "costBasis")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unpriced_new_holding_is_rejected() {
        let mut input = new_holding(dec!(10));
        input.current_price = None;
        assert!(matches!(
            input.validate(Utc::now()),
            Err(Error::InvalidInput(InvalidInputError::MissingPrice { .. }))
        ));
    }

    #[test]
    fn overflowing_value_is_a_computation_error() {
        let huge = Decimal::from(1_000_000_000_000_000i64);
        let h = holding(huge, dec!(1), Some(huge));
        assert!(matches!(h.current_value(), Err(Error::Computation(_))));
        assert!(matches!(h.unrealized_gain(), Err(Error::Computation(_))));

        let costly = holding(huge, huge, Some(dec!(1)));
        assert!(matches!(costly.total_cost(), Err(Error::Computation(_))));
    }

    #[test]
    fn future_purchase_date_is_rejected() {
        let mut input = new_holding(dec!(10));
        input.purchase_date = Utc::now() + Duration::days(2);
        assert!(matches!(
            input.validate(Utc::now()),
            Err(Error::InvalidInput(InvalidInputError::FutureDate { .. }))
        ));
    }

    #[test]
    fn asset_class_parsing_rejects_unknown_values() {
        assert_eq!("etf".parse::<AssetClass>().unwrap(), AssetClass::Etf);
        assert_eq!(
            "MUTUAL_FUND".parse::<AssetClass>().unwrap(),
            AssetClass::MutualFund
        );
        assert!(matches!(
            "CRYPTO".parse::<AssetClass>(),
            Err(Error::InvalidInput(InvalidInputError::UnknownAssetClass(_)))
        ));
        assert!(serde_json::from_str::<AssetClass>("\"CRYPTO\"").is_err());
    }

    #[test]
    fn delta_applies_updates_deletes_and_creates() {
        let now = Utc::now();
        let existing = vec![holding(dec!(100), dec!(150), Some(dec!(160)))];
        let delta = HoldingsDelta {
            create: vec![new_holding(dec!(50))],
            update: vec![HoldingUpdate::price("H1", dec!(170))],
            delete: vec![],
        };
        delta.validate(now).unwrap();

        let next = delta.apply_to("owner", &existing, now).unwrap();
        assert_eq!(next.len(), 2);
        assert_eq!(next[0].current_price, Some(dec!(170)));
        assert_eq!(next[1].owner_id, "owner");
        // source set is untouched
        assert_eq!(existing[0].current_price, Some(dec!(160)));
    }

    #[test]
    fn delta_with_unknown_id_fails() {
        let existing = vec![holding(dec!(1), dec!(1), Some(dec!(1)))];
        let delta = HoldingsDelta {
            delete: vec!["missing".to_string()],
            ..HoldingsDelta::default()
        };
        assert!(matches!(
            delta.apply_to("owner", &existing, Utc::now()),
            Err(Error::Validation(ValidationError::UnknownHolding(_)))
        ));
    }

    #[test]
    fn delta_rejects_duplicate_targets() {
        let delta = HoldingsDelta {
            update: vec![HoldingUpdate::price("H1", dec!(1))],
            delete: vec!["H1".to_string()],
            ..HoldingsDelta::default()
        };
        assert!(matches!(
            delta.validate(Utc::now()),
            Err(Error::Validation(ValidationError::DuplicateHolding(_)))
        ));
    }

    #[test]
    fn update_with_non_positive_price_is_rejected() {
        let update = HoldingUpdate::price("H1", dec!(-3));
        assert!(update.validate().is_err());
    }
}
