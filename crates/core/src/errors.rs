//! Core error types for the analytics engine.
//!
//! Collaborator failures (holdings store, price feed, cache store) are carried
//! in string form so this type stays independent of any storage or transport.

use rust_decimal::Decimal;
use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the engine.
#[derive(Error, Debug)]
pub enum Error {
    /// A holding is malformed (non-positive quantity, cost, price...).
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// Risk metrics were requested without enough observations.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Unexpected arithmetic failure, such as a decimal overflow.
    #[error("Calculation failed: {0}")]
    Computation(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Price feed error: {0}")]
    PriceFeed(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Invalid configuration value: {0}")]
    Config(String),
}

/// Malformed holding data. Field names use their wire (camelCase) spelling.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidInputError {
    #[error("'{field}' must be positive for holding {holding_id}, got {value}")]
    NonPositive {
        holding_id: String,
        field: &'static str,
        value: Decimal,
    },

    #[error("Holding {holding_id} has no current price")]
    MissingPrice { holding_id: String },

    #[error("'purchaseDate' of holding {holding_id} is in the future")]
    FutureDate { holding_id: String },

    #[error("Unknown asset class '{0}'")]
    UnknownAssetClass(String),

    #[error("Required field '{0}' is empty")]
    EmptyField(&'static str),
}

/// Rejected target allocations, thresholds and change sets.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("'{field}' must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: Decimal,
        min: Decimal,
        max: Decimal,
    },

    #[error("'targetAllocation' must sum to 100, got {sum}")]
    AllocationSum { sum: Decimal },

    #[error("Holding '{0}' appears more than once in the change set")]
    DuplicateHolding(String),

    #[error("Holding '{0}' does not exist")]
    UnknownHolding(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Cache(err.to_string())
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}
