//! Risk analytics over a portfolio's daily value series.

mod risk_calculator;
mod risk_model;

pub use risk_calculator::*;
pub use risk_model::*;
