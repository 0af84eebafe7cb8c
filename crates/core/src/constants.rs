use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Decimal precision for risk statistics
pub const DECIMAL_PRECISION: u32 = 6;

/// Decimal precision for allocation percentages
pub const ALLOCATION_PRECISION: u32 = 4;

/// Decimal precision for returned percentages and amounts
pub const DISPLAY_DECIMAL_PRECISION: u32 = 2;

/// Allowed drift of an allocation sum away from 100
pub const ALLOCATION_SUM_TOLERANCE: Decimal = dec!(0.01);

pub const TRADING_DAYS_PER_YEAR: u32 = 252;

/// sqrt(252), used when `Decimal::sqrt` cannot produce a value
pub const SQRT_TRADING_DAYS_APPROX: Decimal = dec!(15.874507866);

/// Percentile used for historical Value-at-Risk (95% confidence)
pub const VAR_TAIL_FRACTION: Decimal = dec!(0.05);

pub const MIN_REBALANCE_THRESHOLD: Decimal = dec!(1);
pub const MAX_REBALANCE_THRESHOLD: Decimal = dec!(20);
pub const DEFAULT_REBALANCE_THRESHOLD: Decimal = dec!(5);

pub const DEFAULT_RISK_LOOKBACK_DAYS: u32 = 30;
pub const DEFAULT_RISK_FREE_RATE: Decimal = dec!(0.02);
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;
pub const DEFAULT_REFRESH_BATCH_SIZE: usize = 100;
pub const DEFAULT_PRICE_FETCH_TIMEOUT_SECS: u64 = 10;
