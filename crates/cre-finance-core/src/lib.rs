pub mod error;
pub mod export;
pub mod format;
pub mod time_value;
pub mod types;

#[cfg(feature = "amortization")]
pub mod amortization;

#[cfg(feature = "income")]
pub mod income;

#[cfg(feature = "returns")]
pub mod returns;

#[cfg(feature = "prepayment")]
pub mod prepayment;

#[cfg(feature = "construction")]
pub mod construction;

#[cfg(feature = "rent_vs_buy")]
pub mod rent_vs_buy;

pub use error::CreFinanceError;
pub use types::*;

/// Standard result type for all cre-finance operations
pub type CreFinanceResult<T> = Result<T, CreFinanceError>;
