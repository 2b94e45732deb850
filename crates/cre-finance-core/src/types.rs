use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::CreFinanceError;
use crate::CreFinanceResult;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Periodic rates expressed as decimals (0.005 = 0.5% per month).
pub type Rate = Decimal;

/// User-facing rates expressed as percentages (6.5 = 6.5%), the way the
/// loan forms collect them.
pub type Percent = Decimal;

/// Largest monetary input accepted (one quadrillion). Schedule totals built
/// from amounts and rates inside these bounds stay within decimal range.
pub const MAX_AMOUNT: Money = dec!(1000000000000000);

/// Largest annual rate accepted, in percent.
pub const MAX_RATE_PCT: Percent = dec!(1000);

/// Reject negative amounts and amounts above [`MAX_AMOUNT`].
pub fn check_amount(field: &str, value: Money) -> CreFinanceResult<()> {
    if value < Decimal::ZERO {
        return Err(CreFinanceError::invalid(field, "Cannot be negative"));
    }
    if value > MAX_AMOUNT {
        return Err(CreFinanceError::invalid(
            field,
            format!("Exceeds the maximum of {MAX_AMOUNT}"),
        ));
    }
    Ok(())
}

/// Reject rates outside 0..=[`MAX_RATE_PCT`] percent.
pub fn check_rate_pct(field: &str, value: Percent) -> CreFinanceResult<()> {
    if value < Decimal::ZERO || value > MAX_RATE_PCT {
        return Err(CreFinanceError::invalid(
            field,
            format!("Rate must be between 0 and {MAX_RATE_PCT} percent"),
        ));
    }
    Ok(())
}

/// Unit of a loan term.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermUnit {
    #[default]
    Months,
    Years,
}

/// Fixed-rate loan terms shared by the amortising calculators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanTerms {
    /// Original principal
    pub principal: Money,
    /// Annual note rate in percent
    pub annual_rate_pct: Percent,
    /// Term length, in `term_unit`
    pub term: u32,
    #[serde(default)]
    pub term_unit: TermUnit,
    /// Interest-only: no scheduled principal until maturity
    #[serde(default)]
    pub interest_only: bool,
}

impl LoanTerms {
    /// Term expressed in monthly periods.
    pub fn term_months(&self) -> u32 {
        match self.term_unit {
            TermUnit::Months => self.term,
            TermUnit::Years => self.term.saturating_mul(12),
        }
    }

    /// Enforce 0 < principal <= MAX_AMOUNT, 0 <= rate <= MAX_RATE_PCT and
    /// term > 0.
    pub fn validate(&self) -> CreFinanceResult<()> {
        if self.principal <= Decimal::ZERO {
            return Err(CreFinanceError::invalid(
                "principal",
                "Principal must be positive",
            ));
        }
        check_amount("principal", self.principal)?;
        if self.annual_rate_pct < Decimal::ZERO {
            return Err(CreFinanceError::invalid(
                "annual_rate_pct",
                "Interest rate cannot be negative",
            ));
        }
        check_rate_pct("annual_rate_pct", self.annual_rate_pct)?;
        if self.term == 0 {
            return Err(CreFinanceError::invalid(
                "term",
                "Loan term must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
