//! Lender ratios derived from NOI. Every ratio returns 0 when its divisor is
//! zero or negative, so callers never see a division failure for display
//! figures.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::time_value::{level_payment, periodic_rate};
use crate::types::{Money, Percent};
use crate::CreFinanceResult;

/// NOI / property value, as a percent.
pub fn cap_rate_pct(noi: Money, property_value: Money) -> Percent {
    if property_value <= Decimal::ZERO {
        tracing::warn!(%property_value, "cap rate requested for non-positive property value");
        return Decimal::ZERO;
    }
    guarded_ratio(noi, property_value, dec!(100))
}

/// NOI / annual debt service.
pub fn dscr(noi: Money, annual_debt_service: Money) -> Decimal {
    if annual_debt_service <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    guarded_ratio(noi, annual_debt_service, Decimal::ONE)
}

/// NOI / loan amount, as a percent.
pub fn debt_yield_pct(noi: Money, loan_amount: Money) -> Percent {
    if loan_amount <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    guarded_ratio(noi, loan_amount, dec!(100))
}

/// Largest loan whose debt yield equals `target_pct`: NOI / (target / 100).
pub fn max_loan_by_target_yield(noi: Money, target_pct: Percent) -> Money {
    if target_pct <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    guarded_ratio(noi, target_pct / dec!(100), Decimal::ONE)
}

/// (NOI - debt service) / cash invested, as a percent.
pub fn cash_on_cash_pct(noi: Money, annual_debt_service: Money, cash_invested: Money) -> Percent {
    if cash_invested <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    guarded_ratio(noi - annual_debt_service, cash_invested, dec!(100))
}

/// Largest loan whose debt service keeps DSCR at `target_dscr`. An
/// interest-only loan is sized on its interest alone; otherwise on the level
/// payment over `amortization_months`.
pub fn max_loan_by_dscr(
    noi: Money,
    target_dscr: Decimal,
    annual_rate_pct: Percent,
    amortization_months: u32,
    interest_only: bool,
) -> CreFinanceResult<Money> {
    if target_dscr <= Decimal::ZERO || noi <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }
    let max_monthly_payment = guarded_ratio(noi, target_dscr, Decimal::ONE) / dec!(12);
    let payment_per_dollar = if interest_only {
        periodic_rate(annual_rate_pct)
    } else {
        level_payment(
            Decimal::ONE,
            periodic_rate(annual_rate_pct),
            amortization_months,
        )?
    };
    if payment_per_dollar <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }
    Ok(guarded_ratio(max_monthly_payment, payment_per_dollar, Decimal::ONE))
}

/// numerator / denominator * scale, or 0 when the quotient leaves decimal
/// range.
pub(crate) fn guarded_ratio(numerator: Decimal, denominator: Decimal, scale: Decimal) -> Decimal {
    match numerator
        .checked_div(denominator)
        .and_then(|q| q.checked_mul(scale))
    {
        Some(value) => value,
        None => {
            tracing::warn!(%numerator, %denominator, "ratio outside decimal range reported as 0");
            Decimal::ZERO
        }
    }
}
