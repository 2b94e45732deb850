use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::CreFinanceError;
use crate::types::{Money, Percent, Rate};
use crate::CreFinanceResult;

/// Convert an annual percentage into a monthly decimal rate (6 → 0.005).
pub fn periodic_rate(annual_pct: Percent) -> Rate {
    annual_pct / dec!(100) / dec!(12)
}

/// (1 + r)^n via iterative multiplication. Fails once the factor leaves
/// decimal range.
pub fn compound_factor(rate: Rate, periods: u32) -> CreFinanceResult<Decimal> {
    let one_plus_r = Decimal::ONE + rate;
    let mut compound = Decimal::ONE;
    for _ in 0..periods {
        compound = in_range(compound.checked_mul(one_plus_r), "rate")?;
    }
    Ok(compound)
}

/// 1 / (1 + r)^n by repeated division. For positive rates this shrinks
/// toward zero and cannot overflow.
pub fn discount_factor(rate: Rate, periods: u32) -> CreFinanceResult<Decimal> {
    let one_plus_r = Decimal::ONE + rate;
    if one_plus_r <= Decimal::ZERO {
        return Err(CreFinanceError::invalid(
            "rate",
            "Rate must be greater than -100%",
        ));
    }
    let mut discount = Decimal::ONE;
    for _ in 0..periods {
        discount = in_range(discount.checked_div(one_plus_r), "rate")?;
    }
    Ok(discount)
}

/// Present value of 1 paid at the end of each of `periods` periods:
/// (1 - (1+r)^-n) / r, or n when the rate is too small to register.
pub fn annuity_factor(rate: Rate, periods: u32) -> CreFinanceResult<Decimal> {
    if rate.is_zero() {
        return Ok(Decimal::from(periods));
    }
    let one_minus_v = Decimal::ONE - discount_factor(rate, periods)?;
    if one_minus_v.is_zero() {
        return Ok(Decimal::from(periods));
    }
    in_range(one_minus_v.checked_div(rate), "rate")
}

/// Level payment that fully amortises `principal` over `periods`:
/// P * r / (1 - (1+r)^-n), or P / n when the rate is zero.
pub fn level_payment(principal: Money, rate: Rate, periods: u32) -> CreFinanceResult<Money> {
    if periods == 0 {
        return Err(CreFinanceError::invalid(
            "periods",
            "Number of periods must be > 0",
        ));
    }

    let annuity = annuity_factor(rate, periods)?;
    if annuity.is_zero() {
        return Err(CreFinanceError::DivisionByZero {
            context: "level payment annuity factor".into(),
        });
    }
    in_range(principal.checked_div(annuity), "principal")
}

/// Outstanding balance after `payments_made` level payments: the present
/// value of the payments still due, PMT * (1 - (1+r)^-(n-k)) / r.
pub fn remaining_balance(
    principal: Money,
    rate: Rate,
    periods: u32,
    payments_made: u32,
) -> CreFinanceResult<Money> {
    if periods == 0 {
        return Err(CreFinanceError::invalid(
            "periods",
            "Number of periods must be > 0",
        ));
    }

    let k = payments_made.min(periods);
    if k == periods {
        return Ok(Decimal::ZERO);
    }

    let payment = level_payment(principal, rate, periods)?;
    let annuity = annuity_factor(rate, periods - k)?;
    let balance = in_range(payment.checked_mul(annuity), "principal")?;

    Ok(balance.max(Decimal::ZERO))
}

/// Lift a checked decimal operation into the crate result, naming the input
/// that drove it out of range.
pub fn in_range(value: Option<Decimal>, field: &str) -> CreFinanceResult<Decimal> {
    value.ok_or_else(|| CreFinanceError::out_of_range(field))
}

/// Present value of a monthly stream whose first element falls at the end
/// of period 1.
pub fn present_value_of_stream(rate: Rate, flows: &[Money]) -> CreFinanceResult<Money> {
    let one_plus_r = Decimal::ONE + rate;
    if one_plus_r <= Decimal::ZERO {
        return Err(CreFinanceError::invalid(
            "rate",
            "Rate must be greater than -100%",
        ));
    }
    let mut discount = Decimal::ONE;
    let mut pv = Decimal::ZERO;
    for flow in flows {
        discount = in_range(discount.checked_div(one_plus_r), "rate")?;
        let term = in_range(flow.checked_mul(discount), "flows")?;
        pv = in_range(pv.checked_add(term), "flows")?;
    }
    Ok(pv)
}
