//! Internal rate of return over a yearly cash-flow timeline.
//!
//! Flows are netted per year into a dense series starting at year 0 and
//! solved with Newton-Raphson. All arithmetic is checked: a step that would
//! overflow 96-bit decimal range is reported as a convergence failure, never
//! a panic.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::CreFinanceError;
use crate::time_value::in_range;
use crate::types::{with_metadata, ComputationOutput, Money, Percent, Rate};
use crate::CreFinanceResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const INITIAL_GUESS: Decimal = dec!(0.1);
const MAX_IRR_ITERATIONS: u32 = 1000;
const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000001);

/// Lower bound keeping 1 + r strictly positive.
const MIN_RATE: Decimal = dec!(-0.99);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A signed cash flow in a given year (year 0 = acquisition).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowEntry {
    pub year: u32,
    pub amount: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrrInput {
    pub cash_flows: Vec<CashFlowEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrrOutput {
    pub irr_pct: Percent,
    pub iterations: u32,
    /// Net flow per year, index = year
    pub net_cash_flows: Vec<Money>,
    /// Sum of negative flows, as a positive amount
    pub total_invested: Money,
    /// Sum of positive flows
    pub total_returned: Money,
    /// total_returned / total_invested
    pub equity_multiple: Decimal,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Solve for the rate that zeroes the NPV of the cash-flow timeline.
pub fn compute_irr(input: &IrrInput) -> CreFinanceResult<ComputationOutput<IrrOutput>> {
    let start = Instant::now();
    let _span = tracing::debug_span!("compute_irr", flows = input.cash_flows.len()).entered();
    let mut warnings: Vec<String> = Vec::new();

    let net_cash_flows = net_by_year(&input.cash_flows)?;

    // net_by_year guarantees at least one entry, so min() exists
    let earliest = input
        .cash_flows
        .iter()
        .map(|cf| cf.year)
        .min()
        .unwrap_or(0) as usize;
    if net_cash_flows[earliest] >= Decimal::ZERO {
        return Err(CreFinanceError::invalid(
            "cash_flows",
            "initial investment must be negative",
        ));
    }

    let sign_changes = net_cash_flows
        .iter()
        .filter(|cf| !cf.is_zero())
        .collect::<Vec<_>>()
        .windows(2)
        .filter(|w| w[0].is_sign_negative() != w[1].is_sign_negative())
        .count();
    if sign_changes > 1 {
        warnings.push(format!(
            "Cash flows change sign {sign_changes} times — more than one IRR may exist"
        ));
    }

    let (rate, iterations) = newton_raphson_irr(&net_cash_flows)?;

    let total_invested = checked_sum(
        net_cash_flows
            .iter()
            .filter(|cf| cf.is_sign_negative())
            .map(|cf| -*cf),
    )?;
    let total_returned = checked_sum(
        net_cash_flows
            .iter()
            .filter(|cf| cf.is_sign_positive())
            .copied(),
    )?;
    let equity_multiple = if total_invested.is_zero() {
        Decimal::ZERO
    } else {
        in_range(total_returned.checked_div(total_invested), "cash_flows")?
    };

    tracing::debug!(irr = %rate, iterations, "irr converged");

    let output = IrrOutput {
        irr_pct: in_range(rate.checked_mul(dec!(100)), "cash_flows")?,
        iterations,
        net_cash_flows,
        total_invested,
        total_returned,
        equity_multiple,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Newton-Raphson IRR on annual net cash flows",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// NPV of a dense yearly series at `rate` (flow t discounted by (1+rate)^t).
pub fn npv(rate: Rate, cash_flows: &[Money]) -> CreFinanceResult<Money> {
    if rate <= dec!(-1) {
        return Err(CreFinanceError::invalid(
            "rate",
            "Discount rate must be greater than -100%",
        ));
    }
    npv_and_derivative(cash_flows, rate)
        .map(|(v, _)| v)
        .ok_or_else(|| CreFinanceError::DivisionByZero {
            context: "NPV discount factor overflow".into(),
        })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Sum entries per year into a zero-filled series indexed 0..=max_year.
fn net_by_year(entries: &[CashFlowEntry]) -> CreFinanceResult<Vec<Money>> {
    let max_year = entries
        .iter()
        .map(|cf| cf.year)
        .max()
        .ok_or_else(|| CreFinanceError::InsufficientData("IRR requires cash flows".into()))?;

    if max_year == 0 {
        return Err(CreFinanceError::InsufficientData(
            "IRR requires cash flows in at least two years".into(),
        ));
    }
    if max_year > 200 {
        return Err(CreFinanceError::invalid(
            "cash_flows",
            format!("Year {max_year} is beyond the 200-year horizon"),
        ));
    }

    let mut dense = vec![Decimal::ZERO; max_year as usize + 1];
    for cf in entries {
        let slot = &mut dense[cf.year as usize];
        *slot = in_range(slot.checked_add(cf.amount), "cash_flows")?;
    }
    Ok(dense)
}

fn checked_sum(mut flows: impl Iterator<Item = Money>) -> CreFinanceResult<Money> {
    flows.try_fold(Decimal::ZERO, |acc, cf| {
        in_range(acc.checked_add(cf), "cash_flows")
    })
}

fn newton_raphson_irr(cash_flows: &[Money]) -> CreFinanceResult<(Rate, u32)> {
    let mut rate = INITIAL_GUESS;
    let mut last_npv = Decimal::ZERO;

    for i in 1..=MAX_IRR_ITERATIONS {
        let (npv_val, dnpv) =
            npv_and_derivative(cash_flows, rate).ok_or_else(|| diverged(i, last_npv))?;
        last_npv = npv_val;

        if dnpv.is_zero() {
            return Err(diverged(i, npv_val));
        }

        let step = npv_val.checked_div(dnpv).ok_or_else(|| diverged(i, npv_val))?;
        let mut next = rate.checked_sub(step).ok_or_else(|| diverged(i, npv_val))?;
        if next < MIN_RATE {
            next = MIN_RATE;
        }

        if (next - rate).abs() < CONVERGENCE_THRESHOLD {
            return Ok((next, i));
        }
        rate = next;
    }

    Err(diverged(MAX_IRR_ITERATIONS, last_npv))
}

fn diverged(iterations: u32, last_delta: Decimal) -> CreFinanceError {
    tracing::warn!(iterations, %last_delta, "irr did not converge");
    CreFinanceError::ConvergenceFailure {
        function: "IRR".into(),
        iterations,
        last_delta,
    }
}

/// NPV(r) = sum CF_t / (1+r)^t and d(NPV)/dr = sum -t * CF_t / (1+r)^(t+1).
/// None when any intermediate overflows.
fn npv_and_derivative(cash_flows: &[Money], rate: Rate) -> Option<(Decimal, Decimal)> {
    let one_plus_r = Decimal::ONE + rate;
    let mut npv = Decimal::ZERO;
    let mut dnpv = Decimal::ZERO;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        npv = npv.checked_add(cf.checked_mul(discount)?)?;
        discount = discount.checked_div(one_plus_r)?;
        if t > 0 {
            let term = Decimal::from(t as u64)
                .checked_mul(*cf)?
                .checked_mul(discount)?;
            dnpv = dnpv.checked_sub(term)?;
        }
    }

    Some((npv, dnpv))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
