use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::CreFinanceError;
use crate::export::{money_cell, to_csv, CsvRecord};
use crate::time_value::{in_range, periodic_rate};
use crate::types::{
    check_amount, check_rate_pct, with_metadata, ComputationOutput, Money, Percent,
};
use crate::CreFinanceResult;

/// Longest construction term accepted.
const MAX_TERM_MONTHS: u32 = 120;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A requested disbursement in a given (1-based) month.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawRequest {
    pub month: u32,
    pub amount: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawScheduleInput {
    pub total_commitment: Money,
    pub annual_rate_pct: Percent,
    pub term_months: u32,
    pub draws: Vec<DrawRequest>,
}

/// One month of the draw schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawScheduleEntry {
    pub month: u32,
    /// Sum of draws requested this month
    pub requested: Money,
    /// Amount actually funded after the commitment cap
    pub funded: Money,
    /// Outstanding balance after this month's draw
    pub balance: Money,
    /// Interest on the balance for this month
    pub interest: Money,
    pub cumulative_interest: Money,
    pub cumulative_drawn: Money,
    pub undrawn_commitment: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawScheduleOutput {
    pub schedule: Vec<DrawScheduleEntry>,
    pub total_drawn: Money,
    /// Interest accrued over the term; the interest reserve required
    pub total_interest: Money,
    pub peak_balance: Money,
    /// Principal outstanding at the end of the term
    pub ending_balance: Money,
    pub undrawn_commitment: Money,
    /// Requested amounts refused by the commitment cap
    pub truncated_amount: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Build a monthly construction draw schedule with interest-only accrual.
///
/// Each month's draw is funded first (capped at the undrawn commitment) and
/// interest is then charged on the full balance for that month.
pub fn run_draw_schedule(
    input: &DrawScheduleInput,
) -> CreFinanceResult<ComputationOutput<DrawScheduleOutput>> {
    let start = Instant::now();
    let _span = tracing::debug_span!("run_draw_schedule", term = input.term_months).entered();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    let mut requested_by_month = vec![Decimal::ZERO; input.term_months as usize];
    for draw in &input.draws {
        let slot = &mut requested_by_month[(draw.month - 1) as usize];
        *slot = in_range(slot.checked_add(draw.amount), "draws")?;
    }

    let rate = periodic_rate(input.annual_rate_pct);
    let mut schedule = Vec::with_capacity(input.term_months as usize);
    let mut balance = Decimal::ZERO;
    let mut cumulative_interest = Decimal::ZERO;
    let mut peak_balance = Decimal::ZERO;
    let mut truncated_amount = Decimal::ZERO;

    for (idx, requested) in requested_by_month.into_iter().enumerate() {
        let month = idx as u32 + 1;
        let available = input.total_commitment - balance;
        let funded = requested.min(available);

        if funded < requested {
            let refused = requested - funded;
            truncated_amount = in_range(truncated_amount.checked_add(refused), "draws")?;
            tracing::warn!(month, %refused, "draw truncated at commitment cap");
            warnings.push(format!(
                "Month {month}: draw of {requested} exceeds the remaining commitment; funded {funded}"
            ));
        }

        balance += funded;
        let interest = balance * rate;
        cumulative_interest += interest;
        peak_balance = peak_balance.max(balance);

        schedule.push(DrawScheduleEntry {
            month,
            requested,
            funded,
            balance,
            interest,
            cumulative_interest,
            cumulative_drawn: balance,
            undrawn_commitment: input.total_commitment - balance,
        });
    }

    tracing::debug!(
        total_drawn = %balance,
        total_interest = %cumulative_interest,
        "draw schedule built"
    );

    let output = DrawScheduleOutput {
        schedule,
        total_drawn: balance,
        total_interest: cumulative_interest,
        peak_balance,
        ending_balance: balance,
        undrawn_commitment: input.total_commitment - balance,
        truncated_amount,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Construction draw schedule with interest-only accrual",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Render a draw schedule as CSV text.
pub fn draw_schedule_csv(output: &DrawScheduleOutput) -> CreFinanceResult<String> {
    to_csv(&output.schedule)
}

impl CsvRecord for DrawScheduleEntry {
    fn header() -> &'static [&'static str] {
        &[
            "Month",
            "Requested",
            "Funded",
            "Balance",
            "Interest",
            "Cumulative Interest",
            "Cumulative Drawn",
            "Undrawn",
        ]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.month.to_string(),
            money_cell(self.requested),
            money_cell(self.funded),
            money_cell(self.balance),
            money_cell(self.interest),
            money_cell(self.cumulative_interest),
            money_cell(self.cumulative_drawn),
            money_cell(self.undrawn_commitment),
        ]
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_input(input: &DrawScheduleInput) -> CreFinanceResult<()> {
    if input.total_commitment <= Decimal::ZERO {
        return Err(CreFinanceError::invalid(
            "total_commitment",
            "Commitment must be positive",
        ));
    }
    check_amount("total_commitment", input.total_commitment)?;
    check_rate_pct("annual_rate_pct", input.annual_rate_pct)?;
    if input.term_months == 0 || input.term_months > MAX_TERM_MONTHS {
        return Err(CreFinanceError::invalid(
            "term_months",
            format!("Term must be between 1 and {MAX_TERM_MONTHS} months"),
        ));
    }
    for draw in &input.draws {
        if draw.month == 0 || draw.month > input.term_months {
            return Err(CreFinanceError::invalid(
                "draws",
                format!(
                    "Draw month {} is outside the 1..={} term",
                    draw.month, input.term_months
                ),
            ));
        }
        if draw.amount < Decimal::ZERO {
            return Err(CreFinanceError::invalid(
                "draws",
                format!("Draw in month {} is negative", draw.month),
            ));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
