use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::schedule::{amortize, BalloonTreatment};
use crate::types::{
    check_amount, with_metadata, ComputationOutput, LoanTerms, Money, Percent, TermUnit,
};
use crate::CreFinanceResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Existing loan versus a proposed replacement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinanceInput {
    pub current_balance: Money,
    pub current_rate_pct: Percent,
    pub remaining_months: u32,
    pub new_rate_pct: Percent,
    pub new_term_months: u32,
    #[serde(default)]
    pub closing_costs: Money,
    /// Roll closing costs into the new principal instead of paying cash
    #[serde(default)]
    pub finance_closing_costs: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinanceOutput {
    pub current_payment: Money,
    pub new_payment: Money,
    pub new_principal: Money,
    /// current_payment - new_payment (negative when the new payment is higher)
    pub monthly_savings: Money,
    /// Months of savings needed to recover cash closing costs
    pub breakeven_months: Option<u32>,
    pub current_remaining_interest: Money,
    pub new_total_interest: Money,
    /// Remaining payments on the current loan less payments on the new loan
    /// and cash closing costs
    pub lifetime_savings: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compare the remaining payments on an existing loan with a refinance.
pub fn analyze_refinance(
    input: &RefinanceInput,
) -> CreFinanceResult<ComputationOutput<RefinanceOutput>> {
    let start = Instant::now();
    let _span = tracing::debug_span!("analyze_refinance").entered();
    let mut warnings: Vec<String> = Vec::new();

    check_amount("closing_costs", input.closing_costs)?;

    let current = amortize(
        &LoanTerms {
            principal: input.current_balance,
            annual_rate_pct: input.current_rate_pct,
            term: input.remaining_months,
            term_unit: TermUnit::Months,
            interest_only: false,
        },
        None,
        BalloonTreatment::FinalRow,
    )?;

    let (new_principal, cash_costs) = if input.finance_closing_costs {
        (input.current_balance + input.closing_costs, Decimal::ZERO)
    } else {
        (input.current_balance, input.closing_costs)
    };

    let proposed = amortize(
        &LoanTerms {
            principal: new_principal,
            annual_rate_pct: input.new_rate_pct,
            term: input.new_term_months,
            term_unit: TermUnit::Months,
            interest_only: false,
        },
        None,
        BalloonTreatment::FinalRow,
    )?;

    let monthly_savings = current.scheduled_payment - proposed.scheduled_payment;

    let breakeven_months = if monthly_savings <= Decimal::ZERO {
        warnings.push("New payment is not lower than the current payment".into());
        None
    } else {
        (cash_costs / monthly_savings).ceil().to_u32()
    };

    let lifetime_savings = current.total_paid - proposed.total_paid - cash_costs;

    if input.new_term_months > input.remaining_months && monthly_savings > Decimal::ZERO {
        warnings.push(format!(
            "New term of {} months extends the payoff by {} months — lower payment may cost more overall",
            input.new_term_months,
            input.new_term_months - input.remaining_months
        ));
    }

    tracing::debug!(
        monthly_savings = %monthly_savings,
        lifetime_savings = %lifetime_savings,
        "refinance analysed"
    );

    let output = RefinanceOutput {
        current_payment: current.scheduled_payment,
        new_payment: proposed.scheduled_payment,
        new_principal,
        monthly_savings,
        breakeven_months,
        current_remaining_interest: current.total_interest,
        new_total_interest: proposed.total_interest,
        lifetime_savings,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Refinance savings and break-even analysis",
        input,
        warnings,
        elapsed,
        output,
    ))
}
