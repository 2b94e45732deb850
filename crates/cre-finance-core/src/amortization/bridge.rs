use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::schedule::{amortize, AmortizationRow, BalloonTreatment};
use crate::error::CreFinanceError;
use crate::types::{
    check_amount, check_rate_pct, with_metadata, ComputationOutput, LoanTerms, Money, Percent,
    TermUnit,
};
use crate::CreFinanceResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

fn default_true() -> bool {
    true
}

/// Short-term bridge financing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeLoanInput {
    pub loan_amount: Money,
    pub annual_rate_pct: Percent,
    pub term_months: u32,
    /// Origination points, percent of the loan
    #[serde(default)]
    pub origination_points_pct: Percent,
    /// Exit fee, percent of the loan
    #[serde(default)]
    pub exit_fee_pct: Percent,
    #[serde(default = "default_true")]
    pub interest_only: bool,
    /// Amortization period when not interest-only; defaults to the term
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amortization_months: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeLoanOutput {
    pub monthly_payment: Money,
    pub total_interest: Money,
    pub origination_fee: Money,
    pub exit_fee: Money,
    /// Balance repaid at maturity
    pub balloon_at_maturity: Money,
    /// Loan amount less the origination fee
    pub net_proceeds: Money,
    /// Interest plus fees
    pub total_financing_cost: Money,
    /// Total financing cost per year of term, as a percent of the loan
    pub effective_annual_cost_pct: Percent,
    /// Payments through maturity; the balloon is not included
    pub schedule: Vec<AmortizationRow>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Cost out a bridge loan: carry, fees and the balloon due at maturity.
pub fn analyze_bridge_loan(
    input: &BridgeLoanInput,
) -> CreFinanceResult<ComputationOutput<BridgeLoanOutput>> {
    let start = Instant::now();
    let _span = tracing::debug_span!("analyze_bridge_loan").entered();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    let amort_months = if input.interest_only {
        input.term_months
    } else {
        input.amortization_months.unwrap_or(input.term_months)
    };

    let full = amortize(
        &LoanTerms {
            principal: input.loan_amount,
            annual_rate_pct: input.annual_rate_pct,
            term: amort_months,
            term_unit: TermUnit::Months,
            interest_only: input.interest_only,
        },
        None,
        BalloonTreatment::Separate,
    )?;

    let schedule: Vec<AmortizationRow> = full
        .schedule
        .into_iter()
        .take(input.term_months as usize)
        .collect();

    // A fully amortising loan maturing on schedule has already absorbed the
    // residual in its last row.
    let balloon_at_maturity = schedule
        .last()
        .map(|r| r.balance)
        .unwrap_or(input.loan_amount);
    let total_interest: Money = schedule.iter().map(|r| r.interest).sum();

    let origination_fee = input.loan_amount * input.origination_points_pct / dec!(100);
    let exit_fee = input.loan_amount * input.exit_fee_pct / dec!(100);
    let total_financing_cost = total_interest + origination_fee + exit_fee;

    let years = Decimal::from(input.term_months) / dec!(12);
    let effective_annual_cost_pct = total_financing_cost / input.loan_amount / years * dec!(100);

    if input.term_months > 36 {
        warnings.push(format!(
            "Bridge term of {} months exceeds 36 — consider permanent financing",
            input.term_months
        ));
    }
    if input.origination_points_pct + input.exit_fee_pct > dec!(5) {
        warnings.push("Combined points and exit fee exceed 5% of the loan".into());
    }

    tracing::debug!(
        balloon = %balloon_at_maturity,
        total_cost = %total_financing_cost,
        "bridge loan analysed"
    );

    let output = BridgeLoanOutput {
        monthly_payment: full.scheduled_payment,
        total_interest,
        origination_fee,
        exit_fee,
        balloon_at_maturity,
        net_proceeds: input.loan_amount - origination_fee,
        total_financing_cost,
        effective_annual_cost_pct,
        schedule,
    };

    let methodology = if input.interest_only {
        "Interest-only bridge loan with balloon at maturity"
    } else {
        "Amortizing bridge loan with balloon at maturity"
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(methodology, input, warnings, elapsed, output))
}

fn validate_input(input: &BridgeLoanInput) -> CreFinanceResult<()> {
    if input.loan_amount <= Decimal::ZERO {
        return Err(CreFinanceError::invalid(
            "loan_amount",
            "Loan amount must be positive",
        ));
    }
    if input.term_months == 0 {
        return Err(CreFinanceError::invalid(
            "term_months",
            "Term must be at least one month",
        ));
    }
    check_amount("loan_amount", input.loan_amount)?;
    check_rate_pct("origination_points_pct", input.origination_points_pct)?;
    check_rate_pct("exit_fee_pct", input.exit_fee_pct)?;
    if let Some(amort) = input.amortization_months {
        if !input.interest_only && amort < input.term_months {
            return Err(CreFinanceError::invalid(
                "amortization_months",
                "Amortization period cannot be shorter than the term",
            ));
        }
    }
    Ok(())
}
