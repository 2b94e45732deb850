use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::CreFinanceError;
use crate::income::ratios;
use crate::time_value::{level_payment, periodic_rate};
use crate::types::{
    check_amount, check_rate_pct, with_metadata, ComputationOutput, LoanTerms, Money, Percent,
};
use crate::CreFinanceResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Equity brought to closing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CashInvested {
    #[serde(default)]
    pub down_payment: Money,
    #[serde(default)]
    pub closing_costs: Money,
    #[serde(default)]
    pub rehab_costs: Money,
    #[serde(default)]
    pub points: Money,
    #[serde(default)]
    pub interest_reserve: Money,
}

impl CashInvested {
    pub fn total(&self) -> Money {
        self.down_payment + self.closing_costs + self.rehab_costs + self.points + self.interest_reserve
    }
}

/// Income and expense line items for a rental property. Rent, other income,
/// HOA and utilities are monthly; taxes and insurance are annual.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncomeExpenseInput {
    pub monthly_rent: Money,
    #[serde(default)]
    pub other_income_monthly: Money,
    #[serde(default)]
    pub vacancy_pct: Percent,
    #[serde(default)]
    pub property_tax_annual: Money,
    #[serde(default)]
    pub insurance_annual: Money,
    #[serde(default)]
    pub hoa_monthly: Money,
    #[serde(default)]
    pub utilities_monthly: Money,
    /// Repairs and maintenance, percent of effective gross income
    #[serde(default)]
    pub repairs_pct: Percent,
    /// Property management, percent of effective gross income
    #[serde(default)]
    pub management_pct: Percent,
    #[serde(default)]
    pub property_value: Money,
    /// Annual debt service when known directly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_debt_service: Option<Money>,
    /// Loan terms; when present, debt service is derived from them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan: Option<LoanTerms>,
    /// Loan amount for debt yield; defaults to the loan principal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_amount: Option<Money>,
    #[serde(default)]
    pub cash_invested: CashInvested,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_debt_yield_pct: Option<Percent>,
    /// Target DSCR for loan sizing (requires `loan` for rate and amortization)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_dscr: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomeAnalysisOutput {
    pub gross_income_monthly: Money,
    pub vacancy_loss_monthly: Money,
    pub effective_gross_income_monthly: Money,
    pub operating_expenses_monthly: Money,
    /// Annualised (EGI - OpEx)
    pub noi: Money,
    /// OpEx / EGI, as a percent
    pub operating_expense_ratio_pct: Percent,
    pub annual_debt_service: Money,
    pub cap_rate_pct: Percent,
    pub dscr: Decimal,
    pub debt_yield_pct: Percent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_loan_by_target_yield: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_loan_by_dscr: Option<Money>,
    pub cash_invested: Money,
    /// NOI less debt service
    pub annual_cash_flow: Money,
    pub cash_on_cash_pct: Percent,
    /// Occupancy needed to cover expenses and debt service, as a percent
    pub break_even_occupancy_pct: Percent,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Reduce income and expense line items to NOI and the lender ratios built
/// on it (cap rate, DSCR, debt yield, cash-on-cash).
pub fn analyze_income(
    input: &IncomeExpenseInput,
) -> CreFinanceResult<ComputationOutput<IncomeAnalysisOutput>> {
    let start = Instant::now();
    let _span = tracing::debug_span!("analyze_income").entered();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    // --- Monthly income ---
    let gross_income_monthly = input.monthly_rent + input.other_income_monthly;
    let vacancy_loss_monthly = gross_income_monthly * input.vacancy_pct / dec!(100);
    let egi = gross_income_monthly - vacancy_loss_monthly;

    // --- Monthly expenses ---
    let opex = input.property_tax_annual / dec!(12)
        + input.insurance_annual / dec!(12)
        + input.hoa_monthly
        + input.utilities_monthly
        + egi * input.repairs_pct / dec!(100)
        + egi * input.management_pct / dec!(100);

    let noi = (egi - opex) * dec!(12);

    let operating_expense_ratio_pct = if egi.is_zero() {
        Decimal::ZERO
    } else {
        ratios::guarded_ratio(opex, egi, dec!(100))
    };

    // --- Debt service ---
    let annual_debt_service = match &input.loan {
        Some(loan) => annual_debt_service_for(loan)?,
        None => input.annual_debt_service.unwrap_or(Decimal::ZERO),
    };
    let loan_amount = input
        .loan_amount
        .or_else(|| input.loan.as_ref().map(|l| l.principal))
        .unwrap_or(Decimal::ZERO);

    // --- Ratios ---
    if input.property_value <= Decimal::ZERO {
        warnings.push("Property value not provided — cap rate reported as 0".into());
    }
    let cap_rate_pct = ratios::cap_rate_pct(noi, input.property_value);

    if annual_debt_service.is_zero() {
        warnings.push("No debt service — DSCR reported as 0".into());
    }
    let dscr = ratios::dscr(noi, annual_debt_service);

    let debt_yield_pct = ratios::debt_yield_pct(noi, loan_amount);

    let max_loan_by_target_yield = input
        .target_debt_yield_pct
        .map(|target| ratios::max_loan_by_target_yield(noi, target));

    let max_loan_by_dscr = match (input.target_dscr, &input.loan) {
        (Some(target), Some(loan)) => Some(ratios::max_loan_by_dscr(
            noi,
            target,
            loan.annual_rate_pct,
            loan.term_months(),
            loan.interest_only,
        )?),
        (Some(_), None) => {
            warnings.push("Target DSCR given without loan terms — DSCR loan sizing skipped".into());
            None
        }
        _ => None,
    };

    let cash_invested = input.cash_invested.total();
    if cash_invested.is_zero() {
        warnings.push("No cash invested — cash-on-cash reported as 0".into());
    }
    let cash_on_cash_pct = ratios::cash_on_cash_pct(noi, annual_debt_service, cash_invested);
    let annual_cash_flow = noi - annual_debt_service;

    let annual_gross = gross_income_monthly * dec!(12);
    let break_even_occupancy_pct = if annual_gross.is_zero() {
        Decimal::ZERO
    } else {
        ratios::guarded_ratio(opex * dec!(12) + annual_debt_service, annual_gross, dec!(100))
    };

    // --- Warnings for unusual metrics ---
    if dscr > Decimal::ZERO && dscr < dec!(1.2) {
        warnings.push(format!(
            "DSCR of {dscr:.2} is below 1.20x — most lenders will not size to this"
        ));
    }
    if noi < Decimal::ZERO {
        warnings.push("Negative NOI — expenses exceed effective gross income".into());
    }

    tracing::debug!(noi = %noi, dscr = %dscr, cap_rate_pct = %cap_rate_pct, "income analysed");

    let output = IncomeAnalysisOutput {
        gross_income_monthly,
        vacancy_loss_monthly,
        effective_gross_income_monthly: egi,
        operating_expenses_monthly: opex,
        noi,
        operating_expense_ratio_pct,
        annual_debt_service,
        cap_rate_pct,
        dscr,
        debt_yield_pct,
        max_loan_by_target_yield,
        max_loan_by_dscr,
        cash_invested,
        annual_cash_flow,
        cash_on_cash_pct,
        break_even_occupancy_pct,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Net operating income and lender ratios",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Twelve months of debt service for the given loan (interest-only or level).
pub fn annual_debt_service_for(loan: &LoanTerms) -> CreFinanceResult<Money> {
    loan.validate()?;
    let rate = periodic_rate(loan.annual_rate_pct);
    let monthly = if loan.interest_only {
        loan.principal * rate
    } else {
        level_payment(loan.principal, rate, loan.term_months())?
    };
    Ok(monthly * dec!(12))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_input(input: &IncomeExpenseInput) -> CreFinanceResult<()> {
    if input.vacancy_pct < Decimal::ZERO || input.vacancy_pct > dec!(100) {
        return Err(CreFinanceError::invalid(
            "vacancy_pct",
            "Vacancy must be between 0 and 100 percent",
        ));
    }

    for (field, value) in [
        ("monthly_rent", input.monthly_rent),
        ("other_income_monthly", input.other_income_monthly),
        ("property_tax_annual", input.property_tax_annual),
        ("insurance_annual", input.insurance_annual),
        ("hoa_monthly", input.hoa_monthly),
        ("utilities_monthly", input.utilities_monthly),
    ] {
        check_amount(field, value)?;
    }
    check_rate_pct("repairs_pct", input.repairs_pct)?;
    check_rate_pct("management_pct", input.management_pct)?;

    if let Some(ads) = input.annual_debt_service {
        check_amount("annual_debt_service", ads)?;
    }
    if let Some(loan) = input.loan_amount {
        check_amount("loan_amount", loan)?;
    }

    let cash = &input.cash_invested;
    for (field, value) in [
        ("cash_invested.down_payment", cash.down_payment),
        ("cash_invested.closing_costs", cash.closing_costs),
        ("cash_invested.rehab_costs", cash.rehab_costs),
        ("cash_invested.points", cash.points),
        ("cash_invested.interest_reserve", cash.interest_reserve),
    ] {
        check_amount(field, value)?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
