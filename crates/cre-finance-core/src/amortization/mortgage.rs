use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::schedule::{amortize, BalloonTreatment};
use crate::error::CreFinanceError;
use crate::types::{
    check_amount, check_rate_pct, with_metadata, ComputationOutput, LoanTerms, Money, Percent,
    TermUnit,
};
use crate::CreFinanceResult;

/// LTV above which private mortgage insurance is charged.
const PMI_LTV_THRESHOLD_PCT: Decimal = dec!(80);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input for a purchase-mortgage payment breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MortgageInput {
    pub home_price: Money,
    pub down_payment: Money,
    /// Annual note rate in percent
    pub annual_rate_pct: Percent,
    pub term_years: u32,
    /// Annual property tax
    #[serde(default)]
    pub property_tax_annual: Money,
    /// Annual hazard insurance premium
    #[serde(default)]
    pub insurance_annual: Money,
    #[serde(default)]
    pub hoa_monthly: Money,
    /// Annual PMI premium as a percent of the loan amount
    #[serde(default)]
    pub pmi_rate_pct: Percent,
}

/// Monthly PITI breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MortgageOutput {
    pub loan_amount: Money,
    pub ltv_pct: Percent,
    pub principal_and_interest: Money,
    pub monthly_tax: Money,
    pub monthly_insurance: Money,
    pub monthly_pmi: Money,
    pub monthly_hoa: Money,
    pub total_monthly_payment: Money,
    /// Interest paid over the full term
    pub total_interest: Money,
    /// Down payment plus every P&I payment
    pub total_cost_of_loan: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Break a purchase mortgage into principal & interest, taxes, insurance,
/// PMI and HOA.
pub fn calculate_mortgage(
    input: &MortgageInput,
) -> CreFinanceResult<ComputationOutput<MortgageOutput>> {
    let start = Instant::now();
    let _span = tracing::debug_span!("calculate_mortgage").entered();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    let loan_amount = input.home_price - input.down_payment;
    let ltv_pct = loan_amount / input.home_price * dec!(100);

    let (principal_and_interest, total_interest) = if loan_amount.is_zero() {
        warnings.push("Down payment covers the full price — no loan required".into());
        (Decimal::ZERO, Decimal::ZERO)
    } else {
        let loan = LoanTerms {
            principal: loan_amount,
            annual_rate_pct: input.annual_rate_pct,
            term: input.term_years,
            term_unit: TermUnit::Years,
            interest_only: false,
        };
        let schedule = amortize(&loan, None, BalloonTreatment::FinalRow)?;
        (schedule.scheduled_payment, schedule.total_interest)
    };

    let monthly_tax = input.property_tax_annual / dec!(12);
    let monthly_insurance = input.insurance_annual / dec!(12);
    let monthly_pmi = if ltv_pct > PMI_LTV_THRESHOLD_PCT {
        loan_amount * input.pmi_rate_pct / dec!(100) / dec!(12)
    } else {
        Decimal::ZERO
    };

    if ltv_pct > PMI_LTV_THRESHOLD_PCT && input.pmi_rate_pct.is_zero() {
        warnings.push(format!(
            "LTV of {ltv_pct:.1}% exceeds 80% but no PMI rate was provided"
        ));
    }
    if ltv_pct > dec!(97) {
        warnings.push(format!(
            "LTV of {ltv_pct:.1}% exceeds 97% — above most program limits"
        ));
    }

    let total_monthly_payment =
        principal_and_interest + monthly_tax + monthly_insurance + monthly_pmi + input.hoa_monthly;

    let total_cost_of_loan = input.down_payment + loan_amount + total_interest;

    tracing::debug!(
        loan_amount = %loan_amount,
        total_monthly = %total_monthly_payment,
        "mortgage payment calculated"
    );

    let output = MortgageOutput {
        loan_amount,
        ltv_pct,
        principal_and_interest,
        monthly_tax,
        monthly_insurance,
        monthly_pmi,
        monthly_hoa: input.hoa_monthly,
        total_monthly_payment,
        total_interest,
        total_cost_of_loan,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Purchase mortgage PITI breakdown",
        input,
        warnings,
        elapsed,
        output,
    ))
}

fn validate_input(input: &MortgageInput) -> CreFinanceResult<()> {
    if input.home_price <= Decimal::ZERO {
        return Err(CreFinanceError::invalid(
            "home_price",
            "Home price must be positive",
        ));
    }
    if input.down_payment < Decimal::ZERO || input.down_payment > input.home_price {
        return Err(CreFinanceError::invalid(
            "down_payment",
            "Down payment must be between zero and the home price",
        ));
    }
    check_amount("home_price", input.home_price)?;
    check_rate_pct("annual_rate_pct", input.annual_rate_pct)?;
    if input.term_years == 0 {
        return Err(CreFinanceError::invalid(
            "term_years",
            "Loan term must be at least one year",
        ));
    }
    for (field, value) in [
        ("property_tax_annual", input.property_tax_annual),
        ("insurance_annual", input.insurance_annual),
        ("hoa_monthly", input.hoa_monthly),
    ] {
        check_amount(field, value)?;
    }
    check_rate_pct("pmi_rate_pct", input.pmi_rate_pct)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_input() -> MortgageInput {
        MortgageInput {
            home_price: dec!(500000),
            down_payment: dec!(100000),
            annual_rate_pct: dec!(6),
            term_years: 30,
            property_tax_annual: dec!(6000),
            insurance_annual: dec!(1800),
            hoa_monthly: dec!(250),
            pmi_rate_pct: dec!(0.5),
        }
    }

    #[test]
    fn test_loan_amount_and_ltv() {
        let out = calculate_mortgage(&sample_input()).unwrap().result;
        assert_eq!(out.loan_amount, dec!(400000));
        assert_eq!(out.ltv_pct, dec!(80));
    }

    #[test]
    fn test_no_pmi_at_80_ltv() {
        let out = calculate_mortgage(&sample_input()).unwrap().result;
        assert_eq!(out.monthly_pmi, Decimal::ZERO);
    }

    #[test]
    fn test_pmi_above_80_ltv() {
        let mut input = sample_input();
        input.down_payment = dec!(50000);
        let out = calculate_mortgage(&input).unwrap().result;
        // 450000 * 0.5% / 12 = 187.50
        assert_eq!(out.monthly_pmi, dec!(187.5));
    }

    #[test]
    fn test_piti_total() {
        let out = calculate_mortgage(&sample_input()).unwrap().result;
        // P&I on 400k at 6%/30y ≈ 2398.20; tax 500; ins 150; hoa 250
        assert!((out.principal_and_interest - dec!(2398.20)).abs() < dec!(0.01));
        assert_eq!(out.monthly_tax, dec!(500));
        assert_eq!(out.monthly_insurance, dec!(150));
        let expected = out.principal_and_interest + dec!(900);
        assert_eq!(out.total_monthly_payment, expected);
    }

    #[test]
    fn test_cash_purchase() {
        let mut input = sample_input();
        input.down_payment = input.home_price;
        let result = calculate_mortgage(&input).unwrap();
        assert_eq!(result.result.principal_and_interest, Decimal::ZERO);
        assert_eq!(result.result.total_interest, Decimal::ZERO);
        assert!(!result.warnings.is_empty());
    }

    #[test]
    fn test_down_payment_exceeds_price_error() {
        let mut input = sample_input();
        input.down_payment = dec!(600000);
        assert!(calculate_mortgage(&input).is_err());
    }

    #[test]
    fn test_missing_pmi_warning() {
        let mut input = sample_input();
        input.down_payment = dec!(25000);
        input.pmi_rate_pct = Decimal::ZERO;
        let result = calculate_mortgage(&input).unwrap();
        assert!(result.warnings.iter().any(|w| w.contains("no PMI")));
    }

    #[test]
    fn test_extreme_rate_is_computed() {
        let mut input = sample_input();
        input.annual_rate_pct = dec!(300);
        input.term_years = 40;
        let out = calculate_mortgage(&input).unwrap().result;
        // 400000 * 0.25 a month, effectively interest only
        assert!((out.principal_and_interest - dec!(100000)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_out_of_range_inputs_error() {
        let mut input = sample_input();
        input.home_price = dec!(79228162514264337593543950335);
        assert!(calculate_mortgage(&input).is_err());

        let mut input = sample_input();
        input.pmi_rate_pct = dec!(-0.5);
        assert!(matches!(
            calculate_mortgage(&input),
            Err(CreFinanceError::InvalidInput { .. })
        ));
    }
}
