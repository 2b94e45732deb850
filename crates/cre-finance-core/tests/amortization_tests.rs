use cre_finance_core::amortization::{mortgage, refinance, schedule};
use cre_finance_core::format::{format_currency, parse_amount};
use cre_finance_core::{CreFinanceError, LoanTerms, TermUnit};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn loan(principal: Decimal, rate_pct: Decimal, months: u32) -> LoanTerms {
    LoanTerms {
        principal,
        annual_rate_pct: rate_pct,
        term: months,
        term_unit: TermUnit::Months,
        interest_only: false,
    }
}

// ===========================================================================
// Amortization schedule
// ===========================================================================

#[test]
fn test_zero_rate_equal_payments() {
    let out = schedule::amortize(
        &loan(dec!(120000), Decimal::ZERO, 12),
        None,
        schedule::BalloonTreatment::FinalRow,
    )
    .unwrap();

    assert_eq!(out.schedule.len(), 12);
    for row in &out.schedule {
        assert_eq!(row.payment, dec!(10000));
        assert_eq!(row.interest, Decimal::ZERO);
    }
    assert_eq!(out.schedule[11].balance, Decimal::ZERO);
}

#[test]
fn test_thirty_year_schedule_totals() {
    let input = schedule::AmortizationInput {
        loan: LoanTerms {
            principal: dec!(1_000_000),
            annual_rate_pct: dec!(6),
            term: 30,
            term_unit: TermUnit::Years,
            interest_only: false,
        },
        start_date: None,
        balloon: schedule::BalloonTreatment::FinalRow,
    };
    let result = schedule::generate_schedule(&input).unwrap();
    let out = &result.result;

    assert_eq!(out.periods, 360);
    assert_eq!(out.schedule.len(), 360);
    // $1M at 6% / 30y ≈ $5,995.51 per month
    assert!((out.scheduled_payment - dec!(5995.51)).abs() < dec!(0.01));
    assert!((out.total_principal - dec!(1_000_000)).abs() < dec!(0.000001));
    assert!(out.schedule.last().unwrap().balance.abs() < dec!(0.01));
}

#[test]
fn test_interest_only_final_row_balloon() {
    let mut terms = loan(dec!(500000), dec!(9), 12);
    terms.interest_only = true;
    let out = schedule::amortize(&terms, None, schedule::BalloonTreatment::FinalRow).unwrap();

    assert_eq!(out.schedule[0].principal, Decimal::ZERO);
    assert_eq!(out.schedule[0].interest, dec!(3750));
    assert_eq!(out.schedule[11].principal, dec!(500000));
    assert_eq!(out.schedule[11].balance, Decimal::ZERO);
}

#[test]
fn test_schedule_rejects_zero_principal() {
    let result = schedule::amortize(
        &loan(Decimal::ZERO, dec!(5), 12),
        None,
        schedule::BalloonTreatment::FinalRow,
    );
    assert!(matches!(result, Err(CreFinanceError::InvalidInput { .. })));
}

#[test]
fn test_schedule_csv_shape() {
    let out = schedule::amortize(
        &loan(dec!(250000), dec!(7.25), 60),
        None,
        schedule::BalloonTreatment::FinalRow,
    )
    .unwrap();
    let csv = schedule::schedule_csv(&out).unwrap();
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(lines.len(), 61);
    assert_eq!(lines[0], "Period,Date,Payment,Interest,Principal,Balance");
    for line in &lines[1..] {
        let cells: Vec<&str> = line.split(',').collect();
        for cell in &cells[2..] {
            let (_, decimals) = cell.split_once('.').unwrap();
            assert_eq!(decimals.len(), 2, "cell {cell} in {line}");
        }
    }
}

// ===========================================================================
// Mortgage and refinance
// ===========================================================================

fn sample_mortgage() -> mortgage::MortgageInput {
    mortgage::MortgageInput {
        home_price: dec!(500000),
        down_payment: dec!(100000),
        annual_rate_pct: dec!(6.75),
        term_years: 30,
        property_tax_annual: dec!(6000),
        insurance_annual: dec!(1800),
        hoa_monthly: dec!(150),
        pmi_rate_pct: dec!(0.5),
    }
}

#[test]
fn test_mortgage_no_pmi_at_80_ltv() {
    let out = mortgage::calculate_mortgage(&sample_mortgage()).unwrap().result;
    assert_eq!(out.loan_amount, dec!(400000));
    assert_eq!(out.ltv_pct, dec!(80));
    assert_eq!(out.monthly_pmi, Decimal::ZERO);
    assert_eq!(
        out.total_monthly_payment,
        out.principal_and_interest + dec!(500) + dec!(150) + dec!(150)
    );
}

#[test]
fn test_mortgage_pmi_above_80_ltv() {
    let mut input = sample_mortgage();
    input.down_payment = dec!(50000);
    let out = mortgage::calculate_mortgage(&input).unwrap().result;
    // 450k * 0.5% / 12
    assert_eq!(out.monthly_pmi, dec!(187.5));
}

#[test]
fn test_refinance_breakeven_none_without_savings() {
    let input = refinance::RefinanceInput {
        current_balance: dec!(300000),
        current_rate_pct: dec!(5),
        remaining_months: 300,
        new_rate_pct: dec!(7),
        new_term_months: 300,
        closing_costs: dec!(4000),
        finance_closing_costs: false,
    };
    let out = refinance::analyze_refinance(&input).unwrap().result;
    assert!(out.monthly_savings <= Decimal::ZERO);
    assert_eq!(out.breakeven_months, None);
}

#[test]
fn test_refinance_breakeven_with_savings() {
    let input = refinance::RefinanceInput {
        current_balance: dec!(300000),
        current_rate_pct: dec!(7.5),
        remaining_months: 300,
        new_rate_pct: dec!(6),
        new_term_months: 300,
        closing_costs: dec!(4000),
        finance_closing_costs: false,
    };
    let out = refinance::analyze_refinance(&input).unwrap().result;
    assert!(out.monthly_savings > Decimal::ZERO);
    let months = out.breakeven_months.unwrap();
    assert!(Decimal::from(months) * out.monthly_savings >= dec!(4000));
    assert!(Decimal::from(months - 1) * out.monthly_savings < dec!(4000));
}

// ===========================================================================
// Formatting helpers
// ===========================================================================

#[test]
fn test_parse_and_format_examples() {
    assert_eq!(parse_amount("$1,250.50").unwrap(), dec!(1250.50));
    assert_eq!(format_currency(dec!(-1234.567)), "-$1,234.57");
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #[test]
    fn prop_schedule_ends_at_zero_and_rows_balance(
        principal in 1_000u64..5_000_000,
        rate_bp in 0i64..2_000,
        months in 1u32..=480,
    ) {
        let terms = loan(Decimal::from(principal), Decimal::new(rate_bp, 2), months);
        let out = schedule::amortize(&terms, None, schedule::BalloonTreatment::FinalRow).unwrap();

        prop_assert_eq!(out.schedule.len(), months as usize);
        let last = out.schedule.last().unwrap();
        prop_assert!(last.balance.abs() <= dec!(0.01));
        for row in &out.schedule {
            prop_assert!((row.interest + row.principal - row.payment).abs() <= dec!(0.000001));
            prop_assert!(row.balance >= Decimal::ZERO);
        }
    }
}
