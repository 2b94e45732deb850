use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::CreFinanceError;
use crate::export::{money_cell, to_csv, CsvRecord};
use crate::time_value::{level_payment, periodic_rate};
use crate::types::{with_metadata, ComputationOutput, LoanTerms, Money};
use crate::CreFinanceResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Hard upper bound on schedule length (100 years of monthly payments).
const MAX_TERM_MONTHS: u32 = 1200;

/// Terms beyond this are legal but unusual for real-estate debt.
const LONG_TERM_WARNING_MONTHS: u32 = 480;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Where the principal of an interest-only loan is repaid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalloonTreatment {
    /// The final row repays the outstanding balance.
    #[default]
    FinalRow,
    /// The schedule carries interest only; the balloon is reported on its own.
    Separate,
}

/// Input for an amortization schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationInput {
    pub loan: LoanTerms,
    /// Date of the first payment; rows are dated monthly from here
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub balloon: BalloonTreatment,
}

/// One period of an amortization schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationRow {
    /// 1-based period index
    pub period: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    /// Balance after this period's payment
    pub balance: Money,
}

/// Full schedule plus totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationOutput {
    /// Level (or interest-only) payment before any final-row payoff
    pub scheduled_payment: Money,
    pub schedule: Vec<AmortizationRow>,
    pub total_paid: Money,
    pub total_interest: Money,
    pub total_principal: Money,
    /// Principal due at maturity for interest-only loans
    pub balloon_payment: Money,
    /// True when the balloon is included in the last schedule row
    pub balloon_in_schedule: bool,
    pub periods: u32,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Generate a fixed-rate amortization schedule (level payment or interest-only).
pub fn generate_schedule(
    input: &AmortizationInput,
) -> CreFinanceResult<ComputationOutput<AmortizationOutput>> {
    let start = Instant::now();
    let _span = tracing::debug_span!("generate_schedule").entered();
    let mut warnings: Vec<String> = Vec::new();

    let output = amortize(&input.loan, input.start_date, input.balloon)?;

    let n = input.loan.term_months();
    if n > LONG_TERM_WARNING_MONTHS {
        warnings.push(format!(
            "Term of {n} months exceeds {LONG_TERM_WARNING_MONTHS} — unusually long for real-estate debt"
        ));
    }
    if input.loan.annual_rate_pct > dec!(25) {
        warnings.push(format!(
            "Rate of {}% is above 25% — verify the rate was entered as an annual percentage",
            input.loan.annual_rate_pct
        ));
    }
    if input.loan.interest_only && input.balloon == BalloonTreatment::Separate {
        warnings.push(format!(
            "Balloon of {} is due at maturity and is not part of the schedule",
            output.balloon_payment
        ));
    }

    tracing::debug!(
        periods = output.periods,
        payment = %output.scheduled_payment,
        total_interest = %output.total_interest,
        "amortization schedule generated"
    );

    let methodology = if input.loan.interest_only {
        "Interest-only schedule with balloon at maturity"
    } else {
        "Fixed-rate level-payment amortization"
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(methodology, input, warnings, elapsed, output))
}

/// Build the schedule without the output envelope. Used directly by the
/// other loan calculators.
pub fn amortize(
    loan: &LoanTerms,
    start_date: Option<NaiveDate>,
    balloon: BalloonTreatment,
) -> CreFinanceResult<AmortizationOutput> {
    loan.validate()?;

    let n = loan.term_months();
    if n > MAX_TERM_MONTHS {
        return Err(CreFinanceError::invalid(
            "term",
            format!("Term of {n} months exceeds the {MAX_TERM_MONTHS}-month maximum"),
        ));
    }

    let rate = periodic_rate(loan.annual_rate_pct);
    let scheduled_payment = if loan.interest_only {
        loan.principal * rate
    } else {
        level_payment(loan.principal, rate, n)?
    };

    // Interest-only loans with a separate balloon keep the balance open.
    let absorb_final = !(loan.interest_only && balloon == BalloonTreatment::Separate);

    let mut schedule = Vec::with_capacity(n as usize);
    let mut balance = loan.principal;

    for period in 1..=n {
        let interest = balance * rate;
        let mut principal = (scheduled_payment - interest)
            .min(balance)
            .max(Decimal::ZERO);

        if period == n && absorb_final {
            principal = balance;
        }

        let payment = interest + principal;
        balance = (balance - principal).max(Decimal::ZERO);

        schedule.push(AmortizationRow {
            period,
            date: row_date(start_date, period)?,
            payment,
            interest,
            principal,
            balance,
        });

        if balance.is_zero() {
            break;
        }
    }

    let total_paid: Money = schedule.iter().map(|r| r.payment).sum();
    let total_interest: Money = schedule.iter().map(|r| r.interest).sum();
    let total_principal: Money = schedule.iter().map(|r| r.principal).sum();

    let balloon_payment = if loan.interest_only {
        loan.principal
    } else {
        Decimal::ZERO
    };

    Ok(AmortizationOutput {
        scheduled_payment,
        periods: schedule.len() as u32,
        schedule,
        total_paid,
        total_interest,
        total_principal,
        balloon_payment,
        balloon_in_schedule: loan.interest_only && absorb_final,
    })
}

/// Render a schedule as CSV text.
pub fn schedule_csv(output: &AmortizationOutput) -> CreFinanceResult<String> {
    to_csv(&output.schedule)
}

fn row_date(start: Option<NaiveDate>, period: u32) -> CreFinanceResult<Option<NaiveDate>> {
    match start {
        None => Ok(None),
        Some(d) => d
            .checked_add_months(Months::new(period - 1))
            .map(Some)
            .ok_or_else(|| {
                CreFinanceError::invalid("start_date", "Payment date out of calendar range")
            }),
    }
}

impl CsvRecord for AmortizationRow {
    fn header() -> &'static [&'static str] {
        &["Period", "Date", "Payment", "Interest", "Principal", "Balance"]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.period.to_string(),
            self.date.map(|d| d.to_string()).unwrap_or_default(),
            money_cell(self.payment),
            money_cell(self.interest),
            money_cell(self.principal),
            money_cell(self.balance),
        ]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TermUnit;
    use rust_decimal_macros::dec;

    fn sample_input() -> AmortizationInput {
        AmortizationInput {
            loan: LoanTerms {
                principal: dec!(200000),
                annual_rate_pct: dec!(6),
                term: 30,
                term_unit: TermUnit::Years,
                interest_only: false,
            },
            start_date: None,
            balloon: BalloonTreatment::FinalRow,
        }
    }

    fn interest_only_input(balloon: BalloonTreatment) -> AmortizationInput {
        AmortizationInput {
            loan: LoanTerms {
                principal: dec!(500000),
                annual_rate_pct: dec!(9),
                term: 12,
                term_unit: TermUnit::Months,
                interest_only: true,
            },
            start_date: None,
            balloon,
        }
    }

    #[test]
    fn test_30yr_schedule_length_and_payment() {
        let out = generate_schedule(&sample_input()).unwrap().result;
        assert_eq!(out.periods, 360);
        assert_eq!(out.schedule.len(), 360);
        assert!((out.scheduled_payment - dec!(1199.10)).abs() < dec!(0.01));
    }

    #[test]
    fn test_final_balance_zero() {
        let out = generate_schedule(&sample_input()).unwrap().result;
        let last = out.schedule.last().unwrap();
        assert_eq!(last.balance, Decimal::ZERO);
        assert!((last.payment - out.scheduled_payment).abs() < dec!(0.01));
    }

    #[test]
    fn test_payment_identity_every_row() {
        let out = generate_schedule(&sample_input()).unwrap().result;
        for row in &out.schedule {
            assert_eq!(row.interest + row.principal, row.payment);
        }
    }

    #[test]
    fn test_balance_non_increasing() {
        let out = generate_schedule(&sample_input()).unwrap().result;
        let mut prev = dec!(200000);
        for row in &out.schedule {
            assert!(row.balance <= prev);
            prev = row.balance;
        }
    }

    #[test]
    fn test_first_row_interest() {
        let out = generate_schedule(&sample_input()).unwrap().result;
        // 200000 * 0.005 = 1000
        assert_eq!(out.schedule[0].interest, dec!(1000));
    }

    #[test]
    fn test_totals_consistent() {
        let out = generate_schedule(&sample_input()).unwrap().result;
        assert!((out.total_principal - dec!(200000)).abs() < dec!(0.000001));
        assert!((out.total_paid - out.total_interest - out.total_principal).abs() < dec!(0.000001));
        // ~$231,676.38 of interest over 30 years
        assert!((out.total_interest - dec!(231676.38)).abs() < dec!(1));
    }

    #[test]
    fn test_zero_rate_equal_payments() {
        let mut input = sample_input();
        input.loan.principal = dec!(120000);
        input.loan.annual_rate_pct = Decimal::ZERO;
        input.loan.term = 12;
        input.loan.term_unit = TermUnit::Months;

        let out = generate_schedule(&input).unwrap().result;
        assert_eq!(out.schedule.len(), 12);
        for row in &out.schedule {
            assert_eq!(row.payment, dec!(10000));
            assert_eq!(row.interest, Decimal::ZERO);
        }
        assert_eq!(out.schedule[11].balance, Decimal::ZERO);
    }

    #[test]
    fn test_interest_only_balloon_in_final_row() {
        let out = generate_schedule(&interest_only_input(BalloonTreatment::FinalRow))
            .unwrap()
            .result;
        // 500000 * 0.0075 = 3750
        assert_eq!(out.scheduled_payment, dec!(3750));
        for row in &out.schedule[..11] {
            assert_eq!(row.payment, dec!(3750));
            assert_eq!(row.principal, Decimal::ZERO);
            assert_eq!(row.balance, dec!(500000));
        }
        let last = &out.schedule[11];
        assert_eq!(last.principal, dec!(500000));
        assert_eq!(last.payment, dec!(503750));
        assert_eq!(last.balance, Decimal::ZERO);
        assert!(out.balloon_in_schedule);
        assert_eq!(out.balloon_payment, dec!(500000));
    }

    #[test]
    fn test_interest_only_separate_balloon() {
        let result = generate_schedule(&interest_only_input(BalloonTreatment::Separate)).unwrap();
        let out = &result.result;
        assert_eq!(out.schedule.len(), 12);
        assert_eq!(out.schedule[11].balance, dec!(500000));
        assert_eq!(out.total_interest, dec!(45000));
        assert_eq!(out.total_principal, Decimal::ZERO);
        assert!(!out.balloon_in_schedule);
        assert!(result.warnings.iter().any(|w| w.contains("Balloon")));
    }

    #[test]
    fn test_row_dates_monthly() {
        let mut input = sample_input();
        input.start_date = NaiveDate::from_ymd_opt(2025, 1, 31);
        let out = generate_schedule(&input).unwrap().result;
        assert_eq!(out.schedule[0].date, NaiveDate::from_ymd_opt(2025, 1, 31));
        // chrono clamps to month end
        assert_eq!(out.schedule[1].date, NaiveDate::from_ymd_opt(2025, 2, 28));
        assert_eq!(out.schedule[12].date, NaiveDate::from_ymd_opt(2026, 1, 31));
    }

    #[test]
    fn test_zero_principal_error() {
        let mut input = sample_input();
        input.loan.principal = Decimal::ZERO;
        assert!(matches!(
            generate_schedule(&input),
            Err(CreFinanceError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_negative_rate_error() {
        let mut input = sample_input();
        input.loan.annual_rate_pct = dec!(-1);
        assert!(generate_schedule(&input).is_err());
    }

    #[test]
    fn test_zero_term_error() {
        let mut input = sample_input();
        input.loan.term = 0;
        assert!(generate_schedule(&input).is_err());
    }

    #[test]
    fn test_excessive_term_error() {
        let mut input = sample_input();
        input.loan.term = 101;
        assert!(generate_schedule(&input).is_err());
    }

    #[test]
    fn test_extreme_rate_long_term_completes() {
        let mut input = sample_input();
        input.loan.principal = dec!(100000);
        input.loan.annual_rate_pct = dec!(300);
        input.loan.term = 480;
        input.loan.term_unit = TermUnit::Months;

        let result = generate_schedule(&input).unwrap();
        let out = &result.result;
        assert_eq!(out.schedule.len(), 480);
        // 100000 * 3 / 12
        assert_eq!(out.schedule[0].interest, dec!(25000));
        assert_eq!(out.schedule.last().unwrap().balance, Decimal::ZERO);
        assert!((out.total_principal - dec!(100000)).abs() < dec!(0.000001));
        assert!(result.warnings.iter().any(|w| w.contains("above 25%")));
    }

    #[test]
    fn test_rate_above_ceiling_error() {
        let mut input = sample_input();
        input.loan.annual_rate_pct = dec!(5000);
        assert!(matches!(
            generate_schedule(&input),
            Err(CreFinanceError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_principal_above_ceiling_error() {
        let mut input = sample_input();
        input.loan.principal = dec!(79228162514264337593543950335);
        assert!(matches!(
            generate_schedule(&input),
            Err(CreFinanceError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_long_term_warning() {
        let mut input = sample_input();
        input.loan.term = 41;
        let result = generate_schedule(&input).unwrap();
        assert!(result.warnings.iter().any(|w| w.contains("unusually long")));
    }

    #[test]
    fn test_schedule_csv() {
        let mut input = sample_input();
        input.loan.term = 1;
        input.start_date = NaiveDate::from_ymd_opt(2025, 3, 1);
        let out = generate_schedule(&input).unwrap().result;
        let csv = schedule_csv(&out).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 13);
        assert_eq!(lines[0], "Period,Date,Payment,Interest,Principal,Balance");
        assert!(lines[1].starts_with("1,2025-03-01,"));
        assert!(lines[12].ends_with(",0.00"));
    }

    #[test]
    fn test_methodology_string() {
        let result = generate_schedule(&sample_input()).unwrap();
        assert_eq!(result.methodology, "Fixed-rate level-payment amortization");
    }
}
