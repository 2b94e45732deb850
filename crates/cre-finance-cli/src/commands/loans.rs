use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;

use cre_finance_core::amortization::bridge::{self, BridgeLoanInput};
use cre_finance_core::amortization::mortgage::{self, MortgageInput};
use cre_finance_core::amortization::refinance::{self, RefinanceInput};
use cre_finance_core::amortization::schedule::{self, AmortizationInput, BalloonTreatment};
use cre_finance_core::{LoanTerms, TermUnit};

use super::{file_or_stdin, parse_money, CommandOutput};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum BalloonArg {
    /// Repay the balance in the final row
    FinalRow,
    /// Keep the schedule interest-only and report the balloon separately
    Separate,
}

impl From<BalloonArg> for BalloonTreatment {
    fn from(arg: BalloonArg) -> Self {
        match arg {
            BalloonArg::FinalRow => BalloonTreatment::FinalRow,
            BalloonArg::Separate => BalloonTreatment::Separate,
        }
    }
}

/// Arguments for an amortization schedule
#[derive(Args)]
pub struct AmortizeArgs {
    /// Loan principal (e.g. 1500000 or "$1,500,000")
    #[arg(long, value_parser = parse_money)]
    pub principal: Option<Decimal>,

    /// Annual interest rate in percent (e.g. 6.5)
    #[arg(long, value_parser = parse_money)]
    pub rate: Option<Decimal>,

    /// Loan term (months unless --years)
    #[arg(long)]
    pub term: Option<u32>,

    /// Interpret --term in years
    #[arg(long)]
    pub years: bool,

    /// Interest-only payments with the principal due at maturity
    #[arg(long)]
    pub interest_only: bool,

    /// Date of the first payment (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Where an interest-only balloon is repaid
    #[arg(long, value_enum, default_value = "final-row")]
    pub balloon: BalloonArg,

    /// Print the schedule as CSV instead of the structured result
    #[arg(long)]
    pub schedule_csv: bool,

    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for a purchase-mortgage breakdown
#[derive(Args)]
pub struct MortgageArgs {
    /// Purchase price
    #[arg(long, value_parser = parse_money)]
    pub home_price: Option<Decimal>,

    /// Down payment
    #[arg(long, value_parser = parse_money)]
    pub down_payment: Option<Decimal>,

    /// Annual interest rate in percent
    #[arg(long, value_parser = parse_money)]
    pub rate: Option<Decimal>,

    /// Term in years
    #[arg(long, default_value = "30")]
    pub years: u32,

    /// Annual property tax
    #[arg(long, value_parser = parse_money)]
    pub property_tax: Option<Decimal>,

    /// Annual insurance premium
    #[arg(long, value_parser = parse_money)]
    pub insurance: Option<Decimal>,

    /// Monthly HOA dues
    #[arg(long, value_parser = parse_money)]
    pub hoa: Option<Decimal>,

    /// Annual PMI rate in percent of the loan
    #[arg(long, value_parser = parse_money)]
    pub pmi_rate: Option<Decimal>,

    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for refinance analysis
#[derive(Args)]
pub struct RefinanceArgs {
    /// Current loan balance
    #[arg(long, value_parser = parse_money)]
    pub balance: Option<Decimal>,

    /// Current annual rate in percent
    #[arg(long, value_parser = parse_money)]
    pub current_rate: Option<Decimal>,

    /// Months remaining on the current loan
    #[arg(long)]
    pub remaining_months: Option<u32>,

    /// Proposed annual rate in percent
    #[arg(long, value_parser = parse_money)]
    pub new_rate: Option<Decimal>,

    /// Proposed term in months
    #[arg(long)]
    pub new_term: Option<u32>,

    /// Closing costs of the new loan
    #[arg(long, value_parser = parse_money)]
    pub closing_costs: Option<Decimal>,

    /// Roll closing costs into the new loan
    #[arg(long)]
    pub finance_costs: bool,

    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for bridge loan costing
#[derive(Args)]
pub struct BridgeLoanArgs {
    /// Loan amount
    #[arg(long, value_parser = parse_money)]
    pub amount: Option<Decimal>,

    /// Annual interest rate in percent
    #[arg(long, value_parser = parse_money)]
    pub rate: Option<Decimal>,

    /// Term in months
    #[arg(long)]
    pub term: Option<u32>,

    /// Origination points, percent of the loan
    #[arg(long, value_parser = parse_money)]
    pub points: Option<Decimal>,

    /// Exit fee, percent of the loan
    #[arg(long, value_parser = parse_money)]
    pub exit_fee: Option<Decimal>,

    /// Amortize over this many months instead of paying interest only
    #[arg(long)]
    pub amortization_months: Option<u32>,

    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_amortize(args: AmortizeArgs) -> Result<CommandOutput, Box<dyn std::error::Error>> {
    let amort_input: AmortizationInput = match file_or_stdin(args.input.as_deref())? {
        Some(input) => input,
        None => AmortizationInput {
            loan: LoanTerms {
                principal: args
                    .principal
                    .ok_or("--principal is required (or provide --input)")?,
                annual_rate_pct: args.rate.ok_or("--rate is required (or provide --input)")?,
                term: args.term.ok_or("--term is required (or provide --input)")?,
                term_unit: if args.years {
                    TermUnit::Years
                } else {
                    TermUnit::Months
                },
                interest_only: args.interest_only,
            },
            start_date: args.start_date,
            balloon: args.balloon.into(),
        },
    };

    let result = schedule::generate_schedule(&amort_input)?;
    if args.schedule_csv {
        return Ok(CommandOutput::Text(schedule::schedule_csv(&result.result)?));
    }
    Ok(serde_json::to_value(result)?.into())
}

pub fn run_mortgage(args: MortgageArgs) -> Result<CommandOutput, Box<dyn std::error::Error>> {
    let mortgage_input: MortgageInput = match file_or_stdin(args.input.as_deref())? {
        Some(input) => input,
        None => MortgageInput {
            home_price: args
                .home_price
                .ok_or("--home-price is required (or provide --input)")?,
            down_payment: args
                .down_payment
                .ok_or("--down-payment is required (or provide --input)")?,
            annual_rate_pct: args.rate.ok_or("--rate is required (or provide --input)")?,
            term_years: args.years,
            property_tax_annual: args.property_tax.unwrap_or(Decimal::ZERO),
            insurance_annual: args.insurance.unwrap_or(Decimal::ZERO),
            hoa_monthly: args.hoa.unwrap_or(Decimal::ZERO),
            pmi_rate_pct: args.pmi_rate.unwrap_or(Decimal::ZERO),
        },
    };
    let result = mortgage::calculate_mortgage(&mortgage_input)?;
    Ok(serde_json::to_value(result)?.into())
}

pub fn run_refinance(args: RefinanceArgs) -> Result<CommandOutput, Box<dyn std::error::Error>> {
    let refi_input: RefinanceInput = match file_or_stdin(args.input.as_deref())? {
        Some(input) => input,
        None => RefinanceInput {
            current_balance: args
                .balance
                .ok_or("--balance is required (or provide --input)")?,
            current_rate_pct: args
                .current_rate
                .ok_or("--current-rate is required (or provide --input)")?,
            remaining_months: args
                .remaining_months
                .ok_or("--remaining-months is required (or provide --input)")?,
            new_rate_pct: args
                .new_rate
                .ok_or("--new-rate is required (or provide --input)")?,
            new_term_months: args
                .new_term
                .ok_or("--new-term is required (or provide --input)")?,
            closing_costs: args.closing_costs.unwrap_or(Decimal::ZERO),
            finance_closing_costs: args.finance_costs,
        },
    };
    let result = refinance::analyze_refinance(&refi_input)?;
    Ok(serde_json::to_value(result)?.into())
}

pub fn run_bridge_loan(args: BridgeLoanArgs) -> Result<CommandOutput, Box<dyn std::error::Error>> {
    let bridge_input: BridgeLoanInput = match file_or_stdin(args.input.as_deref())? {
        Some(input) => input,
        None => BridgeLoanInput {
            loan_amount: args.amount.ok_or("--amount is required (or provide --input)")?,
            annual_rate_pct: args.rate.ok_or("--rate is required (or provide --input)")?,
            term_months: args.term.ok_or("--term is required (or provide --input)")?,
            origination_points_pct: args.points.unwrap_or(Decimal::ZERO),
            exit_fee_pct: args.exit_fee.unwrap_or(Decimal::ZERO),
            interest_only: args.amortization_months.is_none(),
            amortization_months: args.amortization_months,
        },
    };
    let result = bridge::analyze_bridge_loan(&bridge_input)?;
    Ok(serde_json::to_value(result)?.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn amortize_args() -> AmortizeArgs {
        AmortizeArgs {
            principal: Some(dec!(120000)),
            rate: Some(Decimal::ZERO),
            term: Some(1),
            years: true,
            interest_only: false,
            start_date: None,
            balloon: BalloonArg::FinalRow,
            schedule_csv: false,
            input: None,
        }
    }

    #[test]
    fn test_amortize_from_flags() {
        let out = run_amortize(amortize_args()).unwrap();
        let CommandOutput::Structured(value) = out else {
            panic!("expected structured output");
        };
        assert_eq!(value["result"]["periods"], 12);
        let payment: Decimal = value["result"]["scheduled_payment"]
            .as_str()
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!(payment, dec!(10000));
    }

    #[test]
    fn test_amortize_schedule_csv() {
        let mut args = amortize_args();
        args.schedule_csv = true;
        let CommandOutput::Text(csv) = run_amortize(args).unwrap() else {
            panic!("expected csv text");
        };
        assert_eq!(csv.lines().count(), 13);
        assert!(csv.starts_with("Period,Date,Payment,Interest,Principal,Balance"));
    }

    #[test]
    fn test_missing_flag_message() {
        let mut args = amortize_args();
        args.rate = None;
        let err = run_amortize(args).err().unwrap();
        assert!(err.to_string().contains("--rate"));
    }
}
