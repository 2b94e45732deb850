use clap::Args;
use rust_decimal::Decimal;

use cre_finance_core::income::noi::{self, CashInvested, IncomeExpenseInput};
use cre_finance_core::{LoanTerms, TermUnit};

use super::{file_or_stdin, parse_money, CommandOutput};

/// Arguments for NOI and lender ratio analysis
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct NoiArgs {
    /// Monthly scheduled rent
    #[arg(long, value_parser = parse_money)]
    pub rent: Option<Decimal>,

    /// Other monthly income (parking, laundry, ...)
    #[arg(long, value_parser = parse_money)]
    pub other_income: Option<Decimal>,

    /// Vacancy and credit loss in percent
    #[arg(long, value_parser = parse_money)]
    pub vacancy: Option<Decimal>,

    /// Annual property tax
    #[arg(long, value_parser = parse_money)]
    pub property_tax: Option<Decimal>,

    /// Annual insurance
    #[arg(long, value_parser = parse_money)]
    pub insurance: Option<Decimal>,

    /// Monthly HOA dues
    #[arg(long, value_parser = parse_money)]
    pub hoa: Option<Decimal>,

    /// Monthly owner-paid utilities
    #[arg(long, value_parser = parse_money)]
    pub utilities: Option<Decimal>,

    /// Repairs in percent of effective gross income
    #[arg(long, value_parser = parse_money)]
    pub repairs: Option<Decimal>,

    /// Management fee in percent of effective gross income
    #[arg(long, value_parser = parse_money)]
    pub management: Option<Decimal>,

    /// Property value for cap rate
    #[arg(long, value_parser = parse_money)]
    pub value: Option<Decimal>,

    /// Annual debt service, when not derived from loan terms
    #[arg(long, value_parser = parse_money)]
    pub debt_service: Option<Decimal>,

    /// Loan principal; with --loan-rate and --loan-years derives debt service
    #[arg(long, value_parser = parse_money)]
    pub loan_amount: Option<Decimal>,

    /// Loan annual rate in percent
    #[arg(long, value_parser = parse_money)]
    pub loan_rate: Option<Decimal>,

    /// Loan amortization in years
    #[arg(long)]
    pub loan_years: Option<u32>,

    /// Total cash invested for cash-on-cash
    #[arg(long, value_parser = parse_money)]
    pub cash_invested: Option<Decimal>,

    /// Target debt yield in percent for loan sizing
    #[arg(long, value_parser = parse_money)]
    pub target_debt_yield: Option<Decimal>,

    /// Target DSCR for loan sizing
    #[arg(long, value_parser = parse_money)]
    pub target_dscr: Option<Decimal>,

    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_noi(args: NoiArgs) -> Result<CommandOutput, Box<dyn std::error::Error>> {
    let noi_input: IncomeExpenseInput = match file_or_stdin(args.input.as_deref())? {
        Some(input) => input,
        None => input_from_flags(&args)?,
    };
    let result = noi::analyze_income(&noi_input)?;
    Ok(serde_json::to_value(result)?.into())
}

fn input_from_flags(args: &NoiArgs) -> Result<IncomeExpenseInput, Box<dyn std::error::Error>> {
    let loan = match (args.loan_amount, args.loan_rate, args.loan_years) {
        (Some(principal), Some(rate), Some(years)) => Some(LoanTerms {
            principal,
            annual_rate_pct: rate,
            term: years,
            term_unit: TermUnit::Years,
            interest_only: false,
        }),
        (_, None, None) => None,
        _ => return Err("--loan-amount, --loan-rate and --loan-years must be given together".into()),
    };

    Ok(IncomeExpenseInput {
        monthly_rent: args.rent.ok_or("--rent is required (or provide --input)")?,
        other_income_monthly: args.other_income.unwrap_or(Decimal::ZERO),
        vacancy_pct: args.vacancy.unwrap_or(Decimal::ZERO),
        property_tax_annual: args.property_tax.unwrap_or(Decimal::ZERO),
        insurance_annual: args.insurance.unwrap_or(Decimal::ZERO),
        hoa_monthly: args.hoa.unwrap_or(Decimal::ZERO),
        utilities_monthly: args.utilities.unwrap_or(Decimal::ZERO),
        repairs_pct: args.repairs.unwrap_or(Decimal::ZERO),
        management_pct: args.management.unwrap_or(Decimal::ZERO),
        property_value: args.value.unwrap_or(Decimal::ZERO),
        annual_debt_service: args.debt_service,
        loan,
        loan_amount: args.loan_amount,
        cash_invested: CashInvested {
            down_payment: args.cash_invested.unwrap_or(Decimal::ZERO),
            ..Default::default()
        },
        target_debt_yield_pct: args.target_debt_yield,
        target_dscr: args.target_dscr,
    })
}
