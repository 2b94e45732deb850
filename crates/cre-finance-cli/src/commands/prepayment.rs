use clap::{Args, ValueEnum};
use rust_decimal::Decimal;

use cre_finance_core::prepayment::penalty::{self, PenaltyInput, PenaltyMethod};

use super::{file_or_stdin, parse_money, CommandOutput};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MethodArg {
    /// Percentage ladder by remaining loan year
    StepDown,
    /// N months of interest on the prepaid amount
    MonthsInterest,
    /// Yield maintenance on the lost spread
    YieldMaint,
}

/// Arguments for a prepayment penalty
#[derive(Args)]
pub struct PrepaymentPenaltyArgs {
    /// Outstanding loan balance
    #[arg(long, value_parser = parse_money)]
    pub balance: Option<Decimal>,

    /// Amount being prepaid (defaults to the full balance)
    #[arg(long, value_parser = parse_money)]
    pub prepay: Option<Decimal>,

    /// Annual note rate in percent
    #[arg(long, value_parser = parse_money)]
    pub note_rate: Option<Decimal>,

    /// Months remaining to maturity
    #[arg(long)]
    pub months_remaining: Option<u32>,

    /// Penalty method
    #[arg(long, value_enum)]
    pub method: Option<MethodArg>,

    /// Step-down ladder, e.g. "5,4,3,2,1"
    #[arg(long)]
    pub ladder: Option<String>,

    /// Months of interest charged
    #[arg(long)]
    pub months_of_interest: Option<u32>,

    /// Annual reinvestment (treasury) rate in percent for yield maintenance
    #[arg(long, value_parser = parse_money)]
    pub reinvestment_rate: Option<Decimal>,

    /// Spread added to the reinvestment rate when discounting, in percent
    #[arg(long, value_parser = parse_money)]
    pub discount_adjustment: Option<Decimal>,

    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_prepayment_penalty(
    args: PrepaymentPenaltyArgs,
) -> Result<CommandOutput, Box<dyn std::error::Error>> {
    let penalty_input: PenaltyInput = match file_or_stdin(args.input.as_deref())? {
        Some(input) => input,
        None => input_from_flags(args)?,
    };
    let result = penalty::compute_penalty(&penalty_input)?;
    Ok(serde_json::to_value(result)?.into())
}

fn input_from_flags(args: PrepaymentPenaltyArgs) -> Result<PenaltyInput, Box<dyn std::error::Error>> {
    let method = match args.method.ok_or("--method is required (or provide --input)")? {
        MethodArg::StepDown => PenaltyMethod::StepDown {
            ladder: penalty::parse_ladder(
                args.ladder
                    .as_deref()
                    .ok_or("--ladder is required for step-down")?,
            )?,
        },
        MethodArg::MonthsInterest => PenaltyMethod::MonthsInterest {
            months_of_interest: args
                .months_of_interest
                .ok_or("--months-of-interest is required for months-interest")?,
        },
        MethodArg::YieldMaint => PenaltyMethod::YieldMaintenance {
            reinvestment_rate_pct: args
                .reinvestment_rate
                .ok_or("--reinvestment-rate is required for yield-maint")?,
            discount_adjustment_pct: args.discount_adjustment.unwrap_or(Decimal::ZERO),
        },
    };

    let remaining_balance = args
        .balance
        .ok_or("--balance is required (or provide --input)")?;

    Ok(PenaltyInput {
        remaining_balance,
        prepay_amount: args.prepay.unwrap_or(remaining_balance),
        note_rate_pct: args
            .note_rate
            .ok_or("--note-rate is required (or provide --input)")?,
        months_remaining: args
            .months_remaining
            .ok_or("--months-remaining is required (or provide --input)")?,
        method,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn args(method: MethodArg) -> PrepaymentPenaltyArgs {
        PrepaymentPenaltyArgs {
            balance: Some(dec!(1000000)),
            prepay: None,
            note_rate: Some(dec!(6)),
            months_remaining: Some(18),
            method: Some(method),
            ladder: Some("5,4,3".into()),
            months_of_interest: Some(3),
            reinvestment_rate: None,
            discount_adjustment: None,
            input: None,
        }
    }

    #[test]
    fn test_step_down_from_flags() {
        let input = input_from_flags(args(MethodArg::StepDown)).unwrap();
        assert_eq!(input.prepay_amount, dec!(1000000));
        let out = penalty::compute_penalty(&input).unwrap().result;
        // 18 months remaining is year 2 of the ladder
        assert_eq!(out.penalty, dec!(40000));
    }

    #[test]
    fn test_yield_maint_requires_rate() {
        assert!(input_from_flags(args(MethodArg::YieldMaint)).is_err());
    }
}
