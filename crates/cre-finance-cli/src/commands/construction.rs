use clap::Args;
use rust_decimal::Decimal;

use cre_finance_core::construction::draws::{self, DrawRequest, DrawScheduleInput};
use cre_finance_core::format::parse_amount;

use super::{file_or_stdin, parse_money, CommandOutput};

/// Arguments for a construction draw schedule
#[derive(Args)]
pub struct ConstructionDrawsArgs {
    /// Total loan commitment
    #[arg(long, value_parser = parse_money)]
    pub commitment: Option<Decimal>,

    /// Annual interest rate in percent
    #[arg(long, value_parser = parse_money)]
    pub rate: Option<Decimal>,

    /// Construction term in months
    #[arg(long)]
    pub term: Option<u32>,

    /// A draw as MONTH:AMOUNT, repeatable (e.g. --draw 1:250000 --draw 4:400000)
    #[arg(long = "draw")]
    pub draws: Vec<String>,

    /// Print the schedule as CSV instead of the structured result
    #[arg(long)]
    pub schedule_csv: bool,

    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_construction_draws(
    args: ConstructionDrawsArgs,
) -> Result<CommandOutput, Box<dyn std::error::Error>> {
    let draw_input: DrawScheduleInput = match file_or_stdin(args.input.as_deref())? {
        Some(input) => input,
        None => DrawScheduleInput {
            total_commitment: args
                .commitment
                .ok_or("--commitment is required (or provide --input)")?,
            annual_rate_pct: args.rate.ok_or("--rate is required (or provide --input)")?,
            term_months: args.term.ok_or("--term is required (or provide --input)")?,
            draws: args
                .draws
                .iter()
                .map(|raw| parse_draw(raw.as_str()))
                .collect::<Result<Vec<_>, _>>()?,
        },
    };

    let result = draws::run_draw_schedule(&draw_input)?;
    if args.schedule_csv {
        return Ok(CommandOutput::Text(draws::draw_schedule_csv(&result.result)?));
    }
    Ok(serde_json::to_value(result)?.into())
}

fn parse_draw(raw: &str) -> Result<DrawRequest, Box<dyn std::error::Error>> {
    let (month, amount) = raw
        .split_once(':')
        .ok_or_else(|| format!("draw '{raw}' must be MONTH:AMOUNT"))?;
    Ok(DrawRequest {
        month: month
            .trim()
            .parse()
            .map_err(|_| format!("draw '{raw}' has an invalid month"))?,
        amount: parse_amount(amount)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_draw() {
        let draw = parse_draw("3:$250,000").unwrap();
        assert_eq!(draw.month, 3);
        assert_eq!(draw.amount, dec!(250000));
        assert!(parse_draw("250000").is_err());
        assert!(parse_draw("x:1").is_err());
    }

    #[test]
    fn test_draws_csv_from_flags() {
        let args = ConstructionDrawsArgs {
            commitment: Some(dec!(1000000)),
            rate: Some(dec!(12)),
            term: Some(3),
            draws: vec!["1:100000".into(), "2:100000".into()],
            schedule_csv: true,
            input: None,
        };
        let CommandOutput::Text(csv) = run_construction_draws(args).unwrap() else {
            panic!("expected csv text");
        };
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with("2,100000.00,100000.00,200000.00,2000.00"));
    }
}
