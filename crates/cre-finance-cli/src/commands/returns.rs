use clap::Args;

use cre_finance_core::format::parse_amount;
use cre_finance_core::returns::irr::{self, CashFlowEntry, IrrInput};

use super::{file_or_stdin, CommandOutput};

/// Arguments for IRR
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct IrrArgs {
    /// Comma-separated annual cash flows starting at year 0 (e.g. "-1000000,80000,1150000")
    #[arg(long)]
    pub cash_flows: Option<String>,

    /// Path to JSON/YAML input file with `cash_flows: [{year, amount}]`
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_irr(args: IrrArgs) -> Result<CommandOutput, Box<dyn std::error::Error>> {
    let irr_input: IrrInput = match file_or_stdin(args.input.as_deref())? {
        Some(input) => input,
        None => {
            let raw = args
                .cash_flows
                .ok_or("--cash-flows is required (or provide --input)")?;
            IrrInput {
                cash_flows: parse_cash_flows(&raw)?,
            }
        }
    };
    let result = irr::compute_irr(&irr_input)?;
    Ok(serde_json::to_value(result)?.into())
}

/// Split a comma list into flows at years 0, 1, 2, ...
fn parse_cash_flows(raw: &str) -> Result<Vec<CashFlowEntry>, Box<dyn std::error::Error>> {
    raw.split(',')
        .enumerate()
        .map(|(year, piece)| -> Result<CashFlowEntry, Box<dyn std::error::Error>> {
            Ok(CashFlowEntry {
                year: year as u32,
                amount: parse_amount(piece)?,
            })
        })
        .collect()
}
