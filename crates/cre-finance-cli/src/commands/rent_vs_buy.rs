use clap::Args;

use cre_finance_core::rent_vs_buy::comparison::{self, RentVsBuyInput};

use super::{file_or_stdin, CommandOutput};

/// Arguments for rent-vs-buy analysis
#[derive(Args)]
pub struct RentVsBuyArgs {
    /// Path to JSON/YAML input file with `own`, `rent`, `horizon_months`, `discount_rate_pct`
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_rent_vs_buy(args: RentVsBuyArgs) -> Result<CommandOutput, Box<dyn std::error::Error>> {
    let rvb_input: RentVsBuyInput = file_or_stdin(args.input.as_deref())?
        .ok_or("--input <file.json> or stdin required for rent-vs-buy")?;
    let result = comparison::compare_rent_vs_buy(&rvb_input)?;
    Ok(serde_json::to_value(result)?.into())
}
