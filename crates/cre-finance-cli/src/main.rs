mod commands;
mod config;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde::Deserialize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::construction::ConstructionDrawsArgs;
use commands::income::NoiArgs;
use commands::loans::{AmortizeArgs, BridgeLoanArgs, MortgageArgs, RefinanceArgs};
use commands::prepayment::PrepaymentPenaltyArgs;
use commands::rent_vs_buy::RentVsBuyArgs;
use commands::returns::IrrArgs;
use commands::CommandOutput;
use config::{CliConfig, Settings};

/// Commercial real-estate lending calculations
#[derive(Parser)]
#[command(
    name = "crefin",
    version,
    about = "Commercial real-estate lending calculations",
    long_about = "A CLI for commercial real-estate loan calculations with decimal precision. \
                  Supports amortization schedules, NOI and lender ratios, IRR, prepayment \
                  penalties, construction draws, and rent-vs-buy analysis."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (default: json, or the config file / CREFIN_OUTPUT value)
    #[arg(long, global = true)]
    output: Option<OutputFormat>,

    /// Path to a TOML config file (default: ./crefin.toml if present)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Log filter written to stderr, e.g. `debug` (default: warn)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a fixed-rate amortization schedule
    Amortize(AmortizeArgs),
    /// Reduce income and expenses to NOI, cap rate, DSCR and debt yield
    Noi(NoiArgs),
    /// Solve the internal rate of return of annual cash flows
    Irr(IrrArgs),
    /// Compute a prepayment penalty (step-down, months of interest, yield maintenance)
    PrepaymentPenalty(PrepaymentPenaltyArgs),
    /// Build a construction draw schedule with interest reserve
    ConstructionDraws(ConstructionDrawsArgs),
    /// Compare the present-value cost of buying against renting
    RentVsBuy(RentVsBuyArgs),
    /// Monthly payment breakdown for a purchase mortgage
    Mortgage(MortgageArgs),
    /// Evaluate refinance savings and break-even
    Refinance(RefinanceArgs),
    /// Cost of a short-term bridge loan
    BridgeLoan(BridgeLoanArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let settings = match CliConfig::discover(cli.config.as_deref())
        .and_then(|cfg| cfg.with_env(|key| std::env::var(key).ok()).map_err(Into::into))
    {
        Ok(cfg) => Settings::resolve(cfg, cli.output, cli.log_level.clone()),
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(2);
        }
    };

    init_tracing(&settings.log_level);
    tracing::debug!(output = ?settings.output, "settings resolved");

    let result: Result<CommandOutput, Box<dyn std::error::Error>> = match cli.command {
        Commands::Amortize(args) => commands::loans::run_amortize(args),
        Commands::Noi(args) => commands::income::run_noi(args),
        Commands::Irr(args) => commands::returns::run_irr(args),
        Commands::PrepaymentPenalty(args) => commands::prepayment::run_prepayment_penalty(args),
        Commands::ConstructionDraws(args) => commands::construction::run_construction_draws(args),
        Commands::RentVsBuy(args) => commands::rent_vs_buy::run_rent_vs_buy(args),
        Commands::Mortgage(args) => commands::loans::run_mortgage(args),
        Commands::Refinance(args) => commands::loans::run_refinance(args),
        Commands::BridgeLoan(args) => commands::loans::run_bridge_loan(args),
        Commands::Version => {
            println!("crefin {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(CommandOutput::Structured(value)) => {
            output::format_output(&settings.output, &value);
            process::exit(0);
        }
        Ok(CommandOutput::Text(text)) => {
            print!("{}", text);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
