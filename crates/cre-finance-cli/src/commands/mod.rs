pub mod construction;
pub mod income;
pub mod loans;
pub mod prepayment;
pub mod rent_vs_buy;
pub mod returns;

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::Value;

use cre_finance_core::format::parse_amount;

use crate::input;

/// What a subcommand hands back to `main` for printing.
pub enum CommandOutput {
    /// Rendered through the selected `--output` formatter
    Structured(Value),
    /// Printed verbatim (e.g. a schedule CSV)
    Text(String),
}

impl From<Value> for CommandOutput {
    fn from(value: Value) -> Self {
        CommandOutput::Structured(value)
    }
}

/// clap value parser accepting form-style amounts such as `$1,250,000` or `6.5%`.
pub fn parse_money(raw: &str) -> Result<Decimal, String> {
    parse_amount(raw).map_err(|e| e.to_string())
}

/// Typed input from `--input <file>`, else piped stdin, else `None`.
pub fn file_or_stdin<T: DeserializeOwned>(
    path: Option<&str>,
) -> Result<Option<T>, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return Ok(Some(input::file::read_input(path)?));
    }
    input::stdin::read_stdin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_money_form_values() {
        assert_eq!(parse_money("$1,250,000").unwrap(), dec!(1250000));
        assert_eq!(parse_money("6.5%").unwrap(), dec!(6.5));
        assert!(parse_money("abc").is_err());
    }
}
