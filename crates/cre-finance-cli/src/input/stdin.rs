use serde::de::DeserializeOwned;
use std::io::{self, Read};

/// Calculator document piped on stdin, in the same JSON or YAML shape that
/// `--input` accepts. `None` when stdin is a terminal or carries only
/// whitespace, so the command falls back to its flags.
pub fn read_stdin<T: DeserializeOwned>() -> Result<Option<T>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    parse_piped(&buffer)
}

/// A document opening with `{` or `[` is JSON; anything else is read as YAML.
fn parse_piped<T: DeserializeOwned>(text: &str) -> Result<Option<T>, Box<dyn std::error::Error>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    tracing::debug!(bytes = trimmed.len(), "calculator input piped on stdin");
    let parsed = if trimmed.starts_with('{') || trimmed.starts_with('[') {
        serde_json::from_str(trimmed)
            .map_err(|e| format!("Piped JSON does not match this calculator's input: {e}"))?
    } else {
        serde_yaml::from_str(trimmed)
            .map_err(|e| format!("Piped YAML does not match this calculator's input: {e}"))?
    };
    Ok(Some(parsed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cre_finance_core::returns::irr::IrrInput;
    use rust_decimal_macros::dec;

    #[test]
    fn test_blank_input_falls_back_to_flags() {
        let parsed: Option<IrrInput> = parse_piped("  \n\t").unwrap();
        assert!(parsed.is_none());
    }

    #[test]
    fn test_piped_json() {
        let json = r#"{"cash_flows":[{"year":0,"amount":"-1000"},{"year":1,"amount":"1100"}]}"#;
        let parsed: IrrInput = parse_piped(json).unwrap().unwrap();
        assert_eq!(parsed.cash_flows.len(), 2);
        assert_eq!(parsed.cash_flows[1].amount, dec!(1100));
    }

    #[test]
    fn test_piped_yaml() {
        let yaml = "cash_flows:\n  - year: 0\n    amount: \"-1000\"\n  - year: 1\n    amount: \"1100\"\n";
        let parsed: IrrInput = parse_piped(yaml).unwrap().unwrap();
        assert_eq!(parsed.cash_flows[0].amount, dec!(-1000));
    }

    #[test]
    fn test_wrong_shape_names_the_format() {
        let err = parse_piped::<IrrInput>(r#"{"flows": []}"#).err().unwrap();
        assert!(err.to_string().contains("Piped JSON"));
    }
}
