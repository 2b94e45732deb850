use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Read a JSON or YAML input file (by extension) into a typed struct.
pub fn read_input<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    parse_contents(&canonical, &contents)
        .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e).into())
}

fn parse_contents<T: DeserializeOwned>(
    path: &Path,
    contents: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    if is_yaml {
        Ok(serde_yaml::from_str(contents)?)
    } else {
        Ok(serde_json::from_str(contents)?)
    }
}

/// Resolve the path against the working directory and check it is a file.
fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }

    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }

    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cre_finance_core::construction::draws::DrawScheduleInput;
    use rust_decimal_macros::dec;

    #[test]
    fn test_yaml_by_extension() {
        let yaml = "total_commitment: \"1000000\"\nannual_rate_pct: \"8\"\nterm_months: 12\ndraws:\n  - month: 1\n    amount: \"250000\"\n";
        let input: DrawScheduleInput = parse_contents(Path::new("draws.yaml"), yaml).unwrap();
        assert_eq!(input.total_commitment, dec!(1000000));
        assert_eq!(input.draws.len(), 1);
    }

    #[test]
    fn test_json_by_default() {
        let json = r#"{"total_commitment":"500000","annual_rate_pct":"7","term_months":6,"draws":[]}"#;
        let input: DrawScheduleInput = parse_contents(Path::new("draws.json"), json).unwrap();
        assert_eq!(input.term_months, 6);
    }

    #[test]
    fn test_missing_file() {
        let result: Result<DrawScheduleInput, _> = read_input("definitely/not/here.json");
        assert!(result.is_err());
    }
}
