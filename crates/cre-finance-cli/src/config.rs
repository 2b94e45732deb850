//! CLI settings: an optional TOML file, overridden by `CREFIN_*` environment
//! variables, overridden by command-line flags.

use clap::ValueEnum;
use serde::Deserialize;
use std::path::Path;

use crate::OutputFormat;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "crefin.toml";
pub const ENV_OUTPUT: &str = "CREFIN_OUTPUT";
pub const ENV_LOG: &str = "CREFIN_LOG";

/// Contents of the TOML config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CliConfig {
    /// Default output format
    pub output: Option<OutputFormat>,
    /// Tracing filter, e.g. `warn` or `cre_finance_core=debug`
    pub log_level: Option<String>,
}

impl CliConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config '{}': {}", path.display(), e))?;
        Self::from_toml(&content)
            .map_err(|e| format!("Failed to parse config '{}': {}", path.display(), e).into())
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// The explicit `--config` file if given, else `crefin.toml` when present.
    pub fn discover(explicit: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        match explicit {
            Some(path) => Self::from_file(Path::new(path)),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Apply `CREFIN_OUTPUT` / `CREFIN_LOG` on top of the file values.
    pub fn with_env<F>(mut self, get: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = get(ENV_OUTPUT) {
            let format = OutputFormat::from_str(raw.trim(), true)
                .map_err(|_| format!("{ENV_OUTPUT}: unknown output format '{raw}'"))?;
            self.output = Some(format);
        }
        if let Some(level) = get(ENV_LOG) {
            if !level.trim().is_empty() {
                self.log_level = Some(level);
            }
        }
        Ok(self)
    }
}

/// Settings in effect for this invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub output: OutputFormat,
    pub log_level: String,
}

impl Settings {
    pub fn resolve(
        config: CliConfig,
        flag_output: Option<OutputFormat>,
        flag_log_level: Option<String>,
    ) -> Self {
        Self {
            output: flag_output.or(config.output).unwrap_or(OutputFormat::Json),
            log_level: flag_log_level
                .or(config.log_level)
                .unwrap_or_else(|| "warn".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_parse_config_file() {
        let cfg = CliConfig::from_toml("output = \"table\"\nlog_level = \"debug\"\n").unwrap();
        assert_eq!(cfg.output, Some(OutputFormat::Table));
        assert_eq!(cfg.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(CliConfig::from_toml("colour = true").is_err());
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::resolve(CliConfig::default().with_env(no_env).unwrap(), None, None);
        assert_eq!(settings.output, OutputFormat::Json);
        assert_eq!(settings.log_level, "warn");
    }

    #[test]
    fn test_env_overrides_file() {
        let file = CliConfig::from_toml("output = \"table\"").unwrap();
        let cfg = file
            .with_env(|key| match key {
                ENV_OUTPUT => Some("minimal".into()),
                ENV_LOG => Some("info".into()),
                _ => None,
            })
            .unwrap();
        let settings = Settings::resolve(cfg, None, None);
        assert_eq!(settings.output, OutputFormat::Minimal);
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_flags_override_env() {
        let cfg = CliConfig::default()
            .with_env(|key| (key == ENV_OUTPUT).then(|| "csv".to_string()))
            .unwrap();
        let settings = Settings::resolve(cfg, Some(OutputFormat::Table), Some("trace".into()));
        assert_eq!(settings.output, OutputFormat::Table);
        assert_eq!(settings.log_level, "trace");
    }

    #[test]
    fn test_bad_env_output() {
        let result = CliConfig::default().with_env(|key| (key == ENV_OUTPUT).then(|| "xml".into()));
        assert!(result.is_err());
    }
}
