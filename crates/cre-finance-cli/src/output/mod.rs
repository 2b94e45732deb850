pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Render a command's structured result in the selected format.
pub fn format_output(format: &OutputFormat, value: &Value) {
    tracing::trace!(?format, "rendering output");
    match format {
        OutputFormat::Json => json::print_json(value, atty::is(atty::Stream::Stdout)),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}
