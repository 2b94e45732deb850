//! Flattening of schedule rows into CSV text: one line per period, a fixed
//! header per row type, money fixed to two decimals.

use crate::error::CreFinanceError;
use crate::format::round_cents;
use crate::types::Money;
use crate::CreFinanceResult;

/// A schedule row that can be written as one CSV record.
pub trait CsvRecord {
    /// Column header, identical for every row of this type.
    fn header() -> &'static [&'static str];

    /// Cell values in header order.
    fn fields(&self) -> Vec<String>;
}

/// Render a money cell with exactly two decimals.
pub fn money_cell(value: Money) -> String {
    format!("{:.2}", round_cents(value))
}

/// Write `rows` as CSV text, header first.
pub fn to_csv<R: CsvRecord>(rows: &[R]) -> CreFinanceResult<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(R::header())?;
    for row in rows {
        wtr.write_record(row.fields())?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| CreFinanceError::SerializationError(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| CreFinanceError::SerializationError(e.to_string()))
}
