//! Presentation helpers shared by every calculator: parsing loosely
//! formatted form amounts and rendering money for display.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

use crate::error::CreFinanceError;
use crate::types::{Money, Percent};
use crate::CreFinanceResult;

/// Parse a user-entered amount such as `"$1,250.50"`, `" 3 500 "` or `"7.25%"`.
///
/// Blank input is treated as zero. Anything that is not a number once
/// currency symbols, separators and whitespace are stripped is rejected.
pub fn parse_amount(raw: &str) -> CreFinanceResult<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '%' | '_') && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return Ok(Decimal::ZERO);
    }

    Decimal::from_str(&cleaned)
        .map_err(|_| CreFinanceError::invalid("amount", format!("'{raw}' is not a number")))
}

/// Round half away from zero to whole cents.
pub fn round_cents(value: Money) -> Money {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `$1,234.57` style rendering; negatives as `-$1,234.57`.
pub fn format_currency(value: Money) -> String {
    let rounded = round_cents(value);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let text = format!("{:.2}", rounded.abs());
    let (whole, frac) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{sign}${grouped}.{frac}")
}

/// `6.25%` style rendering with two decimals.
pub fn format_percent(value: Percent) -> String {
    format!("{:.2}%", round_cents(value))
}
