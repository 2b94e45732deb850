//! Commercial loan prepayment penalties: step-down, months-of-interest and
//! approximate yield maintenance.
//!
//! The method is a tagged enum, so only the selected formula ever runs and
//! there are no stale figures from the other two.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Instant;

use crate::error::CreFinanceError;
use crate::format::parse_amount;
use crate::time_value::{in_range, periodic_rate};
use crate::types::{
    check_amount, check_rate_pct, with_metadata, ComputationOutput, Money, Percent,
};
use crate::CreFinanceResult;

/// Longest remaining term accepted (100 years).
const MAX_MONTHS_REMAINING: u32 = 1200;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Penalty method and its method-specific parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PenaltyMethod {
    /// Percentage ladder by remaining loan year, e.g. 5-4-3-2-1
    #[serde(rename = "step_down")]
    StepDown {
        #[serde(deserialize_with = "deserialize_ladder")]
        ladder: Vec<Percent>,
    },
    /// A fixed number of months of interest on the prepaid amount
    #[serde(rename = "months_interest")]
    MonthsInterest { months_of_interest: u32 },
    /// Lost spread over the remaining term, discounted at the reinvestment rate
    #[serde(rename = "yield_maint")]
    YieldMaintenance {
        reinvestment_rate_pct: Percent,
        #[serde(default)]
        discount_adjustment_pct: Percent,
    },
}

impl PenaltyMethod {
    pub fn label(&self) -> &'static str {
        match self {
            PenaltyMethod::StepDown { .. } => "step_down",
            PenaltyMethod::MonthsInterest { .. } => "months_interest",
            PenaltyMethod::YieldMaintenance { .. } => "yield_maint",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PenaltyInput {
    pub remaining_balance: Money,
    pub prepay_amount: Money,
    /// Annual note rate in percent
    pub note_rate_pct: Percent,
    pub months_remaining: u32,
    pub method: PenaltyMethod,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PenaltyOutput {
    pub method: String,
    /// Prepay amount floored at the remaining balance
    pub effective_prepay: Money,
    pub penalty: Money,
    pub penalty_pct_of_prepay: Percent,
    /// Ladder percentage applied (step-down only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied_rate_pct: Option<Percent>,
    /// Prepaid principal plus penalty
    pub total_payoff: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute the prepayment penalty for the selected method.
pub fn compute_penalty(input: &PenaltyInput) -> CreFinanceResult<ComputationOutput<PenaltyOutput>> {
    let start = Instant::now();
    let _span = tracing::debug_span!("compute_penalty", method = input.method.label()).entered();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    let effective_prepay = input.prepay_amount.min(input.remaining_balance);
    if input.prepay_amount > input.remaining_balance {
        warnings.push(format!(
            "Prepay amount {} exceeds the remaining balance — penalty computed on {}",
            input.prepay_amount, input.remaining_balance
        ));
    }

    let (penalty, applied_rate_pct) = match &input.method {
        PenaltyMethod::StepDown { ladder } => {
            let pct = step_down_rate_pct(ladder, input.months_remaining);
            (step_down_penalty(effective_prepay, ladder, input.months_remaining), Some(pct))
        }
        PenaltyMethod::MonthsInterest { months_of_interest } => (
            months_interest_penalty(effective_prepay, input.note_rate_pct, *months_of_interest),
            None,
        ),
        PenaltyMethod::YieldMaintenance {
            reinvestment_rate_pct,
            discount_adjustment_pct,
        } => {
            if reinvestment_rate_pct >= &input.note_rate_pct {
                warnings.push(
                    "Reinvestment rate is at or above the note rate — yield maintenance is zero"
                        .into(),
                );
            }
            (
                yield_maintenance_penalty(
                    effective_prepay,
                    input.note_rate_pct,
                    *reinvestment_rate_pct,
                    *discount_adjustment_pct,
                    input.months_remaining,
                )?,
                None,
            )
        }
    };

    let penalty_pct_of_prepay = if effective_prepay.is_zero() {
        Decimal::ZERO
    } else {
        in_range(
            penalty
                .checked_div(effective_prepay)
                .and_then(|share| share.checked_mul(dec!(100))),
            "prepay_amount",
        )?
    };

    tracing::debug!(penalty = %penalty, "prepayment penalty computed");

    let output = PenaltyOutput {
        method: input.method.label().to_string(),
        effective_prepay,
        penalty,
        penalty_pct_of_prepay,
        applied_rate_pct,
        total_payoff: effective_prepay + penalty,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Prepayment penalty (step-down / months-of-interest / yield maintenance)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Ladder percentage for the remaining loan year: position ceil(months / 12),
/// 0% when the position is 0 or past the end of the ladder.
pub fn step_down_rate_pct(ladder: &[Percent], months_remaining: u32) -> Percent {
    let position = months_remaining.div_ceil(12) as usize;
    if position == 0 || position > ladder.len() {
        return Decimal::ZERO;
    }
    ladder[position - 1]
}

pub fn step_down_penalty(effective_prepay: Money, ladder: &[Percent], months_remaining: u32) -> Money {
    effective_prepay * step_down_rate_pct(ladder, months_remaining) / dec!(100)
}

pub fn months_interest_penalty(
    effective_prepay: Money,
    note_rate_pct: Percent,
    months_of_interest: u32,
) -> Money {
    effective_prepay * periodic_rate(note_rate_pct) * Decimal::from(months_of_interest)
}

/// Sum over the remaining months of the monthly spread lost on the prepaid
/// amount, discounted at the monthly reinvestment rate plus adjustment.
pub fn yield_maintenance_penalty(
    effective_prepay: Money,
    note_rate_pct: Percent,
    reinvestment_rate_pct: Percent,
    discount_adjustment_pct: Percent,
    months_remaining: u32,
) -> CreFinanceResult<Money> {
    let note_monthly = periodic_rate(note_rate_pct);
    let reinvest_monthly = periodic_rate(reinvestment_rate_pct);
    let spread = (note_monthly - reinvest_monthly).max(Decimal::ZERO);
    if spread.is_zero() {
        return Ok(Decimal::ZERO);
    }

    let lost_monthly = effective_prepay * spread;
    let one_plus_d = Decimal::ONE + reinvest_monthly + periodic_rate(discount_adjustment_pct);
    if one_plus_d <= Decimal::ZERO {
        return Err(CreFinanceError::invalid(
            "discount_adjustment_pct",
            "Discount adjustment makes the discount base non-positive",
        ));
    }

    let mut discount = Decimal::ONE;
    let mut penalty = Decimal::ZERO;
    for _ in 0..months_remaining {
        discount = in_range(discount.checked_div(one_plus_d), "discount_adjustment_pct")?;
        let month = in_range(lost_monthly.checked_mul(discount), "discount_adjustment_pct")?;
        penalty = in_range(penalty.checked_add(month), "discount_adjustment_pct")?;
    }
    Ok(penalty)
}

/// Parse a comma-separated ladder such as `"5,4,3,2,1"` or `"3%, 2%, 1%"`.
pub fn parse_ladder(text: &str) -> CreFinanceResult<Vec<Percent>> {
    text.split(',')
        .map(|piece| {
            if piece.trim().is_empty() {
                return Err(CreFinanceError::invalid(
                    "ladder",
                    format!("empty step in '{text}'"),
                ));
            }
            parse_amount(piece)
        })
        .collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LadderRepr {
    List(Vec<Percent>),
    Text(String),
}

fn deserialize_ladder<'de, D>(deserializer: D) -> Result<Vec<Percent>, D::Error>
where
    D: Deserializer<'de>,
{
    match LadderRepr::deserialize(deserializer)? {
        LadderRepr::List(v) => Ok(v),
        LadderRepr::Text(s) => parse_ladder(&s).map_err(serde::de::Error::custom),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_input(input: &PenaltyInput) -> CreFinanceResult<()> {
    check_amount("remaining_balance", input.remaining_balance)?;
    check_amount("prepay_amount", input.prepay_amount)?;
    check_rate_pct("note_rate_pct", input.note_rate_pct)?;
    if input.months_remaining > MAX_MONTHS_REMAINING {
        return Err(CreFinanceError::invalid(
            "months_remaining",
            format!("Cannot exceed {MAX_MONTHS_REMAINING} months"),
        ));
    }

    match &input.method {
        PenaltyMethod::StepDown { ladder } => {
            if ladder.is_empty() {
                return Err(CreFinanceError::invalid(
                    "ladder",
                    "Step-down ladder needs at least one step",
                ));
            }
            if ladder.iter().any(|p| *p < Decimal::ZERO || *p > dec!(100)) {
                return Err(CreFinanceError::invalid(
                    "ladder",
                    "Ladder steps must be between 0 and 100 percent",
                ));
            }
        }
        PenaltyMethod::MonthsInterest { .. } => {}
        PenaltyMethod::YieldMaintenance {
            reinvestment_rate_pct,
            discount_adjustment_pct,
        } => {
            check_rate_pct("reinvestment_rate_pct", *reinvestment_rate_pct)?;
            let one_plus_d = Decimal::ONE
                + periodic_rate(*reinvestment_rate_pct)
                + periodic_rate(*discount_adjustment_pct);
            if one_plus_d <= Decimal::ZERO {
                return Err(CreFinanceError::invalid(
                    "discount_adjustment_pct",
                    "Discount adjustment makes the discount base non-positive",
                ));
            }
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn input_with(method: PenaltyMethod) -> PenaltyInput {
        PenaltyInput {
            remaining_balance: dec!(2000000),
            prepay_amount: dec!(1000000),
            note_rate_pct: dec!(6),
            months_remaining: 30,
            method,
        }
    }

    fn ladder() -> Vec<Percent> {
        vec![dec!(5), dec!(4), dec!(3), dec!(2), dec!(1)]
    }

    #[test]
    fn test_step_down_position() {
        // 30 months remaining → position 3 → 3%
        let out = compute_penalty(&input_with(PenaltyMethod::StepDown { ladder: ladder() }))
            .unwrap()
            .result;
        assert_eq!(out.applied_rate_pct, Some(dec!(3)));
        assert_eq!(out.penalty, dec!(30000));
        assert_eq!(out.total_payoff, dec!(1030000));
    }

    #[test]
    fn test_step_down_boundaries() {
        let l = ladder();
        assert_eq!(step_down_rate_pct(&l, 0), Decimal::ZERO);
        assert_eq!(step_down_rate_pct(&l, 1), dec!(5));
        assert_eq!(step_down_rate_pct(&l, 12), dec!(5));
        assert_eq!(step_down_rate_pct(&l, 13), dec!(4));
        assert_eq!(step_down_rate_pct(&l, 60), dec!(1));
        assert_eq!(step_down_rate_pct(&l, 61), Decimal::ZERO);
    }

    #[test]
    fn test_months_interest() {
        let out = compute_penalty(&input_with(PenaltyMethod::MonthsInterest {
            months_of_interest: 6,
        }))
        .unwrap()
        .result;
        // 1,000,000 * 0.005 * 6 = 30,000
        assert_eq!(out.penalty, dec!(30000));
        assert_eq!(out.applied_rate_pct, None);
    }

    #[test]
    fn test_yield_maintenance_formula() {
        let out = compute_penalty(&input_with(PenaltyMethod::YieldMaintenance {
            reinvestment_rate_pct: dec!(4.2),
            discount_adjustment_pct: Decimal::ZERO,
        }))
        .unwrap()
        .result;

        let spread = dec!(0.005) - dec!(0.0035);
        let mut expected = Decimal::ZERO;
        let mut discount = Decimal::ONE;
        for _ in 0..30 {
            discount /= dec!(1.0035);
            expected += dec!(1000000) * spread * discount;
        }
        assert_eq!(out.penalty, expected);
        // Undiscounted bound: 1,000,000 * 0.0015 * 30 = 45,000
        assert!(out.penalty < dec!(45000));
        assert!(out.penalty > dec!(40000));
    }

    #[test]
    fn test_yield_maintenance_zero_spread() {
        let result = compute_penalty(&input_with(PenaltyMethod::YieldMaintenance {
            reinvestment_rate_pct: dec!(7),
            discount_adjustment_pct: Decimal::ZERO,
        }))
        .unwrap();
        assert_eq!(result.result.penalty, Decimal::ZERO);
        assert!(!result.warnings.is_empty());
    }

    #[test]
    fn test_discount_adjustment_lowers_penalty() {
        let base =
            yield_maintenance_penalty(dec!(1000000), dec!(6), dec!(4), Decimal::ZERO, 60).unwrap();
        let adjusted =
            yield_maintenance_penalty(dec!(1000000), dec!(6), dec!(4), dec!(0.5), 60).unwrap();
        assert!(adjusted < base);
    }

    #[test]
    fn test_collapsing_discount_base_is_an_error() {
        let input = input_with(PenaltyMethod::YieldMaintenance {
            reinvestment_rate_pct: Decimal::ZERO,
            discount_adjustment_pct: dec!(-1199.99),
        });
        assert!(matches!(
            compute_penalty(&input),
            Err(CreFinanceError::InvalidInput { ref field, .. }) if field == "discount_adjustment_pct"
        ));
    }

    #[test]
    fn test_balance_above_ceiling_error() {
        let mut input = input_with(PenaltyMethod::MonthsInterest {
            months_of_interest: 6,
        });
        input.remaining_balance = dec!(79228162514264337593543950335);
        assert!(compute_penalty(&input).is_err());
    }

    #[test]
    fn test_prepay_floored_at_balance() {
        let mut input = input_with(PenaltyMethod::MonthsInterest {
            months_of_interest: 3,
        });
        input.prepay_amount = dec!(5000000);
        let result = compute_penalty(&input).unwrap();
        assert_eq!(result.result.effective_prepay, dec!(2000000));
        assert_eq!(result.result.penalty, dec!(30000));
        assert!(result.warnings.iter().any(|w| w.contains("exceeds")));
    }

    #[test]
    fn test_penalty_pct_of_prepay() {
        let out = compute_penalty(&input_with(PenaltyMethod::StepDown { ladder: ladder() }))
            .unwrap()
            .result;
        assert_eq!(out.penalty_pct_of_prepay, dec!(3));
    }

    #[test]
    fn test_parse_ladder() {
        assert_eq!(parse_ladder("5,4,3,2,1").unwrap(), ladder());
        assert_eq!(
            parse_ladder(" 3% , 2%, 1 ").unwrap(),
            vec![dec!(3), dec!(2), dec!(1)]
        );
        assert!(parse_ladder("5,,3").is_err());
        assert!(parse_ladder("five").is_err());
    }

    #[test]
    fn test_deserialize_ladder_string_and_list() {
        let from_text: PenaltyMethod =
            serde_json::from_str(r#"{"type":"step_down","ladder":"5,4,3"}"#).unwrap();
        let from_list: PenaltyMethod =
            serde_json::from_str(r#"{"type":"step_down","ladder":["5","4","3"]}"#).unwrap();
        match (from_text, from_list) {
            (PenaltyMethod::StepDown { ladder: a }, PenaltyMethod::StepDown { ladder: b }) => {
                assert_eq!(a, b);
                assert_eq!(a.len(), 3);
            }
            _ => panic!("expected step-down"),
        }
    }

    #[test]
    fn test_deserialize_yield_maint_tag() {
        let method: PenaltyMethod = serde_json::from_str(
            r#"{"type":"yield_maint","reinvestment_rate_pct":"4.5"}"#,
        )
        .unwrap();
        assert_eq!(method.label(), "yield_maint");
    }

    #[test]
    fn test_empty_ladder_error() {
        assert!(compute_penalty(&input_with(PenaltyMethod::StepDown { ladder: vec![] })).is_err());
    }

    #[test]
    fn test_negative_prepay_error() {
        let mut input = input_with(PenaltyMethod::MonthsInterest {
            months_of_interest: 3,
        });
        input.prepay_amount = dec!(-1);
        assert!(matches!(
            compute_penalty(&input),
            Err(CreFinanceError::InvalidInput { .. })
        ));
    }
}
