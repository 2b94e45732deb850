//! Discounted cash-flow comparison of owning a home against renting one over
//! a holding horizon.
//!
//! Ownership cost is the cash paid at closing plus the present value of the
//! monthly carrying costs, less the present value of what the owner walks away
//! with on sale at the horizon. Renting cost is the present value of the rent
//! stream. Both are expressed as positive costs, so the smaller NPV wins.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::CreFinanceError;
use crate::time_value::{in_range, level_payment, periodic_rate, remaining_balance};
use crate::types::{
    check_amount, check_rate_pct, with_metadata, ComputationOutput, Money, Percent,
};
use crate::CreFinanceResult;

/// Longest holding horizon accepted (50 years).
const MAX_HORIZON_MONTHS: u32 = 600;
/// Longest purchase loan accepted.
const MAX_TERM_YEARS: u32 = 100;
/// PMI is cancelled once the balance reaches this share of the price.
const PMI_CANCEL_LTV: Decimal = dec!(0.78);
/// PMI is only charged when the opening LTV is above this share.
const PMI_REQUIRED_LTV: Decimal = dec!(0.80);
/// NPV differences inside this band are reported as indifferent.
const INDIFFERENCE_BAND: Money = dec!(1);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Purchase side of the comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnInputs {
    pub home_price: Money,
    pub down_payment: Money,
    #[serde(default)]
    pub closing_costs: Money,
    pub annual_rate_pct: Percent,
    pub term_years: u32,
    #[serde(default)]
    pub property_tax_annual: Money,
    #[serde(default)]
    pub insurance_annual: Money,
    #[serde(default)]
    pub maintenance_monthly: Money,
    #[serde(default)]
    pub hoa_monthly: Money,
    /// Annual PMI premium as a percent of the original loan
    #[serde(default)]
    pub pmi_rate_pct: Percent,
    /// Annual home price appreciation
    #[serde(default)]
    pub appreciation_pct: Percent,
    /// Selling costs as a percent of the sale price
    #[serde(default)]
    pub selling_costs_pct: Percent,
    /// Annual growth applied to every monthly carrying cost, P&I included
    #[serde(default)]
    pub expense_growth_pct: Percent,
}

/// Rental side of the comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentInputs {
    pub monthly_rent: Money,
    #[serde(default)]
    pub rent_growth_pct: Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentVsBuyInput {
    pub own: OwnInputs,
    pub rent: RentInputs,
    pub horizon_months: u32,
    /// Annual discount rate applied monthly
    pub discount_rate_pct: Percent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Buy,
    Rent,
    Indifferent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentVsBuyOutput {
    pub npv_own: Money,
    pub npv_rent: Money,
    /// npv_own - npv_rent; negative means buying is cheaper
    pub npv_diff: Money,
    pub upfront_cash: Money,
    pub loan_amount: Money,
    pub monthly_principal_and_interest: Money,
    pub pv_carrying_costs: Money,
    pub home_value_at_horizon: Money,
    pub remaining_balance: Money,
    pub net_sale_proceeds: Money,
    pub pv_sale_proceeds: Money,
    pub pv_rent: Money,
    /// Month PMI stops, if it was ever charged and cancelled within the horizon
    pub pmi_cancelled_month: Option<u32>,
    /// First month at which selling and walking away beats having rented
    pub breakeven_month: Option<u32>,
    pub recommendation: Recommendation,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compare the present-value cost of buying against renting.
pub fn compare_rent_vs_buy(
    input: &RentVsBuyInput,
) -> CreFinanceResult<ComputationOutput<RentVsBuyOutput>> {
    let start = Instant::now();
    let _span =
        tracing::debug_span!("compare_rent_vs_buy", horizon = input.horizon_months).entered();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    let own = &input.own;
    let horizon = input.horizon_months;
    let discount_rate = periodic_rate(input.discount_rate_pct);
    let one_plus_d = Decimal::ONE + discount_rate;
    let expense_growth = Decimal::ONE + periodic_rate(own.expense_growth_pct);
    let rent_growth = Decimal::ONE + periodic_rate(input.rent.rent_growth_pct);
    let appreciation = Decimal::ONE + periodic_rate(own.appreciation_pct);
    let sell_factor = Decimal::ONE - own.selling_costs_pct / dec!(100);

    let loan_amount = own.home_price - own.down_payment;
    let loan_rate = periodic_rate(own.annual_rate_pct);
    let term_months = own.term_years.saturating_mul(12);
    let monthly_pi = if loan_amount > Decimal::ZERO {
        level_payment(loan_amount, loan_rate, term_months)?
    } else {
        Decimal::ZERO
    };

    let pmi_applies = loan_amount > own.home_price * PMI_REQUIRED_LTV;
    if pmi_applies && own.pmi_rate_pct.is_zero() {
        warnings.push("Down payment is under 20% but no PMI rate was supplied".into());
    }
    let monthly_pmi_base = loan_amount * own.pmi_rate_pct / dec!(100) / dec!(12);
    let pmi_cutoff = own.home_price * PMI_CANCEL_LTV;

    let upfront_cash = own.down_payment + own.closing_costs;

    let mut discount = Decimal::ONE;
    let mut growth = Decimal::ONE;
    let mut rent_factor = Decimal::ONE;
    let mut home_value = own.home_price;
    let mut balance_before = loan_amount;

    let mut pv_carrying = Decimal::ZERO;
    let mut pv_rent = Decimal::ZERO;
    let mut pmi_cancelled_month = None;
    let mut breakeven_month = None;
    let mut last = SaleLeg::default();

    for month in 1..=horizon {
        discount = in_range(discount.checked_div(one_plus_d), "discount_rate_pct")?;
        home_value = in_range(home_value.checked_mul(appreciation), "own.appreciation_pct")?;

        let pi = if month <= term_months { monthly_pi } else { Decimal::ZERO };
        let pmi = if pmi_applies && balance_before > pmi_cutoff {
            monthly_pmi_base
        } else {
            if pmi_applies && pmi_cancelled_month.is_none() {
                pmi_cancelled_month = Some(month);
            }
            Decimal::ZERO
        };
        let carrying = pi
            + own.property_tax_annual / dec!(12)
            + own.insurance_annual / dec!(12)
            + own.maintenance_monthly
            + own.hoa_monthly
            + pmi;
        let grown = in_range(carrying.checked_mul(growth), "own.expense_growth_pct")?;
        pv_carrying = accumulate(pv_carrying, grown, discount, "own.expense_growth_pct")?;

        let rent = in_range(
            input.rent.monthly_rent.checked_mul(rent_factor),
            "rent.rent_growth_pct",
        )?;
        pv_rent = accumulate(pv_rent, rent, discount, "rent.rent_growth_pct")?;

        let balance_after = balance_at(loan_amount, loan_rate, term_months, month)?;
        let net_sale = home_value * sell_factor - balance_after;
        last = SaleLeg {
            balance: balance_after,
            net_sale,
            pv_sale: in_range(net_sale.checked_mul(discount), "discount_rate_pct")?,
        };

        let own_to_date = own_cost(upfront_cash, pv_carrying, last.pv_sale)?;
        if breakeven_month.is_none() && own_to_date < pv_rent {
            breakeven_month = Some(month);
        }

        balance_before = balance_after;
        growth = in_range(growth.checked_mul(expense_growth), "own.expense_growth_pct")?;
        rent_factor = in_range(rent_factor.checked_mul(rent_growth), "rent.rent_growth_pct")?;
    }

    let npv_own = own_cost(upfront_cash, pv_carrying, last.pv_sale)?;
    let npv_rent = pv_rent;
    let npv_diff = in_range(npv_own.checked_sub(npv_rent), "horizon_months")?;

    let recommendation = if npv_diff < -INDIFFERENCE_BAND {
        Recommendation::Buy
    } else if npv_diff > INDIFFERENCE_BAND {
        Recommendation::Rent
    } else {
        Recommendation::Indifferent
    };

    if last.net_sale < Decimal::ZERO {
        warnings.push(format!(
            "Sale at month {horizon} does not cover the remaining loan balance"
        ));
    }

    tracing::debug!(%npv_own, %npv_rent, ?recommendation, "rent vs buy compared");

    let output = RentVsBuyOutput {
        npv_own,
        npv_rent,
        npv_diff,
        upfront_cash,
        loan_amount,
        monthly_principal_and_interest: monthly_pi,
        pv_carrying_costs: pv_carrying,
        home_value_at_horizon: home_value,
        remaining_balance: last.balance,
        net_sale_proceeds: last.net_sale,
        pv_sale_proceeds: last.pv_sale,
        pv_rent,
        pmi_cancelled_month,
        breakeven_month,
        recommendation,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Rent vs buy NPV comparison (monthly discounting)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct SaleLeg {
    balance: Money,
    net_sale: Money,
    pv_sale: Money,
}

/// total + amount * discount, failing once the running sum leaves decimal
/// range.
fn accumulate(total: Money, amount: Money, discount: Decimal, field: &str) -> CreFinanceResult<Money> {
    let pv = in_range(amount.checked_mul(discount), field)?;
    in_range(total.checked_add(pv), field)
}

/// Upfront cash plus discounted carrying costs, less discounted sale proceeds.
fn own_cost(upfront: Money, pv_carrying: Money, pv_sale: Money) -> CreFinanceResult<Money> {
    in_range(
        upfront
            .checked_add(pv_carrying)
            .and_then(|cost| cost.checked_sub(pv_sale)),
        "own.appreciation_pct",
    )
}

fn balance_at(loan: Money, rate: Decimal, term_months: u32, month: u32) -> CreFinanceResult<Money> {
    if loan <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }
    remaining_balance(loan, rate, term_months, month)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_input(input: &RentVsBuyInput) -> CreFinanceResult<()> {
    let own = &input.own;
    if own.home_price <= Decimal::ZERO {
        return Err(CreFinanceError::invalid(
            "own.home_price",
            "Home price must be positive",
        ));
    }
    if own.down_payment < Decimal::ZERO || own.down_payment > own.home_price {
        return Err(CreFinanceError::invalid(
            "own.down_payment",
            "Down payment must be between zero and the home price",
        ));
    }
    check_amount("own.home_price", own.home_price)?;
    for (field, value) in [
        ("own.closing_costs", own.closing_costs),
        ("own.property_tax_annual", own.property_tax_annual),
        ("own.insurance_annual", own.insurance_annual),
        ("own.maintenance_monthly", own.maintenance_monthly),
        ("own.hoa_monthly", own.hoa_monthly),
    ] {
        check_amount(field, value)?;
    }
    check_rate_pct("own.annual_rate_pct", own.annual_rate_pct)?;
    check_rate_pct("own.pmi_rate_pct", own.pmi_rate_pct)?;
    if own.term_years > MAX_TERM_YEARS {
        return Err(CreFinanceError::invalid(
            "own.term_years",
            format!("Loan term cannot exceed {MAX_TERM_YEARS} years"),
        ));
    }
    if own.down_payment < own.home_price && own.term_years == 0 {
        return Err(CreFinanceError::invalid(
            "own.term_years",
            "A financed purchase needs a loan term",
        ));
    }
    if own.selling_costs_pct < Decimal::ZERO || own.selling_costs_pct > dec!(100) {
        return Err(CreFinanceError::invalid(
            "own.selling_costs_pct",
            "Selling costs must be between 0 and 100 percent",
        ));
    }
    if own.appreciation_pct <= dec!(-100) {
        return Err(CreFinanceError::invalid(
            "own.appreciation_pct",
            "Appreciation must be greater than -100 percent",
        ));
    }
    check_amount("rent.monthly_rent", input.rent.monthly_rent)?;
    if input.horizon_months == 0 || input.horizon_months > MAX_HORIZON_MONTHS {
        return Err(CreFinanceError::invalid(
            "horizon_months",
            format!("Horizon must be between 1 and {MAX_HORIZON_MONTHS} months"),
        ));
    }
    if input.discount_rate_pct <= dec!(-1200) {
        return Err(CreFinanceError::invalid(
            "discount_rate_pct",
            "Discount rate must be greater than -1200 percent",
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
