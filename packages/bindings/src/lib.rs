use napi::Result as NapiResult;
use napi_derive::napi;
use serde::de::DeserializeOwned;
use serde::Serialize;

use cre_finance_core::CreFinanceResult;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Parse the JSON input, run the calculator, serialise its output.
fn run_json<I, O, F>(input_json: &str, calc: F) -> NapiResult<String>
where
    I: DeserializeOwned,
    O: Serialize,
    F: FnOnce(&I) -> CreFinanceResult<O>,
{
    let input: I = serde_json::from_str(input_json).map_err(to_napi_error)?;
    let output = calc(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Loans
// ---------------------------------------------------------------------------

#[napi]
pub fn amortize(input_json: String) -> NapiResult<String> {
    run_json(
        &input_json,
        cre_finance_core::amortization::schedule::generate_schedule,
    )
}

#[napi]
pub fn amortization_csv(input_json: String) -> NapiResult<String> {
    let input: cre_finance_core::amortization::schedule::AmortizationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = cre_finance_core::amortization::schedule::generate_schedule(&input)
        .map_err(to_napi_error)?;
    cre_finance_core::amortization::schedule::schedule_csv(&output.result).map_err(to_napi_error)
}

#[napi]
pub fn calculate_mortgage(input_json: String) -> NapiResult<String> {
    run_json(
        &input_json,
        cre_finance_core::amortization::mortgage::calculate_mortgage,
    )
}

#[napi]
pub fn analyze_refinance(input_json: String) -> NapiResult<String> {
    run_json(
        &input_json,
        cre_finance_core::amortization::refinance::analyze_refinance,
    )
}

#[napi]
pub fn analyze_bridge_loan(input_json: String) -> NapiResult<String> {
    run_json(
        &input_json,
        cre_finance_core::amortization::bridge::analyze_bridge_loan,
    )
}

#[napi]
pub fn prepayment_penalty(input_json: String) -> NapiResult<String> {
    run_json(
        &input_json,
        cre_finance_core::prepayment::penalty::compute_penalty,
    )
}

// ---------------------------------------------------------------------------
// Income and returns
// ---------------------------------------------------------------------------

#[napi]
pub fn analyze_income(input_json: String) -> NapiResult<String> {
    run_json(&input_json, cre_finance_core::income::noi::analyze_income)
}

#[napi]
pub fn compute_irr(input_json: String) -> NapiResult<String> {
    run_json(&input_json, cre_finance_core::returns::irr::compute_irr)
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

#[napi]
pub fn construction_draws(input_json: String) -> NapiResult<String> {
    run_json(
        &input_json,
        cre_finance_core::construction::draws::run_draw_schedule,
    )
}

#[napi]
pub fn draw_schedule_csv(input_json: String) -> NapiResult<String> {
    let input: cre_finance_core::construction::draws::DrawScheduleInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        cre_finance_core::construction::draws::run_draw_schedule(&input).map_err(to_napi_error)?;
    cre_finance_core::construction::draws::draw_schedule_csv(&output.result)
        .map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Rent vs buy
// ---------------------------------------------------------------------------

#[napi]
pub fn rent_vs_buy(input_json: String) -> NapiResult<String> {
    run_json(
        &input_json,
        cre_finance_core::rent_vs_buy::comparison::compare_rent_vs_buy,
    )
}

// ---------------------------------------------------------------------------
// Form helpers
// ---------------------------------------------------------------------------

/// Parse a form-entered amount ("$1,250.50") into a decimal string.
#[napi]
pub fn parse_amount(raw: String) -> NapiResult<String> {
    cre_finance_core::format::parse_amount(&raw)
        .map(|d| d.to_string())
        .map_err(to_napi_error)
}

/// Format a decimal string as US currency ("-$1,234.57").
#[napi]
pub fn format_currency(value: String) -> NapiResult<String> {
    let amount = cre_finance_core::format::parse_amount(&value).map_err(to_napi_error)?;
    Ok(cre_finance_core::format::format_currency(amount))
}
