use amortization_core::frequency::{Frequency, FrequencyCatalog};
use amortization_core::loans::schedule::ScheduleEntry;
use amortization_core::loans::terms::{LoanState, LoanTerms};
use amortization_core::loans::{calculator, chart, schedule};
use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Frequencies
// ---------------------------------------------------------------------------

#[napi]
pub fn standard_frequencies() -> NapiResult<String> {
    let catalog = FrequencyCatalog::standard();
    let frequencies: Vec<&Frequency> = catalog.iter().collect();
    serde_json::to_string(&frequencies).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Calculator
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct CalculateRequest {
    terms: LoanTerms,
    frequency: Frequency,
}

#[napi]
pub fn calculate_loan(input_json: String) -> NapiResult<String> {
    let input: CalculateRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = calculator::calculate_loan(&input.terms, &input.frequency).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ScheduleRequest {
    #[serde(default)]
    loan_id: u32,
    loan: LoanState,
    frequency: Frequency,
    /// Date the remaining signed term is measured from; today when absent.
    #[serde(default)]
    as_of: Option<chrono::NaiveDate>,
}

#[napi]
pub fn generate_schedule(input_json: String) -> NapiResult<String> {
    let input: ScheduleRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let today = input
        .as_of
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let output = schedule::build_schedule(input.loan_id, &input.loan, &input.frequency, today)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn chart_data(entries_json: String) -> NapiResult<String> {
    let entries: Vec<ScheduleEntry> = serde_json::from_str(&entries_json).map_err(to_napi_error)?;
    let output = chart::build_chart(&entries).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
