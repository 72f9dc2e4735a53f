use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use amortization_core::frequency::{Frequency, FrequencyCatalog};
use amortization_core::loans::calculator;
use amortization_core::loans::chart;
use amortization_core::loans::schedule::{self, ScheduleEntry};
use amortization_core::loans::terms::{LoanState, LoanTerms};

use crate::input;

/// A stored loan plus the id its schedule rows are filed under.
#[derive(Debug, Deserialize)]
pub struct ScheduleRequest {
    #[serde(default)]
    pub loan_id: u32,
    #[serde(flatten)]
    pub loan: LoanState,
}

/// Arguments for the payment calculator
#[derive(Args)]
pub struct CalculateArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Purchase price
    #[arg(long)]
    pub purchase_price: Option<Decimal>,

    /// Cash down payment
    #[arg(long, default_value = "0")]
    pub cash_down: Decimal,

    /// Frequency id from the catalog (4 = Monthly in the standard catalog)
    #[arg(long, default_value_t = 4)]
    pub frequency_id: u32,

    /// Term in years
    #[arg(long)]
    pub years: Option<Decimal>,

    /// Nominal annual interest rate in percent (6 = 6%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Additive correction on the per-period rate
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub correction_rate: Decimal,

    /// Recurring extra payment amount
    #[arg(long, default_value = "0")]
    pub extra_payment: Decimal,

    /// Apply the extra payment to the balance each period
    #[arg(long)]
    pub extra_enabled: bool,

    /// Annual tax / fee amount spread across the payments
    #[arg(long, default_value = "0")]
    pub annual_tax: Decimal,
}

pub fn run_calculate(
    args: CalculateArgs,
    catalog: &FrequencyCatalog,
) -> Result<Value, Box<dyn std::error::Error>> {
    let terms: LoanTerms = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let purchase_price = args
            .purchase_price
            .ok_or("--purchase-price is required (or provide --input)")?;
        let term_years = args.years.ok_or("--years is required (or provide --input)")?;
        let annual_interest_rate = args.rate.ok_or("--rate is required (or provide --input)")?;

        LoanTerms {
            purchase_price,
            cash_down: args.cash_down,
            frequency_id: args.frequency_id,
            term_years,
            annual_interest_rate,
            correction_rate: args.correction_rate,
            extra_payment: args.extra_payment,
            extra_payment_enabled: args.extra_enabled,
            annual_tax_amount: args.annual_tax,
        }
    };

    let frequency = catalog.get(terms.frequency_id)?;
    let result = calculator::calculate_loan(&terms, frequency)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for schedule generation
#[derive(Args)]
pub struct ScheduleArgs {
    /// Path to JSON loan file (stdin is read when omitted)
    #[arg(long)]
    pub input: Option<String>,

    /// Run the calculator on the loan before generating
    #[arg(long)]
    pub calculate: bool,

    /// Date the remaining signed term is measured from (defaults to today)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,

    /// Round money fields on every row to cents
    #[arg(long)]
    pub cents: bool,
}

pub fn run_schedule(
    args: ScheduleArgs,
    catalog: &FrequencyCatalog,
) -> Result<Value, Box<dyn std::error::Error>> {
    let request = read_schedule_request(args.input.as_deref())?;
    let (loan, frequency) = prepare_loan(request.loan, catalog, args.calculate)?;
    let today = args.as_of.unwrap_or_else(|| chrono::Local::now().date_naive());

    let mut output = schedule::build_schedule(request.loan_id, &loan, frequency, today)?;
    if args.cents {
        output.result.entries = output
            .result
            .entries
            .iter()
            .map(ScheduleEntry::rounded_to_cents)
            .collect();
    }
    Ok(serde_json::to_value(output)?)
}

/// Arguments for the principal / interest chart series
#[derive(Args)]
pub struct ChartArgs {
    /// Path to JSON file holding either a loan or a generated schedule
    /// (`{"entries": [...]}`); stdin is read when omitted
    #[arg(long)]
    pub input: Option<String>,

    /// Run the calculator on the loan before generating
    #[arg(long)]
    pub calculate: bool,
}

pub fn run_chart(
    args: ChartArgs,
    catalog: &FrequencyCatalog,
) -> Result<Value, Box<dyn std::error::Error>> {
    let data = read_value(args.input.as_deref())?;

    let entries: Vec<ScheduleEntry> = match schedule_entries(&data) {
        Some(rows) => serde_json::from_value(rows.clone())?,
        None => {
            let request: ScheduleRequest = serde_json::from_value(data)?;
            let (mut loan, frequency) = prepare_loan(request.loan, catalog, args.calculate)?;
            schedule::generate_schedule(request.loan_id, &mut loan, frequency)?
        }
    };

    let result = chart::build_chart(&entries)?;
    Ok(serde_json::to_value(result)?)
}

/// Schedule rows inside a chart input, whether bare or inside a previous
/// `schedule` command's output envelope.
fn schedule_entries(data: &Value) -> Option<&Value> {
    data.get("entries")
        .or_else(|| data.get("result").and_then(|r| r.get("entries")))
        .filter(|v| v.is_array())
}

fn read_value(path: Option<&str>) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        input::file::read_json_value(path)
    } else if let Some(data) = input::stdin::read_stdin()? {
        Ok(data)
    } else {
        Err("--input <loan.json> or stdin required".into())
    }
}

fn read_schedule_request(
    path: Option<&str>,
) -> Result<ScheduleRequest, Box<dyn std::error::Error>> {
    Ok(serde_json::from_value(read_value(path)?)?)
}

/// Resolve the loan's frequency and optionally persist fresh calculator
/// outputs onto it.
fn prepare_loan<'a>(
    loan: LoanState,
    catalog: &'a FrequencyCatalog,
    calculate: bool,
) -> Result<(LoanState, &'a Frequency), Box<dyn std::error::Error>> {
    let frequency_id = loan
        .frequency_id
        .ok_or("Loan must have a frequency set (frequency_id)")?;
    let frequency = catalog.get(frequency_id)?;

    let loan = if calculate {
        calculator::recalculate_loan(&loan, frequency)?.result
    } else {
        loan
    };
    Ok((loan, frequency))
}
