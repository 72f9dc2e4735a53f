//! Period-by-period amortisation schedule.
//!
//! Generation is a balance roll-forward over at most `number_of_payments + 4`
//! periods after an opening row. The extra four periods are a guard band for
//! rounding. Termination is latched one period late: the first period whose
//! *starting* balance is negative is still emitted, then generation stops.
//! Totals are accumulated from the signed rows; the rows handed back to the
//! caller have their balances, interest and principal made non-negative.

use chrono::{Days, NaiveDate};
use log::{debug, trace, warn};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::LoanError;
use crate::frequency::Frequency;
use crate::loans::terms::LoanState;
use crate::types::*;
use crate::LoanResult;

/// Periods generated beyond the nominal payment count.
pub const OVERRUN_PERIODS: u32 = 4;

/// Decimal places kept on the written-back totals.
const TOTALS_DP: u32 = 4;

/// One row of the schedule. Row 0 is the opening balance and carries no
/// per-period figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub loan_id: u32,
    pub payment_number: u32,
    pub schedule_date: NaiveDate,
    pub payment_amount: Money,
    pub principal: Option<Money>,
    pub interest: Option<Money>,
    pub starting_balance: Option<Money>,
    pub ending_balance: Money,
    /// Ending balance less the extra payment, when extra payments are enabled.
    pub ending_balance_extra: Option<Money>,
    /// The configured extra amount. Recorded even when extra payments are
    /// disabled, in which case it is not taken off the balance.
    pub extra_payment: Option<Money>,
    /// Annual rate snapshot, as a percentage.
    pub interest_rate_annual: Option<Rate>,
    pub interest_rate_per_period: Option<Rate>,
}

impl ScheduleEntry {
    pub fn is_opening(&self) -> bool {
        self.payment_number == 0
    }

    /// Copy with every money field rounded to cents.
    pub fn rounded_to_cents(&self) -> ScheduleEntry {
        let cents = |v: Decimal| v.round_dp(2);
        ScheduleEntry {
            payment_amount: cents(self.payment_amount),
            principal: self.principal.map(cents),
            interest: self.interest.map(cents),
            starting_balance: self.starting_balance.map(cents),
            ending_balance: cents(self.ending_balance),
            ending_balance_extra: self.ending_balance_extra.map(cents),
            extra_payment: self.extra_payment.map(cents),
            ..self.clone()
        }
    }
}

/// Rows from one roll-forward and whether the termination latch fired.
#[derive(Debug, Clone)]
pub struct ScheduleRun {
    pub entries: Vec<ScheduleEntry>,
    /// False when the overrun limit was reached without the balance
    /// crossing zero.
    pub terminated: bool,
}

/// Aggregates over every non-opening row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub total_interest: Money,
    pub total_principal: Money,
    pub total_extra_payment: Money,
    pub actual_payment_count: u32,
    pub actual_term_length: Years,
}

/// Everything one generation request produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleOutput {
    pub loan_id: u32,
    pub schedule_count: usize,
    pub message: String,
    pub summary: Option<ScheduleSummary>,
    pub loan: LoanState,
    pub entries: Vec<ScheduleEntry>,
}

fn overflow(loan_id: u32, payment_number: u32, step: &str) -> LoanError {
    LoanError::Overflow {
        context: format!("loan {loan_id} period {payment_number} {step}"),
    }
}

/// Roll the balance forward period by period.
///
/// Returns an empty run when the loan lacks a payment date, financed amount,
/// payment amount or payment count.
pub fn run_schedule(
    loan_id: u32,
    loan: &LoanState,
    frequency: &Frequency,
) -> LoanResult<ScheduleRun> {
    let (
        Some(start_date),
        Some(financed_amount),
        Some(payment_amount),
        Some(number_of_payments),
    ) = (
        loan.payment_date,
        loan.financed_amount,
        loan.payment_amount,
        loan.number_of_payments,
    )
    else {
        return Ok(ScheduleRun {
            entries: Vec::new(),
            terminated: false,
        });
    };

    let rate = loan.final_interest_rate.unwrap_or_default();
    let configured_extra = loan.extra_payment.unwrap_or_default();
    let applied_extra = if loan.extra_payment_enabled {
        configured_extra
    } else {
        Decimal::ZERO
    };
    let interval = Days::new(u64::from(frequency.days_between_payments));
    let advance = |date: NaiveDate| date.checked_add_days(interval).unwrap_or(NaiveDate::MAX);

    let limit = number_of_payments.saturating_add(OVERRUN_PERIODS);
    // Grown as rows are produced; the stored payment count is caller data.
    let mut entries = Vec::new();

    entries.push(ScheduleEntry {
        loan_id,
        payment_number: 0,
        schedule_date: start_date,
        payment_amount,
        principal: None,
        interest: None,
        starting_balance: None,
        ending_balance: financed_amount,
        ending_balance_extra: None,
        extra_payment: None,
        interest_rate_annual: loan.interest_rate,
        interest_rate_per_period: loan.final_interest_rate,
    });

    let mut balance = financed_amount;
    let mut date = advance(start_date);
    let mut terminated = false;

    for payment_number in 1..=limit {
        let starting_balance = balance;
        let interest = starting_balance
            .checked_mul(rate)
            .ok_or_else(|| overflow(loan_id, payment_number, "interest"))?;
        let principal = payment_amount
            .checked_sub(interest)
            .ok_or_else(|| overflow(loan_id, payment_number, "principal"))?
            .max(Decimal::ZERO);
        let ending_balance = starting_balance
            .checked_sub(principal)
            .ok_or_else(|| overflow(loan_id, payment_number, "ending balance"))?;
        let ending_balance_extra = ending_balance
            .checked_sub(applied_extra)
            .ok_or_else(|| overflow(loan_id, payment_number, "extra payment"))?;

        trace!(
            "loan {loan_id} period {payment_number}: start {starting_balance} interest {interest} principal {principal} end {ending_balance_extra}"
        );

        entries.push(ScheduleEntry {
            loan_id,
            payment_number,
            schedule_date: date,
            payment_amount,
            principal: Some(principal),
            interest: Some(interest),
            starting_balance: Some(starting_balance),
            ending_balance,
            ending_balance_extra: Some(ending_balance_extra),
            extra_payment: Some(configured_extra),
            interest_rate_annual: loan.interest_rate,
            interest_rate_per_period: loan.final_interest_rate,
        });

        balance = if loan.extra_payment_enabled {
            ending_balance_extra
        } else {
            ending_balance
        };
        date = advance(date);

        if starting_balance < Decimal::ZERO {
            terminated = true;
            break;
        }
    }

    Ok(ScheduleRun { entries, terminated })
}

/// Totals over the signed rows produced by [`run_schedule`].
///
/// Interest is only accumulated where positive. When extra payments are
/// enabled one extra amount is taken back off the accumulated total.
pub fn summarize(
    entries: &[ScheduleEntry],
    loan: &LoanState,
    frequency: &Frequency,
) -> LoanResult<ScheduleSummary> {
    let add = |total: Decimal, value: Decimal, field: &str| {
        total.checked_add(value).ok_or_else(|| LoanError::Overflow {
            context: format!("schedule total {field}"),
        })
    };

    let mut total_interest = Decimal::ZERO;
    let mut total_principal = Decimal::ZERO;
    let mut total_extra_payment = Decimal::ZERO;
    let mut actual_payment_count: u32 = 0;

    for entry in entries.iter().filter(|e| !e.is_opening()) {
        if let Some(interest) = entry.interest.filter(|i| *i > Decimal::ZERO) {
            total_interest = add(total_interest, interest, "interest")?;
        }
        if let Some(principal) = entry.principal {
            total_principal = add(total_principal, principal, "principal")?;
        }
        if let Some(extra) = entry.extra_payment {
            total_extra_payment = add(total_extra_payment, extra, "extra payment")?;
        }
        actual_payment_count += 1;
    }

    let configured_extra = loan.extra_payment.unwrap_or_default();
    if loan.extra_payment_enabled && configured_extra > Decimal::ZERO {
        total_extra_payment -= configured_extra;
    }

    let actual_term_length = if frequency.payments_per_year == 0 {
        Decimal::ZERO
    } else {
        Decimal::from(actual_payment_count) / Decimal::from(frequency.payments_per_year)
    };

    Ok(ScheduleSummary {
        total_interest: total_interest.round_dp(TOTALS_DP),
        total_principal: total_principal.round_dp(TOTALS_DP),
        total_extra_payment: total_extra_payment.round_dp(TOTALS_DP),
        actual_payment_count,
        actual_term_length,
    })
}

/// Drop the sign from balances, interest and principal on every row.
pub fn normalize(entries: &mut [ScheduleEntry]) {
    for entry in entries.iter_mut() {
        entry.starting_balance = entry.starting_balance.map(|v| v.abs());
        entry.interest = entry.interest.map(|v| v.abs());
        entry.principal = entry.principal.map(|v| v.abs());
        entry.ending_balance = entry.ending_balance.abs();
        entry.ending_balance_extra = entry.ending_balance_extra.map(|v| v.abs());
    }
}

/// Whole years from `today` to the signed maturity date, midpoints away
/// from zero. Zero when there is no maturity date or it is not in the future.
pub fn remaining_term(signed_maturity_date: Option<NaiveDate>, today: NaiveDate) -> Years {
    match signed_maturity_date {
        Some(maturity) if maturity > today => {
            let days = (maturity - today).num_days();
            (Decimal::from(days) / Decimal::from(365))
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        }
        _ => Decimal::ZERO,
    }
}

/// Generate the full schedule for a loan as of `today`, writing the totals,
/// actual payment count, actual term length and remaining signed term back
/// onto `loan`.
///
/// A loan missing its calculator outputs yields an empty schedule and is
/// left untouched, as is a loan whose balances overflow.
pub fn generate_schedule_as_of(
    loan_id: u32,
    loan: &mut LoanState,
    frequency: &Frequency,
    today: NaiveDate,
) -> LoanResult<Vec<ScheduleEntry>> {
    Ok(generate(loan_id, loan, frequency, today)?.0.entries)
}

fn generate(
    loan_id: u32,
    loan: &mut LoanState,
    frequency: &Frequency,
    today: NaiveDate,
) -> LoanResult<(ScheduleRun, Option<ScheduleSummary>)> {
    let mut run = run_schedule(loan_id, loan, frequency)?;
    if run.entries.is_empty() {
        warn!(
            "loan {loan_id}: payment date, financed amount, payment amount or payment count \
             missing; no schedule generated"
        );
        return Ok((run, None));
    }
    if !run.terminated {
        debug!(
            "loan {loan_id}: balance did not cross zero within {} periods",
            run.entries.len() - 1
        );
    }

    let summary = summarize(&run.entries, loan, frequency)?;
    loan.total_interest = Some(summary.total_interest);
    loan.total_principal = Some(summary.total_principal);
    loan.total_extra_payment = Some(summary.total_extra_payment);
    loan.new_number_of_payments = Some(summary.actual_payment_count);
    loan.new_term_length = Some(summary.actual_term_length);
    loan.signed_term_remaining = Some(remaining_term(loan.signed_maturity_date, today));

    normalize(&mut run.entries);

    debug!(
        "loan {loan_id}: generated {} entries, total interest {}",
        run.entries.len(),
        summary.total_interest
    );
    Ok((run, Some(summary)))
}

/// [`generate_schedule_as_of`] using the local calendar date.
pub fn generate_schedule(
    loan_id: u32,
    loan: &mut LoanState,
    frequency: &Frequency,
) -> LoanResult<Vec<ScheduleEntry>> {
    let today = chrono::Local::now().date_naive();
    generate_schedule_as_of(loan_id, loan, frequency, today)
}

/// Generate a schedule for a copy of `loan` and wrap it with the updated
/// loan, the summary and any warnings.
pub fn build_schedule(
    loan_id: u32,
    loan: &LoanState,
    frequency: &Frequency,
    today: NaiveDate,
) -> LoanResult<ComputationOutput<ScheduleOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    frequency.validate()?;

    let mut updated = loan.clone();
    let (run, summary) = generate(loan_id, &mut updated, frequency, today)?;

    if summary.is_none() {
        warnings.push(
            "Loan is missing payment_date, financed_amount, payment_amount or \
             number_of_payments; run the calculator first"
                .into(),
        );
    } else if !run.terminated {
        warnings.push(format!(
            "Balance did not cross zero within {} periods; schedule stopped at the overrun limit",
            run.entries.len() - 1
        ));
    }
    let entries = run.entries;

    let message = format!(
        "Generated {} payment schedule entries using {} payments per year (every {} days).",
        entries.len(),
        frequency.payments_per_year,
        frequency.days_between_payments
    );

    let output = ScheduleOutput {
        loan_id,
        schedule_count: entries.len(),
        message,
        summary,
        loan: updated,
        entries,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Annuity-due balance roll-forward",
        &serde_json::json!({
            "loan_id": loan_id,
            "frequency": frequency.frequency_type,
            "days_between_payments": frequency.days_between_payments,
            "overrun_periods": OVERRUN_PERIODS,
            "extra_payment_enabled": loan.extra_payment_enabled,
            "as_of": today.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}
