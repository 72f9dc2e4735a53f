use log::debug;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::LoanError;
use crate::frequency::Frequency;
use crate::loans::format::format_currency;
use crate::loans::terms::{LoanState, LoanTerms};
use crate::time_value::annuity_due_payment;
use crate::types::*;
use crate::LoanResult;

/// Decimal places kept on the per-period rates.
const RATE_DP: u32 = 10;

/// Decimal places kept on the payment amount. Display layers round to cents.
const PAYMENT_DP: u32 = 4;

/// Derived payment figures for one set of loan terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub financed_amount: Money,
    pub number_of_payments: u32,
    pub period_interest_rate: Rate,
    pub final_interest_rate: Rate,
    pub payment_amount: Money,
    /// Payment plus the configured extra amount, whether or not extra
    /// payments are enabled.
    pub final_payment_amount: Money,
    pub period_tax_amount: Money,
    pub total_period_payment: Money,
    pub message: String,
}

/// Compute the financed amount, payment count, period rates and the
/// annuity-due payment for `terms` under `frequency`.
pub fn calculate(terms: &LoanTerms, frequency: &Frequency) -> LoanResult<CalculationResult> {
    if frequency.payments_per_year == 0 {
        return Err(LoanError::DivisionByZero {
            context: format!("frequency '{}' has zero payments per year", frequency.frequency_type),
        });
    }
    let payments_per_year = Decimal::from(frequency.payments_per_year);

    let financed_amount = terms.financed_amount();

    let number_of_payments = (terms.term_years * payments_per_year)
        .trunc()
        .to_u32()
        .ok_or_else(|| LoanError::InvalidInput {
            field: "term_years".into(),
            reason: format!(
                "{} years at {} payments per year is not a valid payment count",
                terms.term_years, frequency.payments_per_year
            ),
        })?;

    let period_interest_rate =
        (terms.annual_interest_rate / dec!(100) / payments_per_year).round_dp(RATE_DP);
    let final_interest_rate = (period_interest_rate + terms.correction_rate).round_dp(RATE_DP);

    let payment_amount =
        annuity_due_payment(financed_amount, final_interest_rate, number_of_payments)?
            .round_dp(PAYMENT_DP);

    let final_payment_amount = payment_amount + terms.extra_payment;
    let period_tax_amount = terms.annual_tax_amount / payments_per_year;
    let total_period_payment = final_payment_amount + period_tax_amount;

    let message = if terms.extra_payment_enabled && terms.extra_payment > Decimal::ZERO {
        format!(
            "You'll pay {}, for {} times. This includes {} loan payment, {} extra payment and {} of taxes.",
            format_currency(total_period_payment),
            number_of_payments,
            format_currency(payment_amount),
            format_currency(terms.extra_payment),
            format_currency(period_tax_amount),
        )
    } else {
        format!(
            "You'll pay {}, for {} times. This includes {} loan payment, and {} of taxes.",
            format_currency(total_period_payment),
            number_of_payments,
            format_currency(payment_amount),
            format_currency(period_tax_amount),
        )
    };

    debug!(
        "calculated {number_of_payments} payments of {payment_amount} on {financed_amount} at {final_interest_rate} per period"
    );

    Ok(CalculationResult {
        financed_amount,
        number_of_payments,
        period_interest_rate,
        final_interest_rate,
        payment_amount,
        final_payment_amount,
        period_tax_amount,
        total_period_payment,
        message,
    })
}

/// Run the calculator and wrap the result with methodology and warnings.
pub fn calculate_loan(
    terms: &LoanTerms,
    frequency: &Frequency,
) -> LoanResult<ComputationOutput<CalculationResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    frequency.validate()?;

    if terms.financed_amount() < Decimal::ZERO {
        warnings.push(format!(
            "Cash down exceeds purchase price; financed amount is {}",
            terms.financed_amount()
        ));
    }
    if !terms.extra_payment_enabled && terms.extra_payment > Decimal::ZERO {
        warnings.push(
            "Extra payment is configured but disabled; it is included in \
             final_payment_amount only"
                .into(),
        );
    }

    let result = calculate(terms, frequency)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Annuity-due level payment",
        &serde_json::json!({
            "frequency": frequency.frequency_type,
            "payments_per_year": frequency.payments_per_year,
            "term_years": terms.term_years.to_string(),
            "annual_interest_rate_pct": terms.annual_interest_rate.to_string(),
            "correction_rate": terms.correction_rate.to_string(),
            "payment_timing": "start of period",
        }),
        warnings,
        elapsed,
        result,
    ))
}

/// Calculate from a stored loan and persist the outputs onto a copy of it.
pub fn recalculate_loan(
    loan: &LoanState,
    frequency: &Frequency,
) -> LoanResult<ComputationOutput<LoanState>> {
    let start = Instant::now();
    frequency.validate()?;

    let result = calculate(&loan.terms(), frequency)?;
    let mut updated = loan.clone();
    updated.apply_calculation(&result, frequency);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Annuity-due level payment persisted onto loan",
        &serde_json::json!({
            "frequency": frequency.frequency_type,
            "message": result.message,
        }),
        Vec::new(),
        elapsed,
        updated,
    ))
}
