use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::frequency::Frequency;
use crate::loans::calculator::CalculationResult;
use crate::types::{Money, Rate, Years};

/// Inputs to the payment calculator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanTerms {
    pub purchase_price: Money,
    pub cash_down: Money,
    /// Reference into the frequency catalog; resolved by the caller.
    pub frequency_id: u32,
    pub term_years: Years,
    /// Nominal annual rate as a percentage (6 = 6%).
    pub annual_interest_rate: Rate,
    /// Added directly to the per-period rate.
    #[serde(default)]
    pub correction_rate: Rate,
    #[serde(default)]
    pub extra_payment: Money,
    #[serde(default)]
    pub extra_payment_enabled: bool,
    #[serde(default)]
    pub annual_tax_amount: Money,
}

impl LoanTerms {
    pub fn financed_amount(&self) -> Money {
        self.purchase_price - self.cash_down
    }
}

/// A stored loan: the terms as entered, the calculator outputs persisted
/// onto it, and the totals written back by schedule generation.
///
/// Every derived field is optional because a freshly entered loan has not
/// been through the calculator yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoanState {
    pub payment_date: Option<NaiveDate>,
    pub purchase_price: Option<Money>,
    pub cash_down: Option<Money>,
    pub financed_amount: Option<Money>,
    pub frequency_id: Option<u32>,
    pub number_years: Option<Years>,
    /// Annual rate as a percentage, snapshotted onto every schedule row.
    pub interest_rate: Option<Rate>,
    pub correction_rate: Option<Rate>,
    pub period_interest_rate: Option<Rate>,
    pub final_interest_rate: Option<Rate>,
    pub signed_term_years: Option<Years>,
    pub signed_maturity_date: Option<NaiveDate>,
    pub signed_term_number_of_payments: Option<u32>,
    pub signed_term_remaining: Option<Years>,
    pub extra_payment_enabled: bool,
    pub extra_payment: Option<Money>,
    pub number_of_payments: Option<u32>,
    pub payment_amount: Option<Money>,
    pub final_payment_amount: Option<Money>,
    pub annual_tax_amount: Option<Money>,
    pub period_tax_amount: Option<Money>,
    pub new_term_length: Option<Years>,
    pub new_number_of_payments: Option<u32>,
    pub total_interest: Option<Money>,
    pub total_principal: Option<Money>,
    pub total_extra_payment: Option<Money>,
}

impl LoanState {
    /// Calculator inputs from the stored fields; absent numbers count as zero.
    pub fn terms(&self) -> LoanTerms {
        LoanTerms {
            purchase_price: self.purchase_price.unwrap_or_default(),
            cash_down: self.cash_down.unwrap_or_default(),
            frequency_id: self.frequency_id.unwrap_or_default(),
            term_years: self.number_years.unwrap_or_default(),
            annual_interest_rate: self.interest_rate.unwrap_or_default(),
            correction_rate: self.correction_rate.unwrap_or_default(),
            extra_payment: self.extra_payment.unwrap_or_default(),
            extra_payment_enabled: self.extra_payment_enabled,
            annual_tax_amount: self.annual_tax_amount.unwrap_or_default(),
        }
    }

    /// Persist calculator outputs onto the loan so the schedule generator's
    /// prerequisites are in place.
    pub fn apply_calculation(&mut self, result: &CalculationResult, frequency: &Frequency) {
        let payments_per_year = Decimal::from(frequency.payments_per_year);

        self.financed_amount = Some(result.financed_amount);
        self.number_of_payments = Some(result.number_of_payments);
        self.period_interest_rate = Some(result.period_interest_rate);
        self.final_interest_rate = Some(result.final_interest_rate);
        self.payment_amount = Some(result.payment_amount);
        self.final_payment_amount = Some(result.final_payment_amount);

        self.period_tax_amount = match self.annual_tax_amount {
            Some(tax) if tax > Decimal::ZERO && !payments_per_year.is_zero() => {
                Some(tax / payments_per_year)
            }
            other => other,
        };

        self.signed_term_number_of_payments = Some(
            self.signed_term_years
                .and_then(|years| (years * payments_per_year).trunc().to_u32())
                .unwrap_or(0),
        );
    }
}
