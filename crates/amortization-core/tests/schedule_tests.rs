use amortization_core::frequency::FrequencyCatalog;
use amortization_core::loans::calculator::{self, calculate};
use amortization_core::loans::schedule::{self, run_schedule, OVERRUN_PERIODS};
use amortization_core::loans::terms::{LoanState, LoanTerms};
use amortization_core::time_value::annuity_due_present_value;
use amortization_core::LoanError;
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
}

fn terms(
    price: Decimal,
    down: Decimal,
    frequency_id: u32,
    years: Decimal,
    rate: Decimal,
) -> LoanTerms {
    LoanTerms {
        purchase_price: price,
        cash_down: down,
        frequency_id,
        term_years: years,
        annual_interest_rate: rate,
        correction_rate: Decimal::ZERO,
        extra_payment: Decimal::ZERO,
        extra_payment_enabled: false,
        annual_tax_amount: Decimal::ZERO,
    }
}

/// Calculate, persist onto a loan, and return it ready for generation.
fn calculated_loan(t: &LoanTerms) -> LoanState {
    let catalog = FrequencyCatalog::standard();
    let frequency = catalog.get(t.frequency_id).unwrap();
    let mut loan = LoanState {
        payment_date: Some(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()),
        purchase_price: Some(t.purchase_price),
        cash_down: Some(t.cash_down),
        frequency_id: Some(t.frequency_id),
        number_years: Some(t.term_years),
        interest_rate: Some(t.annual_interest_rate),
        correction_rate: Some(t.correction_rate),
        extra_payment: Some(t.extra_payment),
        extra_payment_enabled: t.extra_payment_enabled,
        ..Default::default()
    };
    let result = calculate(&loan.terms(), frequency).unwrap();
    loan.apply_calculation(&result, frequency);
    loan
}

// ===========================================================================
// Calculator properties
// ===========================================================================

#[test]
fn test_zero_rate_payment_is_even_split() {
    let catalog = FrequencyCatalog::standard();
    for (financed, frequency_id, years) in [
        (dec!(1200), 4, dec!(1)),
        (dec!(50000), 2, dec!(5)),
        (dec!(999.99), 7, dec!(3)),
        (dec!(180000), 1, dec!(15)),
    ] {
        let frequency = catalog.get(frequency_id).unwrap();
        let t = terms(financed, Decimal::ZERO, frequency_id, years, Decimal::ZERO);
        let result = calculate(&t, frequency).unwrap();
        let expected = (financed / Decimal::from(result.number_of_payments)).round_dp(4);
        assert_eq!(result.payment_amount, expected, "financed {financed}");
    }
}

#[test]
fn test_payment_re_amortises_to_financed_amount() {
    let catalog = FrequencyCatalog::standard();
    for (rate, frequency_id, years) in [
        (dec!(3.25), 4, dec!(15)),
        (dec!(7.9), 2, dec!(4)),
        (dec!(12), 5, dec!(10)),
        (dec!(0.5), 1, dec!(2)),
    ] {
        let frequency = catalog.get(frequency_id).unwrap();
        let t = terms(dec!(250000), dec!(50000), frequency_id, years, rate);
        let result = calculate(&t, frequency).unwrap();
        let pv = annuity_due_present_value(
            result.payment_amount,
            result.final_interest_rate,
            result.number_of_payments,
        )
        .unwrap();
        assert!(
            (pv - result.financed_amount).abs() < dec!(0.5),
            "rate {rate}: pv {pv} vs {}",
            result.financed_amount
        );
    }
}

#[test]
fn test_frequency_lookup_failure_is_reported() {
    let catalog = FrequencyCatalog::standard();
    assert!(matches!(catalog.get(42), Err(LoanError::FrequencyNotFound(42))));
}

// ===========================================================================
// Concrete scenarios
// ===========================================================================

#[test]
fn test_thirty_year_mortgage_schedule() {
    let t = terms(dec!(200000), dec!(20000), 4, dec!(30), dec!(6));
    let mut loan = calculated_loan(&t);
    assert_eq!(loan.financed_amount, Some(dec!(180000)));
    assert_eq!(loan.number_of_payments, Some(360));
    assert_eq!(loan.period_interest_rate, Some(dec!(0.005)));
    assert_eq!(loan.payment_amount, Some(dec!(1073.8218)));

    let catalog = FrequencyCatalog::standard();
    let monthly = catalog.get(4).unwrap();
    let entries = schedule::generate_schedule_as_of(1, &mut loan, monthly, as_of()).unwrap();

    // Interest accrues on the opening balance while the payment is sized for
    // payment-in-advance, so the balance is still positive at the overrun limit.
    assert_eq!(entries.len(), 1 + 360 + OVERRUN_PERIODS as usize);
    assert_eq!(entries[0].ending_balance, dec!(180000));
    assert_eq!(entries[1].interest, Some(dec!(900)));
    assert_eq!(entries[1].principal, Some(dec!(173.8218)));
    assert_eq!(loan.new_number_of_payments, Some(364));
    assert!(loan.total_interest.unwrap() > dec!(200000));
}

#[test]
fn test_zero_rate_amortises_in_ceiling_periods() {
    let t = terms(dec!(1000), Decimal::ZERO, 4, dec!(1), Decimal::ZERO);
    let loan = calculated_loan(&t);
    let payment = loan.payment_amount.unwrap();
    assert_eq!(payment, dec!(83.3333));

    let catalog = FrequencyCatalog::standard();
    let run = run_schedule(1, &loan, catalog.get(4).unwrap()).unwrap();
    for entry in &run.entries[1..] {
        assert_eq!(entry.interest, Some(Decimal::ZERO));
        assert_eq!(entry.principal, Some(payment));
    }

    let paid_off_at = run.entries[1..]
        .iter()
        .find(|e| e.ending_balance <= Decimal::ZERO)
        .map(|e| e.payment_number)
        .unwrap();
    let expected = (dec!(1000) / payment).ceil();
    assert_eq!(Decimal::from(paid_off_at), expected);
    assert_eq!(paid_off_at, 13);
}

#[test]
fn test_extra_payment_overshoot_terminates_next_period() {
    let loan = LoanState {
        payment_date: NaiveDate::from_ymd_opt(2025, 1, 1),
        financed_amount: Some(dec!(1000)),
        payment_amount: Some(dec!(300)),
        number_of_payments: Some(4),
        final_interest_rate: Some(Decimal::ZERO),
        extra_payment: Some(dec!(250)),
        extra_payment_enabled: true,
        ..Default::default()
    };
    let catalog = FrequencyCatalog::standard();
    let run = run_schedule(1, &loan, catalog.get(4).unwrap()).unwrap();

    // 1000 -> 450 -> -100 (after extra) -> negative start, emitted, stop
    assert!(run.terminated);
    assert_eq!(run.entries.len(), 4);
    assert_eq!(run.entries[2].ending_balance_extra, Some(dec!(-100)));
    assert_eq!(run.entries[3].starting_balance, Some(dec!(-100)));
}

// ===========================================================================
// Schedule invariants
// ===========================================================================

#[test]
fn test_schedule_never_exceeds_overrun_limit() {
    for (rate, years) in [
        (dec!(0), dec!(2)),
        (dec!(4.5), dec!(10)),
        (dec!(18), dec!(3)),
        (dec!(40), dec!(1)),
    ] {
        let loan = calculated_loan(&terms(dec!(30000), dec!(5000), 4, years, rate));
        let catalog = FrequencyCatalog::standard();
        let run = run_schedule(1, &loan, catalog.get(4).unwrap()).unwrap();
        let limit = loan.number_of_payments.unwrap() + OVERRUN_PERIODS;
        assert!(run.entries.len() - 1 <= limit as usize, "rate {rate}");
    }
}

#[test]
fn test_exactly_one_entry_after_negative_start() {
    let loan = LoanState {
        payment_date: NaiveDate::from_ymd_opt(2025, 1, 1),
        financed_amount: Some(dec!(500)),
        payment_amount: Some(dec!(120)),
        number_of_payments: Some(10),
        final_interest_rate: Some(dec!(0.01)),
        ..Default::default()
    };
    let catalog = FrequencyCatalog::standard();
    let run = run_schedule(1, &loan, catalog.get(4).unwrap()).unwrap();
    assert!(run.terminated);

    let first_negative = run
        .entries
        .iter()
        .position(|e| e.starting_balance.is_some_and(|b| b < Decimal::ZERO))
        .unwrap();
    assert_eq!(first_negative, run.entries.len() - 1);
}

#[test]
fn test_generated_values_are_non_negative() {
    let mut t = terms(dec!(40000), dec!(0), 2, dec!(3), dec!(8));
    t.extra_payment = dec!(400);
    t.extra_payment_enabled = true;
    let mut loan = calculated_loan(&t);
    let catalog = FrequencyCatalog::standard();
    let biweekly = catalog.get(2).unwrap();
    let entries = schedule::generate_schedule_as_of(9, &mut loan, biweekly, as_of()).unwrap();
    assert!(!entries.is_empty());

    for e in &entries {
        assert!(e.ending_balance >= Decimal::ZERO);
        for v in [e.principal, e.interest, e.starting_balance, e.ending_balance_extra]
            .into_iter()
            .flatten()
        {
            assert!(v >= Decimal::ZERO, "row {}: {v}", e.payment_number);
        }
    }
}

#[test]
fn test_full_pipeline_envelopes() {
    let catalog = FrequencyCatalog::standard();
    let monthly = catalog.get(4).unwrap();
    let loan = LoanState {
        payment_date: NaiveDate::from_ymd_opt(2025, 2, 1),
        purchase_price: Some(dec!(25000)),
        cash_down: Some(dec!(5000)),
        frequency_id: Some(4),
        number_years: Some(dec!(2)),
        interest_rate: Some(dec!(9)),
        signed_maturity_date: NaiveDate::from_ymd_opt(2027, 2, 1),
        ..Default::default()
    };

    let recalculated = calculator::recalculate_loan(&loan, monthly).unwrap().result;
    let out = schedule::build_schedule(11, &recalculated, monthly, as_of()).unwrap();
    let summary = out.result.summary.clone().unwrap();

    assert_eq!(out.result.schedule_count, out.result.entries.len());
    assert_eq!(summary.actual_payment_count as usize, out.result.entries.len() - 1);
    assert_eq!(out.result.loan.total_interest, Some(summary.total_interest));
    assert_eq!(out.result.loan.signed_term_remaining, Some(dec!(2)));
    assert!(out.result.entries.iter().all(|e| e.loan_id == 11));
}
