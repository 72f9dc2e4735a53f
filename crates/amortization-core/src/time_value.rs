use rust_decimal::Decimal;

use crate::error::LoanError;
use crate::types::{Money, Rate};
use crate::LoanResult;

/// Iterative compound: (1 + r)^n using multiplication to avoid powd drift.
pub fn compound(rate: Rate, nper: u32) -> LoanResult<Decimal> {
    let factor = Decimal::ONE + rate;
    let mut result = Decimal::ONE;
    for _ in 0..nper {
        result = result.checked_mul(factor).ok_or_else(|| LoanError::Overflow {
            context: format!("(1 + {rate})^{nper}"),
        })?;
    }
    Ok(result)
}

/// Level payment for an annuity-due (payment at the start of each period).
///
/// `pv * r * (1+r)^n / (((1+r)^n - 1) * (1+r))`, or `pv / n` when `r == 0`.
/// The result is unrounded; callers round to their storage precision.
pub fn annuity_due_payment(present_value: Money, rate: Rate, nper: u32) -> LoanResult<Money> {
    if nper == 0 {
        return Err(LoanError::DivisionByZero {
            context: "payment amount with zero payments".into(),
        });
    }

    if rate.is_zero() {
        return Ok(present_value / Decimal::from(nper));
    }

    let factor = compound(rate, nper)?;
    let numerator = present_value
        .checked_mul(rate)
        .and_then(|v| v.checked_mul(factor))
        .ok_or_else(|| LoanError::Overflow {
            context: "annuity-due payment numerator".into(),
        })?;
    let denominator = (factor - Decimal::ONE)
        .checked_mul(Decimal::ONE + rate)
        .ok_or_else(|| LoanError::Overflow {
            context: "annuity-due payment denominator".into(),
        })?;

    if denominator.is_zero() {
        return Err(LoanError::DivisionByZero {
            context: "annuity-due payment denominator".into(),
        });
    }

    numerator
        .checked_div(denominator)
        .ok_or_else(|| LoanError::Overflow {
            context: "annuity-due payment".into(),
        })
}

/// Present value of `nper` level payments made at the start of each period.
pub fn annuity_due_present_value(payment: Money, rate: Rate, nper: u32) -> LoanResult<Money> {
    if rate.is_zero() {
        return Ok(payment * Decimal::from(nper));
    }

    let factor = compound(rate, nper)?;
    let denominator = rate.checked_mul(factor).ok_or_else(|| LoanError::Overflow {
        context: "annuity-due present value".into(),
    })?;
    if denominator.is_zero() {
        return Err(LoanError::DivisionByZero {
            context: "annuity-due present value".into(),
        });
    }

    Ok(payment * (factor - Decimal::ONE) * (Decimal::ONE + rate) / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_compound_basic() {
        assert_eq!(compound(dec!(0.1), 2).unwrap(), dec!(1.21));
        assert_eq!(compound(dec!(0.05), 0).unwrap(), Decimal::ONE);
    }

    #[test]
    fn test_compound_overflow_is_an_error() {
        assert!(matches!(
            compound(dec!(100), 100),
            Err(LoanError::Overflow { .. })
        ));
    }

    #[test]
    fn test_annuity_due_payment_known_answer() {
        // 10,000 over 12 periods at 1%: ordinary PMT 888.4879 / 1.01 = 879.6910
        let pmt = annuity_due_payment(dec!(10000), dec!(0.01), 12).unwrap();
        assert!((pmt - dec!(879.6910)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_annuity_due_payment_zero_rate() {
        let pmt = annuity_due_payment(dec!(1200), Decimal::ZERO, 12).unwrap();
        assert_eq!(pmt, dec!(100));
    }

    #[test]
    fn test_annuity_due_payment_zero_periods() {
        assert!(matches!(
            annuity_due_payment(dec!(1200), dec!(0.01), 0),
            Err(LoanError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn test_present_value_inverts_payment() {
        let pmt = annuity_due_payment(dec!(250000), dec!(0.004), 240).unwrap();
        let pv = annuity_due_present_value(pmt, dec!(0.004), 240).unwrap();
        assert!((pv - dec!(250000)).abs() < dec!(0.000001));
    }
}
