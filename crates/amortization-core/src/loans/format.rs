use rust_decimal::{Decimal, RoundingStrategy};

/// Render an amount with thousands separators and two decimals
/// (`1234567.891` -> `1,234,567.89`). Midpoints round away from zero.
pub fn format_amount(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.2}", rounded.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-{grouped}.{fraction}")
    } else {
        format!("{grouped}.{fraction}")
    }
}

/// `format_amount` with a leading dollar sign.
pub fn format_currency(value: Decimal) -> String {
    format!("${}", format_amount(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_grouping() {
        assert_eq!(format_amount(dec!(0)), "0.00");
        assert_eq!(format_amount(dec!(999.5)), "999.50");
        assert_eq!(format_amount(dec!(1000)), "1,000.00");
        assert_eq!(format_amount(dec!(1234567.891)), "1,234,567.89");
    }

    #[test]
    fn test_midpoint_rounds_away_from_zero() {
        assert_eq!(format_amount(dec!(2.345)), "2.35");
        assert_eq!(format_amount(dec!(-2.345)), "-2.35");
    }

    #[test]
    fn test_currency_prefix() {
        assert_eq!(format_currency(dec!(1073.8218)), "$1,073.82");
        assert_eq!(format_currency(dec!(-0.001)), "$0.00");
    }
}
