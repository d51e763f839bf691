//! Monetary rounding helpers shared by the fee engine, the P/L calculator
//! and the normalizer. Amounts are plain `f64` in whole currency units (IDR).

/// Round to the nearest whole currency unit, half away from zero.
/// Fees flowing into storage carry no fractional subunits.
#[inline]
pub fn round_currency(x: f64) -> f64 {
    x.round()
}

/// Round to 2 decimal places, half away from zero. Used for profit/loss only.
#[inline]
pub fn round_decimal(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Render an amount as `Rp 1.234.567` (dot thousands separator, no fraction).
/// Display only; never used for stored values.
pub fn format_idr(amount: f64) -> String {
    let rounded = round_currency(amount);
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    if rounded < 0.0 {
        format!("-Rp {grouped}")
    } else {
        format!("Rp {grouped}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_currency_half_away_from_zero() {
        assert_eq!(round_currency(885.72), 886.0);
        assert_eq!(round_currency(885.5), 886.0);
        assert_eq!(round_currency(-885.5), -886.0);
        assert_eq!(round_currency(885.49), 885.0);
    }

    #[test]
    fn test_round_decimal() {
        assert_eq!(round_decimal(19114.0), 19114.0);
        assert_eq!(round_decimal(1.005_1), 1.01);
        assert_eq!(round_decimal(-12.345_6), -12.35);
    }

    #[test]
    fn test_format_idr() {
        assert_eq!(format_idr(0.0), "Rp 0");
        assert_eq!(format_idr(886.0), "Rp 886");
        assert_eq!(format_idr(19114.0), "Rp 19.114");
        assert_eq!(format_idr(1_234_567.4), "Rp 1.234.567");
        assert_eq!(format_idr(-1_500_000.0), "-Rp 1.500.000");
    }
}
