//! USD formatting with a fixed `es-US` convention: `$1,234.56`.
//!
//! The output never depends on the host locale.

/// Format an amount as US dollars, rounding half away from zero to cents.
pub fn format_usd(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u128;
    let whole = group_thousands(cents / 100);
    let fraction = cents % 100;

    if amount.is_sign_negative() && cents > 0 {
        format!("-${whole}.{fraction:02}")
    } else {
        format!("${whole}.{fraction:02}")
    }
}

fn group_thousands(value: u128) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_and_round_amounts() {
        assert_eq!(format_usd(0.0), "$0.00");
        assert_eq!(format_usd(250.0), "$250.00");
    }

    #[test]
    fn test_thousands_grouping() {
        assert_eq!(format_usd(1000.0), "$1,000.00");
        assert_eq!(format_usd(1234567.891), "$1,234,567.89");
        assert_eq!(format_usd(999.999), "$1,000.00");
    }

    #[test]
    fn test_rounding_to_cents() {
        assert_eq!(format_usd(10.125), "$10.13");
        assert_eq!(format_usd(0.004), "$0.00");
    }

    #[test]
    fn test_negative_amounts() {
        assert_eq!(format_usd(-1500.5), "-$1,500.50");
        assert_eq!(format_usd(-0.0), "$0.00");
        assert_eq!(format_usd(-0.001), "$0.00");
    }
}
