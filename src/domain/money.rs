use rust_decimal::{Decimal, RoundingStrategy};

/// Round to two decimal places, half away from zero.
/// Statutory amounts are rounded at every stage (ITC, then interest, then
/// totals), so the same rounding must be applied consistently everywhere.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Format an amount with exactly two decimal places.
/// Example: 15254.2 -> "15254.20"
pub fn format_amount(value: Decimal) -> String {
    format!("{:.2}", value)
}

/// Parse a spreadsheet amount permissively: strip everything that is not a
/// digit, decimal point or minus sign (currency symbols, thousands
/// separators), then parse. Returns zero when nothing parseable remains.
pub fn parse_amount(input: &str) -> Decimal {
    let cleaned: String = input
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        return Decimal::ZERO;
    }
    cleaned.parse().unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_round2_half_away_from_zero() {
        assert_eq!(round2(dec!(1.005)), dec!(1.01));
        assert_eq!(round2(dec!(1.004)), dec!(1.00));
        assert_eq!(round2(dec!(-1.005)), dec!(-1.01));
        assert_eq!(round2(dec!(15254.2372881355)), dec!(15254.24));
        assert_eq!(round2(dec!(100)), dec!(100));
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(dec!(15254.24)), "15254.24");
        assert_eq!(format_amount(dec!(15254.2)), "15254.20");
        assert_eq!(format_amount(dec!(0)), "0.00");
        assert_eq!(format_amount(dec!(-12.345)), "-12.35");
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1234.56"), dec!(1234.56));
        assert_eq!(parse_amount("1,00,000.00"), dec!(100000.00));
        assert_eq!(parse_amount("₹ 500 Dr"), dec!(500));
        assert_eq!(parse_amount("-250.75"), dec!(-250.75));
    }

    #[test]
    fn test_parse_amount_unparseable_defaults_to_zero() {
        assert_eq!(parse_amount(""), Decimal::ZERO);
        assert_eq!(parse_amount("N/A"), Decimal::ZERO);
        assert_eq!(parse_amount("1.2.3"), Decimal::ZERO);
        assert_eq!(parse_amount("--"), Decimal::ZERO);
    }
}
