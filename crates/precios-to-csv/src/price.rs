use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

static AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9](?:[0-9]|[.,'\u{2019}][0-9])*").expect("hardcoded amount regex is valid")
});

/// Parse a price cell into its magnitude.
///
/// Handles formats like:
/// - "$1,234.50" -> 1234.50
/// - "RD$ 85.00" -> 85.00
/// - "1.234,50" -> 1234.50
/// - "-12.5" -> 12.5 (sign markers are ignored)
///
/// Cells without digits, placeholders and zero amounts return `None`.
#[must_use]
pub fn parse_price(raw: &str) -> Option<Decimal> {
    let token = AMOUNT_RE.find(raw)?.as_str();
    let digits = token
        .chars()
        .filter(|ch| !matches!(ch, '\'' | '\u{2019}'))
        .collect::<String>();

    let normalized = normalize_separators(&digits);
    let amount = Decimal::from_str(&normalized).ok()?;
    if amount.is_zero() {
        return None;
    }
    Some(amount)
}

fn normalize_separators(digits: &str) -> String {
    let last_dot = digits.rfind('.');
    let last_comma = digits.rfind(',');

    let decimal_separator = match (last_dot, last_comma) {
        (Some(dot), Some(comma)) => Some(if dot > comma { '.' } else { ',' }),
        (Some(_), None) => single_kind_decimal(digits, '.'),
        (None, Some(_)) => single_kind_decimal(digits, ','),
        (None, None) => None,
    };

    let mut out = String::with_capacity(digits.len());
    let decimal_index = decimal_separator.and_then(|separator| digits.rfind(separator));
    for (index, ch) in digits.char_indices() {
        match ch {
            '.' | ',' if Some(index) == decimal_index => out.push('.'),
            '.' | ',' => {}
            _ => out.push(ch),
        }
    }
    out
}

fn single_kind_decimal(digits: &str, separator: char) -> Option<char> {
    if digits.matches(separator).count() > 1 {
        return None;
    }

    let fraction_len = digits
        .rsplit(separator)
        .next()
        .map_or(0, |fraction| fraction.len());
    if separator == ',' && fraction_len == 3 {
        None
    } else {
        Some(separator)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::parse_price;

    #[test]
    fn parses_dollar_amount_with_thousands() {
        assert_eq!(parse_price("$1,234.50"), Some(dec!(1234.50)));
    }

    #[test]
    fn parses_local_currency_prefix() {
        assert_eq!(parse_price("RD$ 85.00"), Some(dec!(85.00)));
        assert_eq!(parse_price("RD$85"), Some(dec!(85)));
    }

    #[test]
    fn parses_european_separators() {
        assert_eq!(parse_price("1.234,50"), Some(dec!(1234.50)));
        assert_eq!(parse_price("12,5"), Some(dec!(12.5)));
    }

    #[test]
    fn treats_repeated_separator_as_thousands() {
        assert_eq!(parse_price("1,234,567"), Some(dec!(1234567)));
        assert_eq!(parse_price("1,234"), Some(dec!(1234)));
    }

    #[test]
    fn drops_sign_markers() {
        assert_eq!(parse_price("-12.50"), Some(dec!(12.50)));
        assert_eq!(parse_price("(45.00)"), Some(dec!(45.00)));
    }

    #[test]
    fn whitespace_trimming() {
        assert_eq!(parse_price("  68  "), Some(dec!(68)));
    }

    #[test]
    fn returns_none_without_digits() {
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("--"), None);
        assert_eq!(parse_price("N/D"), None);
        assert_eq!(parse_price("RD$"), None);
    }

    #[test]
    fn zero_is_not_a_price() {
        assert_eq!(parse_price("0.00"), None);
        assert_eq!(parse_price("$0"), None);
    }
}
