//! Locale-sensitive amount cleaning.
//!
//! Hungarian bills mix dot-grouped integers (`6.364` = 6364 Ft) with genuine
//! decimals (`123.45`), and use both space grouping (`175 945`) and the
//! decimal comma (`123,45`). The exact-3-digit suffix check below is the
//! disambiguator between grouping dots and decimal dots; changing it causes
//! off-by-1000 errors.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

lazy_static! {
    /// Short digit run with no separator at all.
    static ref SHORT_INT: Regex = Regex::new(r"^\d{1,4}$").unwrap();

    /// Dot-grouped thousands with no further suffix (Hungarian convention).
    static ref DOT_THOUSANDS: Regex = Regex::new(r"^\d{1,3}(?:\.\d{3})+$").unwrap();

    /// Space-grouped thousands, optionally with a decimal tail.
    static ref SPACE_GROUPED: Regex =
        Regex::new(r"^\d{1,3}(?:[\s\u{00a0}]\d{3})+(?:[.,]\d+)?$").unwrap();

    /// Trailing decimal comma with 1-2 digits.
    static ref TRAILING_DECIMAL_COMMA: Regex = Regex::new(r",(\d{1,2})$").unwrap();
}

/// Clean a raw captured amount string into a decimal value.
///
/// Never fails: unparseable input yields zero so a bad capture degrades to a
/// missing field instead of aborting the extraction.
pub fn clean_amount(raw: &str) -> Decimal {
    // Keep only digits, separators, and whitespace.
    let stripped: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',' || c.is_whitespace())
        .collect();
    let mut s = stripped.trim().to_string();

    if SHORT_INT.is_match(&s) {
        return Decimal::from_str(&s).unwrap_or(Decimal::ZERO);
    }

    if DOT_THOUSANDS.is_match(&s) {
        // 6.364 means 6364, not six-point-three-six-four.
        s = s.replace('.', "");
    } else if SPACE_GROUPED.is_match(&s) {
        s.retain(|c| !c.is_whitespace());
    }

    match TRAILING_DECIMAL_COMMA.find(&s).map(|m| m.start()) {
        Some(tail_start) => {
            // Comma-last means decimal comma; any earlier separator is grouping.
            let head: String = s[..tail_start]
                .chars()
                .filter(|c| c.is_ascii_digit())
                .collect();
            let tail = s[tail_start + 1..].to_string();
            s = format!("{head}.{tail}");
        }
        // A comma that is not a decimal tail is a stray thousands separator.
        None => s = s.replace(',', ""),
    }

    Decimal::from_str(&s).unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn dot_grouped_hungarian_integer() {
        assert_eq!(clean_amount("6.364"), dec("6364"));
        assert_eq!(clean_amount("1.234.567"), dec("1234567"));
    }

    #[test]
    fn space_grouped_thousands() {
        assert_eq!(clean_amount("175 945"), dec("175945"));
        assert_eq!(clean_amount("6\u{00a0}364 Ft"), dec("6364"));
    }

    #[test]
    fn decimal_comma() {
        assert_eq!(clean_amount("123,45"), dec("123.45"));
        assert_eq!(clean_amount("1.234,56"), dec("1234.56"));
        assert_eq!(clean_amount("1 234,5"), dec("1234.5"));
    }

    #[test]
    fn short_run_parses_directly() {
        assert_eq!(clean_amount("42"), dec("42"));
        assert_eq!(clean_amount("9990 Ft"), dec("9990"));
    }

    #[test]
    fn genuine_decimal_dot_untouched() {
        assert_eq!(clean_amount("123.45"), dec("123.45"));
    }

    #[test]
    fn garbage_yields_zero() {
        assert_eq!(clean_amount("n/a"), Decimal::ZERO);
        assert_eq!(clean_amount(""), Decimal::ZERO);
        assert_eq!(clean_amount("12 34"), Decimal::ZERO);
    }

    #[test]
    fn idempotent_on_well_formed_input() {
        for raw in ["6.364", "175 945", "123,45", "42", "123.45"] {
            let once = clean_amount(raw);
            let twice = clean_amount(&once.to_string());
            assert_eq!(once, twice, "not idempotent for {raw}");
        }
    }
}
