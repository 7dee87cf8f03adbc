// src/heuristics/numeric.rs

use super::cascade::compile;
use once_cell::sync::Lazy;
use regex::Regex;
use std::num::IntErrorKind;

/// `25.000,50`: dotted thousands groups followed by a decimal comma.
static EUROPEAN: Lazy<Option<Regex>> =
    Lazy::new(|| compile(r"^[0-9]{1,3}(?:\.[0-9]{3})+,[0-9]+$"));

/// Separator-only thousands grouping with no decimal part (`1,140`, `1.140`).
static GROUPED_INTEGER: Lazy<Option<Regex>> =
    Lazy::new(|| compile(r"^[0-9]{1,3}(?:[.,][0-9]{3})+$"));

fn matches(re: &Lazy<Option<Regex>>, s: &str) -> bool {
    re.as_ref().is_some_and(|re| re.is_match(s))
}

/// Parse a number written in either `25,000.50` or `25.000,50` convention.
///
/// Whitespace is stripped first. Anything that does not parse, and any
/// negative or non-finite value, yields `0.0`.
pub fn parse_numeric(raw: &str) -> f64 {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();

    let normalized = if matches(&EUROPEAN, &compact) {
        compact.replace('.', "").replace(',', ".")
    } else {
        compact.replace(',', "")
    };

    match normalized.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => v,
        _ => 0.0,
    }
}

/// Parse a package/piece count. Grouping separators in either convention
/// are thousands separators here, since counts are whole numbers.
pub fn parse_count(raw: &str) -> u32 {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();

    if matches(&GROUPED_INTEGER, &compact) {
        let digits: String = compact.chars().filter(|c| c.is_ascii_digit()).collect();
        return match digits.parse::<u32>() {
            Ok(n) => n,
            Err(e) if *e.kind() == IntErrorKind::PosOverflow => u32::MAX,
            Err(_) => 0,
        };
    }

    // `as` saturates: huge values clamp to u32::MAX, NaN to 0.
    parse_numeric(&compact).trunc() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_conventions_agree() {
        assert_eq!(parse_numeric("25,000.50"), 25000.50);
        assert_eq!(parse_numeric("25.000,50"), 25000.50);
        assert_eq!(parse_numeric("1.234.567,8"), 1234567.8);
        assert_eq!(parse_numeric("1,234,567.8"), 1234567.8);
    }

    #[test]
    fn plain_integers_and_decimals() {
        assert_eq!(parse_numeric("57000"), 57000.0);
        assert_eq!(parse_numeric("12.5"), 12.5);
    }

    #[test]
    fn whitespace_inside_numeral_is_stripped() {
        assert_eq!(parse_numeric("25 000.50"), 25000.50);
        assert_eq!(parse_numeric(" 25.000,50 "), 25000.50);
        assert_eq!(parse_numeric("57 000"), 57000.0);
    }

    #[test]
    fn bare_comma_is_a_thousands_separator() {
        // No dotted groups, so the standard convention applies.
        assert_eq!(parse_numeric("25,50"), 2550.0);
    }

    #[test]
    fn garbage_is_zero() {
        assert_eq!(parse_numeric("not a number"), 0.0);
        assert_eq!(parse_numeric(""), 0.0);
        assert_eq!(parse_numeric("NaN"), 0.0);
        assert_eq!(parse_numeric("inf"), 0.0);
        assert_eq!(parse_numeric("-12"), 0.0);
    }

    #[test]
    fn counts() {
        assert_eq!(parse_count("1140"), 1140);
        assert_eq!(parse_count("1,140"), 1140);
        assert_eq!(parse_count("1.140"), 1140);
        assert_eq!(parse_count("1 140"), 1140);
        assert_eq!(parse_count("12.7"), 12);
        assert_eq!(parse_count("abc"), 0);
        assert_eq!(parse_count("99999999999"), u32::MAX);
        assert_eq!(parse_count("99,999,999,999"), u32::MAX);
    }

    #[test]
    fn non_ascii_digits_are_not_numbers() {
        assert_eq!(parse_count("１,１４０"), 0);
        assert_eq!(parse_count("١,١٤٠"), 0);
        assert_eq!(parse_numeric("２５.０００,５０"), 0.0);
    }
}
