//! Currency amount parsing/formatting and charge description cleanup.
//!
//! OCR output is noisy: amounts arrive as `$1,234.56`, `1234.56`, or garbage,
//! and descriptions carry stray punctuation. Everything here is lenient and
//! never fails.

use once_cell::sync::Lazy;
use regex::Regex;

static NUMERIC_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)").expect("numeric prefix regex is valid"));

/// Parse a currency-like string into dollars.
///
/// Strips `$` and thousands separators, then reads the leading decimal
/// number. Returns `0.0` when nothing numeric is found; callers treat zero as
/// "no amount".
///
/// ```
/// use billbot_core::parse_amount;
/// assert_eq!(parse_amount("$1,234.56"), 1234.56);
/// assert_eq!(parse_amount("not a number"), 0.0);
/// ```
pub fn parse_amount(raw: &str) -> f64 {
    let stripped: String = raw.chars().filter(|&c| c != '$' && c != ',').collect();
    NUMERIC_PREFIX
        .find(stripped.trim())
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Round a dollar amount to the nearest whole dollar, halves away from zero.
///
/// Negative and non-finite inputs round to zero.
pub fn round_whole(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}

/// Format dollars with US thousands separators and at most two fraction
/// digits, dropping trailing zeros: `847` → `847`, `1234.5` → `1,234.5`.
pub fn format_amount(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let cents = (value.abs() * 100.0).round() as u64;
    let (whole, frac) = (cents / 100, cents % 100);

    let mut out = String::new();
    if value < 0.0 && cents > 0 {
        out.push('-');
    }
    out.push_str(&group_thousands(whole));
    if frac > 0 {
        let digits = format!("{frac:02}");
        out.push('.');
        out.push_str(digits.trim_end_matches('0'));
    }
    out
}

/// Format a whole-dollar amount with thousands separators.
pub fn format_whole(value: u64) -> String {
    group_thousands(value)
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Normalise a raw charge description.
///
/// 1. Drop everything except ASCII letters/digits, whitespace, `-` and `/`
/// 2. Collapse whitespace runs to single spaces and trim
/// 3. Title-case each word (`IBUPROFEN 800MG` → `Ibuprofen 800mg`)
///
/// May return an empty string; callers discard those lines.
pub fn clean_description(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || *c == '-' || *c == '/')
        .collect();

    kept.split_whitespace()
        .map(title_case_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case_word(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => {
            let mut out = String::with_capacity(lower.len());
            out.push(first.to_ascii_uppercase());
            out.push_str(chars.as_str());
            out
        }
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dollar_amounts() {
        assert_eq!(parse_amount("$1,234.56"), 1234.56);
        assert_eq!(parse_amount("1234.56"), 1234.56);
        assert_eq!(parse_amount("  $847.00 "), 847.0);
        assert_eq!(parse_amount("1,200"), 1200.0);
        assert_eq!(parse_amount(".50"), 0.5);
        assert_eq!(parse_amount("12."), 12.0);
    }

    #[test]
    fn unparseable_is_zero() {
        assert_eq!(parse_amount("not a number"), 0.0);
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("$"), 0.0);
        assert_eq!(parse_amount("USD 12"), 0.0);
    }

    #[test]
    fn leading_number_wins_over_trailing_junk() {
        assert_eq!(parse_amount("86.00 ea"), 86.0);
    }

    #[test]
    fn round_whole_values() {
        assert_eq!(round_whole(932.5), 933);
        assert_eq!(round_whole(932.49), 932);
        assert_eq!(round_whole(-4.0), 0);
        assert_eq!(round_whole(f64::INFINITY), 0);
    }

    #[test]
    fn formats_amounts() {
        assert_eq!(format_amount(847.0), "847");
        assert_eq!(format_amount(1234.5), "1,234.5");
        assert_eq!(format_amount(1234.56), "1,234.56");
        assert_eq!(format_amount(1_000_000.0), "1,000,000");
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_amount(203.28), "203.28");
        assert_eq!(format_amount(-12.1), "-12.1");
        assert_eq!(format_amount(f64::NAN), "0");
    }

    #[test]
    fn formats_whole_amounts() {
        assert_eq!(format_whole(0), "0");
        assert_eq!(format_whole(999), "999");
        assert_eq!(format_whole(5929), "5,929");
        assert_eq!(format_whole(1234567), "1,234,567");
    }

    #[test]
    fn cleans_descriptions() {
        assert_eq!(clean_description("  FACILITY   FEE "), "Facility Fee");
        assert_eq!(clean_description("IBUPROFEN 800MG"), "Ibuprofen 800mg");
        assert_eq!(clean_description("X-RAY / CHEST"), "X-ray / Chest");
        assert_eq!(clean_description("Lab (CBC) & panel*"), "Lab Cbc Panel");
        assert_eq!(clean_description("***"), "");
    }
}
