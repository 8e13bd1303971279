// src/extractors/amount.rs
//! Hungarian number formatting: `.` groups thousands, `,` marks decimals.

use once_cell::sync::Lazy;
use regex::Regex;

const EMPTY_PLACEHOLDER: &str = "—";

static NUMERIC_PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)").expect("Failed to compile NUMERIC_PREFIX_RE")
});

/// Parses a statement cell. Anything that is not a number counts as zero.
pub fn parse_amount(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == EMPTY_PLACEHOLDER {
        return 0.0;
    }

    let cleaned: String = trimmed
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '.')
        .collect();
    let cleaned = cleaned.replacen(',', ".", 1);

    NUMERIC_PREFIX_RE
        .find(&cleaned)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Renders an amount in the portal's convention, e.g. `-1234.5` as `-1.234,5`.
pub fn format_amount(value: f64) -> String {
    let raw = value.abs().to_string();
    let (int_part, frac_part) = match raw.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (raw.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let mut out = String::new();
    if value < 0.0 {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push(',');
        out.push_str(frac);
    }
    out
}
