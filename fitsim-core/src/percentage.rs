//! Conversion between user-facing percentage text and [`Multiplier`] values.
//!
//! Parsing quantises to the multiplier grid (0.01% steps) before anything else
//! looks at the value. Range checks, commits and the bounds shown in error
//! messages all derive from that one quantised integer.

use crate::multiplier::Multiplier;
use crate::validate::ValidationError;
use regex::Regex;
use std::sync::LazyLock;

static PERCENTAGE_GRAMMAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)$").expect("percentage grammar is a valid pattern")
});

/// Parse a percentage delta such as `"15"`, `"-7.5"` or `"+.25"` into a multiplier.
///
/// Surrounding whitespace is ignored. Text outside the grammar is a
/// [`ValidationError::Format`]; text inside it that still fails to produce a
/// finite number is a [`ValidationError::Number`].
pub fn to_multiplier(text: &str) -> Result<Multiplier, ValidationError> {
    let text = text.trim();
    if !PERCENTAGE_GRAMMAR.is_match(text) {
        return Err(ValidationError::Format);
    }

    let percent: f64 = text.parse().map_err(|_| ValidationError::Number)?;
    if !percent.is_finite() {
        return Err(ValidationError::Number);
    }

    Ok(Multiplier::from_percentage(percent))
}

/// Percentage delta of a multiplier: `(m - 1) * 100`.
#[inline]
pub fn to_percentage(multiplier: Multiplier) -> f64 {
    multiplier.to_percentage()
}

/// Render a multiplier as signed percentage text with at most two decimals.
///
/// `0.9 → "-10%"`, `1.2 → "+20%"`, `1.155 → "+15.5%"`, `1.0 → "0%"`.
/// Works on the raw integer, so the output is exact rather than float-rounded.
pub fn format_percentage(multiplier: Multiplier) -> String {
    let hundredths = multiplier.percent_hundredths();
    let sign = match hundredths.signum() {
        1 => "+",
        -1 => "-",
        _ => "",
    };
    let magnitude = hundredths.unsigned_abs();
    let whole = magnitude / 100;
    let frac = magnitude % 100;

    if frac == 0 {
        format!("{sign}{whole}%")
    } else if frac % 10 == 0 {
        format!("{sign}{whole}.{}%", frac / 10)
    } else {
        format!("{sign}{whole}.{frac:02}%")
    }
}
