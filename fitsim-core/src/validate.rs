use crate::multiplier::Multiplier;
use crate::percentage::{format_percentage, to_multiplier};
use crate::range::AttributeRange;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a percentage entry cannot be confirmed.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationError {
    #[error("Enter a number such as 15, -7.5 or +.25")]
    Format,
    #[error("Not a valid number")]
    Number,
    /// Bounds are carried in percentage form for display.
    #[error("Value must be between {min} and {max}")]
    OutOfRange { min: String, max: String },
}

impl ValidationError {
    pub fn out_of_range(range: &AttributeRange) -> Self {
        ValidationError::OutOfRange {
            min: format_percentage(range.min()),
            max: format_percentage(range.max()),
        }
    }
}

/// Result of checking one text entry against one attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// Nothing entered yet. Not an error, but nothing to confirm either.
    Empty,
    Invalid(ValidationError),
    Valid(Multiplier),
}

impl Verdict {
    pub fn is_confirmable(&self) -> bool {
        matches!(self, Verdict::Valid(_))
    }

    pub fn multiplier(&self) -> Option<Multiplier> {
        match self {
            Verdict::Valid(m) => Some(*m),
            _ => None,
        }
    }

    /// Message to show under the input field, if any.
    pub fn message(&self) -> Option<String> {
        match self {
            Verdict::Invalid(e) => Some(e.to_string()),
            Verdict::Empty | Verdict::Valid(_) => None,
        }
    }
}

/// Validate raw percentage text against an attribute's bounds.
///
/// Pure: identical inputs always produce identical verdicts.
pub fn validate(text: &str, range: &AttributeRange) -> Verdict {
    if text.trim().is_empty() {
        return Verdict::Empty;
    }

    let multiplier = match to_multiplier(text) {
        Ok(m) => m,
        Err(e) => return Verdict::Invalid(e),
    };

    if !range.contains(multiplier) {
        return Verdict::Invalid(ValidationError::out_of_range(range));
    }

    Verdict::Valid(multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn velocity() -> AttributeRange {
        AttributeRange::new(
            37,
            "Maximum Velocity",
            Multiplier::from_f64(0.90),
            Multiplier::from_f64(1.20),
        )
        .unwrap()
    }

    #[test]
    fn test_scenario_from_bounds() {
        let range = velocity();

        assert_eq!(validate("15", &range), Verdict::Valid(Multiplier::from_f64(1.15)));
        assert_eq!(
            validate("25", &range),
            Verdict::Invalid(ValidationError::OutOfRange {
                min: "-10%".to_string(),
                max: "+20%".to_string(),
            })
        );
        assert_eq!(validate("1..5", &range), Verdict::Invalid(ValidationError::Format));
    }

    #[test]
    fn test_empty_is_not_an_error() {
        let range = velocity();
        for text in ["", "   ", "\t\n"] {
            let verdict = validate(text, &range);
            assert_eq!(verdict, Verdict::Empty);
            assert!(!verdict.is_confirmable());
            assert_eq!(verdict.message(), None);
        }
    }

    #[test]
    fn test_non_ascii_digits_are_number_errors() {
        // Matches the digit class of the grammar but is not a parseable float
        let range = velocity();
        assert_eq!(
            validate("\u{0661}\u{0665}", &range),
            Verdict::Invalid(ValidationError::Number)
        );
    }

    #[test]
    fn test_extreme_magnitudes_are_rejected() {
        let range = velocity();
        let out_of_range = Verdict::Invalid(ValidationError::OutOfRange {
            min: "-10%".to_string(),
            max: "+20%".to_string(),
        });
        assert_eq!(validate("-99999999999999999999", &range), out_of_range);
        assert_eq!(validate("99999999999999999999", &range), out_of_range);

        let digits = "9".repeat(400);
        assert_eq!(
            validate(&digits, &range),
            Verdict::Invalid(ValidationError::Number)
        );
        assert_eq!(
            validate(&format!("-{digits}"), &range),
            Verdict::Invalid(ValidationError::Number)
        );
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let range = velocity();
        assert!(validate("-10", &range).is_confirmable());
        assert!(validate("20", &range).is_confirmable());
        assert!(!validate("20.01", &range).is_confirmable());
        assert!(!validate("-10.01", &range).is_confirmable());
    }

    #[test]
    fn test_messages() {
        let range = velocity();
        assert_eq!(
            validate("25", &range).message().as_deref(),
            Some("Value must be between -10% and +20%")
        );
        assert!(validate("x", &range).message().is_some());
        assert_eq!(validate("5", &range).message(), None);
    }

    proptest! {
        /// Every in-range step validates and round trips.
        #[test]
        fn in_range_text_is_valid(hundredths in -1000i64..=2000) {
            let range = velocity();
            let percent = hundredths as f64 / 100.0;
            let verdict = validate(&format!("{percent}"), &range);
            let m = verdict.multiplier();
            prop_assert!(m.is_some(), "{} rejected", percent);
            prop_assert!((m.unwrap().to_percentage() - percent).abs() < 0.005);
        }

        /// Text outside the grammar never reports a number error.
        #[test]
        fn grammar_failure_is_format_error(s in "[a-zA-Z%,.+*/_-]{1,8}") {
            let range = velocity();
            prop_assert_eq!(validate(&s, &range), Verdict::Invalid(ValidationError::Format));
        }

        #[test]
        fn validation_is_deterministic(s in "\\PC{0,12}") {
            let range = velocity();
            prop_assert_eq!(validate(&s, &range), validate(&s, &range));
        }
    }
}
