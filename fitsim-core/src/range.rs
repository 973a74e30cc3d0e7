use crate::multiplier::Multiplier;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type AttributeId = u32;
pub type ItemId = u32;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("Attribute {attribute_id}: bounds must be positive multipliers")]
    NonPositive { attribute_id: AttributeId },
    #[error("Attribute {attribute_id}: minimum {min} exceeds maximum {max}")]
    Inverted {
        attribute_id: AttributeId,
        min: Multiplier,
        max: Multiplier,
    },
}

/// One attribute a mutation item may adjust, with its allowed multiplier bounds.
///
/// Bounds are immutable once constructed. Deserialized ranges must go through
/// [`AttributeRange::validated`] before use, which the catalog types do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeRange {
    attribute_id: AttributeId,
    display_name: String,
    #[serde(default)]
    icon: Option<String>,
    min: Multiplier,
    max: Multiplier,
    #[serde(default = "default_high_is_good")]
    high_is_good: bool,
}

fn default_high_is_good() -> bool {
    true
}

impl AttributeRange {
    pub fn new(
        attribute_id: AttributeId,
        display_name: impl Into<String>,
        min: Multiplier,
        max: Multiplier,
    ) -> Result<Self, RangeError> {
        Self {
            attribute_id,
            display_name: display_name.into(),
            icon: None,
            min,
            max,
            high_is_good: true,
        }
        .validated()
    }

    /// Check the bounds invariant: `0 < min <= max`.
    pub fn validated(self) -> Result<Self, RangeError> {
        if !self.min.is_positive() || !self.max.is_positive() {
            return Err(RangeError::NonPositive {
                attribute_id: self.attribute_id,
            });
        }
        if self.min > self.max {
            return Err(RangeError::Inverted {
                attribute_id: self.attribute_id,
                min: self.min,
                max: self.max,
            });
        }
        Ok(self)
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Mark the attribute as one where lower values are better (e.g. signature radius).
    pub fn lower_is_better(mut self) -> Self {
        self.high_is_good = false;
        self
    }

    pub fn attribute_id(&self) -> AttributeId {
        self.attribute_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    pub fn min(&self) -> Multiplier {
        self.min
    }

    pub fn max(&self) -> Multiplier {
        self.max
    }

    pub fn high_is_good(&self) -> bool {
        self.high_is_good
    }

    /// Inclusive bounds check on multipliers.
    pub fn contains(&self, value: Multiplier) -> bool {
        value >= self.min && value <= self.max
    }

    /// Whether `value` moves the attribute in its favourable direction.
    /// Returns `false` for an unmodified value.
    pub fn is_improvement(&self, value: Multiplier) -> bool {
        if self.high_is_good {
            value > Multiplier::ONE
        } else {
            value < Multiplier::ONE
        }
    }

    /// Position of `value` within the bounds, 0.0 at `min` and 1.0 at `max`.
    /// Returns 0 if max == min.
    pub fn ratio(&self, value: Multiplier) -> f64 {
        let span = (self.max - self.min).raw();
        if span == 0 {
            return 0.0;
        }
        let clamped = value.max(self.min).min(self.max);
        (clamped - self.min).raw() as f64 / span as f64
    }
}
