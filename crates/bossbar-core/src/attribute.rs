//! Clamped health-like attribute backing the bar's fill percentage.

use serde::{Deserialize, Serialize};

/// A scalar kept inside `[min, max]` on every write.
///
/// The bar exposes it as a fraction (`value / max`) in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttributeValue {
    value: f32,
    min: f32,
    max: f32,
    default: f32,
}

impl AttributeValue {
    /// Lower bound of the health attribute.
    pub const MIN: f32 = 0.0;
    /// Upper bound of the health attribute.
    pub const MAX: f32 = 100.0;
    /// Value a fresh attribute starts at.
    pub const DEFAULT: f32 = 100.0;

    /// Creates a health attribute at its default (full) value.
    pub fn health() -> Self {
        Self {
            value: Self::DEFAULT,
            min: Self::MIN,
            max: Self::MAX,
            default: Self::DEFAULT,
        }
    }

    /// Creates a health attribute holding `value`, clamped.
    pub fn with_value(value: f32) -> Self {
        let mut attr = Self::health();
        attr.set_value(value);
        attr
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn min(&self) -> f32 {
        self.min
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn default_value(&self) -> f32 {
        self.default
    }

    /// Stores `value` clamped to `[min, max]`. NaN is stored as `min`.
    pub fn set_value(&mut self, value: f32) {
        self.value = if value.is_nan() {
            self.min
        } else {
            value.clamp(self.min, self.max)
        };
    }

    /// Restores the default value.
    pub fn reset(&mut self) {
        self.value = self.default;
    }

    /// Returns the value as a fraction of `max`, always in `[0, 1]`.
    pub fn fraction(&self) -> f32 {
        if self.max <= 0.0 {
            return 0.0;
        }
        (self.value / self.max).clamp(0.0, 1.0)
    }

    /// Sets the value from a fraction. Out-of-range input is clamped to `[0, 1]`.
    pub fn set_fraction(&mut self, fraction: f32) {
        let fraction = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };
        self.set_value(fraction * self.max);
    }
}

impl Default for AttributeValue {
    fn default() -> Self {
        Self::health()
    }
}
