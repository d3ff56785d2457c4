use serde::{Deserialize, Serialize};

use super::error::RangeError;

/// Closed numeric interval `[min, max]`
///
/// Used as raw input domain, normalized output domain and as dead-zone filter.
/// Bounds are fixed at construction; `min <= max` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RangeBounds", into = "RangeBounds")]
pub struct Range {
    min: f64,
    max: f64,
}

/// Raw analog stick domain reported by the driver
pub const STICK_INPUT: Range = Range::fixed(-32768.0, 32768.0);

/// Raw trigger domain reported by the driver
pub const TRIGGER_INPUT: Range = Range::fixed(0.0, 255.0);

/// Normalized stick domain (percent, signed)
pub const STICK_OUTPUT: Range = Range::fixed(-100.0, 100.0);

/// Normalized trigger domain (percent)
pub const TRIGGER_OUTPUT: Range = Range::fixed(0.0, 100.0);

impl Range {
    /// Zero-width range `[0, 0]`
    pub const ZERO: Range = Range::fixed(0.0, 0.0);

    /// Creates a new range, rejecting inverted or NaN bounds
    pub fn new(min: f64, max: f64) -> Result<Self, RangeError> {
        if min.is_nan() || max.is_nan() {
            return Err(RangeError::NotANumber);
        }
        if min > max {
            return Err(RangeError::Inverted { min, max });
        }
        Ok(Self { min, max })
    }

    const fn fixed(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Inclusive on both ends
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    /// Maps `value` from this range onto `output` with a plain affine transform.
    ///
    /// Values outside `self` are extrapolated, not clamped. Callers must not
    /// rescale from a zero-width range.
    pub fn rescale(&self, value: f64, output: &Range) -> f64 {
        (value - self.min) * (output.max - output.min) / (self.max - self.min) + output.min
    }
}

impl Default for Range {
    fn default() -> Self {
        Self::ZERO
    }
}

/// Serialized form of a [`Range`]; missing bounds default to 0
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeBounds {
    #[serde(default)]
    pub min: f64,
    #[serde(default)]
    pub max: f64,
}

impl TryFrom<RangeBounds> for Range {
    type Error = RangeError;

    fn try_from(bounds: RangeBounds) -> Result<Self, Self::Error> {
        Range::new(bounds.min, bounds.max)
    }
}

impl From<Range> for RangeBounds {
    fn from(range: Range) -> Self {
        Self {
            min: range.min,
            max: range.max,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_inclusive() {
        let range = Range::new(-8000.0, 6000.0).unwrap();
        assert!(range.contains(-8000.0));
        assert!(range.contains(6000.0));
        assert!(range.contains(0.0));
        assert!(!range.contains(-8000.5));
        assert!(!range.contains(6001.0));
    }

    #[test]
    fn zero_width_range_only_contains_zero() {
        assert!(Range::ZERO.contains(0.0));
        assert!(!Range::ZERO.contains(1.0));
        assert!(!Range::ZERO.contains(-1.0));
        assert_eq!(Range::default(), Range::ZERO);
    }

    #[test]
    fn inverted_range_is_rejected() {
        assert_eq!(
            Range::new(10.0, -10.0),
            Err(RangeError::Inverted {
                min: 10.0,
                max: -10.0
            })
        );
    }

    #[test]
    fn nan_bound_is_rejected() {
        assert_eq!(Range::new(f64::NAN, 1.0), Err(RangeError::NotANumber));
        assert_eq!(Range::new(0.0, f64::NAN), Err(RangeError::NotANumber));
    }

    #[test]
    fn stick_rescale_hits_both_ends_and_center() {
        assert_eq!(STICK_INPUT.rescale(0.0, &STICK_OUTPUT), 0.0);
        assert_eq!(STICK_INPUT.rescale(32768.0, &STICK_OUTPUT), 100.0);
        assert_eq!(STICK_INPUT.rescale(-32768.0, &STICK_OUTPUT), -100.0);
    }

    #[test]
    fn trigger_rescale_hits_both_ends() {
        assert_eq!(TRIGGER_INPUT.rescale(255.0, &TRIGGER_OUTPUT), 100.0);
        assert_eq!(TRIGGER_INPUT.rescale(0.0, &TRIGGER_OUTPUT), 0.0);
    }

    #[test]
    fn bounds_default_to_zero_when_missing() {
        let range: Range = toml::from_str("max = 6000").unwrap();
        assert_eq!(range, Range::new(0.0, 6000.0).unwrap());

        let range: Range = toml::from_str("").unwrap();
        assert_eq!(range, Range::ZERO);
    }

    #[test]
    fn inverted_bounds_fail_to_deserialize() {
        let result: Result<Range, _> = toml::from_str("min = 5.0\nmax = -5.0");
        assert!(result.is_err());
    }
}
