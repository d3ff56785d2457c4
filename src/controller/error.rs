//! Error definitions for the controller core

use thiserror::Error;

/// Errors raised when building a [`Range`](super::range::Range)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RangeError {
    /// Lower bound is greater than the upper bound
    #[error("Inverted range: min {min} is greater than max {max}")]
    Inverted { min: f64, max: f64 },

    /// One of the bounds is NaN
    #[error("Range bound is not a number")]
    NotANumber,
}

/// Errors raised when constructing a [`ControllerState`](super::controller_state::ControllerState)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControllerError {
    /// A configured dead-zone could not be turned into a valid range
    #[error("Invalid {side} dead-zone: {source}")]
    InvalidDeadzone {
        side: &'static str,
        #[source]
        source: RangeError,
    },
}
