//! Validation errors for ecoair-types.

use thiserror::Error;

/// Errors raised when caller-supplied values are rejected before they reach storage.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new validation rules
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ValidationError {
    /// The city name is empty once surrounding whitespace is removed.
    #[error("City name must not be empty")]
    EmptyCityName,

    /// Latitude outside of [-90, 90].
    #[error("Latitude {0} is out of range (expected -90..=90)")]
    LatitudeOutOfRange(f64),

    /// Longitude outside of [-180, 180].
    #[error("Longitude {0} is out of range (expected -180..=180)")]
    LongitudeOutOfRange(f64),
}

/// Result type alias using ecoair-types' ValidationError type.
pub type ValidationResult<T> = std::result::Result<T, ValidationError>;
