//! Error types for checked clearance evaluation.

use thiserror::Error;

/// Reasons a link description is rejected before evaluation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClearanceError {
    /// A numeric input was NaN or infinite.
    #[error("{field} must be finite (got {value})")]
    NonFinite {
        /// Name of the offending input.
        field: &'static str,
        /// Value that was supplied.
        value: f64,
    },

    /// Link distance below zero.
    #[error("link distance must not be negative (got {0} m)")]
    NegativeDistance(f64),

    /// Zero or negative carrier frequency.
    #[error("frequency must be positive (got {0} Hz)")]
    NonPositiveFrequency(f64),

    /// Obstacle sits outside the TX-RX span.
    #[error("obstacle position {position_m} m is outside the link (0-{distance_m} m)")]
    ObstacleOutOfRange {
        /// Requested obstacle position.
        position_m: f64,
        /// Link length.
        distance_m: f64,
    },

    /// Obstacle height below ground.
    #[error("obstacle height must not be negative (got {0} m)")]
    NegativeObstacleHeight(f64),

    /// Obstacle footprint with no width.
    #[error("obstacle half-width must be positive (got {0} m)")]
    NonPositiveHalfWidth(f64),

    /// Zero or negative refraction K-factor.
    #[error("K-factor must be positive (got {0})")]
    NonPositiveKFactor(f64),

    /// Path scan with no intervals.
    #[error("sample count must be at least 1")]
    ZeroSamples,
}

/// Passes `value` through, or names `field` in the error when it is NaN or infinite.
pub(crate) fn ensure_finite(field: &'static str, value: f64) -> Result<f64, ClearanceError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ClearanceError::NonFinite { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_finite_names_the_field() {
        assert_eq!(ensure_finite("distance_m", 12.5), Ok(12.5));
        assert!(matches!(
            ensure_finite("tx_height_m", f64::INFINITY),
            Err(ClearanceError::NonFinite { field: "tx_height_m", .. })
        ));
        let err = ensure_finite("k_factor", f64::NAN).unwrap_err();
        assert!(err.to_string().starts_with("k_factor must be finite"));
    }
}
