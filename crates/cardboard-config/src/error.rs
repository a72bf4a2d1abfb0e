use thiserror::Error;

/// Rejected configuration values.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be finite and positive, got {value}")]
    NotPositive { field: &'static str, value: f32 },

    #[error("{field} must be finite, got {value}")]
    NotFinite { field: &'static str, value: f32 },

    #[error("{field} must be below {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f32,
        max: f32,
    },

    #[error("distortion coefficients [{c0}, {c1}] are not monotonic up to radius {max_radius} m")]
    NonMonotonicDistortion { c0: f32, c1: f32, max_radius: f32 },

    #[error("clip planes must satisfy 0 < near < far (near {near}, far {far})")]
    InvalidClipPlanes { near: f32, far: f32 },

    #[error("accelerometer gains must satisfy 0 < min <= max <= 1 (min {min}, max {max})")]
    InvalidGainBounds { min: f32, max: f32 },

    #[error("screen must be at least 1x1 pixels, got {width}x{height}")]
    EmptyScreen { width: i32, height: i32 },
}

pub(crate) fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

pub(crate) fn finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotFinite { field, value })
    }
}
