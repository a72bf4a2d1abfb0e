use cardboard_config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DistortionError {
    #[error(
        "inverse distortion of radius {radius} did not converge after {iterations} iterations \
         (best estimate {best_estimate})"
    )]
    NoConvergence {
        radius: f32,
        best_estimate: f32,
        iterations: u32,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum ViewError {
    #[error("invalid view configuration")]
    Config(#[from] ConfigError),
    /// The render side has been dropped; updates can no longer be applied.
    #[error("stereo view is gone")]
    Closed,
}
