use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("failed to spawn sensor thread")]
    Spawn(#[from] std::io::Error),
    #[error("failed to subscribe to sensors")]
    Subscribe(#[from] SensorError),
    /// The sensor source went down with a panicked sensor thread.
    #[error("sensor source is no longer available")]
    SourceLost,
}

/// Failures reported by a [`SensorSource`](crate::source::SensorSource).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SensorError {
    #[error("sensor unavailable: {0}")]
    Unavailable(String),
    #[error("sensor event stream disconnected")]
    Disconnected,
}
