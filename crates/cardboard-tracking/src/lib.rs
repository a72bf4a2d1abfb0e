//! Head tracking: sensor ingestion, gyro/accelerometer fusion and head pose queries.

pub mod error;
pub mod fusion;
pub mod head_transform;
pub mod math;
pub mod source;
pub mod tracker;
pub mod types;

pub use error::{SensorError, TrackingError};
pub use fusion::{FilterConfig, OrientationFilter};
pub use head_transform::{EulerAngles, HeadTransform};
pub use source::{channel_source, ChannelSensorSource, SensorSender, SensorSource};
pub use tracker::{HeadTracker, IngestStats};
pub use types::{InertialSample, SensorEvent, SensorKind};
