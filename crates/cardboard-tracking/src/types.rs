use glam::DVec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    Accelerometer,
    Gyroscope,
}

/// Raw reading as delivered by the platform, in device axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorEvent {
    pub kind: SensorKind,
    /// m/s^2 for the accelerometer, rad/s for the gyroscope.
    pub values: [f32; 3],
    /// Monotonic sensor clock, nanoseconds.
    pub timestamp_ns: i64,
}

impl SensorEvent {
    pub fn gyroscope(values: [f32; 3], timestamp_ns: i64) -> Self {
        Self {
            kind: SensorKind::Gyroscope,
            values,
            timestamp_ns,
        }
    }

    pub fn accelerometer(values: [f32; 3], timestamp_ns: i64) -> Self {
        Self {
            kind: SensorKind::Accelerometer,
            values,
            timestamp_ns,
        }
    }

    /// All-zero or non-finite readings are a known hardware glitch.
    pub fn is_degenerate(&self) -> bool {
        self.values.iter().all(|v| *v == 0.0) || self.values.iter().any(|v| !v.is_finite())
    }

    /// Remap device axes into the tracker frame: `(x, y, z) -> (-y, x, z)`.
    pub fn to_inertial_sample(&self) -> InertialSample {
        let [x, y, z] = self.values;
        InertialSample {
            vector: DVec3::new(-(y as f64), x as f64, z as f64),
            timestamp_ns: self.timestamp_ns,
        }
    }
}

/// Axis-corrected reading consumed by the orientation filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InertialSample {
    pub vector: DVec3,
    pub timestamp_ns: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaps_device_axes() {
        let sample = SensorEvent::gyroscope([1.0, 2.0, 3.0], 42).to_inertial_sample();
        assert_eq!(sample.vector, DVec3::new(-2.0, 1.0, 3.0));
        assert_eq!(sample.timestamp_ns, 42);
    }

    #[test]
    fn zero_and_nan_samples_are_degenerate() {
        assert!(SensorEvent::accelerometer([0.0, 0.0, 0.0], 0).is_degenerate());
        assert!(SensorEvent::gyroscope([f32::NAN, 0.1, 0.0], 0).is_degenerate());
        assert!(!SensorEvent::accelerometer([0.0, 0.0, 9.81], 0).is_degenerate());
    }
}
