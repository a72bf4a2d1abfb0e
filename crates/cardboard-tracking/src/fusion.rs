use cardboard_config::TrackingConfig;
use glam::{DMat4, DQuat, DVec3};
use parking_lot::Mutex;

const NS_TO_S: f64 = 1.0e-9;

/// Standard gravity (m/s^2).
const GRAVITY: f64 = 9.80665;

/// Readings departing from 1 g by this fraction (or more) carry no weight.
const ACCEL_REJECTION: f64 = 0.5;

/// Accelerometer vectors shorter than this cannot give a gravity direction.
const MIN_ACCEL_NORM: f64 = 1.0e-3;

/// Tilt variance after a reset: nothing is known about the orientation.
const UNKNOWN_TILT_VARIANCE: f64 = 1.0e6;

/// Estimator tuning, in SI units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterConfig {
    /// Longest gyro interval integrated in one step (seconds).
    pub max_gyro_dt: f64,
    /// Tilt variance growth per second of integration (rad^2/s).
    pub gyro_noise: f64,
    /// Tilt variance of one accelerometer reading (rad^2).
    pub accel_noise: f64,
    pub min_accel_gain: f64,
    pub max_accel_gain: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self::from(&TrackingConfig::default())
    }
}

impl From<&TrackingConfig> for FilterConfig {
    fn from(config: &TrackingConfig) -> Self {
        Self {
            max_gyro_dt: config.max_gyro_dt_ms as f64 / 1000.0,
            gyro_noise: config.gyro_noise as f64,
            accel_noise: config.accel_noise as f64,
            min_accel_gain: config.min_accel_gain as f64,
            max_accel_gain: config.max_accel_gain as f64,
        }
    }
}

/// Gyro + accelerometer orientation estimator.
///
/// Gyro rates are integrated into a unit quaternion; accelerometer readings
/// pull roll and pitch toward gravity with a scalar Kalman-style weight.
/// Yaw is left to the gyro. Every operation takes the same internal lock,
/// so the sensor thread and the render thread can share one filter.
pub struct OrientationFilter {
    config: FilterConfig,
    state: Mutex<OrientationState>,
}

struct OrientationState {
    /// Rotates sensor-frame vectors into the Z-up world frame.
    world_from_sensor: DQuat,
    /// Most recent gyro reading, used for prediction.
    angular_velocity: DVec3,
    last_gyro_timestamp_ns: Option<i64>,
    last_accel_timestamp_ns: Option<i64>,
    /// Uncertainty of the roll/pitch estimate (rad^2).
    tilt_variance: f64,
    /// Set by the first accelerometer reading after a reset.
    aligned_to_gravity: bool,
}

impl OrientationState {
    fn initial() -> Self {
        Self {
            world_from_sensor: DQuat::IDENTITY,
            angular_velocity: DVec3::ZERO,
            last_gyro_timestamp_ns: None,
            last_accel_timestamp_ns: None,
            tilt_variance: UNKNOWN_TILT_VARIANCE,
            aligned_to_gravity: false,
        }
    }
}

impl OrientationFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self {
            config,
            state: Mutex::new(OrientationState::initial()),
        }
    }

    /// Forget everything: identity orientation, maximal uncertainty.
    pub fn reset(&self) {
        *self.state.lock() = OrientationState::initial();
    }

    /// Integrate an angular velocity (rad/s, tracker frame) up to `timestamp_ns`.
    ///
    /// The first sample after a reset only records the rate. Intervals are
    /// clamped to `[0, max_gyro_dt]` so clock resets and gaps cannot blow up
    /// the estimate.
    pub fn process_gyro(&self, angular_velocity: DVec3, timestamp_ns: i64) {
        if !angular_velocity.is_finite() {
            return;
        }

        let mut state = self.state.lock();
        let dt = match state.last_gyro_timestamp_ns {
            Some(previous) => {
                (timestamp_ns.saturating_sub(previous) as f64 * NS_TO_S).clamp(0.0, self.config.max_gyro_dt)
            }
            None => 0.0,
        };
        state.last_gyro_timestamp_ns = Some(timestamp_ns);
        state.angular_velocity = angular_velocity;

        if dt > 0.0 {
            let step = DQuat::from_scaled_axis(angular_velocity * dt);
            state.world_from_sensor = (state.world_from_sensor * step).normalize();
            state.tilt_variance =
                (state.tilt_variance + self.config.gyro_noise * dt).min(UNKNOWN_TILT_VARIANCE);
        }
    }

    /// Correct roll and pitch from a specific-force reading (m/s^2, tracker frame).
    ///
    /// The first reading after a reset aligns the estimate with gravity.
    /// Later readings rotate it only part of the way, about a horizontal axis.
    /// A timestamp earlier than the last one re-bases the accelerometer clock.
    pub fn process_acc(&self, acceleration: DVec3, timestamp_ns: i64) {
        if let Some(previous) = self.correct_tilt(acceleration, timestamp_ns) {
            tracing::debug!(previous, timestamp_ns, "Accelerometer clock went backwards");
        }
    }

    /// Returns the replaced timestamp when the sample's clock went backwards.
    fn correct_tilt(&self, acceleration: DVec3, timestamp_ns: i64) -> Option<i64> {
        let norm = acceleration.length();
        if !norm.is_finite() || norm < MIN_ACCEL_NORM {
            return None;
        }
        let measured_up = acceleration / norm;

        let mut state = self.state.lock();
        let clock_reset = state
            .last_accel_timestamp_ns
            .filter(|&previous| timestamp_ns < previous);
        state.last_accel_timestamp_ns = Some(timestamp_ns);

        let predicted_up = (state.world_from_sensor.inverse() * DVec3::Z).normalize();
        // Rotation `c` with `c * measured_up == predicted_up`; applying it on the
        // sensor side moves the predicted up vector onto the measured one.
        let correction = DQuat::from_rotation_arc(measured_up, predicted_up);

        if !state.aligned_to_gravity {
            state.world_from_sensor = (state.world_from_sensor * correction).normalize();
            state.tilt_variance = self.config.accel_noise;
            state.aligned_to_gravity = true;
            return clock_reset;
        }

        let trust = (1.0 - (norm - GRAVITY).abs() / GRAVITY / ACCEL_REJECTION).clamp(0.0, 1.0);
        if trust == 0.0 {
            return clock_reset;
        }

        let kalman_gain = state.tilt_variance / (state.tilt_variance + self.config.accel_noise);
        let gain = kalman_gain.clamp(self.config.min_accel_gain, self.config.max_accel_gain) * trust;

        let partial = DQuat::IDENTITY.slerp(correction, gain);
        state.world_from_sensor = (state.world_from_sensor * partial).normalize();
        state.tilt_variance *= 1.0 - gain;
        clock_reset
    }

    /// Orientation extrapolated `seconds_ahead` with the last angular velocity.
    ///
    /// Returned as the sensor-from-world rotation (a view matrix). Identity
    /// until the first sample arrives.
    pub fn predicted_orientation(&self, seconds_ahead: f64) -> DMat4 {
        let state = self.state.lock();
        let ahead = DQuat::from_scaled_axis(state.angular_velocity * seconds_ahead.max(0.0));
        let predicted = (state.world_from_sensor * ahead).normalize();
        DMat4::from_quat(predicted.inverse())
    }
}

impl Default for OrientationFilter {
    fn default() -> Self {
        Self::new(FilterConfig::default())
    }
}
