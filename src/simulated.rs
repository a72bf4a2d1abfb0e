use cardboard_tracking::{SensorError, SensorEvent, SensorSource};
use glam::DVec3;
use std::time::{Duration, Instant};

const GRAVITY: f64 = 9.80665;

/// Synthetic IMU for running without a device: a head slowly looking
/// around, sampled at a fixed rate with gyro and accelerometer readings.
pub struct SimulatedImu {
    period: Duration,
    start: Instant,
    next_due: Instant,
    pending: Option<SensorEvent>,
    subscribed: bool,
}

impl SimulatedImu {
    pub fn new(rate_hz: u32) -> Self {
        let now = Instant::now();
        Self {
            period: Duration::from_secs(1) / rate_hz.max(1),
            start: now,
            next_due: now,
            pending: None,
            subscribed: false,
        }
    }

    /// Gyro and accelerometer readings at `t` seconds, in device axes.
    fn sample(t: f64, timestamp_ns: i64) -> (SensorEvent, SensorEvent) {
        // Yaw sweep with a gentle nod.
        let (yaw_rate, pitch, pitch_rate) = (
            0.3 * (0.5 * t).cos(),
            0.2 * (0.3 * t).sin(),
            0.06 * (0.3 * t).cos(),
        );
        let gyro = DVec3::new(pitch_rate, yaw_rate * pitch.sin(), yaw_rate * pitch.cos());
        let accel = DVec3::new(0.0, pitch.sin(), pitch.cos()) * GRAVITY;
        (
            SensorEvent::gyroscope(to_device_axes(gyro), timestamp_ns),
            SensorEvent::accelerometer(to_device_axes(accel), timestamp_ns),
        )
    }
}

/// Inverse of the tracker's `(x, y, z) -> (-y, x, z)` remap.
fn to_device_axes(v: DVec3) -> [f32; 3] {
    [v.y as f32, -v.x as f32, v.z as f32]
}

impl SensorSource for SimulatedImu {
    fn subscribe(&mut self) -> Result<(), SensorError> {
        self.subscribed = true;
        self.next_due = Instant::now();
        self.pending = None;
        tracing::info!(period = ?self.period, "Simulated IMU subscribed");
        Ok(())
    }

    fn next_event(&mut self, timeout: Duration) -> Result<Option<SensorEvent>, SensorError> {
        if !self.subscribed {
            return Err(SensorError::Unavailable("not subscribed".into()));
        }
        if let Some(event) = self.pending.take() {
            return Ok(Some(event));
        }

        let now = Instant::now();
        if self.next_due > now {
            let wait = self.next_due - now;
            if wait > timeout {
                std::thread::sleep(timeout);
                return Ok(None);
            }
            std::thread::sleep(wait);
        }

        let elapsed = self.next_due.duration_since(self.start);
        self.next_due += self.period;
        let (gyro, accel) = Self::sample(elapsed.as_secs_f64(), elapsed.as_nanos() as i64);
        self.pending = Some(accel);
        Ok(Some(gyro))
    }

    fn unsubscribe(&mut self) {
        self.subscribed = false;
        tracing::info!("Simulated IMU unsubscribed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_head_reads_one_g_up() {
        let (gyro, accel) = SimulatedImu::sample(0.0, 0);
        let remapped = accel.to_inertial_sample().vector;
        assert!(remapped.abs_diff_eq(DVec3::new(0.0, 0.0, GRAVITY), 1e-4));
        assert!((gyro.to_inertial_sample().vector.z - 0.3).abs() < 1e-6);
    }

    #[test]
    fn emits_gyro_then_accel_with_rising_timestamps() {
        let mut imu = SimulatedImu::new(1000);
        assert!(imu.next_event(Duration::from_millis(1)).is_err());

        imu.subscribe().unwrap();
        let mut last = -1;
        for i in 0..6 {
            let event = imu.next_event(Duration::from_millis(50)).unwrap().unwrap();
            let expected = if i % 2 == 0 {
                cardboard_tracking::SensorKind::Gyroscope
            } else {
                cardboard_tracking::SensorKind::Accelerometer
            };
            assert_eq!(event.kind, expected);
            assert!(event.timestamp_ns >= last);
            last = event.timestamp_ns;
        }
    }
}
