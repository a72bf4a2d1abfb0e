use crate::math::write_into;
use glam::{Mat4, Quat, Vec3};

/// Below this cosine of pitch, yaw and roll are no longer separable.
pub const GIMBAL_LOCK_EPSILON: f32 = 0.01;

/// Head rotation in radians, as reported by [`HeadTransform::euler_angles`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EulerAngles {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl EulerAngles {
    pub fn to_array(self) -> [f32; 3] {
        [self.pitch, self.yaw, self.roll]
    }
}

/// Snapshot of the head pose for one frame.
///
/// Wraps the head view matrix (world to head, column-major) and exposes the
/// usual derived quantities. Every accessor is pure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadTransform {
    head_view: Mat4,
}

impl Default for HeadTransform {
    fn default() -> Self {
        Self {
            head_view: Mat4::IDENTITY,
        }
    }
}

impl HeadTransform {
    pub fn from_head_view(head_view: Mat4) -> Self {
        Self { head_view }
    }

    pub fn head_view(&self) -> Mat4 {
        self.head_view
    }

    pub fn set_head_view(&mut self, head_view: Mat4) {
        self.head_view = head_view;
    }

    pub fn translation(&self) -> Vec3 {
        self.head_view.w_axis.truncate()
    }

    pub fn forward(&self) -> Vec3 {
        -self.head_view.z_axis.truncate()
    }

    pub fn up(&self) -> Vec3 {
        self.head_view.y_axis.truncate()
    }

    pub fn right(&self) -> Vec3 {
        self.head_view.x_axis.truncate()
    }

    /// Head rotation as a quaternion (the conjugate of the view's rotation).
    pub fn quaternion(&self) -> Quat {
        Quat::from_mat4(&self.head_view).normalize().conjugate()
    }

    pub fn is_gimbal_locked(&self) -> bool {
        let m6 = self.head_view.y_axis.z.clamp(-1.0, 1.0);
        (1.0 - m6 * m6).sqrt() < GIMBAL_LOCK_EPSILON
    }

    /// Pitch, yaw and roll in radians.
    ///
    /// Near gimbal lock yaw is pinned to zero and the whole in-plane rotation
    /// is reported as roll.
    pub fn euler_angles(&self) -> EulerAngles {
        let m = &self.head_view;
        let pitch = m.y_axis.z.clamp(-1.0, 1.0).asin();

        let (yaw, roll) = if self.is_gimbal_locked() {
            (0.0, m.x_axis.y.atan2(m.x_axis.x))
        } else {
            (
                (-m.x_axis.z).atan2(m.z_axis.z),
                (-m.y_axis.x).atan2(m.y_axis.y),
            )
        };

        EulerAngles {
            pitch: -pitch,
            yaw: -yaw,
            roll: -roll,
        }
    }

    /// Writes the 16 column-major elements of the head view.
    pub fn write_head_view(&self, out: &mut [f32], offset: usize) {
        write_into(out, offset, &self.head_view.to_cols_array());
    }

    pub fn write_translation(&self, out: &mut [f32], offset: usize) {
        write_into(out, offset, &self.translation().to_array());
    }

    pub fn write_forward(&self, out: &mut [f32], offset: usize) {
        write_into(out, offset, &self.forward().to_array());
    }

    pub fn write_up(&self, out: &mut [f32], offset: usize) {
        write_into(out, offset, &self.up().to_array());
    }

    pub fn write_right(&self, out: &mut [f32], offset: usize) {
        write_into(out, offset, &self.right().to_array());
    }

    /// Writes `[x, y, z, w]`.
    pub fn write_quaternion(&self, out: &mut [f32], offset: usize) {
        write_into(out, offset, &self.quaternion().to_array());
    }

    /// Writes `[pitch, yaw, roll]`.
    pub fn write_euler_angles(&self, out: &mut [f32], offset: usize) {
        write_into(out, offset, &self.euler_angles().to_array());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn identity_pose() {
        let head = HeadTransform::default();
        assert_eq!(head.forward(), Vec3::NEG_Z);
        assert_eq!(head.up(), Vec3::Y);
        assert_eq!(head.right(), Vec3::X);
        assert_eq!(head.translation(), Vec3::ZERO);
        assert_eq!(head.euler_angles(), EulerAngles::default());
    }

    #[test]
    fn translation_comes_from_last_column() {
        let head = HeadTransform::from_head_view(Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(head.translation(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn yaw_only_rotation() {
        let head = HeadTransform::from_head_view(Mat4::from_rotation_y(0.3));
        let angles = head.euler_angles();
        assert!(angles.pitch.abs() < 1e-6);
        assert!((angles.yaw + 0.3).abs() < 1e-6);
        assert!(angles.roll.abs() < 1e-6);
    }

    #[test]
    fn straight_up_is_gimbal_locked() {
        let head = HeadTransform::from_head_view(Mat4::from_rotation_x(FRAC_PI_2));
        assert!(head.is_gimbal_locked());

        let angles = head.euler_angles();
        assert!(angles.to_array().iter().all(|a| a.is_finite()));
        assert!((angles.pitch + FRAC_PI_2).abs() < 1e-3);
        assert_eq!(angles.yaw, 0.0);
    }

    #[test]
    fn gimbal_lock_reports_rotation_as_roll() {
        let view = Mat4::from_rotation_z(0.4) * Mat4::from_rotation_x(FRAC_PI_2);
        let angles = HeadTransform::from_head_view(view).euler_angles();
        assert_eq!(angles.yaw, 0.0);
        assert!((angles.roll + 0.4).abs() < 1e-5);
    }

    #[test]
    fn quaternion_is_conjugate_of_view_rotation() {
        let head = HeadTransform::from_head_view(Mat4::from_rotation_z(0.4));
        let q = head.quaternion();
        assert!(q.abs_diff_eq(Quat::from_rotation_z(-0.4), 1e-6));
    }

    #[test]
    fn writes_at_offset() {
        let head = HeadTransform::from_head_view(Mat4::from_rotation_y(0.3));
        let mut out = [9.0f32; 20];
        head.write_head_view(&mut out, 4);
        assert_eq!(out[..4], [9.0; 4]);
        assert_eq!(out[4..], Mat4::from_rotation_y(0.3).to_cols_array());

        let mut forward = [0.0f32; 3];
        head.write_forward(&mut forward, 0);
        assert_eq!(forward, head.forward().to_array());
    }

    #[test]
    #[should_panic(expected = "not enough space")]
    fn short_buffer_panics() {
        let mut out = [0.0f32; 3];
        HeadTransform::default().write_quaternion(&mut out, 0);
    }
}
