use cardboard_tracking::math::write_into;
use glam::{Mat4, Vec4};

/// Half-angles of an eye's view frustum, in degrees, measured from the
/// optical axis. Left and right need not match.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FieldOfView {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
}

impl FieldOfView {
    pub fn new(left: f32, right: f32, bottom: f32, top: f32) -> Self {
        Self {
            left,
            right,
            bottom,
            top,
        }
    }

    /// Symmetric field of view from a vertical angle and a width/height ratio.
    pub fn symmetric(fov_y: f32, aspect: f32) -> Self {
        let half_y = fov_y * 0.5;
        let half_x = (half_y.to_radians().tan() * aspect).atan().to_degrees();
        Self::new(half_x, half_x, half_y, half_y)
    }

    /// Same frustum seen through the other eye: left and right swap.
    pub fn mirrored(&self) -> Self {
        Self::new(self.right, self.left, self.bottom, self.top)
    }

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f32 {
        self.bottom + self.top
    }

    /// Off-axis perspective projection with OpenGL clip conventions.
    pub fn to_perspective(&self, z_near: f32, z_far: f32) -> Mat4 {
        let l = -self.left.to_radians().tan() * z_near;
        let r = self.right.to_radians().tan() * z_near;
        let b = -self.bottom.to_radians().tan() * z_near;
        let t = self.top.to_radians().tan() * z_near;
        frustum(l, r, b, t, z_near, z_far)
    }

    pub fn write_perspective(&self, z_near: f32, z_far: f32, out: &mut [f32], offset: usize) {
        write_into(out, offset, &self.to_perspective(z_near, z_far).to_cols_array());
    }
}

/// Column-major frustum matrix for the near-plane rectangle `[l, r] x [b, t]`.
pub fn frustum(l: f32, r: f32, b: f32, t: f32, near: f32, far: f32) -> Mat4 {
    let width = r - l;
    let height = t - b;
    let depth = far - near;
    Mat4::from_cols(
        Vec4::new(2.0 * near / width, 0.0, 0.0, 0.0),
        Vec4::new(0.0, 2.0 * near / height, 0.0, 0.0),
        Vec4::new(
            (r + l) / width,
            (t + b) / height,
            -(far + near) / depth,
            -1.0,
        ),
        Vec4::new(0.0, 0.0, -2.0 * far * near / depth, 0.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn mirroring_swaps_left_and_right() {
        let fov = FieldOfView::new(25.8, 38.3, 41.1, 31.7);
        let mirrored = fov.mirrored();
        assert_eq!(mirrored.left, fov.right);
        assert_eq!(mirrored.right, fov.left);
        assert_eq!(mirrored.bottom, fov.bottom);
        assert_eq!(mirrored.top, fov.top);
        assert_eq!(mirrored.mirrored(), fov);
    }

    #[test]
    fn symmetric_fov_matches_gl_perspective() {
        let fov = FieldOfView::symmetric(65.0, 16.0 / 9.0);
        let expected = Mat4::perspective_rh_gl(65f32.to_radians(), 16.0 / 9.0, 0.1, 100.0);
        assert!(fov.to_perspective(0.1, 100.0).abs_diff_eq(expected, 1e-4));
    }

    #[test]
    fn frustum_edges_land_on_clip_boundaries() {
        let fov = FieldOfView::new(30.0, 45.0, 20.0, 40.0);
        let p = fov.to_perspective(0.1, 100.0);

        // A point on the right edge of the near plane projects to x = 1.
        let near = 0.1;
        let right_edge = Vec3::new(45f32.to_radians().tan() * near, 0.0, -near);
        assert!((p.project_point3(right_edge).x - 1.0).abs() < 1e-4);

        let bottom_edge = Vec3::new(0.0, -(20f32.to_radians().tan()) * near, -near);
        assert!((p.project_point3(bottom_edge).y + 1.0).abs() < 1e-4);

        // Near and far planes map to -1 and 1 in depth.
        assert!((p.project_point3(Vec3::new(0.0, 0.0, -0.1)).z + 1.0).abs() < 1e-4);
        assert!((p.project_point3(Vec3::new(0.0, 0.0, -100.0)).z - 1.0).abs() < 1e-3);
    }

    #[test]
    fn writes_sixteen_values() {
        let fov = FieldOfView::symmetric(65.0, 1.0);
        let mut out = [0.0f32; 16];
        fov.write_perspective(0.1, 100.0, &mut out, 0);
        assert_eq!(out, fov.to_perspective(0.1, 100.0).to_cols_array());
    }
}
