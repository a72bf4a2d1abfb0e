use crate::fov::FieldOfView;
use crate::viewport::Viewport;
use glam::{Mat4, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Eye {
    Monocular,
    Left,
    Right,
}

impl Eye {
    /// Offset of this eye from the head centre along the head's x axis, in
    /// the direction applied to the head view.
    fn view_offset(self, interpupillary_distance: f32) -> f32 {
        let half = interpupillary_distance * 0.5;
        match self {
            Eye::Monocular => 0.0,
            Eye::Left => half,
            Eye::Right => -half,
        }
    }
}

/// Projection half of an eye's parameters, cached by the planner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeProjection {
    pub fov: FieldOfView,
    pub perspective: Mat4,
    pub viewport: Viewport,
}

impl Default for EyeProjection {
    fn default() -> Self {
        Self {
            fov: FieldOfView::default(),
            perspective: Mat4::IDENTITY,
            viewport: Viewport::default(),
        }
    }
}

/// Everything the renderer needs to draw one eye for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeParams {
    pub eye: Eye,
    pub viewport: Viewport,
    pub fov: FieldOfView,
    pub perspective: Mat4,
    /// World-to-eye transform: the head view shifted by half the IPD.
    pub eye_view: Mat4,
}

impl EyeParams {
    pub fn new(eye: Eye, projection: &EyeProjection, head_view: Mat4, interpupillary_distance: f32) -> Self {
        let offset = eye.view_offset(interpupillary_distance);
        let eye_view = if offset == 0.0 {
            head_view
        } else {
            Mat4::from_translation(Vec3::new(offset, 0.0, 0.0)) * head_view
        };
        Self {
            eye,
            viewport: projection.viewport,
            fov: projection.fov,
            perspective: projection.perspective,
            eye_view,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stereo_eyes_are_offset_in_opposite_directions() {
        let head = Mat4::from_rotation_y(0.4);
        let projection = EyeProjection::default();
        let left = EyeParams::new(Eye::Left, &projection, head, 0.06);
        let right = EyeParams::new(Eye::Right, &projection, head, 0.06);

        assert!(left.eye_view.w_axis.truncate().abs_diff_eq(Vec3::new(0.03, 0.0, 0.0), 1e-6));
        assert!(right.eye_view.w_axis.truncate().abs_diff_eq(Vec3::new(-0.03, 0.0, 0.0), 1e-6));
        // Rotation block is untouched.
        assert_eq!(left.eye_view.x_axis, head.x_axis);
        assert_eq!(right.eye_view.z_axis, head.z_axis);
    }

    #[test]
    fn monocular_uses_head_view_directly() {
        let head = Mat4::from_rotation_x(0.2);
        let mono = EyeParams::new(Eye::Monocular, &EyeProjection::default(), head, 0.06);
        assert_eq!(mono.eye_view, head);
    }
}
