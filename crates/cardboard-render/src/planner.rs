use crate::distortion::Distortion;
use crate::eye::{Eye, EyeParams, EyeProjection};
use crate::fov::FieldOfView;
use crate::viewport::Viewport;
use cardboard_config::{HeadMountedDisplay, RenderSettings};
use cardboard_tracking::HeadTransform;

/// Inputs that invalidate the projection layout when they change.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionConfig {
    pub hmd: HeadMountedDisplay,
    pub vr_mode: bool,
    pub distortion_correction: bool,
    pub z_near: f32,
    pub z_far: f32,
}

impl ProjectionConfig {
    pub fn new(hmd: HeadMountedDisplay, render: &RenderSettings) -> Self {
        Self {
            hmd,
            vr_mode: render.vr_mode,
            distortion_correction: render.distortion_correction,
            z_near: render.z_near,
            z_far: render.z_far,
        }
    }
}

/// Per-eye projections for one configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProjectionLayout {
    /// Full-screen view: drawn in monocular mode, and the frame's final viewport.
    pub monocular: EyeProjection,
    pub left: EyeProjection,
    pub right: EyeProjection,
}

/// Eyes to draw this frame, in draw order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EyeSet {
    Monocular(EyeParams),
    Stereo([EyeParams; 2]),
}

impl EyeSet {
    pub fn eyes(&self) -> &[EyeParams] {
        match self {
            EyeSet::Monocular(eye) => std::slice::from_ref(eye),
            EyeSet::Stereo(pair) => pair,
        }
    }
}

/// Turns headset and screen geometry into per-eye frusta and viewports.
///
/// The layout is cached and only recomputed when [`apply`](Self::apply) is
/// handed a configuration that differs from the current one.
pub struct ProjectionPlanner {
    config: ProjectionConfig,
    layout: ProjectionLayout,
    recomputations: u64,
}

impl ProjectionPlanner {
    pub fn new(config: ProjectionConfig) -> Self {
        let layout = compute_layout(&config);
        Self {
            config,
            layout,
            recomputations: 1,
        }
    }

    /// Adopt `pending` if present and different, then return the layout.
    pub fn apply(&mut self, pending: Option<ProjectionConfig>) -> &ProjectionLayout {
        if let Some(config) = pending {
            if config != self.config {
                self.layout = compute_layout(&config);
                self.config = config;
                self.recomputations += 1;
                tracing::debug!(
                    vr_mode = self.config.vr_mode,
                    distortion_correction = self.config.distortion_correction,
                    left = ?self.layout.left.fov,
                    "Projection layout recomputed"
                );
            }
        }
        &self.layout
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    pub fn layout(&self) -> &ProjectionLayout {
        &self.layout
    }

    /// Number of layout computations so far, including the initial one.
    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }

    /// Combine the cached layout with this frame's head pose.
    ///
    /// `viewport_scale` shrinks or grows the stereo viewports while distortion
    /// correction is on. Projection matrices are never scaled.
    pub fn eye_params(&self, head: &HeadTransform, viewport_scale: f32) -> EyeSet {
        let head_view = head.head_view();
        let ipd = self.config.hmd.device.interpupillary_distance;

        if !self.config.vr_mode {
            return EyeSet::Monocular(EyeParams::new(
                Eye::Monocular,
                &self.layout.monocular,
                head_view,
                ipd,
            ));
        }

        let mut left = EyeParams::new(Eye::Left, &self.layout.left, head_view, ipd);
        let mut right = EyeParams::new(Eye::Right, &self.layout.right, head_view, ipd);
        if self.config.distortion_correction && viewport_scale != 1.0 {
            left.viewport = left.viewport.scaled(viewport_scale);
            right.viewport = right.viewport.scaled(viewport_scale);
        }
        EyeSet::Stereo([left, right])
    }
}

fn compute_layout(config: &ProjectionConfig) -> ProjectionLayout {
    let screen = &config.hmd.screen;
    let (width, height) = (screen.width, screen.height);

    let monocular_viewport = Viewport::new(0, 0, width, height);
    let mut layout = ProjectionLayout {
        monocular: EyeProjection {
            viewport: monocular_viewport,
            ..EyeProjection::default()
        },
        ..ProjectionLayout::default()
    };

    if !config.vr_mode {
        let aspect = width as f32 / height as f32;
        let fov = FieldOfView::symmetric(config.hmd.device.fov_y, aspect);
        layout.monocular.fov = fov;
        layout.monocular.perspective = fov.to_perspective(config.z_near, config.z_far);
        return layout;
    }

    let left_fov = if config.distortion_correction {
        distorted_left_eye_fov(&config.hmd)
    } else {
        undistorted_left_eye_fov(&config.hmd)
    };
    let right_fov = left_fov.mirrored();

    let half = width / 2;
    layout.left = EyeProjection {
        fov: left_fov,
        perspective: left_fov.to_perspective(config.z_near, config.z_far),
        viewport: Viewport::new(0, 0, half, height),
    };
    layout.right = EyeProjection {
        fov: right_fov,
        perspective: right_fov.to_perspective(config.z_near, config.z_far),
        viewport: Viewport::new(half, 0, width - half, height),
    };
    layout
}

/// Widest half-angle the lens can show, from its radius and the eye relief.
pub fn ideal_fov_angle(hmd: &HeadMountedDisplay) -> f32 {
    let device = &hmd.device;
    (device.lens_diameter * 0.5)
        .atan2(device.eye_to_lens_distance)
        .to_degrees()
}

/// Screen extents around the left lens centre, in meters:
/// (outer, inner, bottom, top).
fn lens_offsets(hmd: &HeadMountedDisplay) -> (f32, f32, f32, f32) {
    let device = &hmd.device;
    let screen = &hmd.screen;
    let half_ipd = device.interpupillary_distance * 0.5;
    let outer = (screen.width_meters() - device.interpupillary_distance) * 0.5;
    let bottom = device.vertical_distance_to_lens_center - screen.border_size_meters;
    let top = screen.height_meters() + screen.border_size_meters
        - device.vertical_distance_to_lens_center;
    (outer, half_ipd, bottom, top)
}

/// Left-eye field of view as seen through the lens, each angle capped at
/// the lens's ideal bound.
fn distorted_left_eye_fov(hmd: &HeadMountedDisplay) -> FieldOfView {
    let device = &hmd.device;
    let distortion = Distortion::new(device.distortion_coefficients);
    let ideal = ideal_fov_angle(hmd);
    let eye_to_screen = device.eye_to_lens_distance + device.screen_to_lens_distance;
    let angle = |distance: f32| {
        distortion
            .distort(distance)
            .atan2(eye_to_screen)
            .to_degrees()
            .min(ideal)
    };

    let (outer, inner, bottom, top) = lens_offsets(hmd);
    FieldOfView::new(angle(outer), angle(inner), angle(bottom), angle(top))
}

/// Left-eye field of view of a plain pinhole placed so the visible viewport
/// spans the target vertical field of view.
fn undistorted_left_eye_fov(hmd: &HeadMountedDisplay) -> FieldOfView {
    let device = &hmd.device;
    let screen = &hmd.screen;
    let eye_to_screen =
        device.visible_viewport_size * 0.5 / (device.fov_y * 0.5).to_radians().tan();
    let angle = |distance: f32| distance.atan2(eye_to_screen).to_degrees();

    let half_ipd = device.interpupillary_distance * 0.5;
    let (_, _, bottom, top) = lens_offsets(hmd);
    FieldOfView::new(
        angle(screen.width_meters() * 0.5 - half_ipd),
        angle(half_ipd),
        angle(bottom),
        angle(top),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardboard_config::{DeviceGeometry, ScreenGeometry};
    use cardboard_tracking::math::is_orthonormal;
    use glam::{Mat4, Vec3};

    fn reference_hmd() -> HeadMountedDisplay {
        HeadMountedDisplay::new(
            ScreenGeometry::from_display_metrics(1280, 720, 320.0, 320.0),
            DeviceGeometry::default(),
        )
    }

    fn config(hmd: HeadMountedDisplay) -> ProjectionConfig {
        ProjectionConfig::new(hmd, &RenderSettings::default())
    }

    #[test]
    fn reference_headset_on_720p() {
        let planner = ProjectionPlanner::new(config(reference_hmd()));
        let layout = planner.layout();

        assert_eq!(layout.left.viewport, Viewport::new(0, 0, 640, 720));
        assert_eq!(layout.right.viewport, Viewport::new(640, 0, 640, 720));
        assert!(!layout.left.viewport.overlaps(&layout.right.viewport));

        let ideal = ideal_fov_angle(&reference_hmd());
        assert!((ideal - 48.652).abs() < 1e-2);

        let left = layout.left.fov;
        assert!((left.left - 25.839).abs() < 1e-2, "{left:?}");
        assert!((left.right - 38.342).abs() < 1e-2, "{left:?}");
        assert!((left.bottom - 41.098).abs() < 1e-2, "{left:?}");
        assert!((left.top - 31.687).abs() < 1e-2, "{left:?}");

        // Inner half-angles of both eyes together stay inside the lens bound.
        let inner_sum = layout.left.fov.right + layout.right.fov.left;
        assert!(inner_sum <= 2.0 * ideal);
        for angle in [left.left, left.right, left.bottom, left.top] {
            assert!(angle <= ideal);
        }
    }

    #[test]
    fn right_eye_mirrors_left_eye() {
        let layout = *ProjectionPlanner::new(config(reference_hmd())).layout();
        assert_eq!(layout.right.fov, layout.left.fov.mirrored());

        let mut undistorted = config(reference_hmd());
        undistorted.distortion_correction = false;
        let layout = *ProjectionPlanner::new(undistorted).layout();
        assert_eq!(layout.right.fov, layout.left.fov.mirrored());
    }

    #[test]
    fn viewports_tile_odd_widths() {
        let hmd = HeadMountedDisplay::new(
            ScreenGeometry::from_display_metrics(1281, 721, 320.0, 320.0),
            DeviceGeometry::default(),
        );
        let layout = *ProjectionPlanner::new(config(hmd)).layout();
        let (left, right) = (layout.left.viewport, layout.right.viewport);

        assert_eq!(left.x, 0);
        assert_eq!(left.right(), right.x);
        assert_eq!(right.right(), 1281);
        assert_eq!(left.area() + right.area(), 1281 * 721);
        assert!(!left.overlaps(&right));
    }

    #[test]
    fn small_lens_clamps_every_angle() {
        let mut hmd = reference_hmd();
        hmd.device.lens_diameter = 0.004;
        let ideal = ideal_fov_angle(&hmd);
        let layout = *ProjectionPlanner::new(config(hmd)).layout();

        let fov = layout.left.fov;
        for angle in [fov.left, fov.right, fov.bottom, fov.top] {
            assert_eq!(angle, ideal);
        }
    }

    #[test]
    fn undistorted_path_uses_target_fov() {
        let mut config = config(reference_hmd());
        config.distortion_correction = false;
        let layout = *ProjectionPlanner::new(config).layout();

        let fov = layout.left.fov;
        assert!((fov.left - 23.831).abs() < 1e-2, "{fov:?}");
        assert!((fov.right - 32.5).abs() < 1e-2, "{fov:?}");
        assert!((fov.bottom - 34.198).abs() < 1e-2, "{fov:?}");
        assert!((fov.top - 28.106).abs() < 1e-2, "{fov:?}");
        assert_eq!(layout.left.viewport, Viewport::new(0, 0, 640, 720));
    }

    #[test]
    fn monocular_mode_is_full_screen_and_symmetric() {
        let mut config = config(reference_hmd());
        config.vr_mode = false;
        let planner = ProjectionPlanner::new(config);
        let layout = planner.layout();

        assert_eq!(layout.monocular.viewport, Viewport::new(0, 0, 1280, 720));
        let expected = Mat4::perspective_rh_gl(65f32.to_radians(), 1280.0 / 720.0, 0.1, 100.0);
        assert!(layout.monocular.perspective.abs_diff_eq(expected, 1e-4));

        let head = HeadTransform::from_head_view(Mat4::from_rotation_y(0.5));
        match planner.eye_params(&head, 0.5) {
            EyeSet::Monocular(eye) => {
                assert_eq!(eye.eye, Eye::Monocular);
                assert_eq!(eye.eye_view, head.head_view());
                assert_eq!(eye.viewport, Viewport::new(0, 0, 1280, 720));
            }
            other => panic!("expected a single eye, got {other:?}"),
        }
    }

    #[test]
    fn stereo_eye_views_straddle_the_head() {
        let planner = ProjectionPlanner::new(config(reference_hmd()));
        let head = HeadTransform::from_head_view(Mat4::from_rotation_y(0.3));
        let eyes = planner.eye_params(&head, 1.0);
        let [left, right] = eyes.eyes() else {
            panic!("expected two eyes");
        };

        assert_eq!(left.eye, Eye::Left);
        assert_eq!(right.eye, Eye::Right);
        assert!(left.eye_view.w_axis.truncate().abs_diff_eq(Vec3::new(0.03, 0.0, 0.0), 1e-6));
        assert!(right.eye_view.w_axis.truncate().abs_diff_eq(Vec3::new(-0.03, 0.0, 0.0), 1e-6));
        assert!(is_orthonormal(&left.eye_view, 1e-5));
    }

    #[test]
    fn scale_touches_viewports_not_matrices() {
        let planner = ProjectionPlanner::new(config(reference_hmd()));
        let head = HeadTransform::default();
        let full = planner.eye_params(&head, 1.0);
        let half = planner.eye_params(&head, 0.5);

        assert_eq!(half.eyes()[0].viewport, Viewport::new(0, 0, 320, 360));
        assert_eq!(half.eyes()[1].viewport, Viewport::new(320, 0, 320, 360));
        assert_eq!(half.eyes()[1].perspective, full.eyes()[1].perspective);

        // Without distortion correction there is no intermediate target to scale.
        let mut undistorted = config(reference_hmd());
        undistorted.distortion_correction = false;
        let planner = ProjectionPlanner::new(undistorted);
        assert_eq!(
            planner.eye_params(&head, 0.5).eyes()[1].viewport,
            Viewport::new(640, 0, 640, 720)
        );
    }

    #[test]
    fn recomputes_only_on_change() {
        let mut planner = ProjectionPlanner::new(config(reference_hmd()));
        planner.apply(None);
        planner.apply(Some(config(reference_hmd())));
        assert_eq!(planner.recomputations(), 1);

        let mut narrower = config(reference_hmd());
        narrower.hmd.device = narrower.hmd.device.with_interpupillary_distance(0.058);
        let before = planner.layout().left.fov;
        let after = planner.apply(Some(narrower)).left.fov;
        assert_eq!(planner.recomputations(), 2);
        assert_ne!(before, after);
    }
}
