use cardboard_render::{Eye, EyeParams, StereoRenderer, Viewport};
use cardboard_tracking::HeadTransform;

/// Stand-in renderer that reports what a real one would be asked to draw.
#[derive(Default)]
pub struct LoggingRenderer {
    frame_count: u64,
    /// Per-eye surface size from the last `on_surface_changed`.
    eye_size: (i32, i32),
}

impl LoggingRenderer {
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

impl StereoRenderer for LoggingRenderer {
    fn on_surface_changed(&mut self, width: i32, height: i32) {
        self.eye_size = (width, height);
        tracing::info!(width, height, "Eye surface size");
    }

    fn on_new_frame(&mut self, head: &HeadTransform) {
        self.frame_count += 1;
        if self.frame_count % 300 == 0 {
            let angles = head.euler_angles();
            tracing::info!(
                frames = self.frame_count,
                pitch = angles.pitch.to_degrees(),
                yaw = angles.yaw.to_degrees(),
                roll = angles.roll.to_degrees(),
                "Render heartbeat"
            );
        }
    }

    fn on_draw_eye(&mut self, eye: &EyeParams) {
        if self.frame_count == 1 {
            tracing::info!(
                eye = ?eye.eye,
                viewport = ?eye.viewport,
                fov = ?eye.fov,
                "First frame eye layout"
            );
        }
        if eye.eye != Eye::Monocular && (eye.viewport.width, eye.viewport.height) != self.eye_size {
            tracing::trace!(viewport = ?eye.viewport, surface = ?self.eye_size, "Eye drawn into a scaled target");
        }
    }

    fn on_finish_frame(&mut self, viewport: &Viewport) {
        tracing::trace!(?viewport, frame = self.frame_count, "Frame finished");
    }

    fn on_renderer_shutdown(&mut self) {
        tracing::info!(frames = self.frame_count, "Renderer shut down");
    }
}
