use crate::error::ViewError;
use crate::eye::EyeParams;
use crate::observer::{DeviceGeometryObserver, ObserverId, ObserverRegistry};
use crate::planner::{ProjectionConfig, ProjectionPlanner};
use crate::viewport::Viewport;
use cardboard_config::{
    validate_clip_planes, ConfigError, DeviceGeometry, HeadMountedDisplay, RenderSettings,
    ScreenGeometry,
};
use cardboard_tracking::{HeadTracker, HeadTransform, TrackingError};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Render callbacks, invoked on the render thread.
pub trait StereoRenderer {
    /// Size of one eye's drawable area (half the surface width in stereo).
    fn on_surface_changed(&mut self, _width: i32, _height: i32) {}

    fn on_new_frame(&mut self, head: &HeadTransform);

    /// Called once per eye, left before right.
    fn on_draw_eye(&mut self, eye: &EyeParams);

    /// Called last, with the full-screen viewport.
    fn on_finish_frame(&mut self, _viewport: &Viewport) {}

    fn on_renderer_shutdown(&mut self) {}
}

/// Everything the view renders with, apart from the head pose.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewSettings {
    pub hmd: HeadMountedDisplay,
    pub render: RenderSettings,
}

impl ViewSettings {
    pub fn new(hmd: HeadMountedDisplay, render: RenderSettings) -> Self {
        Self { hmd, render }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.hmd.device.validate()?;
        self.hmd.screen.validate()?;
        self.render.validate()
    }

    fn projection_config(&self) -> ProjectionConfig {
        ProjectionConfig::new(self.hmd.clone(), &self.render)
    }
}

/// A change queued by a [`ViewController`], applied at the next frame.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigUpdate {
    Device(DeviceGeometry),
    Screen(ScreenGeometry),
    ClipPlanes { z_near: f32, z_far: f32 },
    DistortionCorrection(bool),
    DistortionScale(f32),
    VrMode(bool),
    /// Whole settings snapshot, applied in one step.
    Settings(Box<ViewSettings>),
}

/// Control-side handle to a [`StereoView`].
///
/// Setters validate immediately, ignore changes that leave the settings as
/// they are, and queue the rest for the render thread. Cheap to clone and
/// usable from any thread.
#[derive(Clone)]
pub struct ViewController {
    updates: mpsc::UnboundedSender<ConfigUpdate>,
    /// What the view will render with once the queue is drained.
    settings: Arc<Mutex<ViewSettings>>,
    observers: Arc<Mutex<ObserverRegistry>>,
}

impl ViewController {
    pub fn settings(&self) -> ViewSettings {
        self.settings.lock().clone()
    }

    pub fn device_geometry(&self) -> DeviceGeometry {
        self.settings.lock().hmd.device.clone()
    }

    pub fn screen_geometry(&self) -> ScreenGeometry {
        self.settings.lock().hmd.screen.clone()
    }

    /// Replace the headset geometry and notify device observers.
    pub fn set_device_geometry(&self, device: DeviceGeometry) -> Result<(), ViewError> {
        let changed = self.submit(|settings| {
            settings.hmd.device = device.clone();
            ConfigUpdate::Device(device.clone())
        })?;
        if changed {
            self.notify_device_observers(&device);
        }
        Ok(())
    }

    /// Replace every setting at once, so the view never renders a mix of
    /// old and new values.
    pub fn set_settings(&self, settings: ViewSettings) -> Result<(), ViewError> {
        let device_changed = self.settings.lock().hmd.device != settings.hmd.device;
        let device = settings.hmd.device.clone();
        let changed = self.submit(|current| {
            *current = settings.clone();
            ConfigUpdate::Settings(Box::new(settings))
        })?;
        if changed && device_changed {
            self.notify_device_observers(&device);
        }
        Ok(())
    }

    pub fn set_screen_geometry(&self, screen: ScreenGeometry) -> Result<(), ViewError> {
        self.submit(|settings| {
            settings.hmd.screen = screen.clone();
            ConfigUpdate::Screen(screen)
        })?;
        Ok(())
    }

    pub fn set_interpupillary_distance(&self, distance: f32) -> Result<(), ViewError> {
        self.submit(|settings| {
            settings.hmd.device = settings.hmd.device.with_interpupillary_distance(distance);
            ConfigUpdate::Device(settings.hmd.device.clone())
        })?;
        Ok(())
    }

    /// Target vertical field of view in degrees.
    pub fn set_fov_y(&self, fov_y: f32) -> Result<(), ViewError> {
        self.submit(|settings| {
            settings.hmd.device = settings.hmd.device.with_fov_y(fov_y);
            ConfigUpdate::Device(settings.hmd.device.clone())
        })?;
        Ok(())
    }

    pub fn set_clip_planes(&self, z_near: f32, z_far: f32) -> Result<(), ViewError> {
        validate_clip_planes(z_near, z_far)?;
        self.submit(|settings| {
            settings.render.z_near = z_near;
            settings.render.z_far = z_far;
            ConfigUpdate::ClipPlanes { z_near, z_far }
        })?;
        Ok(())
    }

    pub fn set_distortion_correction(&self, enabled: bool) -> Result<(), ViewError> {
        self.submit(|settings| {
            settings.render.distortion_correction = enabled;
            ConfigUpdate::DistortionCorrection(enabled)
        })?;
        Ok(())
    }

    pub fn set_distortion_scale(&self, scale: f32) -> Result<(), ViewError> {
        self.submit(|settings| {
            settings.render.distortion_scale = scale;
            ConfigUpdate::DistortionScale(scale)
        })?;
        Ok(())
    }

    pub fn set_vr_mode(&self, enabled: bool) -> Result<(), ViewError> {
        self.submit(|settings| {
            settings.render.vr_mode = enabled;
            ConfigUpdate::VrMode(enabled)
        })?;
        Ok(())
    }

    pub fn add_device_geometry_observer(&self, observer: Arc<dyn DeviceGeometryObserver>) -> ObserverId {
        self.observers.lock().add(observer)
    }

    pub fn remove_device_geometry_observer(&self, id: ObserverId) -> bool {
        self.observers.lock().remove(id)
    }

    fn notify_device_observers(&self, device: &DeviceGeometry) {
        tracing::info!(
            vendor = %device.vendor,
            model = %device.model,
            "Device geometry updated"
        );
        let observers = self.observers.lock().snapshot();
        for observer in observers {
            observer.on_device_geometry_changed(device);
        }
    }

    /// Apply `change` to a copy of the settings and queue it if it changed
    /// anything. Returns whether an update was queued.
    fn submit(&self, change: impl FnOnce(&mut ViewSettings) -> ConfigUpdate) -> Result<bool, ViewError> {
        let mut settings = self.settings.lock();
        let mut next = settings.clone();
        let update = change(&mut next);
        if next == *settings {
            return Ok(false);
        }
        next.validate()?;

        tracing::debug!(?update, "Queueing view update");
        self.updates.send(update).map_err(|_| ViewError::Closed)?;
        *settings = next;
        Ok(true)
    }
}

/// Render-side driver: drains queued updates, recomputes projections when
/// needed and feeds one frame at a time to a [`StereoRenderer`].
pub struct StereoView {
    tracker: HeadTracker,
    planner: ProjectionPlanner,
    settings: ViewSettings,
    updates: mpsc::UnboundedReceiver<ConfigUpdate>,
    surface_valid: bool,
    shut_down: bool,
}

impl StereoView {
    pub fn new(tracker: HeadTracker, settings: ViewSettings) -> Result<(Self, ViewController), ViewError> {
        settings.validate()?;
        let (tx, rx) = mpsc::unbounded_channel();
        let controller = ViewController {
            updates: tx,
            settings: Arc::new(Mutex::new(settings.clone())),
            observers: Arc::new(Mutex::new(ObserverRegistry::default())),
        };
        let view = Self {
            tracker,
            planner: ProjectionPlanner::new(settings.projection_config()),
            settings,
            updates: rx,
            surface_valid: true,
            shut_down: false,
        };
        Ok((view, controller))
    }

    /// Start head tracking.
    pub fn resume(&mut self) -> Result<(), TrackingError> {
        self.tracker.start()
    }

    /// Stop head tracking. The last pose stays available.
    pub fn pause(&mut self) {
        self.tracker.stop();
    }

    pub fn tracker(&self) -> &HeadTracker {
        &self.tracker
    }

    pub fn planner(&self) -> &ProjectionPlanner {
        &self.planner
    }

    /// Settings the last frame was drawn with.
    pub fn settings(&self) -> &ViewSettings {
        &self.settings
    }

    pub fn is_rendering(&self) -> bool {
        self.surface_valid && !self.shut_down
    }

    /// Report the drawable surface size. Rendering pauses while it does not
    /// match the configured screen.
    pub fn surface_changed<R: StereoRenderer + ?Sized>(&mut self, renderer: &mut R, width: i32, height: i32) {
        if self.shut_down {
            return;
        }
        let screen = &self.settings.hmd.screen;
        if width != screen.width || height != screen.height {
            if self.surface_valid {
                tracing::warn!(
                    width,
                    height,
                    expected_width = screen.width,
                    expected_height = screen.height,
                    "Surface size does not match the screen; rendering is disabled"
                );
            }
            self.surface_valid = false;
        } else {
            self.surface_valid = true;
        }

        if self.settings.render.vr_mode {
            renderer.on_surface_changed(width / 2, height);
        } else {
            renderer.on_surface_changed(width, height);
        }
    }

    /// Draw one frame: apply queued updates, then hand the head pose and
    /// each eye to `renderer`.
    pub fn draw_frame<R: StereoRenderer + ?Sized>(&mut self, renderer: &mut R) {
        if self.shut_down {
            return;
        }

        let pending = self.drain_updates(renderer);
        self.planner.apply(pending);
        if !self.surface_valid {
            return;
        }

        let head = self.tracker.last_head_view();
        let eyes = self
            .planner
            .eye_params(&head, self.settings.render.distortion_scale);

        renderer.on_new_frame(&head);
        for eye in eyes.eyes() {
            renderer.on_draw_eye(eye);
        }
        renderer.on_finish_frame(&self.planner.layout().monocular.viewport);
    }

    /// Stop tracking and tell the renderer, once. Later frames do nothing.
    pub fn shutdown<R: StereoRenderer + ?Sized>(&mut self, renderer: &mut R) {
        if self.shut_down {
            return;
        }
        self.tracker.stop();
        self.shut_down = true;
        renderer.on_renderer_shutdown();
        tracing::info!("Stereo view shut down");
    }

    fn drain_updates<R: StereoRenderer + ?Sized>(&mut self, renderer: &mut R) -> Option<ProjectionConfig> {
        let mut drained = 0usize;
        let mut vr_mode_toggled = false;

        while let Ok(update) = self.updates.try_recv() {
            drained += 1;
            let render = &mut self.settings.render;
            match update {
                ConfigUpdate::Device(device) => self.settings.hmd.device = device,
                ConfigUpdate::Screen(screen) => self.settings.hmd.screen = screen,
                ConfigUpdate::ClipPlanes { z_near, z_far } => {
                    render.z_near = z_near;
                    render.z_far = z_far;
                }
                ConfigUpdate::DistortionCorrection(enabled) => render.distortion_correction = enabled,
                ConfigUpdate::DistortionScale(scale) => render.distortion_scale = scale,
                ConfigUpdate::VrMode(enabled) => {
                    if render.vr_mode != enabled {
                        render.vr_mode = enabled;
                        vr_mode_toggled = !vr_mode_toggled;
                    }
                }
                ConfigUpdate::Settings(settings) => {
                    if render.vr_mode != settings.render.vr_mode {
                        vr_mode_toggled = !vr_mode_toggled;
                    }
                    self.settings = *settings;
                }
            }
        }

        if drained == 0 {
            return None;
        }
        tracing::trace!(drained, "Applied queued view updates");

        if vr_mode_toggled {
            let (width, height) = (self.settings.hmd.screen.width, self.settings.hmd.screen.height);
            self.surface_changed(renderer, width, height);
        }
        Some(self.settings.projection_config())
    }
}
