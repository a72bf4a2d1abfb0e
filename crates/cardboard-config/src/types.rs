use crate::error::{finite, positive, ConfigError};
use serde::{Deserialize, Serialize};

/// Meters per inch, for converting display DPI into pixel pitch.
pub const METERS_PER_INCH: f32 = 0.0254;

/// Largest lens-space radius (meters) the distortion polynomial is evaluated at.
pub const MAX_DISTORTION_RADIUS: f32 = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Headset (viewer) geometry. Replaced when a new viewer is detected.
    pub device: DeviceGeometry,
    /// Physical display. `None` means "ask the host display subsystem".
    pub screen: Option<ScreenGeometry>,
    /// Runtime render toggles.
    pub render: RenderSettings,
    /// Head tracker tuning.
    pub tracking: TrackingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            device: DeviceGeometry::default(),
            screen: None,
            render: RenderSettings::default(),
            tracking: TrackingConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.device.validate()?;
        if let Some(screen) = &self.screen {
            screen.validate()?;
        }
        self.render.validate()?;
        self.tracking.validate()
    }
}

/// Physical measurements of a headset, in meters unless noted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceGeometry {
    pub vendor: String,
    pub model: String,
    pub version: String,
    /// Distance between the two lens centres.
    pub interpupillary_distance: f32,
    /// Distance from the bottom of the viewer to the lens centres.
    pub vertical_distance_to_lens_center: f32,
    pub lens_diameter: f32,
    pub screen_to_lens_distance: f32,
    pub eye_to_lens_distance: f32,
    /// Visible width of one eye's viewport on the screen.
    pub visible_viewport_size: f32,
    /// Target vertical field of view in degrees.
    pub fov_y: f32,
    /// Radial distortion coefficients `[c0, c1]` of `1 + c0 r^2 + c1 r^4`.
    pub distortion_coefficients: [f32; 2],
}

impl Default for DeviceGeometry {
    fn default() -> Self {
        Self {
            vendor: "com.google".into(),
            model: "cardboard".into(),
            version: "1.0".into(),
            interpupillary_distance: 0.06,
            vertical_distance_to_lens_center: 0.035,
            lens_diameter: 0.025,
            screen_to_lens_distance: 0.037,
            eye_to_lens_distance: 0.011,
            visible_viewport_size: 0.06,
            fov_y: 65.0,
            distortion_coefficients: [250.0, 50000.0],
        }
    }
}

impl DeviceGeometry {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("interpupillary_distance", self.interpupillary_distance)?;
        finite(
            "vertical_distance_to_lens_center",
            self.vertical_distance_to_lens_center,
        )?;
        positive("lens_diameter", self.lens_diameter)?;
        positive("screen_to_lens_distance", self.screen_to_lens_distance)?;
        positive("eye_to_lens_distance", self.eye_to_lens_distance)?;
        positive("visible_viewport_size", self.visible_viewport_size)?;
        positive("fov_y", self.fov_y)?;
        if self.fov_y >= 180.0 {
            return Err(ConfigError::OutOfRange {
                field: "fov_y",
                value: self.fov_y,
                max: 180.0,
            });
        }

        let [c0, c1] = self.distortion_coefficients;
        finite("distortion_coefficients[0]", c0)?;
        finite("distortion_coefficients[1]", c1)?;
        if !distortion_is_monotonic(c0, c1, MAX_DISTORTION_RADIUS) {
            return Err(ConfigError::NonMonotonicDistortion {
                c0,
                c1,
                max_radius: MAX_DISTORTION_RADIUS,
            });
        }
        Ok(())
    }

    /// Copy of this geometry with a different interpupillary distance.
    pub fn with_interpupillary_distance(&self, distance: f32) -> Self {
        Self {
            interpupillary_distance: distance,
            ..self.clone()
        }
    }

    /// Copy of this geometry with a different vertical field of view.
    pub fn with_fov_y(&self, fov_y: f32) -> Self {
        Self {
            fov_y,
            ..self.clone()
        }
    }
}

/// `r * (1 + c0 r^2 + c1 r^4)` is strictly increasing on `[0, max_radius]`.
///
/// The derivative is `g(s) = 1 + 3 c0 s + 5 c1 s^2` with `s = r^2`, a quadratic,
/// so checking the interval ends and the vertex is enough.
fn distortion_is_monotonic(c0: f32, c1: f32, max_radius: f32) -> bool {
    let (c0, c1) = (c0 as f64, c1 as f64);
    let s_max = (max_radius as f64).powi(2);
    let g = |s: f64| 1.0 + 3.0 * c0 * s + 5.0 * c1 * s * s;

    if g(s_max) <= 0.0 {
        return false;
    }
    if c1 > 0.0 {
        let vertex = -3.0 * c0 / (10.0 * c1);
        if vertex > 0.0 && vertex < s_max && g(vertex) <= 0.0 {
            return false;
        }
    }
    true
}

/// Physical display measurements. Always stored in landscape orientation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenGeometry {
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
    pub x_meters_per_pixel: f32,
    pub y_meters_per_pixel: f32,
    /// Size of the bezel below the visible area, in meters.
    pub border_size_meters: f32,
}

impl ScreenGeometry {
    pub const DEFAULT_BORDER_SIZE_METERS: f32 = 0.003;

    /// Build from pixel size and dots-per-inch as reported by a display.
    ///
    /// Portrait metrics are rotated so that `width >= height`.
    pub fn from_display_metrics(width: i32, height: i32, xdpi: f32, ydpi: f32) -> Self {
        let mut screen = Self {
            width,
            height,
            x_meters_per_pixel: METERS_PER_INCH / xdpi,
            y_meters_per_pixel: METERS_PER_INCH / ydpi,
            border_size_meters: Self::DEFAULT_BORDER_SIZE_METERS,
        };
        if screen.height > screen.width {
            std::mem::swap(&mut screen.width, &mut screen.height);
            std::mem::swap(&mut screen.x_meters_per_pixel, &mut screen.y_meters_per_pixel);
        }
        screen
    }

    pub fn width_meters(&self) -> f32 {
        self.width as f32 * self.x_meters_per_pixel
    }

    pub fn height_meters(&self) -> f32 {
        self.height as f32 * self.y_meters_per_pixel
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width < 1 || self.height < 1 {
            return Err(ConfigError::EmptyScreen {
                width: self.width,
                height: self.height,
            });
        }
        positive("x_meters_per_pixel", self.x_meters_per_pixel)?;
        positive("y_meters_per_pixel", self.y_meters_per_pixel)?;
        finite("border_size_meters", self.border_size_meters)
    }
}

impl Default for ScreenGeometry {
    /// A 1920x1080 phone panel at 440 dpi.
    fn default() -> Self {
        Self::from_display_metrics(1920, 1080, 440.0, 440.0)
    }
}

/// Screen and headset snapshot consumed together by the projection planner.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HeadMountedDisplay {
    pub screen: ScreenGeometry,
    pub device: DeviceGeometry,
}

impl HeadMountedDisplay {
    pub fn new(screen: ScreenGeometry, device: DeviceGeometry) -> Self {
        Self { screen, device }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Stereo (true) or single full-screen view (false).
    pub vr_mode: bool,
    /// Whether the renderer runs a lens distortion correction pass.
    pub distortion_correction: bool,
    /// Resolution scale of the eye viewports while distortion correction is on.
    pub distortion_scale: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            vr_mode: true,
            distortion_correction: true,
            distortion_scale: 1.0,
            z_near: 0.1,
            z_far: 100.0,
        }
    }
}

impl RenderSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("distortion_scale", self.distortion_scale)?;
        validate_clip_planes(self.z_near, self.z_far)
    }
}

pub fn validate_clip_planes(z_near: f32, z_far: f32) -> Result<(), ConfigError> {
    if z_near.is_finite() && z_far.is_finite() && z_near > 0.0 && z_far > z_near {
        Ok(())
    } else {
        Err(ConfigError::InvalidClipPlanes {
            near: z_near,
            far: z_far,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Expected sensor-to-photon latency the head pose is predicted over.
    pub prediction_horizon_ms: f32,
    /// Upper bound on the total prediction (latency + time since last gyro sample).
    pub max_prediction_ms: f32,
    /// Gyro sample intervals are clamped to this to survive clock resets.
    pub max_gyro_dt_ms: f32,
    /// Tilt variance growth per second of gyro integration (rad^2/s).
    pub gyro_noise: f32,
    /// Tilt variance of a single accelerometer reading (rad^2).
    pub accel_noise: f32,
    /// Bounds on the per-sample accelerometer correction weight.
    pub min_accel_gain: f32,
    pub max_accel_gain: f32,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            prediction_horizon_ms: 1000.0 / 30.0,
            max_prediction_ms: 100.0,
            max_gyro_dt_ms: 40.0,
            gyro_noise: 0.01,
            accel_noise: 0.5,
            min_accel_gain: 0.005,
            max_accel_gain: 0.5,
        }
    }
}

impl TrackingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        finite("prediction_horizon_ms", self.prediction_horizon_ms)?;
        positive("max_prediction_ms", self.max_prediction_ms)?;
        positive("max_gyro_dt_ms", self.max_gyro_dt_ms)?;
        positive("gyro_noise", self.gyro_noise)?;
        positive("accel_noise", self.accel_noise)?;
        positive("min_accel_gain", self.min_accel_gain)?;
        positive("max_accel_gain", self.max_accel_gain)?;
        if self.min_accel_gain > self.max_accel_gain || self.max_accel_gain > 1.0 {
            return Err(ConfigError::InvalidGainBounds {
                min: self.min_accel_gain,
                max: self.max_accel_gain,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_headset_matches_reference_viewer() {
        let device = DeviceGeometry::default();
        assert_eq!(device.interpupillary_distance, 0.06);
        assert_eq!(device.fov_y, 65.0);
        assert_eq!(device.distortion_coefficients, [250.0, 50000.0]);
        assert!(device.validate().is_ok());
    }

    #[test]
    fn portrait_metrics_are_rotated_to_landscape() {
        let screen = ScreenGeometry::from_display_metrics(720, 1280, 300.0, 320.0);
        assert_eq!((screen.width, screen.height), (1280, 720));
        // Per-axis densities follow the swap.
        assert!((screen.x_meters_per_pixel - METERS_PER_INCH / 320.0).abs() < 1e-9);
        assert!((screen.y_meters_per_pixel - METERS_PER_INCH / 300.0).abs() < 1e-9);
    }

    #[test]
    fn screen_size_in_meters() {
        let screen = ScreenGeometry::from_display_metrics(1280, 720, 320.0, 320.0);
        assert!((screen.width_meters() - 0.1016).abs() < 1e-5);
        assert!((screen.height_meters() - 0.05715).abs() < 1e-5);
    }

    #[test]
    fn rejects_non_monotonic_distortion() {
        let device = DeviceGeometry {
            distortion_coefficients: [-400.0, 0.0],
            ..DeviceGeometry::default()
        };
        assert!(matches!(
            device.validate(),
            Err(ConfigError::NonMonotonicDistortion { .. })
        ));
    }

    #[test]
    fn rejects_non_finite_geometry() {
        let device = DeviceGeometry {
            lens_diameter: f32::NAN,
            ..DeviceGeometry::default()
        };
        assert!(device.validate().is_err());

        let device = DeviceGeometry {
            distortion_coefficients: [f32::INFINITY, 0.0],
            ..DeviceGeometry::default()
        };
        assert!(device.validate().is_err());
    }

    #[test]
    fn clip_planes_must_be_ordered() {
        assert!(validate_clip_planes(0.1, 100.0).is_ok());
        assert!(validate_clip_planes(1.0, 0.5).is_err());
        assert!(validate_clip_planes(0.0, 10.0).is_err());
    }

    #[test]
    fn copy_on_write_helpers_leave_original_untouched() {
        let device = DeviceGeometry::default();
        let wider = device.with_interpupillary_distance(0.064);
        assert_eq!(device.interpupillary_distance, 0.06);
        assert_eq!(wider.interpupillary_distance, 0.064);
        assert_eq!(wider.fov_y, device.fov_y);
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = AppConfig {
            screen: Some(ScreenGeometry::from_display_metrics(1280, 720, 320.0, 320.0)),
            ..AppConfig::default()
        };
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let parsed: AppConfig = toml::from_str("[render]\nvr_mode = false\n").unwrap();
        assert!(!parsed.render.vr_mode);
        assert_eq!(parsed.render.z_far, 100.0);
        assert_eq!(parsed.device, DeviceGeometry::default());
    }
}
