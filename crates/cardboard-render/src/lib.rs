//! Stereo projection for a phone-in-headset viewer: lens distortion, per-eye
//! frusta and viewports, and the per-frame driver that feeds a renderer.

pub mod distortion;
pub mod error;
pub mod eye;
pub mod fov;
pub mod observer;
pub mod planner;
pub mod view;
pub mod viewport;

pub use distortion::{Distortion, MAX_INVERSE_ITERATIONS};
pub use error::{DistortionError, ViewError};
pub use eye::{Eye, EyeParams, EyeProjection};
pub use fov::{frustum, FieldOfView};
pub use observer::{DeviceGeometryObserver, ObserverId, ObserverRegistry};
pub use planner::{EyeSet, ProjectionConfig, ProjectionLayout, ProjectionPlanner};
pub use view::{ConfigUpdate, StereoRenderer, StereoView, ViewController, ViewSettings};
pub use viewport::Viewport;
