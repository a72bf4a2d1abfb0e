use crate::error::DistortionError;

/// Secant iterations allowed before `distort_inverse` gives up.
pub const MAX_INVERSE_ITERATIONS: u32 = 32;

/// Successive estimates closer than this end the inverse iteration.
const INVERSE_TOLERANCE: f64 = 1.0e-4;

/// Radial lens distortion `r' = r * (1 + c0 r^2 + c1 r^4)`, radii in meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Distortion {
    coefficients: [f32; 2],
}

impl Default for Distortion {
    fn default() -> Self {
        Self::new([250.0, 50000.0])
    }
}

impl Distortion {
    pub fn new(coefficients: [f32; 2]) -> Self {
        Self { coefficients }
    }

    pub fn coefficients(&self) -> [f32; 2] {
        self.coefficients
    }

    pub fn distortion_factor(&self, radius: f32) -> f32 {
        self.factor(radius as f64) as f32
    }

    pub fn distort(&self, radius: f32) -> f32 {
        self.forward(radius as f64) as f32
    }

    /// Undistorted radius mapping onto `radius`, or the best estimate on failure.
    pub fn distort_inverse(&self, radius: f32) -> f32 {
        match self.try_distort_inverse(radius) {
            Ok(r) => r,
            Err(DistortionError::NoConvergence {
                radius,
                best_estimate,
                iterations,
            }) => {
                tracing::warn!(
                    radius,
                    best_estimate,
                    iterations,
                    coefficients = ?self.coefficients,
                    "Inverse distortion did not converge"
                );
                best_estimate
            }
        }
    }

    /// Secant search seeded at `radius / 0.9` and `radius * 0.9`.
    pub fn try_distort_inverse(&self, radius: f32) -> Result<f32, DistortionError> {
        let target = radius as f64;
        let mut r0 = target / 0.9;
        let mut r1 = target * 0.9;
        let mut dr0 = target - self.forward(r0);

        let mut iterations = 0;
        while (r1 - r0).abs() > INVERSE_TOLERANCE {
            if iterations == MAX_INVERSE_ITERATIONS {
                return Err(DistortionError::NoConvergence {
                    radius,
                    best_estimate: r1 as f32,
                    iterations,
                });
            }
            iterations += 1;

            let dr1 = target - self.forward(r1);
            let slope = dr1 - dr0;
            if slope == 0.0 {
                // Flat secant: no better step exists.
                break;
            }
            let r2 = r1 - dr1 * ((r1 - r0) / slope);
            if !r2.is_finite() {
                return Err(DistortionError::NoConvergence {
                    radius,
                    best_estimate: r1 as f32,
                    iterations,
                });
            }
            r0 = r1;
            r1 = r2;
            dr0 = dr1;
        }
        Ok(r1 as f32)
    }

    fn factor(&self, radius: f64) -> f64 {
        let [c0, c1] = self.coefficients.map(f64::from);
        let r2 = radius * radius;
        1.0 + c0 * r2 + c1 * r2 * r2
    }

    fn forward(&self, radius: f64) -> f64 {
        radius * self.factor(radius)
    }
}
