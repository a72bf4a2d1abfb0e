//! Small matrix helpers on top of `glam`.

use glam::{Mat3, Mat4};
use std::f32::consts::FRAC_PI_2;

/// Copy `values` into caller-provided storage starting at `offset`.
///
/// # Panics
///
/// Panics if `out` cannot hold `values.len()` elements from `offset`.
pub fn write_into<T: Copy>(out: &mut [T], offset: usize, values: &[T]) {
    let end = offset.checked_add(values.len());
    assert!(
        end.is_some_and(|end| end <= out.len()),
        "not enough space to write the result: {} values at offset {} into a buffer of {}",
        values.len(),
        offset,
        out.len()
    );
    out[offset..offset + values.len()].copy_from_slice(values);
}

/// Realigns the tracker's Z-up world with the display's Y-up, -Z-forward world.
pub fn frame_correction() -> Mat4 {
    Mat4::from_rotation_x(FRAC_PI_2)
}

/// Whether the upper 3x3 block of `m` is a proper rotation (no skew, no scale).
pub fn is_orthonormal(m: &Mat4, eps: f32) -> bool {
    let r = Mat3::from_mat4(*m);
    (r.transpose() * r).abs_diff_eq(Mat3::IDENTITY, eps) && (r.determinant() - 1.0).abs() < eps
}
