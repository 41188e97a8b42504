use glam::{Mat3, Mat4, Quat, Vec3};

use crate::errors::{PrismError, Result};

/// Compose a TRS matrix from position, rotation and scale.
#[must_use]
pub fn compose(position: Vec3, rotation: Quat, scale: Vec3) -> Mat4 {
    Mat4::from_scale_rotation_translation(scale, rotation, position)
}

/// Decompose a TRS matrix back into position, rotation and scale.
///
/// Mirrored transforms (negative determinant) are recovered with a negative
/// scale on the X axis, matching the convention used by [`compose`] callers:
/// `decompose(compose(p, q, s))` round-trips including the reflection sign.
#[must_use]
pub fn decompose(matrix: &Mat4) -> (Vec3, Quat, Vec3) {
    let position = matrix.w_axis.truncate();

    let mut sx = matrix.x_axis.truncate().length();
    let sy = matrix.y_axis.truncate().length();
    let sz = matrix.z_axis.truncate().length();

    // A negative determinant means one axis is reflected; fold it into X.
    if matrix.determinant() < 0.0 {
        sx = -sx;
    }

    let inv_sx = if sx != 0.0 { 1.0 / sx } else { 0.0 };
    let inv_sy = if sy != 0.0 { 1.0 / sy } else { 0.0 };
    let inv_sz = if sz != 0.0 { 1.0 / sz } else { 0.0 };

    let rotation_matrix = Mat3::from_cols(
        matrix.x_axis.truncate() * inv_sx,
        matrix.y_axis.truncate() * inv_sy,
        matrix.z_axis.truncate() * inv_sz,
    );
    let rotation = Quat::from_mat3(&rotation_matrix).normalize();

    (position, rotation, Vec3::new(sx, sy, sz))
}

/// Invert a matrix, reporting singular matrices instead of producing NaNs.
///
/// Callers that must keep rendering fall back to `Mat4::IDENTITY` on error.
pub fn try_inverse(matrix: &Mat4) -> Result<Mat4> {
    if matrix.determinant().abs() <= f32::EPSILON {
        return Err(PrismError::SingularMatrix);
    }
    Ok(matrix.inverse())
}
