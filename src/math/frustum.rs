use glam::{Mat4, Vec3, Vec4};

use super::BoundingSphere;

/// View frustum as six normalized plane equations.
///
/// Planes are stored as `Vec4(nx, ny, nz, d)` with inward-facing normals, so
/// a point is inside when `dot(n, p) + d >= 0` for every plane.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Frustum {
    planes: [Vec4; 6], // left, right, bottom, top, near, far
}

impl Frustum {
    /// Extract planes from a projection-view matrix (Gribb-Hartmann).
    #[must_use]
    pub fn from_matrix(m: Mat4) -> Self {
        let rows = [m.row(0), m.row(1), m.row(2), m.row(3)];

        let mut planes = [
            rows[3] + rows[0], // left
            rows[3] - rows[0], // right
            rows[3] + rows[1], // bottom
            rows[3] - rows[1], // top
            rows[3] + rows[2], // near
            rows[3] - rows[2], // far
        ];

        for plane in &mut planes {
            let length = plane.truncate().length();
            if length > 0.0 {
                *plane /= length;
            }
        }

        Self { planes }
    }

    /// Sphere-frustum intersection test. Returns `true` when the sphere is
    /// fully inside or intersects any plane, `false` only when it lies
    /// entirely on the outside of at least one plane.
    #[must_use]
    pub fn intersects_sphere(&self, sphere: &BoundingSphere) -> bool {
        for plane in &self.planes {
            let distance = plane.truncate().dot(sphere.center) + plane.w;
            if distance < -sphere.radius {
                return false;
            }
        }
        true
    }

    /// Point containment test.
    #[must_use]
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.truncate().dot(point) + plane.w >= 0.0)
    }
}
