use glam::{Mat4, Quat, Vec3};

use crate::math::compose;

/// Local TRS plus the cached world matrix.
#[derive(Debug, Clone)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    /// Updated by the scene's matrix pass; read-only for everyone else.
    pub world_matrix: Mat4,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            world_matrix: Mat4::IDENTITY,
        }
    }
}

impl Transform {
    #[must_use]
    pub fn local_matrix(&self) -> Mat4 {
        compose(self.position, self.rotation, self.scale)
    }

    #[must_use]
    pub fn world_position(&self) -> Vec3 {
        self.world_matrix.w_axis.truncate()
    }
}
