use glam::Mat4;
use slotmap::SlotMap;

use crate::scene::{Node, NodeKey};

/// A bone hierarchy flattened for upload.
///
/// `bone_matrices` holds `bones.len()` column-major mat4s; consumers pick
/// uniform-array or float-texture upload based on bone count and driver
/// capabilities. The version counter gates re-upload.
#[derive(Debug, Clone)]
pub struct Skeleton {
    pub bones: Vec<NodeKey>,
    pub inverse_bind_matrices: Vec<Mat4>,
    bone_matrices: Vec<f32>,
    version: u64,
}

impl Skeleton {
    #[must_use]
    pub fn new(bones: Vec<NodeKey>, inverse_bind_matrices: Vec<Mat4>) -> Self {
        debug_assert_eq!(bones.len(), inverse_bind_matrices.len());
        let bone_matrices = vec![0.0; bones.len() * 16];
        Self {
            bones,
            inverse_bind_matrices,
            bone_matrices,
            version: 0,
        }
    }

    #[must_use]
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    #[must_use]
    pub fn bone_matrices(&self) -> &[f32] {
        &self.bone_matrices
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Recompute the flattened palette from current bone world matrices.
    /// Bones whose node has been removed contribute the identity.
    pub fn update(&mut self, nodes: &SlotMap<NodeKey, Node>) {
        for (i, (&bone, inverse_bind)) in
            self.bones.iter().zip(&self.inverse_bind_matrices).enumerate()
        {
            let world = nodes
                .get(bone)
                .map_or(Mat4::IDENTITY, |node| node.transform.world_matrix);
            let palette = world * *inverse_bind;
            self.bone_matrices[i * 16..(i + 1) * 16]
                .copy_from_slice(&palette.to_cols_array());
        }
        self.version = self.version.wrapping_add(1);
    }
}
