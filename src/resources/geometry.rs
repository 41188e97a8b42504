//! Vertex geometry: attribute buffers, index data, draw groups and morph
//! targets.
//!
//! Attribute payloads carry their own version counter; the driver buffer
//! cache re-uploads an attribute only when its version moved past the
//! mirrored one. Adding or removing attributes bumps the geometry *layout*
//! version, which invalidates cached vertex array objects.

use glam::Vec3;
use rustc_hash::FxHashMap;

use crate::math::{BoundingBox, BoundingSphere};

/// One vertex attribute stream (`f32` components).
#[derive(Debug, Clone)]
pub struct Attribute {
    data: Vec<f32>,
    size: u8,
    pub normalized: bool,
    /// Per-instance step rate; 0 means per-vertex.
    pub divisor: u32,
    version: u64,
}

impl Attribute {
    #[must_use]
    pub fn new(data: Vec<f32>, size: u8) -> Self {
        debug_assert!(size >= 1 && size <= 4);
        Self {
            data,
            size,
            normalized: false,
            divisor: 0,
            version: 0,
        }
    }

    #[must_use]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Number of vertices covered by this stream.
    #[must_use]
    pub fn count(&self) -> u32 {
        (self.data.len() / self.size as usize) as u32
    }

    #[must_use]
    pub fn size(&self) -> u8 {
        self.size
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Replace the payload and advance the version so the GPU mirror is
    /// refreshed on next bind.
    pub fn set_data(&mut self, data: Vec<f32>) {
        self.data = data;
        self.version = self.version.wrapping_add(1);
    }

    /// Mutate the payload in place; advances the version.
    pub fn data_mut(&mut self) -> &mut Vec<f32> {
        self.version = self.version.wrapping_add(1);
        &mut self.data
    }
}

/// Index stream.
#[derive(Debug, Clone)]
pub struct IndexAttribute {
    data: Vec<u32>,
    version: u64,
}

impl IndexAttribute {
    #[must_use]
    pub fn new(data: Vec<u32>) -> Self {
        Self { data, version: 0 }
    }

    #[must_use]
    pub fn data(&self) -> &[u32] {
        &self.data
    }

    #[must_use]
    pub fn count(&self) -> u32 {
        self.data.len() as u32
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn set_data(&mut self, data: Vec<u32>) {
        self.data = data;
        self.version = self.version.wrapping_add(1);
    }
}

/// Sub-range of the geometry drawn with one material slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryGroup {
    pub start: u32,
    pub count: u32,
    /// Index into the mesh's material list.
    pub material_index: u32,
}

#[derive(Debug, Clone, Default)]
pub struct Geometry {
    attributes: FxHashMap<String, Attribute>,
    index: Option<IndexAttribute>,
    pub groups: Vec<GeometryGroup>,

    /// When set, every draw of this geometry is instanced.
    pub instance_count: Option<u32>,

    pub morph_positions: Vec<Attribute>,
    pub morph_normals: Vec<Attribute>,

    bounding_box: Option<BoundingBox>,
    bounding_sphere: Option<BoundingSphere>,

    layout_version: u64,
}

impl Geometry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, attribute: Attribute) {
        self.attributes.insert(name.into(), attribute);
        self.layout_version = self.layout_version.wrapping_add(1);
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<Attribute> {
        let removed = self.attributes.remove(name);
        if removed.is_some() {
            self.layout_version = self.layout_version.wrapping_add(1);
        }
        removed
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn attribute_mut(&mut self, name: &str) -> Option<&mut Attribute> {
        self.attributes.get_mut(name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Attribute)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn set_index(&mut self, index: Option<IndexAttribute>) {
        self.index = index;
        self.layout_version = self.layout_version.wrapping_add(1);
    }

    #[must_use]
    pub fn index(&self) -> Option<&IndexAttribute> {
        self.index.as_ref()
    }

    /// Version of the attribute *layout* (not payloads). Used as the VAO
    /// invalidation key.
    #[must_use]
    pub fn layout_version(&self) -> u64 {
        self.layout_version
    }

    /// Vertex count of the `position` stream, or 0.
    #[must_use]
    pub fn vertex_count(&self) -> u32 {
        self.attribute("position").map_or(0, Attribute::count)
    }

    /// Draw range in elements: index count when indexed, else vertex count.
    #[must_use]
    pub fn draw_count(&self) -> u32 {
        self.index
            .as_ref()
            .map_or_else(|| self.vertex_count(), IndexAttribute::count)
    }

    // ── Bounding volumes ─────────────────────────────────────────────────────

    /// Recompute bounding box and sphere from the `position` attribute.
    ///
    /// Culling requires precomputed bounds; a geometry without them is
    /// treated as always visible.
    pub fn compute_bounds(&mut self) {
        let Some(position) = self.attributes.get("position") else {
            self.bounding_box = None;
            self.bounding_sphere = None;
            return;
        };
        let points: Vec<Vec3> = position
            .data()
            .chunks_exact(position.size() as usize)
            .map(|c| {
                // Streams narrower than vec3 (point sprites, 2D overlays)
                // zero-fill the missing components.
                Vec3::new(
                    c[0],
                    c.get(1).copied().unwrap_or(0.0),
                    c.get(2).copied().unwrap_or(0.0),
                )
            })
            .collect();
        self.bounding_box = Some(BoundingBox::from_points(points.iter().copied()));
        self.bounding_sphere = Some(BoundingSphere::from_points(&points));
    }

    #[must_use]
    pub fn bounding_box(&self) -> Option<&BoundingBox> {
        self.bounding_box.as_ref()
    }

    #[must_use]
    pub fn bounding_sphere(&self) -> Option<&BoundingSphere> {
        self.bounding_sphere.as_ref()
    }
}
