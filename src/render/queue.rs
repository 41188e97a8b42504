//! Per-layer drawable buckets with the dual sorting policy.
//!
//! Opaque draws front-to-back (early-Z rejection, batched by material);
//! transparent draws back-to-front (blending is order-dependent). The two
//! comparators and their tie-break chains are the correctness core of this
//! module; see the invariant tests in `tests/queue.rs`.

use std::cmp::Ordering;

use crate::resources::{Geometry, GeometryGroup, GeometryKey, MaterialKey, Resources};
use crate::scene::{Node, NodeKey};

/// One pending draw call: a (node, geometry, material, depth) tuple, plus the
/// optional geometry-group sub-range for multi-material meshes.
///
/// Drawables live one frame and are pooled by their layer; never hold one
/// across `begin()`.
#[derive(Debug, Clone)]
pub struct Drawable {
    pub node: NodeKey,
    /// Node identity, the final sort tie-break.
    pub object_id: u32,
    pub geometry: GeometryKey,
    pub material: MaterialKey,
    /// Material identity, the opaque batching key.
    pub material_id: u32,
    pub group: Option<GeometryGroup>,
    /// Camera-space depth (projected z after divide).
    pub depth: f32,
    pub render_order: i32,
}

fn opaque_cmp(a: &Drawable, b: &Drawable) -> Ordering {
    a.render_order
        .cmp(&b.render_order)
        .then_with(|| a.material_id.cmp(&b.material_id))
        .then_with(|| a.depth.total_cmp(&b.depth))
        .then_with(|| a.object_id.cmp(&b.object_id))
}

fn transparent_cmp(a: &Drawable, b: &Drawable) -> Ordering {
    a.render_order
        .cmp(&b.render_order)
        .then_with(|| b.depth.total_cmp(&a.depth))
        .then_with(|| a.material_id.cmp(&b.material_id))
        .then_with(|| a.object_id.cmp(&b.object_id))
}

/// One layer's opaque and transparent lists.
///
/// During population the logical lengths are the `*_count` counters and slots
/// are overwritten in place to reuse last frame's allocations; the vectors
/// only agree with the counters after [`RenderQueueLayer::end`] truncates
/// them.
#[derive(Debug, Default)]
pub struct RenderQueueLayer {
    pub id: u8,
    pub opaque: Vec<Drawable>,
    pub transparent: Vec<Drawable>,
    opaque_count: usize,
    transparent_count: usize,
}

impl RenderQueueLayer {
    #[must_use]
    pub fn new(id: u8) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    pub fn begin(&mut self) {
        self.opaque_count = 0;
        self.transparent_count = 0;
    }

    fn push_into(list: &mut Vec<Drawable>, count: &mut usize, drawable: Drawable) {
        if *count < list.len() {
            list[*count] = drawable;
        } else {
            list.push(drawable);
        }
        *count += 1;
    }

    pub fn push_opaque(&mut self, drawable: Drawable) {
        Self::push_into(&mut self.opaque, &mut self.opaque_count, drawable);
    }

    pub fn push_transparent(&mut self, drawable: Drawable) {
        Self::push_into(&mut self.transparent, &mut self.transparent_count, drawable);
    }

    /// Truncate the pooled lists to this frame's counts and sort both.
    pub fn end(&mut self) {
        self.opaque.truncate(self.opaque_count);
        self.transparent.truncate(self.transparent_count);
        self.opaque.sort_by(opaque_cmp);
        self.transparent.sort_by(transparent_cmp);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.opaque.is_empty() && self.transparent.is_empty()
    }
}

/// Layers keyed by id, kept in ascending-id order for deterministic
/// iteration. One instance exists per (scene, camera) pair, owned by the
/// renderer's [`super::RenderCollection`].
#[derive(Debug, Default)]
pub struct RenderQueue {
    layers: Vec<RenderQueueLayer>,
}

impl RenderQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) {
        for layer in &mut self.layers {
            layer.begin();
        }
    }

    pub fn end(&mut self) {
        for layer in &mut self.layers {
            layer.end();
        }
    }

    /// Layer for `id`, created on first use at its sorted position.
    pub fn layer_mut(&mut self, id: u8) -> &mut RenderQueueLayer {
        match self.layers.binary_search_by_key(&id, |l| l.id) {
            Ok(i) => &mut self.layers[i],
            Err(i) => {
                self.layers.insert(i, RenderQueueLayer::new(id));
                &mut self.layers[i]
            }
        }
    }

    pub fn layers(&self) -> impl Iterator<Item = &RenderQueueLayer> {
        self.layers.iter()
    }

    /// Append one drawable per resolved material for `node`'s mesh.
    ///
    /// Multi-material meshes walk `geometry.groups` in lock-step with the
    /// material list; a group whose material slot is missing (out of range or
    /// removed from the pool) is skipped rather than erroring.
    pub fn push(
        &mut self,
        node: &Node,
        key: NodeKey,
        geometry: &Geometry,
        depth: f32,
        resources: &Resources,
    ) {
        let Some(mesh) = &node.mesh else { return };
        let layer = self.layer_mut(node.render_layer);

        let mut enqueue = |material: MaterialKey, group: Option<GeometryGroup>| {
            let Some(mat) = resources.materials.get(material) else {
                return;
            };
            let drawable = Drawable {
                node: key,
                object_id: node.id,
                geometry: mesh.geometry,
                material,
                material_id: mat.id,
                group,
                depth,
                render_order: node.render_order,
            };
            if mat.transparent {
                layer.push_transparent(drawable);
            } else {
                layer.push_opaque(drawable);
            }
        };

        if geometry.groups.is_empty() || mesh.materials.len() <= 1 {
            if let Some(&material) = mesh.materials.first() {
                enqueue(material, None);
            }
        } else {
            for group in &geometry.groups {
                let Some(&material) = mesh.materials.get(group.material_index as usize) else {
                    continue;
                };
                enqueue(material, Some(*group));
            }
        }
    }
}
