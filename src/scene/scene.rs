use std::sync::atomic::{AtomicU32, Ordering};

use glam::{Mat4, Vec4};
use rustc_hash::FxHashSet;
use slotmap::SlotMap;

use crate::render::{LightingData, RenderQueue};
use crate::resources::{Resources, TexelEncoding};
use crate::scene::{Camera, Node, NodeKey, Skeleton, SkeletonKey};

static NEXT_SCENE_ID: AtomicU32 = AtomicU32::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FogKind {
    Linear,
    Exp2,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fog {
    pub kind: FogKind,
    pub color: glam::Vec3,
    /// Linear fog range; ignored for `Exp2`.
    pub near: f32,
    pub far: f32,
    /// Exp2 falloff; ignored for `Linear`.
    pub density: f32,
}

impl Fog {
    #[must_use]
    pub fn linear(color: glam::Vec3, near: f32, far: f32) -> Self {
        Self {
            kind: FogKind::Linear,
            color,
            near,
            far,
            density: 0.0,
        }
    }

    #[must_use]
    pub fn exp2(color: glam::Vec3, density: f32) -> Self {
        Self {
            kind: FogKind::Exp2,
            color,
            near: 0.0,
            far: 0.0,
            density,
        }
    }
}

/// Scene-wide rendering inputs that feed program derivation and uniform
/// upload.
#[derive(Debug, Clone)]
pub struct SceneData {
    pub fog: Option<Fog>,
    /// Global clipping planes; a material's own `clipping_planes` takes
    /// precedence.
    pub clipping_planes: Vec<Vec4>,
    /// Re-bases lighting and shadow math near this transform to dodge
    /// float precision loss far from the origin. `None` means identity.
    pub anchor_matrix: Option<Mat4>,
    pub output_encoding: TexelEncoding,
    pub gamma_factor: f32,
    pub logarithmic_depth: bool,
    /// Forces the Poisson path even where hardware shadow samplers exist.
    pub disable_shadow_sampler: bool,
}

impl Default for SceneData {
    fn default() -> Self {
        Self {
            fog: None,
            clipping_planes: Vec::new(),
            anchor_matrix: None,
            output_encoding: TexelEncoding::Linear,
            gamma_factor: 2.0,
            logarithmic_depth: false,
            disable_shadow_sampler: false,
        }
    }
}

impl SceneData {
    /// Inverse of the anchor matrix, or `None` when anchoring is off or the
    /// anchor is singular (treated as identity).
    #[must_use]
    pub fn anchor_matrix_inverse(&self) -> Option<Mat4> {
        self.anchor_matrix
            .and_then(|m| crate::math::try_inverse(&m).ok())
    }
}

/// The node arena plus scene-wide render settings.
///
/// Parent links are plain keys; `roots` and each node's `children` list are
/// the owning edges. Removal detaches the whole subtree.
#[derive(Debug)]
pub struct Scene {
    pub id: u32,
    nodes: SlotMap<NodeKey, Node>,
    roots: Vec<NodeKey>,
    pub skeletons: SlotMap<SkeletonKey, Skeleton>,
    pub data: SceneData,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed),
            nodes: SlotMap::with_key(),
            roots: Vec::new(),
            skeletons: SlotMap::with_key(),
            data: SceneData::default(),
        }
    }

    pub fn add_node(&mut self, node: Node) -> NodeKey {
        let key = self.nodes.insert(node);
        self.roots.push(key);
        key
    }

    /// Logs an error and leaves the graph untouched if `parent` is gone.
    pub fn add_child(&mut self, parent: NodeKey, node: Node) -> Option<NodeKey> {
        if !self.nodes.contains_key(parent) {
            log::error!("add_child: parent node no longer exists");
            return None;
        }
        let key = self.nodes.insert(node);
        self.nodes[key].parent = Some(parent);
        self.nodes[parent].children.push(key);
        Some(key)
    }

    /// Detach and drop `key` and its whole subtree. Removing a node that is
    /// already gone is a logged no-op.
    pub fn remove_node(&mut self, key: NodeKey) {
        let Some(node) = self.nodes.get(key) else {
            log::error!("remove_node: node already removed");
            return;
        };
        match node.parent {
            Some(parent) => {
                if let Some(parent) = self.nodes.get_mut(parent) {
                    parent.children.retain(|&c| c != key);
                }
            }
            None => self.roots.retain(|&r| r != key),
        }
        let mut stack = vec![key];
        while let Some(k) = stack.pop() {
            if let Some(node) = self.nodes.remove(k) {
                stack.extend(node.children);
            }
        }
    }

    #[must_use]
    pub fn node(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    pub fn node_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
        self.nodes.get_mut(key)
    }

    #[must_use]
    pub fn nodes(&self) -> &SlotMap<NodeKey, Node> {
        &self.nodes
    }

    pub fn add_skeleton(&mut self, skeleton: Skeleton) -> SkeletonKey {
        self.skeletons.insert(skeleton)
    }

    /// Whether `key` and every ancestor up to its root are visible, i.e.
    /// whether the render traversal reaches this node at all.
    #[must_use]
    pub fn subtree_visible(&self, key: NodeKey) -> bool {
        let mut current = Some(key);
        while let Some(k) = current {
            let Some(node) = self.nodes.get(k) else {
                return false;
            };
            if !node.visible {
                return false;
            }
            current = node.parent;
        }
        true
    }

    /// Propagate local TRS down the hierarchy into every node's
    /// `world_matrix`. Call once per frame before any render traversal.
    pub fn update_matrix_world(&mut self) {
        let mut stack: Vec<(NodeKey, Mat4)> = self
            .roots
            .iter()
            .map(|&k| (k, Mat4::IDENTITY))
            .collect();
        while let Some((key, parent_world)) = stack.pop() {
            let Some(node) = self.nodes.get_mut(key) else {
                continue;
            };
            let world = parent_world * node.transform.local_matrix();
            node.transform.world_matrix = world;
            stack.extend(node.children.iter().map(|&c| (c, world)));
        }
    }

    /// One traversal per (scene, camera, frame): frustum-culls drawables into
    /// `queue`, collects lights into `lighting`, and updates each referenced
    /// skeleton's bone palette at most once.
    ///
    /// Culling is per-node, never subtree-pruning: children of a culled node
    /// are still visited, since a child's bounds can extend past its
    /// parent's. Invisible nodes prune their whole subtree.
    ///
    /// The camera's frustum must already be current; a stale one is a caller
    /// bug, not a checked condition.
    pub fn update_render_queue(
        &mut self,
        camera: &Camera,
        resources: &Resources,
        queue: &mut RenderQueue,
        lighting: &mut LightingData,
        collect_lights: bool,
        update_skeletons: bool,
    ) {
        queue.begin();
        lighting.begin();

        let mut light_keys: Vec<NodeKey> = Vec::new();
        let mut touched_skeletons: FxHashSet<SkeletonKey> = FxHashSet::default();

        let mut stack: Vec<NodeKey> = self.roots.clone();
        while let Some(key) = stack.pop() {
            let Some(node) = self.nodes.get(key) else {
                continue;
            };
            if !node.visible {
                continue;
            }
            stack.extend_from_slice(&node.children);

            if collect_lights && node.light.is_some() {
                light_keys.push(key);
            }

            let Some(mesh) = &node.mesh else { continue };
            if mesh.materials.is_empty() {
                continue;
            }
            let Some(geometry) = resources.geometries.get(mesh.geometry) else {
                continue;
            };

            if node.frustum_culled && camera.frustum_culled {
                if let Some(sphere) = geometry.bounding_sphere() {
                    let world_sphere = sphere.transform(&node.transform.world_matrix);
                    if !camera.frustum.intersects_sphere(&world_sphere) {
                        continue;
                    }
                }
            }

            if update_skeletons {
                if let Some(skeleton) = mesh.skeleton {
                    touched_skeletons.insert(skeleton);
                }
            }

            // Camera-space depth: project the world position and divide.
            let clip = camera.projection_view_matrix
                * node.transform.world_position().extend(1.0);
            let depth = if clip.w.abs() > 1e-12 { clip.z / clip.w } else { clip.z };

            queue.push(node, key, geometry, depth, resources);
        }

        // Lights mutate their shadow cameras, so they run after the
        // immutable walk.
        for key in light_keys {
            let Some(node) = self.nodes.get_mut(key) else {
                continue;
            };
            let world = node.transform.world_matrix;
            if let Some(light) = node.light.as_mut() {
                if light.cast_shadow {
                    let kind = light.kind.clone();
                    if let Some(shadow) = light.shadow.as_mut() {
                        shadow.update(&kind, &world);
                    }
                }
                lighting.push(light, &world);
            }
        }

        lighting.end(&self.data);
        queue.end();

        for key in touched_skeletons {
            if let Some(skeleton) = self.skeletons.get_mut(key) {
                skeleton.update(&self.nodes);
            }
        }
    }
}
