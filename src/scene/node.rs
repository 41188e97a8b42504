use std::sync::atomic::{AtomicU32, Ordering};

use smallvec::SmallVec;

use crate::resources::{GeometryKey, MaterialKey};
use crate::scene::{Light, NodeKey, ShadowType, SkeletonKey, Transform};

static NEXT_NODE_ID: AtomicU32 = AtomicU32::new(1);

/// Renderable payload of a node.
///
/// `materials` pairs with the geometry's groups: group `i` draws with
/// `materials[geometry.groups[i].material_index]`. A single material with no
/// groups draws the whole geometry.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub geometry: GeometryKey,
    pub materials: SmallVec<[MaterialKey; 1]>,
    pub skeleton: Option<SkeletonKey>,
    /// One weight per morph target; all zero means morphing is inactive.
    pub morph_influences: Vec<f32>,
}

impl Mesh {
    #[must_use]
    pub fn new(geometry: GeometryKey, material: MaterialKey) -> Self {
        Self {
            geometry,
            materials: SmallVec::from_elem(material, 1),
            skeleton: None,
            morph_influences: Vec::new(),
        }
    }
}

/// A scene-graph node. Plain hierarchy node by default; attaching a `mesh`
/// makes it drawable, attaching a `light` makes it a light source.
#[derive(Debug, Clone)]
pub struct Node {
    /// Monotonic identity; the final sort tie-break key.
    pub id: u32,
    pub name: String,
    pub transform: Transform,

    pub parent: Option<NodeKey>,
    pub children: Vec<NodeKey>,

    pub visible: bool,
    pub frustum_culled: bool,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    pub shadow_type: ShadowType,

    /// Primary sort key within a queue layer; lower draws first.
    pub render_order: i32,
    pub render_layer: u8,

    pub mesh: Option<Mesh>,
    pub light: Option<Light>,
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}

impl Node {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed),
            name: String::new(),
            transform: Transform::default(),
            parent: None,
            children: Vec::new(),
            visible: true,
            frustum_culled: true,
            cast_shadow: false,
            receive_shadow: false,
            shadow_type: ShadowType::default(),
            render_order: 0,
            render_layer: 0,
            mesh: None,
            light: None,
        }
    }

    #[must_use]
    pub fn with_mesh(mesh: Mesh) -> Self {
        let mut node = Self::new();
        node.mesh = Some(mesh);
        node
    }

    #[must_use]
    pub fn with_light(light: Light) -> Self {
        let mut node = Self::new();
        node.light = Some(light);
        node
    }
}
