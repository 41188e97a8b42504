//! Scene graph: nodes, cameras, lights, skeletons.
//!
//! Nodes live in a slotmap arena; parent links are plain keys (never a second
//! owner), children lists are the owning edges. The per-frame traversal that
//! feeds the render queue lives in [`Scene::update_render_queue`].

mod camera;
mod light;
mod node;
mod scene;
mod skeleton;
mod transform;

pub use camera::Camera;
pub use light::{Light, LightKind, LightShadow, ShadowType};
pub use node::{Mesh, Node};
pub use scene::{Fog, FogKind, Scene, SceneData};
pub use skeleton::Skeleton;
pub use transform::Transform;

use slotmap::new_key_type;

new_key_type! {
    pub struct NodeKey;
    pub struct SkeletonKey;
}
