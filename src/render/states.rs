//! Per-(scene, camera) render state snapshots.
//!
//! A [`RenderStates`] is the frozen view of camera and scene settings the
//! draw loop reads, plus the [`LightingData`] the traversal fills. The
//! [`RenderCollection`] owns one states/queue pair per (scene id, camera id)
//! and evicts entries only on explicit request; there is no implicit
//! garbage collection.

use glam::{Mat4, Vec3, Vec4};
use rustc_hash::FxHashMap;

use crate::math::Frustum;
use crate::render::{LightingData, RenderQueue};
use crate::scene::{Camera, Scene, SceneData};

/// Frozen camera fields consumed during uniform upload.
#[derive(Debug, Clone)]
pub struct CameraSnapshot {
    pub id: u32,
    pub position: Vec3,
    pub view_matrix: Mat4,
    pub projection_matrix: Mat4,
    pub projection_view_matrix: Mat4,
    pub frustum: Frustum,
    pub rect: Vec4,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraSnapshot {
    fn default() -> Self {
        Self {
            id: 0,
            position: Vec3::ZERO,
            view_matrix: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
            projection_view_matrix: Mat4::IDENTITY,
            frustum: Frustum::default(),
            rect: Vec4::new(0.0, 0.0, 1.0, 1.0),
            near: 0.1,
            far: 1000.0,
        }
    }
}

#[derive(Debug, Default)]
pub struct RenderStates {
    pub camera: CameraSnapshot,
    pub scene: SceneData,
    pub lighting: LightingData,
}

impl RenderStates {
    /// Refresh the camera/scene snapshots. Lighting is refreshed separately
    /// by the scene traversal.
    pub fn update(&mut self, scene: &Scene, camera: &Camera) {
        self.camera = CameraSnapshot {
            id: camera.id,
            position: camera.position(),
            view_matrix: camera.view_matrix,
            projection_matrix: camera.projection_matrix,
            projection_view_matrix: camera.projection_view_matrix,
            frustum: camera.frustum,
            rect: camera.rect,
            near: camera.near,
            far: camera.far,
        };
        self.scene = scene.data.clone();
    }
}

/// Owner of per-(scene, camera) states and queues.
#[derive(Default)]
pub struct RenderCollection {
    states: FxHashMap<(u32, u32), RenderStates>,
    queues: FxHashMap<(u32, u32), RenderQueue>,
}

impl RenderCollection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Both halves of the pair for one (scene, camera), created on first use.
    pub fn entry(&mut self, scene_id: u32, camera_id: u32) -> (&mut RenderStates, &mut RenderQueue) {
        let key = (scene_id, camera_id);
        (
            self.states.entry(key).or_default(),
            self.queues.entry(key).or_default(),
        )
    }

    #[must_use]
    pub fn states(&self, scene_id: u32, camera_id: u32) -> Option<&RenderStates> {
        self.states.get(&(scene_id, camera_id))
    }

    #[must_use]
    pub fn queue(&self, scene_id: u32, camera_id: u32) -> Option<&RenderQueue> {
        self.queues.get(&(scene_id, camera_id))
    }

    /// Remove the pair for one (scene, camera) so the caller can hold it
    /// across the draw loop; return it with [`RenderCollection::put_back`].
    /// Missing entries come back default-initialized.
    pub fn take(&mut self, scene_id: u32, camera_id: u32) -> (RenderStates, RenderQueue) {
        let key = (scene_id, camera_id);
        (
            self.states.remove(&key).unwrap_or_default(),
            self.queues.remove(&key).unwrap_or_default(),
        )
    }

    pub fn put_back(
        &mut self,
        scene_id: u32,
        camera_id: u32,
        states: RenderStates,
        queue: RenderQueue,
    ) {
        let key = (scene_id, camera_id);
        self.states.insert(key, states);
        self.queues.insert(key, queue);
    }

    /// Drop every entry touching `scene_id`. Call when a scene is discarded.
    pub fn evict_scene(&mut self, scene_id: u32) {
        self.states.retain(|&(s, _), _| s != scene_id);
        self.queues.retain(|&(s, _), _| s != scene_id);
    }

    /// Drop every entry touching `camera_id`. Call when a camera is discarded.
    pub fn evict_camera(&mut self, camera_id: u32) {
        self.states.retain(|&(_, c), _| c != camera_id);
        self.queues.retain(|&(_, c), _| c != camera_id);
    }

    pub fn clear(&mut self) {
        self.states.clear();
        self.queues.clear();
    }
}
