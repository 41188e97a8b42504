//! The renderer: driver owner and frame orchestrator.
//!
//! One `Renderer` wraps one driver plus every driver-scoped cache (state
//! mirror, buffers, textures, render targets, VAOs, programs) and the
//! per-(scene, camera) render collection. `render` is the frame entry point:
//! world matrices, shadow maps, queue construction, then the sorted draw
//! loop. Resource teardown goes through the `dispose_*` hooks so the caches
//! can evict their driver mirrors.

use log::error;
use rustc_hash::FxHashMap;

use crate::gl::{
    BufferCache, Capabilities, ClearMask, GlDriver, ProgramId, RenderTargetCache, StateCache,
    TextureCache, VertexArrayCache,
};
use crate::render::pass::{BoneTextureEntry, MaterialProperties};
use crate::render::shadow::ShadowMapPass;
use crate::render::{RenderCollection, RenderInfo};
use crate::resources::{GeometryKey, MaterialKey, RenderTargetKey, Resources, TextureKey};
use crate::scene::{Camera, Scene, SkeletonKey};
use crate::shader::ProgramCache;

pub struct Renderer<D: GlDriver> {
    pub(crate) driver: D,
    pub(crate) capabilities: Capabilities,

    pub(crate) state: StateCache,
    pub(crate) buffers: BufferCache,
    pub(crate) textures: TextureCache,
    pub(crate) render_targets: RenderTargetCache,
    pub(crate) vaos: VertexArrayCache,
    pub(crate) programs: ProgramCache,

    pub(crate) material_props: FxHashMap<MaterialKey, MaterialProperties>,
    pub(crate) bone_textures: FxHashMap<SkeletonKey, BoneTextureEntry>,
    pub(crate) collection: RenderCollection,
    pub(crate) shadow: ShadowMapPass,

    /// Draw call / primitive counters, reset at the start of every frame.
    pub info: RenderInfo,
    pub clear_color: [f32; 4],
    /// Buffers cleared automatically at the start of the main pass.
    pub auto_clear: ClearMask,
    /// Master toggle for the shadow map pass.
    pub shadows_enabled: bool,

    width: u32,
    height: u32,
}

impl<D: GlDriver> Renderer<D> {
    #[must_use]
    pub fn new(driver: D, width: u32, height: u32) -> Self {
        let capabilities = driver.capabilities();
        Self {
            state: StateCache::new(capabilities.max_textures),
            capabilities,
            driver,
            buffers: BufferCache::new(),
            textures: TextureCache::new(),
            render_targets: RenderTargetCache::new(),
            vaos: VertexArrayCache::new(),
            programs: ProgramCache::new(),
            material_props: FxHashMap::default(),
            bone_textures: FxHashMap::default(),
            collection: RenderCollection::new(),
            shadow: ShadowMapPass::default(),
            info: RenderInfo::default(),
            clear_color: [0.0, 0.0, 0.0, 1.0],
            auto_clear: ClearMask::COLOR | ClearMask::DEPTH | ClearMask::STENCIL,
            shadows_enabled: true,
            width,
            height,
        }
    }

    /// Render one frame of `scene` from `camera` into the default
    /// framebuffer.
    ///
    /// The camera's matrices must be current (see
    /// [`Camera::update_matrices`]). Per-drawable failures are logged and
    /// skipped; the frame always completes.
    pub fn render(&mut self, scene: &mut Scene, camera: &Camera, resources: &mut Resources) {
        self.info.reset();
        scene.update_matrix_world();

        // Shadow maps first, so the main traversal's lighting arrays pick up
        // freshly allocated targets.
        if self.shadows_enabled {
            self.render_shadows(scene, resources);
        }

        let (mut states, mut queue) = self.collection.take(scene.id, camera.id);
        states.update(scene, camera);
        scene.update_render_queue(
            camera,
            resources,
            &mut queue,
            &mut states.lighting,
            true,
            true,
        );

        {
            let Self { driver, state, .. } = self;
            let driver: &mut dyn GlDriver = driver;
            state.bind_framebuffer(driver, None);
            state.set_viewport(driver, viewport_rect(&states.camera.rect, self.width, self.height));
            if !self.auto_clear.is_empty() {
                state.set_clear_color(driver, self.clear_color);
                state.set_depth_mask(driver, true);
                state.set_color_mask(driver, [true; 4]);
                state.clear(driver, self.auto_clear);
            }
        }

        for layer in queue.layers() {
            for drawable in layer.opaque.iter().chain(layer.transparent.iter()) {
                if let Err(e) = self.draw_drawable(scene, &states, resources, drawable, None) {
                    error!("draw skipped: {e}");
                }
            }
        }

        self.collection.put_back(scene.id, camera.id, states, queue);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[must_use]
    pub fn driver(&self) -> &D {
        &self.driver
    }

    #[must_use]
    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// The shared program pool (variant count, refcount inspection).
    #[must_use]
    pub fn programs(&self) -> &ProgramCache {
        &self.programs
    }

    /// The per-(scene, camera) states/queues (introspection and eviction).
    #[must_use]
    pub fn collection(&self) -> &RenderCollection {
        &self.collection
    }

    pub fn collection_mut(&mut self) -> &mut RenderCollection {
        &mut self.collection
    }

    /// Program currently snapshot for `material`, if any.
    #[must_use]
    pub fn material_program(&self, material: MaterialKey) -> Option<ProgramId> {
        self.material_props.get(&material).and_then(|p| p.program)
    }

    /// Forget all mirrored driver state (external code touched the context).
    pub fn reset_state(&mut self) {
        self.state.reset();
    }

    // ── Resource teardown ────────────────────────────────────────────────────

    /// Call after removing a geometry from the pool: deletes its buffers and
    /// every VAO built over them.
    pub fn dispose_geometry(&mut self, key: GeometryKey) {
        let Self {
            driver,
            state,
            buffers,
            vaos,
            ..
        } = self;
        let driver: &mut dyn GlDriver = driver;
        vaos.dispose_geometry(driver, state, key);
        buffers.dispose_geometry(driver, state, key);
    }

    /// Call after removing a texture from the pool.
    pub fn dispose_texture(&mut self, key: TextureKey) {
        let Self {
            driver,
            state,
            textures,
            ..
        } = self;
        textures.dispose(&mut *driver, state, key);
    }

    /// Call after removing a render target from the pool. The color texture
    /// is a pool resource with its own `dispose_texture` call.
    pub fn dispose_render_target(&mut self, key: RenderTargetKey) {
        let Self {
            driver,
            state,
            render_targets,
            ..
        } = self;
        render_targets.dispose(&mut *driver, state, key);
    }

    /// Call after removing a material from the pool: releases its program
    /// reference.
    pub fn dispose_material(&mut self, key: MaterialKey) {
        if let Some(entry) = self.material_props.remove(&key) {
            if let Some(program) = entry.program {
                self.programs.release(&mut self.driver, program);
            }
        }
    }

    /// Call after removing a skeleton: deletes its bone palette texture.
    pub fn dispose_skeleton(&mut self, key: SkeletonKey) {
        if let Some(entry) = self.bone_textures.remove(&key) {
            self.state.forget_texture(entry.handle);
            self.driver.delete_texture(entry.handle);
        }
    }
}

/// Pixel viewport from the camera's normalized sub-rectangle.
fn viewport_rect(rect: &glam::Vec4, width: u32, height: u32) -> [i32; 4] {
    let w = width as f32;
    let h = height as f32;
    [
        (rect.x * w) as i32,
        (rect.y * h) as i32,
        (rect.z * w) as i32,
        (rect.w * h) as i32,
    ]
}
