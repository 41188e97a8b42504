//! Shadow map rendering.
//!
//! Runs before the main pass each frame: for every shadow-casting light, draw
//! the shadow-casting geometry into the light's packed-depth target with a
//! depth (directional/spot) or distance (point) override material. Targets
//! are allocated lazily on first use and kept on the light's shadow config,
//! which is how the lighting arrays find them during the main traversal.

use std::f32::consts::FRAC_PI_2;

use glam::Vec3;
use log::error;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::gl::{
    Attachment, ClearMask, GlDriver, TextureFilter, TextureFormat, TextureParams, TextureTarget,
};
use crate::resources::{
    Material, MaterialKey, MaterialKind, RenderTarget, RenderTargetKey, Resources, Texture,
    UniformValue,
};
use crate::scene::{Camera, LightKind, NodeKey, Scene};

use super::renderer::Renderer;
use super::states::RenderStates;
use super::{Drawable, RenderQueue};

/// Morphing/skinning/clip-count split for the override material pools.
///
/// Program variants derive from the drawn object, so sharing one depth
/// material between skinned and static casters, or between clipped and
/// unclipped ones, would swap its program on every draw; one material per
/// feature combination keeps each snapshot stable.
type Variant = (bool, bool, u8);

pub(crate) struct ShadowMapPass {
    states: RenderStates,
    queue: RenderQueue,
    camera: Camera,
    depth_materials: FxHashMap<Variant, MaterialKey>,
    distance_materials: FxHashMap<Variant, MaterialKey>,
}

impl Default for ShadowMapPass {
    fn default() -> Self {
        Self {
            states: RenderStates::default(),
            queue: RenderQueue::default(),
            camera: Camera::new_perspective(FRAC_PI_2, 1.0, 1.0, 500.0),
            depth_materials: FxHashMap::default(),
            distance_materials: FxHashMap::default(),
        }
    }
}

impl<D: GlDriver> Renderer<D> {
    pub(crate) fn render_shadows(&mut self, scene: &mut Scene, resources: &mut Resources) {
        // The pass owns its own states/queue, so it moves out of the renderer
        // for the duration of the draw loop.
        let mut pass = std::mem::take(&mut self.shadow);
        pass.render(self, scene, resources);
        self.shadow = pass;
    }
}

impl ShadowMapPass {
    fn render<D: GlDriver>(
        &mut self,
        renderer: &mut Renderer<D>,
        scene: &mut Scene,
        resources: &mut Resources,
    ) {
        // Hidden subtrees contribute no lighting entries either, so a caster
        // light under one gets no map rendered.
        let light_keys: Vec<NodeKey> = scene
            .nodes()
            .iter()
            .filter(|&(key, node)| {
                node.light.as_ref().is_some_and(|l| l.casts_shadow())
                    && scene.subtree_visible(key)
            })
            .map(|(key, _)| key)
            .collect();
        if light_keys.is_empty() {
            return;
        }

        let anchor_inverse = scene.data.anchor_matrix_inverse();

        for key in light_keys {
            let Some(node) = scene.node(key) else { continue };
            let world = node.transform.world_matrix;
            let Some(light) = &node.light else { continue };
            let Some(shadow) = &light.shadow else { continue };
            let kind = light.kind.clone();
            let is_point = matches!(kind, LightKind::Point { .. });
            let map_size = shadow.map_size;
            let (camera_near, camera_far) = (shadow.camera_near, shadow.camera_far);

            let map_key = match shadow.map {
                Some(existing) => existing,
                None => {
                    let created = allocate_shadow_target(resources, map_size, is_point);
                    if let Some(light) = scene.node_mut(key).and_then(|n| n.light.as_mut()) {
                        if let Some(shadow) = light.shadow.as_mut() {
                            shadow.map = Some(created);
                        }
                    }
                    created
                }
            };

            // The distance shader compares against the light position in the
            // same (possibly anchored) space the varyings live in.
            let mut light_position = world.w_axis.truncate();
            if let Some(inverse) = anchor_inverse {
                light_position = inverse.transform_point3(light_position);
            }
            let light_far = match kind {
                LightKind::Point { distance, .. } if distance > 0.0 => distance.max(camera_far),
                _ => camera_far,
            };

            let faces = if is_point { 6 } else { 1 };
            for face in 0..faces {
                let Some(node) = scene.node(key) else { break };
                let Some(shadow) = node.light.as_ref().and_then(|l| l.shadow.as_ref()) else {
                    break;
                };
                let (view, projection) = shadow.face_camera(&kind, &world, face);
                self.camera.world_matrix = view.inverse();
                self.camera.projection_matrix = projection;
                self.camera.update_matrices();

                self.states.update(scene, &self.camera);
                scene.update_render_queue(
                    &self.camera,
                    resources,
                    &mut self.queue,
                    &mut self.states.lighting,
                    false,
                    false,
                );

                self.prepare_materials(scene, resources, is_point);
                if is_point {
                    for &material_key in self.distance_materials.values() {
                        set_distance_uniforms(
                            resources,
                            material_key,
                            light_position,
                            camera_near,
                            light_far,
                        );
                    }
                }

                let Some(target) = resources.render_targets.get(map_key) else { continue };
                let color_key = target.color;
                let bound = {
                    let Renderer {
                        driver,
                        state,
                        textures,
                        render_targets,
                        ..
                    } = renderer;
                    render_targets.bind(&mut *driver, state, textures, resources, map_key, target)
                };
                if bound.is_none() {
                    continue;
                }
                if is_point {
                    // Cube targets re-attach the face being rendered.
                    if let Some(handle) = color_key.and_then(|k| renderer.textures.handle(k)) {
                        renderer.driver.framebuffer_texture(
                            Attachment::Color(0),
                            TextureTarget::TextureCubeFace(face),
                            handle,
                        );
                    }
                }

                {
                    let Renderer { driver, state, .. } = renderer;
                    let driver: &mut dyn GlDriver = driver;
                    #[allow(clippy::cast_possible_wrap)]
                    state.set_viewport(driver, [0, 0, map_size as i32, map_size as i32]);
                    // Far plane everywhere; packed depth 1.0 reads as "no
                    // occluder".
                    state.set_clear_color(driver, [1.0, 1.0, 1.0, 1.0]);
                    state.set_depth_mask(driver, true);
                    state.set_color_mask(driver, [true; 4]);
                    state.clear(driver, ClearMask::COLOR | ClearMask::DEPTH);
                }

                let pool = if is_point {
                    &self.distance_materials
                } else {
                    &self.depth_materials
                };
                for layer in self.queue.layers() {
                    for drawable in &layer.opaque {
                        let Some(node) = scene.node(drawable.node) else { continue };
                        if !node.cast_shadow {
                            continue;
                        }
                        let Some(variant) = caster_variant(scene, resources, drawable) else {
                            continue;
                        };
                        let Some(&override_key) = pool.get(&variant) else { continue };
                        // Casters with their own plane set clip their shadow
                        // the same way; the pooled variant guarantees the
                        // count (and therefore the program) stays fixed.
                        let planes = resources
                            .materials
                            .get(drawable.material)
                            .and_then(|m| m.clipping_planes.clone());
                        if let Some(material) = resources.materials.get_mut(override_key) {
                            material.clipping_planes = planes;
                        }
                        if let Err(e) = renderer.draw_drawable(
                            scene,
                            &self.states,
                            resources,
                            drawable,
                            Some(override_key),
                        ) {
                            error!("shadow map draw skipped: {e}");
                        }
                    }
                }
            }
        }

        let Renderer { driver, state, .. } = renderer;
        state.bind_framebuffer(&mut *driver, None);
    }

    /// Make sure an override material exists for every caster variant in the
    /// current queue, before the draw loop takes its immutable borrows.
    fn prepare_materials(&mut self, scene: &Scene, resources: &mut Resources, distance: bool) {
        let mut variants: FxHashSet<Variant> = FxHashSet::default();
        for layer in self.queue.layers() {
            for drawable in &layer.opaque {
                let Some(node) = scene.node(drawable.node) else { continue };
                if !node.cast_shadow {
                    continue;
                }
                if let Some(variant) = caster_variant(scene, resources, drawable) {
                    variants.insert(variant);
                }
            }
        }
        let pool = if distance {
            &mut self.distance_materials
        } else {
            &mut self.depth_materials
        };
        for variant in variants {
            pool.entry(variant).or_insert_with(|| {
                let kind = if distance {
                    MaterialKind::Distance
                } else {
                    MaterialKind::Depth
                };
                let mut material = Material::new(kind);
                material.name = format!(
                    "{}-shadow{}{}-clip{}",
                    if distance { "distance" } else { "depth" },
                    if variant.0 { "-morph" } else { "" },
                    if variant.1 { "-skin" } else { "" },
                    variant.2,
                );
                resources.add_material(material)
            });
        }
    }
}

/// (morphing, skinning, clipping-plane count) of a caster drawable.
fn caster_variant(scene: &Scene, resources: &Resources, drawable: &Drawable) -> Option<Variant> {
    let node = scene.node(drawable.node)?;
    let mesh = node.mesh.as_ref()?;
    let geometry = resources.geometries.get(mesh.geometry)?;
    let morphing = !mesh.morph_influences.is_empty() && !geometry.morph_positions.is_empty();
    let skinning = mesh.skeleton.is_some();
    let clip_count = resources
        .materials
        .get(drawable.material)
        .and_then(|m| m.clipping_planes.as_ref())
        .map_or(scene.data.clipping_planes.len(), Vec::len)
        .min(255) as u8;
    Some((morphing, skinning, clip_count))
}

/// Packed-depth color target: RGBA8 sampled with nearest filtering (depth
/// bytes must never be interpolated), plus a real depth buffer for the pass
/// itself.
fn allocate_shadow_target(
    resources: &mut Resources,
    map_size: u32,
    cube: bool,
) -> RenderTargetKey {
    let mut texture = if cube {
        Texture::new_cube(map_size, TextureFormat::Rgba8)
    } else {
        Texture::new_2d(map_size, map_size, TextureFormat::Rgba8)
    };
    texture.params = TextureParams {
        mag_filter: TextureFilter::Nearest,
        min_filter: TextureFilter::Nearest,
        ..TextureParams::default()
    };
    let color = resources.add_texture(texture);

    let mut target = RenderTarget::new(map_size, map_size);
    target.color = Some(color);
    target.depth_buffer = true;
    resources.add_render_target(target)
}

fn set_distance_uniforms(
    resources: &mut Resources,
    material_key: MaterialKey,
    position: Vec3,
    near: f32,
    far: f32,
) {
    // Uniform values feed straight into upload; no mark_changed, since they
    // never influence the derived variant.
    if let Some(material) = resources.materials.get_mut(material_key) {
        material
            .uniforms
            .insert("u_LightPosition".into(), UniformValue::Vec3(position.to_array()));
        material
            .uniforms
            .insert("u_ShadowCameraNear".into(), UniformValue::Float(near));
        material
            .uniforms
            .insert("u_ShadowCameraFar".into(), UniformValue::Float(far));
    }
}
