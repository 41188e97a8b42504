//! Per-drawable draw orchestration.
//!
//! `draw_drawable` is the inner loop of the renderer: program staleness check
//! and variant (re)acquisition, VAO and texture binding, the standard uniform
//! dispatch table, pipeline state application and the draw submission itself.
//! Everything funnels through the diffed caches, so a steady-state frame
//! issues close to zero redundant driver calls.

use glam::Mat4;
use rustc_hash::FxHashMap;

use crate::errors::{PrismError, Result};
use crate::gl::{
    BlendParams, Blending, CullFaceMode, DrawMode, GlDriver, IndexType, ProgramId, StateCache,
    StateCapability, StencilParams, TextureCache, TextureFilter, TextureFormat, TextureId,
    TextureParams, TextureTarget, Winding, select_morphs,
};
use crate::render::{Drawable, RenderInfo, RenderStates, Renderer};
use crate::resources::{
    Geometry, GeometryGroup, Material, MaterialKey, RenderTargetKey, Resources, Side, TextureKey,
    UniformValue,
};
use crate::scene::{Mesh, Scene, Skeleton, SkeletonKey};
use crate::shader::{ObjectContext, Props, assemble};

/// Uniform slots addressed by the built-in morph chunk.
const MORPH_INFLUENCE_SLOTS: usize = 8;

/// Per-material snapshot of the last derived variant.
///
/// The program reference is the refcount the cache tracks; replacing it
/// acquires the new variant before releasing the old one so a shared key is
/// never torn down and recompiled across the swap.
#[derive(Default)]
pub(crate) struct MaterialProperties {
    pub program: Option<ProgramId>,
    pub props: Option<Props>,
    pub material_version: u64,
}

/// Driver-internal float texture holding a skeleton's bone palette, used when
/// the bone count exceeds the uniform vector budget.
pub(crate) struct BoneTextureEntry {
    pub handle: TextureId,
    pub version: Option<u64>,
    pub size: u32,
}

impl<D: GlDriver> Renderer<D> {
    /// Draw one queued drawable against the current framebuffer.
    ///
    /// Errors are per-drawable: a failed compile or a resource that left the
    /// pool skips this draw and the frame carries on. `material_override`
    /// substitutes the shadow pass's depth/distance materials.
    pub(crate) fn draw_drawable(
        &mut self,
        scene: &Scene,
        states: &RenderStates,
        resources: &Resources,
        drawable: &Drawable,
        material_override: Option<MaterialKey>,
    ) -> Result<()> {
        let node = scene
            .node(drawable.node)
            .ok_or_else(|| PrismError::ResourceMissing("drawable node".into()))?;
        let mesh = node
            .mesh
            .as_ref()
            .ok_or_else(|| PrismError::ResourceMissing("drawable mesh".into()))?;
        let geometry = resources
            .geometries
            .get(drawable.geometry)
            .ok_or_else(|| PrismError::ResourceMissing("drawable geometry".into()))?;
        let material_key = material_override.unwrap_or(drawable.material);
        let material = resources
            .materials
            .get(material_key)
            .ok_or_else(|| PrismError::ResourceMissing("drawable material".into()))?;
        let skeleton = mesh.skeleton.and_then(|k| scene.skeletons.get(k));

        let object = ObjectContext {
            receive_shadow: node.receive_shadow,
            shadow_type: node.shadow_type,
            use_morph_targets: !mesh.morph_influences.is_empty()
                && !geometry.morph_positions.is_empty(),
            use_morph_normals: !geometry.morph_normals.is_empty(),
            bone_count: skeleton.map_or(0, |s| s.bone_count() as u32),
        };

        let props = Props::derive(material, &object, states, &self.capabilities, resources);
        let use_bone_texture = props.use_bone_texture;
        let bone_cap = props.bone_count as usize;

        let entry = self.material_props.entry(material_key).or_default();
        let stale = entry.program.is_none()
            || entry.material_version != material.version()
            || entry.props.as_ref() != Some(&props);
        if stale {
            let key = props.cache_key(material);
            let (vertex, fragment) = assemble(&props, material)?;
            // Acquire before release: a same-key swap must not drop the
            // refcount to zero in between.
            let program = self.programs.acquire(&mut self.driver, key, &vertex, &fragment)?;
            if let Some(old) = entry.program {
                self.programs.release(&mut self.driver, old);
            }
            entry.program = Some(program);
            entry.props = Some(props);
            entry.material_version = material.version();
        }
        let Some(program_id) = entry.program else {
            return Err(PrismError::ResourceMissing("program".into()));
        };

        // Anchor-relative frame: the model matrix is re-expressed against the
        // anchor and the camera matrices pick the anchor back up, so clip
        // positions are unchanged while the interpolated world position stays
        // near the origin.
        let anchor_inverse = states.scene.anchor_matrix_inverse();
        let (model, view, projection_view, camera_position) =
            match (states.scene.anchor_matrix, anchor_inverse) {
                (Some(anchor), Some(inverse)) => (
                    inverse * node.transform.world_matrix,
                    states.camera.view_matrix * anchor,
                    states.camera.projection_view_matrix * anchor,
                    inverse.transform_point3(states.camera.position),
                ),
                _ => (
                    node.transform.world_matrix,
                    states.camera.view_matrix,
                    states.camera.projection_view_matrix,
                    states.camera.position,
                ),
            };

        let front_face_cw = model.determinant() < 0.0;

        {
            let Self {
                driver,
                state,
                buffers,
                vaos,
                programs,
                ..
            } = self;
            let driver: &mut dyn GlDriver = driver;
            let Some(program) = programs.get(program_id) else {
                return Err(PrismError::ResourceMissing("program".into()));
            };
            state.use_program(driver, Some(program_id));
            vaos.bind(
                driver,
                state,
                buffers,
                program,
                drawable.geometry,
                geometry,
                &mesh.morph_influences,
            );
        }

        self.upload_uniforms(
            program_id,
            states,
            resources,
            material,
            mesh,
            skeleton,
            &model,
            &view,
            &projection_view,
            camera_position.to_array(),
            use_bone_texture,
            bone_cap,
        )?;

        {
            let Self { driver, state, .. } = self;
            let driver: &mut dyn GlDriver = driver;
            apply_material_state(driver, state, material, front_face_cw);
            submit_draw(driver, &mut self.info, geometry, drawable.group, material);
        }

        // Leave writes enabled so the next pass's clear is never masked off.
        let Self { driver, state, .. } = self;
        let driver: &mut dyn GlDriver = driver;
        state.reset_texture_units();
        state.set_depth_mask(driver, true);
        state.set_color_mask(driver, [true; 4]);
        Ok(())
    }

    /// Walk the program's reflected uniform table and feed each name from the
    /// standard dispatch table; material custom uniforms take precedence over
    /// every standard name.
    fn upload_uniforms(
        &mut self,
        program_id: ProgramId,
        states: &RenderStates,
        resources: &Resources,
        material: &Material,
        mesh: &Mesh,
        skeleton: Option<&Skeleton>,
        model: &Mat4,
        view: &Mat4,
        projection_view: &Mat4,
        camera_position: [f32; 3],
        use_bone_texture: bool,
        bone_cap: usize,
    ) -> Result<()> {
        let Self {
            driver,
            state,
            textures,
            programs,
            bone_textures,
            ..
        } = self;
        let driver: &mut dyn GlDriver = driver;
        let Some(program) = programs.get_mut(program_id) else {
            return Err(PrismError::ResourceMissing("program".into()));
        };
        let lighting = &states.lighting;
        let scene_data = &states.scene;

        for (name, binding) in &mut program.uniforms {
            if let Some(value) = material.uniforms.get(name.as_str()) {
                if let UniformValue::Texture(key) = value {
                    if let Some(unit) =
                        bind_pool_texture(driver, state, textures, resources, Some(*key))
                    {
                        binding.set(driver, &UniformValue::Int(unit));
                    }
                } else {
                    binding.set(driver, value);
                }
                continue;
            }

            match name.as_str() {
                "u_Model" => {
                    binding.set(driver, &UniformValue::Mat4(model.to_cols_array()));
                }
                "u_View" => {
                    binding.set(driver, &UniformValue::Mat4(view.to_cols_array()));
                }
                "u_Projection" => {
                    binding.set(
                        driver,
                        &UniformValue::Mat4(states.camera.projection_matrix.to_cols_array()),
                    );
                }
                "u_ProjectionView" => {
                    binding.set(driver, &UniformValue::Mat4(projection_view.to_cols_array()));
                }
                "u_CameraPosition" => {
                    binding.set(driver, &UniformValue::Vec3(camera_position));
                }
                "u_Color" => {
                    binding.set(driver, &UniformValue::Vec4(material.color.to_array()));
                }
                "u_Opacity" => {
                    binding.set(driver, &UniformValue::Float(material.opacity));
                }
                "u_Emissive" => {
                    binding.set(driver, &UniformValue::Vec3(material.emissive.to_array()));
                }
                "u_Specular" => {
                    binding.set(driver, &UniformValue::Vec3(material.specular.to_array()));
                }
                "u_Shininess" => {
                    binding.set(driver, &UniformValue::Float(material.shininess));
                }
                "u_Map" => {
                    if let Some(unit) =
                        bind_pool_texture(driver, state, textures, resources, material.map)
                    {
                        binding.set(driver, &UniformValue::Int(unit));
                    }
                }
                "u_EnvMap" => {
                    if let Some(unit) =
                        bind_pool_texture(driver, state, textures, resources, material.env_map)
                    {
                        binding.set(driver, &UniformValue::Int(unit));
                    }
                }
                "u_EmissiveMap" => {
                    if let Some(unit) =
                        bind_pool_texture(driver, state, textures, resources, material.emissive_map)
                    {
                        binding.set(driver, &UniformValue::Int(unit));
                    }
                }
                "u_FogColor" => {
                    if let Some(fog) = &scene_data.fog {
                        binding.set(driver, &UniformValue::Vec3(fog.color.to_array()));
                    }
                }
                "u_FogNear" => {
                    if let Some(fog) = &scene_data.fog {
                        binding.set(driver, &UniformValue::Float(fog.near));
                    }
                }
                "u_FogFar" => {
                    if let Some(fog) = &scene_data.fog {
                        binding.set(driver, &UniformValue::Float(fog.far));
                    }
                }
                "u_FogDensity" => {
                    if let Some(fog) = &scene_data.fog {
                        binding.set(driver, &UniformValue::Float(fog.density));
                    }
                }
                "u_LogDepthFC" => {
                    binding.set(
                        driver,
                        &UniformValue::Float(2.0 / (states.camera.far + 1.0).log2()),
                    );
                }
                "u_AmbientLightColor" => {
                    binding.set(driver, &UniformValue::Vec3(lighting.ambient));
                }
                "u_HemisphereLights" => {
                    binding.set_float_array(driver, &lighting.hemisphere);
                }
                "u_DirectionalLights" => {
                    binding.set_float_array(driver, &lighting.directional);
                }
                "u_PointLights" => {
                    binding.set_float_array(driver, &lighting.point);
                }
                "u_SpotLights" => {
                    binding.set_float_array(driver, &lighting.spot);
                }
                "u_DirectionalShadowParams" => {
                    binding.set_float_array(driver, &lighting.directional_shadow_params);
                }
                "u_PointShadowParams" => {
                    binding.set_float_array(driver, &lighting.point_shadow_params);
                }
                "u_SpotShadowParams" => {
                    binding.set_float_array(driver, &lighting.spot_shadow_params);
                }
                "u_DirectionalShadowMatrices" => {
                    binding.set_matrix_array(driver, &lighting.directional_shadow_matrices);
                }
                "u_PointShadowMatrices" => {
                    binding.set_matrix_array(driver, &lighting.point_shadow_matrices);
                }
                "u_SpotShadowMatrices" => {
                    binding.set_matrix_array(driver, &lighting.spot_shadow_matrices);
                }
                "u_DirectionalShadowMaps" => {
                    let units = bind_shadow_maps(
                        driver,
                        state,
                        textures,
                        resources,
                        &lighting.directional_shadow_maps,
                    );
                    binding.set(driver, &UniformValue::IntArray(units));
                }
                "u_PointShadowMaps" => {
                    let units = bind_shadow_maps(
                        driver,
                        state,
                        textures,
                        resources,
                        &lighting.point_shadow_maps,
                    );
                    binding.set(driver, &UniformValue::IntArray(units));
                }
                "u_SpotShadowMaps" => {
                    let units = bind_shadow_maps(
                        driver,
                        state,
                        textures,
                        resources,
                        &lighting.spot_shadow_maps,
                    );
                    binding.set(driver, &UniformValue::IntArray(units));
                }
                "u_BoneMatrices" => {
                    if let Some(skeleton) = skeleton {
                        let palette = skeleton.bone_matrices();
                        let uploaded = &palette[..palette.len().min(bone_cap * 16)];
                        binding.set_matrix_array(driver, uploaded);
                    }
                }
                "u_BoneTexture" => {
                    if let (Some(skeleton), Some(key), true) =
                        (skeleton, mesh.skeleton, use_bone_texture)
                    {
                        let (unit, _) =
                            upload_bone_texture(driver, state, bone_textures, key, skeleton);
                        binding.set(driver, &UniformValue::Int(unit));
                    }
                }
                "u_BoneTextureSize" => {
                    if let Some(skeleton) = skeleton {
                        let size = bone_texture_size(skeleton.bone_count());
                        binding.set(driver, &UniformValue::Int(size as i32));
                    }
                }
                "u_MorphInfluences" => {
                    let selection =
                        select_morphs(&mesh.morph_influences, crate::gl::MAX_MORPH_TARGETS);
                    let mut influences = vec![0.0f32; MORPH_INFLUENCE_SLOTS];
                    for (slot, &target) in selection.iter().enumerate() {
                        influences[slot] = mesh.morph_influences[target];
                    }
                    binding.set_float_array(driver, &influences);
                }
                "u_ClippingPlanes" => {
                    let planes = material
                        .clipping_planes
                        .as_deref()
                        .unwrap_or(&scene_data.clipping_planes);
                    let mut flat = Vec::with_capacity(planes.len() * 4);
                    for plane in planes {
                        flat.extend_from_slice(&plane.to_array());
                    }
                    binding.set_float_array(driver, &flat);
                }
                // Reflected but unrecognized names stay at their driver
                // defaults; custom shaders feed them via material.uniforms.
                _ => {}
            }
        }
        Ok(())
    }
}

/// Bind a pool texture to the next free unit; `None` when the slot is empty
/// or the texture left the pool.
fn bind_pool_texture(
    driver: &mut dyn GlDriver,
    state: &mut StateCache,
    textures: &mut TextureCache,
    resources: &Resources,
    key: Option<TextureKey>,
) -> Option<i32> {
    let key = key?;
    let texture = resources.textures.get(key)?;
    let unit = state.allocate_texture_unit();
    textures.bind(driver, state, unit, key, texture);
    Some(unit as i32)
}

/// One unit per shadow slot, in array order. Slots whose map has not been
/// rendered yet still consume a unit so later indices stay aligned.
fn bind_shadow_maps(
    driver: &mut dyn GlDriver,
    state: &mut StateCache,
    textures: &mut TextureCache,
    resources: &Resources,
    maps: &[Option<RenderTargetKey>],
) -> Vec<i32> {
    maps.iter()
        .map(|map| {
            let unit = state.allocate_texture_unit();
            let color = map
                .and_then(|k| resources.render_targets.get(k))
                .and_then(|target| target.color);
            if let Some(key) = color {
                if let Some(texture) = resources.textures.get(key) {
                    textures.bind(driver, state, unit, key, texture);
                }
            }
            unit as i32
        })
        .collect()
}

/// Side of the smallest square float texture holding `bones` mat4s (four
/// texels per bone).
fn bone_texture_size(bones: usize) -> u32 {
    let size = ((bones * 4) as f32).sqrt().ceil() as u32;
    size.max(1)
}

/// Upload the bone palette into the skeleton's float texture, creating or
/// resizing it as needed, and bind it to a fresh unit.
fn upload_bone_texture(
    driver: &mut dyn GlDriver,
    state: &mut StateCache,
    bone_textures: &mut FxHashMap<SkeletonKey, BoneTextureEntry>,
    key: SkeletonKey,
    skeleton: &Skeleton,
) -> (i32, u32) {
    let size = bone_texture_size(skeleton.bone_count());
    let unit = state.allocate_texture_unit();
    let entry = bone_textures.entry(key).or_insert_with(|| BoneTextureEntry {
        handle: driver.create_texture(),
        version: None,
        size: 0,
    });
    state.bind_texture(driver, unit, TextureTarget::Texture2D, Some(entry.handle));
    if entry.version != Some(skeleton.version()) || entry.size != size {
        let mut palette = skeleton.bone_matrices().to_vec();
        palette.resize((size * size * 4) as usize, 0.0);
        driver.tex_image_2d(
            TextureTarget::Texture2D,
            0,
            size,
            size,
            TextureFormat::Rgba32F,
            Some(bytemuck::cast_slice(&palette)),
        );
        driver.tex_parameters(
            TextureTarget::Texture2D,
            &TextureParams {
                mag_filter: TextureFilter::Nearest,
                min_filter: TextureFilter::Nearest,
                ..TextureParams::default()
            },
        );
        entry.version = Some(skeleton.version());
        entry.size = size;
    }
    (unit as i32, size)
}

/// Resolve and apply the full pipeline state for one material.
fn apply_material_state(
    driver: &mut dyn GlDriver,
    state: &mut StateCache,
    material: &Material,
    front_face_cw: bool,
) {
    // Opaque fast path: default blending with the transparent flag off skips
    // factor resolution entirely.
    if material.blending == Blending::Normal && !material.transparent {
        state.set_blending(driver, None);
    } else {
        match material.blending {
            Blending::None => state.set_blending(driver, None),
            Blending::Custom => {
                let params = BlendParams {
                    src_rgb: material.blend_src,
                    dst_rgb: material.blend_dst,
                    equation_rgb: material.blend_equation,
                    src_alpha: material.blend_src_alpha.unwrap_or(material.blend_src),
                    dst_alpha: material.blend_dst_alpha.unwrap_or(material.blend_dst),
                    equation_alpha: material.blend_equation_alpha.unwrap_or(material.blend_equation),
                };
                state.set_blending(driver, Some(params));
            }
            preset => state.set_blending(
                driver,
                BlendParams::from_preset(preset, material.premultiplied_alpha),
            ),
        }
    }

    // A negative-determinant model matrix mirrors the winding; flip the
    // front-face convention instead of the cull mode.
    state.set_front_face(driver, if front_face_cw { Winding::Cw } else { Winding::Ccw });
    match material.side {
        Side::Double => state.set_cull(driver, None),
        Side::Front => state.set_cull(driver, Some(CullFaceMode::Back)),
        Side::Back => state.set_cull(driver, Some(CullFaceMode::Front)),
    }

    state.set_depth_test(driver, material.depth_test);
    if material.depth_test {
        state.set_depth_func(driver, material.depth_func);
    }
    state.set_depth_mask(driver, material.depth_write);
    let c = material.color_write;
    state.set_color_mask(driver, [c, c, c, c]);

    match &material.stencil {
        Some(s) => {
            state.set_stencil_test(driver, true);
            state.set_stencil(
                driver,
                &StencilParams {
                    front_func: s.func,
                    front_ref: s.reference,
                    front_read_mask: s.read_mask,
                    front_fail: s.fail,
                    front_z_fail: s.z_fail,
                    front_z_pass: s.z_pass,
                    front_write_mask: s.write_mask,
                    back_func: s.back_func.unwrap_or(s.func),
                    back_ref: s.reference,
                    back_read_mask: s.read_mask,
                    back_fail: s.back_fail.unwrap_or(s.fail),
                    back_z_fail: s.back_z_fail.unwrap_or(s.z_fail),
                    back_z_pass: s.back_z_pass.unwrap_or(s.z_pass),
                    back_write_mask: s.write_mask,
                },
            );
        }
        None => state.set_stencil_test(driver, false),
    }

    state.set_polygon_offset(
        driver,
        material.polygon_offset,
        material.polygon_offset_factor,
        material.polygon_offset_units,
    );
    state.set_capability(
        driver,
        StateCapability::SampleAlphaToCoverage,
        material.alpha_to_coverage,
    );
    if matches!(
        material.draw_mode,
        DrawMode::Lines | DrawMode::LineLoop | DrawMode::LineStrip
    ) {
        state.set_line_width(driver, material.line_width);
    }
}

/// Clamp the draw range to the geometry, pick the indexed/instanced driver
/// entry point, and account the primitives.
fn submit_draw(
    driver: &mut dyn GlDriver,
    info: &mut RenderInfo,
    geometry: &Geometry,
    group: Option<GeometryGroup>,
    material: &Material,
) {
    let draw_count = geometry.draw_count();
    let (mut start, mut count) = group.map_or((0, draw_count), |g| (g.start, g.count));
    start = start.min(draw_count);
    count = count.min(draw_count - start);
    if count == 0 {
        return;
    }

    let mode = material.draw_mode;
    let instances = geometry.instance_count;
    #[allow(clippy::cast_possible_wrap)]
    match (geometry.index().is_some(), instances) {
        (true, Some(n)) => driver.draw_elements_instanced(
            mode,
            count as i32,
            IndexType::Uint32,
            start as usize * 4,
            n as i32,
        ),
        (true, None) => driver.draw_elements(mode, count as i32, IndexType::Uint32, start as usize * 4),
        (false, Some(n)) => driver.draw_arrays_instanced(mode, start as i32, count as i32, n as i32),
        (false, None) => driver.draw_arrays(mode, start as i32, count as i32),
    }
    info.record(mode, u64::from(count), u64::from(instances.unwrap_or(1)));
}
