//! Diffed mirror of the driver's pipeline state.
//!
//! Every stateful toggle the render pass touches is mirrored here as an
//! `Option`; a driver call is issued only when the requested value differs
//! from the mirror. `None` means "unknown", so the first set after
//! construction or [`StateCache::reset`] always reaches the driver.

use log::warn;
use rustc_hash::FxHashMap;

use super::{
    BlendEquation, BlendFactor, Blending, BufferId, BufferTarget, ClearMask, CompareFunc,
    CullFaceMode, FramebufferId, GlDriver, ProgramId, StateCapability, StencilFace, StencilOp,
    TextureId, TextureTarget, VertexArrayId, Winding,
};

/// Fully-resolved blend function state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendParams {
    pub src_rgb: BlendFactor,
    pub dst_rgb: BlendFactor,
    pub equation_rgb: BlendEquation,
    pub src_alpha: BlendFactor,
    pub dst_alpha: BlendFactor,
    pub equation_alpha: BlendEquation,
}

impl BlendParams {
    /// Resolve a blending preset. `None` for [`Blending::Custom`] — the
    /// caller supplies explicit factors in that case.
    #[must_use]
    pub fn from_preset(blending: Blending, premultiplied_alpha: bool) -> Option<Self> {
        let (src_rgb, dst_rgb, src_alpha, dst_alpha) = match (blending, premultiplied_alpha) {
            (Blending::None | Blending::Custom, _) => return None,
            (Blending::Normal, false) => (
                BlendFactor::SrcAlpha,
                BlendFactor::OneMinusSrcAlpha,
                BlendFactor::One,
                BlendFactor::OneMinusSrcAlpha,
            ),
            (Blending::Normal, true) => (
                BlendFactor::One,
                BlendFactor::OneMinusSrcAlpha,
                BlendFactor::One,
                BlendFactor::OneMinusSrcAlpha,
            ),
            (Blending::Additive, false) => (
                BlendFactor::SrcAlpha,
                BlendFactor::One,
                BlendFactor::SrcAlpha,
                BlendFactor::One,
            ),
            (Blending::Additive, true) => (
                BlendFactor::One,
                BlendFactor::One,
                BlendFactor::One,
                BlendFactor::One,
            ),
            (Blending::Subtractive, _) => (
                BlendFactor::Zero,
                BlendFactor::OneMinusSrcColor,
                BlendFactor::Zero,
                BlendFactor::One,
            ),
            (Blending::Multiply, _) => (
                BlendFactor::Zero,
                BlendFactor::SrcColor,
                BlendFactor::Zero,
                BlendFactor::SrcAlpha,
            ),
        };
        Some(Self {
            src_rgb,
            dst_rgb,
            equation_rgb: BlendEquation::Add,
            src_alpha,
            dst_alpha,
            equation_alpha: BlendEquation::Add,
        })
    }
}

/// Two-sided stencil state as applied per drawable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StencilParams {
    pub front_func: CompareFunc,
    pub front_ref: i32,
    pub front_read_mask: u32,
    pub front_fail: StencilOp,
    pub front_z_fail: StencilOp,
    pub front_z_pass: StencilOp,
    pub front_write_mask: u32,
    pub back_func: CompareFunc,
    pub back_ref: i32,
    pub back_read_mask: u32,
    pub back_fail: StencilOp,
    pub back_z_fail: StencilOp,
    pub back_z_pass: StencilOp,
    pub back_write_mask: u32,
}

/// CPU-side cached copy of every pipeline toggle the core sets.
pub struct StateCache {
    max_textures: u32,

    capabilities: FxHashMap<StateCapability, bool>,

    program: Option<ProgramId>,

    blend: Option<BlendParams>,
    blend_enabled: Option<bool>,

    depth_func: Option<CompareFunc>,
    depth_mask: Option<bool>,
    color_mask: Option<[bool; 4]>,

    stencil: Option<StencilParams>,

    cull_mode: Option<CullFaceMode>,
    front_face: Option<Winding>,

    viewport: Option<[i32; 4]>,
    polygon_offset: Option<(f32, f32)>,
    line_width: Option<f32>,
    clear_color: Option<[u32; 4]>, // f32 bits, for exact comparison

    bound_array_buffer: Option<Option<BufferId>>,
    bound_element_buffer: Option<Option<BufferId>>,
    bound_vertex_array: Option<Option<VertexArrayId>>,
    bound_framebuffer: Option<Option<FramebufferId>>,

    active_unit: Option<u32>,
    bound_textures: FxHashMap<u32, (TextureTarget, Option<TextureId>)>,
    next_texture_unit: u32,
}

impl StateCache {
    #[must_use]
    pub fn new(max_textures: u32) -> Self {
        Self {
            max_textures,
            capabilities: FxHashMap::default(),
            program: None,
            blend: None,
            blend_enabled: None,
            depth_func: None,
            depth_mask: None,
            color_mask: None,
            stencil: None,
            cull_mode: None,
            front_face: None,
            viewport: None,
            polygon_offset: None,
            line_width: None,
            clear_color: None,
            bound_array_buffer: None,
            bound_element_buffer: None,
            bound_vertex_array: None,
            bound_framebuffer: None,
            active_unit: None,
            bound_textures: FxHashMap::default(),
            next_texture_unit: 0,
        }
    }

    /// Forget all mirrored state so every subsequent set reaches the driver.
    ///
    /// Needed after external code touches the underlying context.
    pub fn reset(&mut self) {
        self.capabilities.clear();
        self.program = None;
        self.blend = None;
        self.blend_enabled = None;
        self.depth_func = None;
        self.depth_mask = None;
        self.color_mask = None;
        self.stencil = None;
        self.cull_mode = None;
        self.front_face = None;
        self.viewport = None;
        self.polygon_offset = None;
        self.line_width = None;
        self.clear_color = None;
        self.bound_array_buffer = None;
        self.bound_element_buffer = None;
        self.bound_vertex_array = None;
        self.bound_framebuffer = None;
        self.active_unit = None;
        self.bound_textures.clear();
        self.next_texture_unit = 0;
    }

    // ── Capability toggles ───────────────────────────────────────────────────

    pub fn set_capability(
        &mut self,
        driver: &mut dyn GlDriver,
        capability: StateCapability,
        enabled: bool,
    ) {
        if self.capabilities.get(&capability) == Some(&enabled) {
            return;
        }
        if enabled {
            driver.enable(capability);
        } else {
            driver.disable(capability);
        }
        self.capabilities.insert(capability, enabled);
    }

    // ── Program ──────────────────────────────────────────────────────────────

    /// Returns `true` when the bound program actually changed.
    pub fn use_program(&mut self, driver: &mut dyn GlDriver, program: Option<ProgramId>) -> bool {
        if self.program == program {
            return false;
        }
        driver.use_program(program);
        self.program = program;
        true
    }

    // ── Blending ─────────────────────────────────────────────────────────────

    /// Apply blend state; `None` disables blending entirely (the opaque fast
    /// path).
    pub fn set_blending(&mut self, driver: &mut dyn GlDriver, params: Option<BlendParams>) {
        match params {
            None => {
                self.set_capability(driver, StateCapability::Blend, false);
                self.blend_enabled = Some(false);
            }
            Some(p) => {
                self.set_capability(driver, StateCapability::Blend, true);
                self.blend_enabled = Some(true);
                if self.blend != Some(p) {
                    driver.blend_func_separate(p.src_rgb, p.dst_rgb, p.src_alpha, p.dst_alpha);
                    driver.blend_equation_separate(p.equation_rgb, p.equation_alpha);
                    self.blend = Some(p);
                }
            }
        }
    }

    // ── Depth / color ────────────────────────────────────────────────────────

    pub fn set_depth_test(&mut self, driver: &mut dyn GlDriver, enabled: bool) {
        self.set_capability(driver, StateCapability::DepthTest, enabled);
    }

    pub fn set_depth_func(&mut self, driver: &mut dyn GlDriver, func: CompareFunc) {
        if self.depth_func != Some(func) {
            driver.depth_func(func);
            self.depth_func = Some(func);
        }
    }

    pub fn set_depth_mask(&mut self, driver: &mut dyn GlDriver, enabled: bool) {
        if self.depth_mask != Some(enabled) {
            driver.depth_mask(enabled);
            self.depth_mask = Some(enabled);
        }
    }

    pub fn set_color_mask(&mut self, driver: &mut dyn GlDriver, mask: [bool; 4]) {
        if self.color_mask != Some(mask) {
            driver.color_mask(mask[0], mask[1], mask[2], mask[3]);
            self.color_mask = Some(mask);
        }
    }

    // ── Stencil ──────────────────────────────────────────────────────────────

    pub fn set_stencil_test(&mut self, driver: &mut dyn GlDriver, enabled: bool) {
        self.set_capability(driver, StateCapability::StencilTest, enabled);
    }

    pub fn set_stencil(&mut self, driver: &mut dyn GlDriver, params: &StencilParams) {
        if self.stencil.as_ref() == Some(params) {
            return;
        }
        driver.stencil_func_separate(
            StencilFace::Front,
            params.front_func,
            params.front_ref,
            params.front_read_mask,
        );
        driver.stencil_op_separate(
            StencilFace::Front,
            params.front_fail,
            params.front_z_fail,
            params.front_z_pass,
        );
        driver.stencil_mask_separate(StencilFace::Front, params.front_write_mask);
        driver.stencil_func_separate(
            StencilFace::Back,
            params.back_func,
            params.back_ref,
            params.back_read_mask,
        );
        driver.stencil_op_separate(
            StencilFace::Back,
            params.back_fail,
            params.back_z_fail,
            params.back_z_pass,
        );
        driver.stencil_mask_separate(StencilFace::Back, params.back_write_mask);
        self.stencil = Some(*params);
    }

    // ── Culling / winding ────────────────────────────────────────────────────

    /// `None` disables face culling (double-sided materials).
    pub fn set_cull(&mut self, driver: &mut dyn GlDriver, mode: Option<CullFaceMode>) {
        match mode {
            None => self.set_capability(driver, StateCapability::CullFace, false),
            Some(m) => {
                self.set_capability(driver, StateCapability::CullFace, true);
                if self.cull_mode != Some(m) {
                    driver.cull_face(m);
                    self.cull_mode = Some(m);
                }
            }
        }
    }

    pub fn set_front_face(&mut self, driver: &mut dyn GlDriver, winding: Winding) {
        if self.front_face != Some(winding) {
            driver.front_face(winding);
            self.front_face = Some(winding);
        }
    }

    // ── Rasterizer scalars ───────────────────────────────────────────────────

    pub fn set_viewport(&mut self, driver: &mut dyn GlDriver, rect: [i32; 4]) {
        if self.viewport != Some(rect) {
            driver.viewport(rect[0], rect[1], rect[2], rect[3]);
            self.viewport = Some(rect);
        }
    }

    pub fn set_polygon_offset(
        &mut self,
        driver: &mut dyn GlDriver,
        enabled: bool,
        factor: f32,
        units: f32,
    ) {
        self.set_capability(driver, StateCapability::PolygonOffsetFill, enabled);
        if enabled && self.polygon_offset != Some((factor, units)) {
            driver.polygon_offset(factor, units);
            self.polygon_offset = Some((factor, units));
        }
    }

    pub fn set_line_width(&mut self, driver: &mut dyn GlDriver, width: f32) {
        if self.line_width != Some(width) {
            driver.line_width(width);
            self.line_width = Some(width);
        }
    }

    pub fn set_clear_color(&mut self, driver: &mut dyn GlDriver, color: [f32; 4]) {
        let bits = color.map(f32::to_bits);
        if self.clear_color != Some(bits) {
            driver.clear_color(color[0], color[1], color[2], color[3]);
            self.clear_color = Some(bits);
        }
    }

    pub fn clear(&mut self, driver: &mut dyn GlDriver, mask: ClearMask) {
        if !mask.is_empty() {
            driver.clear(mask);
        }
    }

    // ── Buffer / VAO / framebuffer bindings ──────────────────────────────────

    pub fn bind_buffer(
        &mut self,
        driver: &mut dyn GlDriver,
        target: BufferTarget,
        buffer: Option<BufferId>,
    ) {
        let mirror = match target {
            BufferTarget::Array => &mut self.bound_array_buffer,
            BufferTarget::ElementArray => &mut self.bound_element_buffer,
        };
        if *mirror != Some(buffer) {
            driver.bind_buffer(target, buffer);
            *mirror = Some(buffer);
        }
    }

    /// Returns `true` when the binding actually changed.
    pub fn bind_vertex_array(
        &mut self,
        driver: &mut dyn GlDriver,
        vao: Option<VertexArrayId>,
    ) -> bool {
        if self.bound_vertex_array == Some(vao) {
            return false;
        }
        driver.bind_vertex_array(vao);
        self.bound_vertex_array = Some(vao);
        // Element buffer binding is part of VAO state.
        self.bound_element_buffer = None;
        true
    }

    pub fn bind_framebuffer(
        &mut self,
        driver: &mut dyn GlDriver,
        framebuffer: Option<FramebufferId>,
    ) {
        if self.bound_framebuffer != Some(framebuffer) {
            driver.bind_framebuffer(framebuffer);
            self.bound_framebuffer = Some(framebuffer);
        }
    }

    // ── Texture units ────────────────────────────────────────────────────────

    /// Hand out the next texture unit for the current drawable.
    ///
    /// Exceeding the driver budget logs a warning and clamps to the last
    /// unit; the draw proceeds (likely visually wrong, never fatal).
    pub fn allocate_texture_unit(&mut self) -> u32 {
        let unit = self.next_texture_unit;
        if unit >= self.max_textures {
            warn!(
                "Texture unit budget exceeded: trying to use {} units, the driver supports {}",
                unit + 1,
                self.max_textures
            );
            return self.max_textures - 1;
        }
        self.next_texture_unit += 1;
        unit
    }

    /// Restart unit allocation for the next drawable. Bound-texture mirrors
    /// survive, so a texture already occupying its unit is not rebound.
    pub fn reset_texture_units(&mut self) {
        self.next_texture_unit = 0;
    }

    pub fn active_texture(&mut self, driver: &mut dyn GlDriver, unit: u32) {
        if self.active_unit != Some(unit) {
            driver.active_texture(unit);
            self.active_unit = Some(unit);
        }
    }

    pub fn bind_texture(
        &mut self,
        driver: &mut dyn GlDriver,
        unit: u32,
        target: TextureTarget,
        texture: Option<TextureId>,
    ) {
        let target = target.bind_target();
        if self.bound_textures.get(&unit) == Some(&(target, texture)) {
            return;
        }
        self.active_texture(driver, unit);
        driver.bind_texture(target, texture);
        self.bound_textures.insert(unit, (target, texture));
    }

    /// Drop the mirror entry for a deleted texture on every unit.
    pub fn forget_texture(&mut self, texture: TextureId) {
        self.bound_textures
            .retain(|_, (_, bound)| *bound != Some(texture));
    }
}
