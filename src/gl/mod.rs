//! GPU driver surface and driver-side caches.
//!
//! The render core never talks to a windowing system or GL loader directly.
//! Everything it needs from the rasterization API is expressed through the
//! [`GlDriver`] trait: buffer/texture/framebuffer lifecycle, program
//! compilation, state toggles, uniform upload and draw submission. A real
//! backend wraps a GL context; [`NullDriver`] provides a headless backend
//! that allocates handles and counts calls, which is what the integration
//! tests run against.
//!
//! The caches in this module ([`StateCache`], [`BufferCache`],
//! [`TextureCache`], [`RenderTargetCache`], [`VertexArrayCache`]) are scoped
//! to a single driver and are not safe for concurrent mutation; they are
//! owned exclusively by the thread issuing driver calls.

mod buffers;
mod null;
mod render_targets;
mod state;
mod textures;
mod types;
mod vaos;

pub use buffers::BufferCache;
pub use null::{CallCounts, NullDriver};
pub use render_targets::RenderTargetCache;
pub use state::{BlendParams, StateCache, StencilParams};
pub use textures::TextureCache;
pub use types::*;
pub use vaos::VertexArrayCache;
pub(crate) use vaos::{MAX_MORPH_TARGETS, select_morphs};

// ─── Driver Handles ──────────────────────────────────────────────────────────

macro_rules! driver_handle {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub u32);
    };
}

driver_handle!(
    /// Opaque driver-side buffer object handle.
    BufferId
);
driver_handle!(
    /// Opaque driver-side texture object handle.
    TextureId
);
driver_handle!(
    /// Opaque driver-side framebuffer object handle.
    FramebufferId
);
driver_handle!(
    /// Opaque driver-side vertex array object handle.
    VertexArrayId
);
driver_handle!(
    /// Opaque driver-side linked program handle.
    ProgramId
);
driver_handle!(
    /// Opaque uniform location within a linked program.
    UniformLocation
);

// ─── Capabilities ────────────────────────────────────────────────────────────

/// Limits and extension availability, probed once at context creation and
/// cached for the driver's lifetime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capabilities {
    /// GLSL ES 3.00 surface available (affects shader prefix generation and
    /// shadow samplers).
    pub webgl2: bool,
    pub max_textures: u32,
    pub max_vertex_textures: u32,
    pub max_texture_size: u32,
    /// Uniform vector budget of the vertex stage; caps addressable bone count.
    pub max_vertex_uniform_vectors: u32,
    pub float_vertex_textures: bool,
    pub instancing: bool,
    pub depth_textures: bool,
    pub anisotropy: f32,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            webgl2: true,
            max_textures: 16,
            max_vertex_textures: 16,
            max_texture_size: 4096,
            max_vertex_uniform_vectors: 1024,
            float_vertex_textures: true,
            instancing: true,
            depth_textures: true,
            anisotropy: 16.0,
        }
    }
}

// ─── Driver Errors ───────────────────────────────────────────────────────────

/// Compile/link failure reported by the driver.
///
/// Converted into [`crate::PrismError::ProgramCompileFailed`] by the program
/// cache, which attaches numbered source context around `line`.
#[derive(Debug, Clone)]
pub struct CompileError {
    pub log: String,
    /// 1-based line number parsed from the info log, when present.
    pub line: Option<u32>,
    /// Whether the failure was reported against the fragment stage.
    pub fragment_stage: bool,
}

// ─── GlDriver ────────────────────────────────────────────────────────────────

/// The wire-level rasterization API consumed by the render core.
///
/// Methods mirror the GL call surface one-to-one but use the typed enums from
/// [`types`](self). Implementations are stateful in the same way a GL context
/// is; redundant-call elision is *not* their job — that is what
/// [`StateCache`] is for.
pub trait GlDriver {
    fn capabilities(&self) -> Capabilities;

    // ── Buffers ──────────────────────────────────────────────────────────────
    fn create_buffer(&mut self) -> BufferId;
    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferId>);
    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage);
    fn buffer_sub_data(&mut self, target: BufferTarget, offset: usize, data: &[u8]);
    fn delete_buffer(&mut self, buffer: BufferId);

    // ── Vertex Arrays ────────────────────────────────────────────────────────
    fn create_vertex_array(&mut self) -> VertexArrayId;
    fn bind_vertex_array(&mut self, vao: Option<VertexArrayId>);
    fn delete_vertex_array(&mut self, vao: VertexArrayId);
    fn enable_vertex_attrib(&mut self, location: u32);
    fn disable_vertex_attrib(&mut self, location: u32);
    fn vertex_attrib_pointer(
        &mut self,
        location: u32,
        size: u32,
        normalized: bool,
        stride: u32,
        offset: u32,
    );
    fn vertex_attrib_divisor(&mut self, location: u32, divisor: u32);

    // ── Textures ─────────────────────────────────────────────────────────────
    fn create_texture(&mut self) -> TextureId;
    fn active_texture(&mut self, unit: u32);
    fn bind_texture(&mut self, target: TextureTarget, texture: Option<TextureId>);
    fn tex_image_2d(
        &mut self,
        target: TextureTarget,
        level: u32,
        width: u32,
        height: u32,
        format: TextureFormat,
        data: Option<&[u8]>,
    );
    fn tex_parameters(&mut self, target: TextureTarget, params: &TextureParams);
    fn generate_mipmaps(&mut self, target: TextureTarget);
    fn delete_texture(&mut self, texture: TextureId);

    // ── Framebuffers ─────────────────────────────────────────────────────────
    fn create_framebuffer(&mut self) -> FramebufferId;
    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>);
    fn framebuffer_texture(
        &mut self,
        attachment: Attachment,
        target: TextureTarget,
        texture: TextureId,
    );
    fn delete_framebuffer(&mut self, framebuffer: FramebufferId);

    // ── Programs ─────────────────────────────────────────────────────────────
    fn compile_program(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> std::result::Result<ProgramId, CompileError>;
    fn use_program(&mut self, program: Option<ProgramId>);
    fn delete_program(&mut self, program: ProgramId);
    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation>;
    fn attrib_location(&mut self, program: ProgramId, name: &str) -> Option<u32>;

    // ── Uniform Upload ───────────────────────────────────────────────────────
    fn uniform_1f(&mut self, location: UniformLocation, v: f32);
    fn uniform_1i(&mut self, location: UniformLocation, v: i32);
    fn uniform_2f(&mut self, location: UniformLocation, v: [f32; 2]);
    fn uniform_3f(&mut self, location: UniformLocation, v: [f32; 3]);
    fn uniform_4f(&mut self, location: UniformLocation, v: [f32; 4]);
    fn uniform_matrix3(&mut self, location: UniformLocation, v: &[f32; 9]);
    fn uniform_matrix4(&mut self, location: UniformLocation, v: &[f32; 16]);
    /// Flat float array upload (light arrays, shadow parameter arrays).
    fn uniform_1fv(&mut self, location: UniformLocation, v: &[f32]);
    fn uniform_1iv(&mut self, location: UniformLocation, v: &[i32]);
    /// Flat 4×4 matrix array upload (shadow matrices, bone matrices).
    fn uniform_matrix4v(&mut self, location: UniformLocation, v: &[f32]);

    // ── Pipeline State ───────────────────────────────────────────────────────
    fn enable(&mut self, capability: StateCapability);
    fn disable(&mut self, capability: StateCapability);
    fn blend_func_separate(
        &mut self,
        src_rgb: BlendFactor,
        dst_rgb: BlendFactor,
        src_alpha: BlendFactor,
        dst_alpha: BlendFactor,
    );
    fn blend_equation_separate(&mut self, rgb: BlendEquation, alpha: BlendEquation);
    fn depth_func(&mut self, func: CompareFunc);
    fn depth_mask(&mut self, enabled: bool);
    fn color_mask(&mut self, r: bool, g: bool, b: bool, a: bool);
    fn stencil_func_separate(
        &mut self,
        face: StencilFace,
        func: CompareFunc,
        reference: i32,
        mask: u32,
    );
    fn stencil_op_separate(
        &mut self,
        face: StencilFace,
        fail: StencilOp,
        z_fail: StencilOp,
        z_pass: StencilOp,
    );
    fn stencil_mask_separate(&mut self, face: StencilFace, mask: u32);
    fn cull_face(&mut self, mode: CullFaceMode);
    fn front_face(&mut self, winding: Winding);
    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32);
    fn polygon_offset(&mut self, factor: f32, units: f32);
    fn line_width(&mut self, width: f32);
    fn clear_color(&mut self, r: f32, g: f32, b: f32, a: f32);
    fn clear(&mut self, mask: ClearMask);

    // ── Draw Submission ──────────────────────────────────────────────────────
    fn draw_arrays(&mut self, mode: DrawMode, first: i32, count: i32);
    fn draw_elements(&mut self, mode: DrawMode, count: i32, index_type: IndexType, offset: usize);
    fn draw_arrays_instanced(&mut self, mode: DrawMode, first: i32, count: i32, instances: i32);
    fn draw_elements_instanced(
        &mut self,
        mode: DrawMode,
        count: i32,
        index_type: IndexType,
        offset: usize,
        instances: i32,
    );
}
