//! Headless driver backend.
//!
//! Allocates handles, tracks which objects are alive, and counts every call
//! by category. Used by the integration tests to assert redundant-call
//! elision and resource lifecycle behavior without a GPU; also handy for
//! server-side scene validation.

use rustc_hash::FxHashSet;

use super::{
    Attachment, BlendEquation, BlendFactor, BufferId, BufferTarget, BufferUsage, Capabilities,
    ClearMask, CompareFunc, CompileError, CullFaceMode, DrawMode, FramebufferId, GlDriver,
    IndexType, ProgramId, StateCapability, StencilFace, StencilOp, TextureFormat, TextureId,
    TextureParams, TextureTarget, UniformLocation, VertexArrayId, Winding,
};

/// Per-category call counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub buffer_uploads: u32,
    pub texture_uploads: u32,
    pub programs_compiled: u32,
    pub programs_deleted: u32,
    pub use_program: u32,
    pub uniform_uploads: u32,
    pub state_changes: u32,
    pub enable_disable: u32,
    pub bind_texture: u32,
    pub bind_buffer: u32,
    pub bind_vertex_array: u32,
    pub bind_framebuffer: u32,
    pub draw_calls: u32,
    pub clears: u32,
}

/// A [`GlDriver`] that performs no GPU work.
pub struct NullDriver {
    capabilities: Capabilities,
    next_handle: u32,
    pub counts: CallCounts,
    pub alive_programs: FxHashSet<ProgramId>,
    pub alive_buffers: FxHashSet<BufferId>,
    pub alive_textures: FxHashSet<TextureId>,
    /// Sources of every program ever compiled, in compile order.
    pub compiled_sources: Vec<(String, String)>,
    /// When set, the next `compile_program` call fails with this log.
    pub fail_next_compile: Option<String>,
}

impl Default for NullDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl NullDriver {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capabilities(Capabilities::default())
    }

    #[must_use]
    pub fn with_capabilities(capabilities: Capabilities) -> Self {
        Self {
            capabilities,
            next_handle: 1,
            counts: CallCounts::default(),
            alive_programs: FxHashSet::default(),
            alive_buffers: FxHashSet::default(),
            alive_textures: FxHashSet::default(),
            compiled_sources: Vec::new(),
            fail_next_compile: None,
        }
    }

    fn next(&mut self) -> u32 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }
}

impl GlDriver for NullDriver {
    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn create_buffer(&mut self) -> BufferId {
        let id = BufferId(self.next());
        self.alive_buffers.insert(id);
        id
    }

    fn bind_buffer(&mut self, _target: BufferTarget, _buffer: Option<BufferId>) {
        self.counts.bind_buffer += 1;
    }

    fn buffer_data(&mut self, _target: BufferTarget, _data: &[u8], _usage: BufferUsage) {
        self.counts.buffer_uploads += 1;
    }

    fn buffer_sub_data(&mut self, _target: BufferTarget, _offset: usize, _data: &[u8]) {
        self.counts.buffer_uploads += 1;
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.alive_buffers.remove(&buffer);
    }

    fn create_vertex_array(&mut self) -> VertexArrayId {
        VertexArrayId(self.next())
    }

    fn bind_vertex_array(&mut self, _vao: Option<VertexArrayId>) {
        self.counts.bind_vertex_array += 1;
    }

    fn delete_vertex_array(&mut self, _vao: VertexArrayId) {}

    fn enable_vertex_attrib(&mut self, _location: u32) {}

    fn disable_vertex_attrib(&mut self, _location: u32) {}

    fn vertex_attrib_pointer(
        &mut self,
        _location: u32,
        _size: u32,
        _normalized: bool,
        _stride: u32,
        _offset: u32,
    ) {
    }

    fn vertex_attrib_divisor(&mut self, _location: u32, _divisor: u32) {}

    fn create_texture(&mut self) -> TextureId {
        let id = TextureId(self.next());
        self.alive_textures.insert(id);
        id
    }

    fn active_texture(&mut self, _unit: u32) {}

    fn bind_texture(&mut self, _target: TextureTarget, _texture: Option<TextureId>) {
        self.counts.bind_texture += 1;
    }

    fn tex_image_2d(
        &mut self,
        _target: TextureTarget,
        _level: u32,
        _width: u32,
        _height: u32,
        _format: TextureFormat,
        _data: Option<&[u8]>,
    ) {
        self.counts.texture_uploads += 1;
    }

    fn tex_parameters(&mut self, _target: TextureTarget, _params: &TextureParams) {}

    fn generate_mipmaps(&mut self, _target: TextureTarget) {}

    fn delete_texture(&mut self, texture: TextureId) {
        self.alive_textures.remove(&texture);
    }

    fn create_framebuffer(&mut self) -> FramebufferId {
        FramebufferId(self.next())
    }

    fn bind_framebuffer(&mut self, _framebuffer: Option<FramebufferId>) {
        self.counts.bind_framebuffer += 1;
    }

    fn framebuffer_texture(
        &mut self,
        _attachment: Attachment,
        _target: TextureTarget,
        _texture: TextureId,
    ) {
    }

    fn delete_framebuffer(&mut self, _framebuffer: FramebufferId) {}

    fn compile_program(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> std::result::Result<ProgramId, CompileError> {
        if let Some(log) = self.fail_next_compile.take() {
            return Err(CompileError {
                log,
                line: Some(1),
                fragment_stage: true,
            });
        }
        self.counts.programs_compiled += 1;
        self.compiled_sources
            .push((vertex_source.to_string(), fragment_source.to_string()));
        let id = ProgramId(self.next());
        self.alive_programs.insert(id);
        Ok(id)
    }

    fn use_program(&mut self, _program: Option<ProgramId>) {
        self.counts.use_program += 1;
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.counts.programs_deleted += 1;
        self.alive_programs.remove(&program);
    }

    fn uniform_location(&mut self, _program: ProgramId, _name: &str) -> Option<UniformLocation> {
        Some(UniformLocation(self.next()))
    }

    fn attrib_location(&mut self, _program: ProgramId, _name: &str) -> Option<u32> {
        Some(0)
    }

    fn uniform_1f(&mut self, _location: UniformLocation, _v: f32) {
        self.counts.uniform_uploads += 1;
    }

    fn uniform_1i(&mut self, _location: UniformLocation, _v: i32) {
        self.counts.uniform_uploads += 1;
    }

    fn uniform_2f(&mut self, _location: UniformLocation, _v: [f32; 2]) {
        self.counts.uniform_uploads += 1;
    }

    fn uniform_3f(&mut self, _location: UniformLocation, _v: [f32; 3]) {
        self.counts.uniform_uploads += 1;
    }

    fn uniform_4f(&mut self, _location: UniformLocation, _v: [f32; 4]) {
        self.counts.uniform_uploads += 1;
    }

    fn uniform_matrix3(&mut self, _location: UniformLocation, _v: &[f32; 9]) {
        self.counts.uniform_uploads += 1;
    }

    fn uniform_matrix4(&mut self, _location: UniformLocation, _v: &[f32; 16]) {
        self.counts.uniform_uploads += 1;
    }

    fn uniform_1fv(&mut self, _location: UniformLocation, _v: &[f32]) {
        self.counts.uniform_uploads += 1;
    }

    fn uniform_1iv(&mut self, _location: UniformLocation, _v: &[i32]) {
        self.counts.uniform_uploads += 1;
    }

    fn uniform_matrix4v(&mut self, _location: UniformLocation, _v: &[f32]) {
        self.counts.uniform_uploads += 1;
    }

    fn enable(&mut self, _capability: StateCapability) {
        self.counts.enable_disable += 1;
    }

    fn disable(&mut self, _capability: StateCapability) {
        self.counts.enable_disable += 1;
    }

    fn blend_func_separate(
        &mut self,
        _src_rgb: BlendFactor,
        _dst_rgb: BlendFactor,
        _src_alpha: BlendFactor,
        _dst_alpha: BlendFactor,
    ) {
        self.counts.state_changes += 1;
    }

    fn blend_equation_separate(&mut self, _rgb: BlendEquation, _alpha: BlendEquation) {
        self.counts.state_changes += 1;
    }

    fn depth_func(&mut self, _func: CompareFunc) {
        self.counts.state_changes += 1;
    }

    fn depth_mask(&mut self, _enabled: bool) {
        self.counts.state_changes += 1;
    }

    fn color_mask(&mut self, _r: bool, _g: bool, _b: bool, _a: bool) {
        self.counts.state_changes += 1;
    }

    fn stencil_func_separate(
        &mut self,
        _face: StencilFace,
        _func: CompareFunc,
        _reference: i32,
        _mask: u32,
    ) {
        self.counts.state_changes += 1;
    }

    fn stencil_op_separate(
        &mut self,
        _face: StencilFace,
        _fail: StencilOp,
        _z_fail: StencilOp,
        _z_pass: StencilOp,
    ) {
        self.counts.state_changes += 1;
    }

    fn stencil_mask_separate(&mut self, _face: StencilFace, _mask: u32) {
        self.counts.state_changes += 1;
    }

    fn cull_face(&mut self, _mode: CullFaceMode) {
        self.counts.state_changes += 1;
    }

    fn front_face(&mut self, _winding: Winding) {
        self.counts.state_changes += 1;
    }

    fn viewport(&mut self, _x: i32, _y: i32, _width: i32, _height: i32) {
        self.counts.state_changes += 1;
    }

    fn polygon_offset(&mut self, _factor: f32, _units: f32) {
        self.counts.state_changes += 1;
    }

    fn line_width(&mut self, _width: f32) {
        self.counts.state_changes += 1;
    }

    fn clear_color(&mut self, _r: f32, _g: f32, _b: f32, _a: f32) {
        self.counts.state_changes += 1;
    }

    fn clear(&mut self, _mask: ClearMask) {
        self.counts.clears += 1;
    }

    fn draw_arrays(&mut self, _mode: DrawMode, _first: i32, _count: i32) {
        self.counts.draw_calls += 1;
    }

    fn draw_elements(
        &mut self,
        _mode: DrawMode,
        _count: i32,
        _index_type: IndexType,
        _offset: usize,
    ) {
        self.counts.draw_calls += 1;
    }

    fn draw_arrays_instanced(&mut self, _mode: DrawMode, _first: i32, _count: i32, _instances: i32) {
        self.counts.draw_calls += 1;
    }

    fn draw_elements_instanced(
        &mut self,
        _mode: DrawMode,
        _count: i32,
        _index_type: IndexType,
        _offset: usize,
        _instances: i32,
    ) {
        self.counts.draw_calls += 1;
    }
}
