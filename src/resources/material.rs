//! Material property bag.
//!
//! Materials are flat data: shading model selector, color factors, texture
//! references, pipeline state (blend/depth/stencil/cull), and — for fully
//! custom materials — raw shader source plus `defines`/`uniforms` tables.
//! The renderer never mutates a material; staleness tracking lives in a
//! side table keyed by material identity.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};

use glam::{Vec3, Vec4};
use rustc_hash::FxHashMap;

use crate::gl::{
    BlendEquation, BlendFactor, Blending, CompareFunc, DrawMode, StencilOp,
};
use crate::resources::{TextureKey, UniformValue};

static NEXT_MATERIAL_ID: AtomicU32 = AtomicU32::new(1);

/// Which faces are rasterized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Side {
    #[default]
    Front,
    Back,
    Double,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VertexColorMode {
    #[default]
    None,
    Rgb,
    Rgba,
}

/// How an environment map combines with the diffuse color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EnvCombine {
    #[default]
    Multiply,
    Mix,
    Add,
}

/// Raw custom shader source pair.
///
/// Named sources share program variants by name; anonymous sources fold the
/// full text into the program cache key so textually different shaders never
/// collide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource {
    pub name: Option<String>,
    pub vertex: String,
    pub fragment: String,
}

/// Shading model selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaterialKind {
    Basic,
    Lambert,
    Phong,
    /// Packed-depth output, used by the shadow pass.
    Depth,
    /// Packed linear distance output, used by point-light shadow faces.
    Distance,
    Shader(ShaderSource),
}

impl MaterialKind {
    /// Built-in shader table key; empty for anonymous custom shaders.
    #[must_use]
    pub fn shader_name(&self) -> &str {
        match self {
            Self::Basic => "basic",
            Self::Lambert => "lambert",
            Self::Phong => "phong",
            Self::Depth => "depth",
            Self::Distance => "distance",
            Self::Shader(source) => source.name.as_deref().unwrap_or(""),
        }
    }
}

/// Stencil configuration; `back` overrides enable independent back-face
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StencilDesc {
    pub func: CompareFunc,
    pub reference: i32,
    pub read_mask: u32,
    pub write_mask: u32,
    pub fail: StencilOp,
    pub z_fail: StencilOp,
    pub z_pass: StencilOp,
    pub back_func: Option<CompareFunc>,
    pub back_fail: Option<StencilOp>,
    pub back_z_fail: Option<StencilOp>,
    pub back_z_pass: Option<StencilOp>,
}

impl Default for StencilDesc {
    fn default() -> Self {
        Self {
            func: CompareFunc::Always,
            reference: 0,
            read_mask: 0xff,
            write_mask: 0xff,
            fail: StencilOp::Keep,
            z_fail: StencilOp::Keep,
            z_pass: StencilOp::Keep,
            back_func: None,
            back_fail: None,
            back_z_fail: None,
            back_z_pass: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Material {
    /// Monotonic identity; the opaque-sort tie-break key.
    pub id: u32,
    pub name: String,
    pub kind: MaterialKind,

    // ── Color factors ────────────────────────────────────────────────────────
    pub color: Vec4,
    pub opacity: f32,
    pub emissive: Vec3,
    pub specular: Vec3,
    pub shininess: f32,

    // ── Texture slots ────────────────────────────────────────────────────────
    pub map: Option<TextureKey>,
    pub env_map: Option<TextureKey>,
    pub env_combine: EnvCombine,
    pub emissive_map: Option<TextureKey>,

    // ── Blending ─────────────────────────────────────────────────────────────
    pub transparent: bool,
    pub blending: Blending,
    pub premultiplied_alpha: bool,
    /// Explicit factors for [`Blending::Custom`].
    pub blend_src: BlendFactor,
    pub blend_dst: BlendFactor,
    pub blend_equation: BlendEquation,
    pub blend_src_alpha: Option<BlendFactor>,
    pub blend_dst_alpha: Option<BlendFactor>,
    pub blend_equation_alpha: Option<BlendEquation>,

    // ── Depth / color / stencil ──────────────────────────────────────────────
    pub depth_test: bool,
    pub depth_write: bool,
    pub depth_func: CompareFunc,
    pub color_write: bool,
    pub stencil: Option<StencilDesc>,

    // ── Rasterizer ───────────────────────────────────────────────────────────
    pub side: Side,
    pub polygon_offset: bool,
    pub polygon_offset_factor: f32,
    pub polygon_offset_units: f32,
    pub alpha_to_coverage: bool,
    pub line_width: f32,
    pub draw_mode: DrawMode,

    // ── Shading toggles ──────────────────────────────────────────────────────
    pub flat_shading: bool,
    pub vertex_colors: VertexColorMode,
    pub fog: bool,
    /// Whether the material participates in lighting (and therefore tracks
    /// the scene light hash).
    pub accept_light: bool,

    /// Per-material clipping-plane override; takes precedence over the
    /// scene's global planes.
    pub clipping_planes: Option<Vec<Vec4>>,

    // ── Custom shader tables ─────────────────────────────────────────────────
    pub defines: BTreeMap<String, String>,
    pub uniforms: FxHashMap<String, UniformValue>,

    version: u64,
}

impl Material {
    #[must_use]
    pub fn new(kind: MaterialKind) -> Self {
        let accept_light = matches!(kind, MaterialKind::Lambert | MaterialKind::Phong);
        Self {
            id: NEXT_MATERIAL_ID.fetch_add(1, Ordering::Relaxed),
            name: String::new(),
            kind,
            color: Vec4::ONE,
            opacity: 1.0,
            emissive: Vec3::ZERO,
            specular: Vec3::splat(0.06),
            shininess: 30.0,
            map: None,
            env_map: None,
            env_combine: EnvCombine::default(),
            emissive_map: None,
            transparent: false,
            blending: Blending::Normal,
            premultiplied_alpha: false,
            blend_src: BlendFactor::SrcAlpha,
            blend_dst: BlendFactor::OneMinusSrcAlpha,
            blend_equation: BlendEquation::Add,
            blend_src_alpha: None,
            blend_dst_alpha: None,
            blend_equation_alpha: None,
            depth_test: true,
            depth_write: true,
            depth_func: CompareFunc::LessEqual,
            color_write: true,
            stencil: None,
            side: Side::default(),
            polygon_offset: false,
            polygon_offset_factor: 0.0,
            polygon_offset_units: 0.0,
            alpha_to_coverage: false,
            line_width: 1.0,
            draw_mode: DrawMode::Triangles,
            flat_shading: false,
            vertex_colors: VertexColorMode::None,
            fog: true,
            accept_light,
            clipping_planes: None,
            defines: BTreeMap::new(),
            uniforms: FxHashMap::default(),
            version: 0,
        }
    }

    #[must_use]
    pub fn basic() -> Self {
        Self::new(MaterialKind::Basic)
    }

    #[must_use]
    pub fn lambert() -> Self {
        Self::new(MaterialKind::Lambert)
    }

    #[must_use]
    pub fn phong() -> Self {
        Self::new(MaterialKind::Phong)
    }

    /// Force the renderer to re-derive the program variant and re-snapshot
    /// this material on next draw.
    pub fn mark_changed(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }
}
