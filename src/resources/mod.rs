//! CPU-side resource containers.
//!
//! Geometries, materials, textures and render targets are plain data owned by
//! a [`Resources`] pool and addressed through `slotmap` keys. The render core
//! consumes them read-only during queue construction and mirrors them into
//! driver objects through the version-tracked caches in [`crate::gl`].

mod geometry;
mod material;
mod render_target;
mod texture;
mod uniforms;

pub use geometry::{Attribute, Geometry, GeometryGroup, IndexAttribute};
pub use material::{
    EnvCombine, Material, MaterialKind, ShaderSource, Side, StencilDesc, VertexColorMode,
};
pub use render_target::RenderTarget;
pub use texture::{TexelEncoding, Texture, TextureKind};
pub use uniforms::UniformValue;
pub(crate) use uniforms::bits_eq;

use slotmap::{SlotMap, new_key_type};

new_key_type! {
    pub struct GeometryKey;
    pub struct MaterialKey;
    pub struct TextureKey;
    pub struct RenderTargetKey;
}

/// Owner of all CPU-side resources.
///
/// Keys stay valid until the resource is removed; removal is the explicit
/// lifecycle hook that lets the driver caches evict their mirrored objects
/// (see `Renderer::dispose_*`).
#[derive(Default)]
pub struct Resources {
    pub geometries: SlotMap<GeometryKey, Geometry>,
    pub materials: SlotMap<MaterialKey, Material>,
    pub textures: SlotMap<TextureKey, Texture>,
    pub render_targets: SlotMap<RenderTargetKey, RenderTarget>,
}

impl Resources {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_geometry(&mut self, geometry: Geometry) -> GeometryKey {
        self.geometries.insert(geometry)
    }

    pub fn add_material(&mut self, material: Material) -> MaterialKey {
        self.materials.insert(material)
    }

    pub fn add_texture(&mut self, texture: Texture) -> TextureKey {
        self.textures.insert(texture)
    }

    pub fn add_render_target(&mut self, target: RenderTarget) -> RenderTargetKey {
        self.render_targets.insert(target)
    }
}
