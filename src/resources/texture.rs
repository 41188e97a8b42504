//! Texture descriptors.
//!
//! The core never interprets pixel contents — only dimensions, format and
//! encoding metadata. Payload bytes are opaque and handed to the driver
//! verbatim when the version counter advances.

use crate::gl::{TextureFormat, TextureParams};

/// Texel transfer encoding; feeds the shader variant selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TexelEncoding {
    #[default]
    Linear,
    Srgb,
    Gamma,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureKind {
    #[default]
    D2,
    Cube,
}

#[derive(Debug, Clone)]
pub struct Texture {
    pub kind: TextureKind,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub params: TextureParams,
    pub encoding: TexelEncoding,
    /// Which UV channel samples this texture (0 or 1).
    pub uv_channel: u8,
    pub generate_mipmaps: bool,
    /// One image for 2D, six face images for cube maps. Empty payloads are
    /// legal (render-target attachments are allocated without data).
    pub images: Vec<Vec<u8>>,
    version: u64,
}

impl Texture {
    #[must_use]
    pub fn new_2d(width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            kind: TextureKind::D2,
            width,
            height,
            format,
            params: TextureParams::default(),
            encoding: TexelEncoding::default(),
            uv_channel: 0,
            generate_mipmaps: false,
            images: Vec::new(),
            version: 0,
        }
    }

    #[must_use]
    pub fn new_cube(size: u32, format: TextureFormat) -> Self {
        Self {
            kind: TextureKind::Cube,
            width: size,
            height: size,
            format,
            params: TextureParams::default(),
            encoding: TexelEncoding::default(),
            uv_channel: 0,
            generate_mipmaps: false,
            images: Vec::new(),
            version: 0,
        }
    }

    pub fn set_images(&mut self, images: Vec<Vec<u8>>) {
        self.images = images;
        self.version = self.version.wrapping_add(1);
    }

    /// Mark the descriptor dirty without replacing payloads (e.g. after a
    /// parameter change that requires re-upload).
    pub fn mark_changed(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }
}
