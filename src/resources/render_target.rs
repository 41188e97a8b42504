//! Offscreen render target descriptor.
//!
//! A render target pairs a sampleable color texture (owned through the
//! resource pool so shadow maps can be bound as shader inputs later) with an
//! optional driver-internal depth buffer.

use super::TextureKey;

#[derive(Debug, Clone)]
pub struct RenderTarget {
    pub width: u32,
    pub height: u32,
    /// Color attachment; sampled by later passes (shadow maps live here as
    /// packed-depth RGBA).
    pub color: Option<TextureKey>,
    /// Allocate a depth attachment for depth testing during the pass.
    pub depth_buffer: bool,
    version: u64,
}

impl RenderTarget {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            color: None,
            depth_buffer: true,
            version: 0,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if self.width != width || self.height != height {
            self.width = width;
            self.height = height;
            self.version = self.version.wrapping_add(1);
        }
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }
}
