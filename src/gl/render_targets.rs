//! Framebuffer mirrors for offscreen render targets.
//!
//! The color attachment is a pool texture (so later passes can sample it);
//! the optional depth attachment is a driver-internal texture owned here.

use log::error;
use rustc_hash::FxHashMap;

use super::{
    Attachment, FramebufferId, GlDriver, StateCache, TextureCache, TextureFormat, TextureId,
    TextureTarget,
};
use crate::resources::{RenderTarget, RenderTargetKey, Resources};

struct Entry {
    framebuffer: FramebufferId,
    version: u64,
    depth_texture: Option<TextureId>,
}

#[derive(Default)]
pub struct RenderTargetCache {
    map: FxHashMap<RenderTargetKey, Entry>,
}

impl RenderTargetCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the framebuffer for `key`, building or rebuilding attachments
    /// when the target's version advanced. A target whose color texture was
    /// removed from the pool is a logged no-op bind to the default
    /// framebuffer.
    pub fn bind(
        &mut self,
        driver: &mut dyn GlDriver,
        state: &mut StateCache,
        textures: &mut TextureCache,
        resources: &Resources,
        key: RenderTargetKey,
        target: &RenderTarget,
    ) -> Option<FramebufferId> {
        if let Some(entry) = self.map.get(&key) {
            if entry.version == target.version() {
                let framebuffer = entry.framebuffer;
                state.bind_framebuffer(driver, Some(framebuffer));
                return Some(framebuffer);
            }
        }

        // Upload the color attachment first (unit 0 is scratch here).
        let color_handle = match target.color {
            Some(color_key) => match resources.textures.get(color_key) {
                Some(texture) => Some(textures.bind(driver, state, 0, color_key, texture)),
                None => {
                    error!("render target color texture was removed from the pool");
                    state.bind_framebuffer(driver, None);
                    return None;
                }
            },
            None => None,
        };

        let (framebuffer, old_depth) = match self.map.get(&key) {
            Some(entry) => (entry.framebuffer, entry.depth_texture),
            None => (driver.create_framebuffer(), None),
        };
        if let Some(old) = old_depth {
            state.forget_texture(old);
            driver.delete_texture(old);
        }

        state.bind_framebuffer(driver, Some(framebuffer));
        if let Some(color) = color_handle {
            driver.framebuffer_texture(Attachment::Color(0), TextureTarget::Texture2D, color);
        }

        let depth_texture = if target.depth_buffer {
            let depth = driver.create_texture();
            state.bind_texture(driver, 0, TextureTarget::Texture2D, Some(depth));
            driver.tex_image_2d(
                TextureTarget::Texture2D,
                0,
                target.width,
                target.height,
                TextureFormat::Depth24Stencil8,
                None,
            );
            driver.framebuffer_texture(
                Attachment::DepthStencil,
                TextureTarget::Texture2D,
                depth,
            );
            Some(depth)
        } else {
            None
        };

        self.map.insert(
            key,
            Entry {
                framebuffer,
                version: target.version(),
                depth_texture,
            },
        );
        Some(framebuffer)
    }

    /// Delete the framebuffer and its internal depth attachment.
    pub fn dispose(
        &mut self,
        driver: &mut dyn GlDriver,
        state: &mut StateCache,
        key: RenderTargetKey,
    ) {
        if let Some(entry) = self.map.remove(&key) {
            state.bind_framebuffer(driver, None);
            driver.delete_framebuffer(entry.framebuffer);
            if let Some(depth) = entry.depth_texture {
                state.forget_texture(depth);
                driver.delete_texture(depth);
            }
        }
    }
}
