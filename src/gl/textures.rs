//! Texture mirrors keyed by resource identity.

use rustc_hash::FxHashMap;

use super::{GlDriver, StateCache, TextureId, TextureTarget};
use crate::resources::{Texture, TextureKey, TextureKind};

struct Entry {
    handle: TextureId,
    version: u64,
}

#[derive(Default)]
pub struct TextureCache {
    map: FxHashMap<TextureKey, Entry>,
}

impl TextureCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `texture` to `unit`, (re)uploading image data when its version
    /// counter advanced. Returns the driver handle.
    pub fn bind(
        &mut self,
        driver: &mut dyn GlDriver,
        state: &mut StateCache,
        unit: u32,
        key: TextureKey,
        texture: &Texture,
    ) -> TextureId {
        let target = match texture.kind {
            TextureKind::D2 => TextureTarget::Texture2D,
            TextureKind::Cube => TextureTarget::TextureCube,
        };

        if let Some(entry) = self.map.get(&key) {
            if entry.version == texture.version() {
                let handle = entry.handle;
                state.bind_texture(driver, unit, target, Some(handle));
                return handle;
            }
        }

        let handle = match self.map.get(&key) {
            Some(entry) => entry.handle,
            None => driver.create_texture(),
        };
        state.bind_texture(driver, unit, target, Some(handle));
        match texture.kind {
            TextureKind::D2 => {
                let data = texture.images.first().map(Vec::as_slice).filter(|d| !d.is_empty());
                driver.tex_image_2d(
                    TextureTarget::Texture2D,
                    0,
                    texture.width,
                    texture.height,
                    texture.format,
                    data,
                );
            }
            TextureKind::Cube => {
                for face in 0..6u8 {
                    let data = texture
                        .images
                        .get(face as usize)
                        .map(Vec::as_slice)
                        .filter(|d| !d.is_empty());
                    driver.tex_image_2d(
                        TextureTarget::TextureCubeFace(face),
                        0,
                        texture.width,
                        texture.height,
                        texture.format,
                        data,
                    );
                }
            }
        }
        driver.tex_parameters(target, &texture.params);
        if texture.generate_mipmaps {
            driver.generate_mipmaps(target);
        }
        self.map.insert(
            key,
            Entry {
                handle,
                version: texture.version(),
            },
        );
        handle
    }

    #[must_use]
    pub fn handle(&self, key: TextureKey) -> Option<TextureId> {
        self.map.get(&key).map(|e| e.handle)
    }

    /// Delete the driver texture mirroring `key` and scrub it from the unit
    /// mirrors.
    pub fn dispose(&mut self, driver: &mut dyn GlDriver, state: &mut StateCache, key: TextureKey) {
        if let Some(entry) = self.map.remove(&key) {
            state.forget_texture(entry.handle);
            driver.delete_texture(entry.handle);
        }
    }
}
