//! Geometry buffer mirrors.
//!
//! One driver buffer per (geometry, attribute stream), re-specified only when
//! the stream's version counter moves past the mirrored one.

use rustc_hash::FxHashMap;

use super::{BufferId, BufferTarget, BufferUsage, GlDriver, StateCache};
use crate::resources::{Attribute, GeometryKey, IndexAttribute};

struct Entry {
    handle: BufferId,
    version: u64,
}

#[derive(Default)]
pub struct BufferCache {
    attributes: FxHashMap<GeometryKey, FxHashMap<String, Entry>>,
    indices: FxHashMap<GeometryKey, Entry>,
}

impl BufferCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Driver buffer for one attribute stream, uploading if the CPU payload
    /// changed. Leaves the buffer bound to the array target on upload.
    pub fn upload_attribute(
        &mut self,
        driver: &mut dyn GlDriver,
        state: &mut StateCache,
        geometry: GeometryKey,
        name: &str,
        attribute: &Attribute,
    ) -> BufferId {
        let streams = self.attributes.entry(geometry).or_default();
        if let Some(entry) = streams.get_mut(name) {
            if entry.version != attribute.version() {
                state.bind_buffer(driver, BufferTarget::Array, Some(entry.handle));
                driver.buffer_data(
                    BufferTarget::Array,
                    bytemuck::cast_slice(attribute.data()),
                    BufferUsage::StaticDraw,
                );
                entry.version = attribute.version();
            }
            return entry.handle;
        }

        let handle = driver.create_buffer();
        state.bind_buffer(driver, BufferTarget::Array, Some(handle));
        driver.buffer_data(
            BufferTarget::Array,
            bytemuck::cast_slice(attribute.data()),
            BufferUsage::StaticDraw,
        );
        streams.insert(
            name.to_owned(),
            Entry {
                handle,
                version: attribute.version(),
            },
        );
        handle
    }

    /// Driver buffer for the index stream. Uploads through the array target
    /// so the currently bound vertex array's element binding is untouched.
    pub fn upload_index(
        &mut self,
        driver: &mut dyn GlDriver,
        state: &mut StateCache,
        geometry: GeometryKey,
        index: &IndexAttribute,
    ) -> BufferId {
        if let Some(entry) = self.indices.get_mut(&geometry) {
            if entry.version != index.version() {
                state.bind_buffer(driver, BufferTarget::Array, Some(entry.handle));
                driver.buffer_data(
                    BufferTarget::Array,
                    bytemuck::cast_slice(index.data()),
                    BufferUsage::StaticDraw,
                );
                entry.version = index.version();
            }
            return entry.handle;
        }

        let handle = driver.create_buffer();
        state.bind_buffer(driver, BufferTarget::Array, Some(handle));
        driver.buffer_data(
            BufferTarget::Array,
            bytemuck::cast_slice(index.data()),
            BufferUsage::StaticDraw,
        );
        self.indices.insert(
            geometry,
            Entry {
                handle,
                version: index.version(),
            },
        );
        handle
    }

    /// Delete every driver buffer mirroring `geometry`.
    pub fn dispose_geometry(
        &mut self,
        driver: &mut dyn GlDriver,
        state: &mut StateCache,
        geometry: GeometryKey,
    ) {
        state.bind_buffer(driver, BufferTarget::Array, None);
        state.bind_buffer(driver, BufferTarget::ElementArray, None);
        if let Some(streams) = self.attributes.remove(&geometry) {
            for entry in streams.into_values() {
                driver.delete_buffer(entry.handle);
            }
        }
        if let Some(entry) = self.indices.remove(&geometry) {
            driver.delete_buffer(entry.handle);
        }
    }
}
