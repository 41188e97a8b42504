//! Vertex array object mirrors.
//!
//! One VAO per (program, geometry) pair, invalidated when the geometry's
//! attribute layout version moves. Morph-target attribute slots are patched
//! in place when the influence-driven selection changes, without rebuilding
//! the whole object.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::{BufferCache, BufferTarget, GlDriver, StateCache, VertexArrayId};
use crate::resources::{Attribute, Geometry, GeometryKey};
use crate::shader::Program;

/// Morph slots addressable by the built-in vertex shaders.
pub const MAX_MORPH_TARGETS: usize = 4;
pub const MAX_MORPH_NORMALS: usize = 2;

type MorphSelection = SmallVec<[usize; MAX_MORPH_TARGETS]>;

struct Entry {
    vao: VertexArrayId,
    layout_version: u64,
    morph_selection: MorphSelection,
}

#[derive(Default)]
pub struct VertexArrayCache {
    map: FxHashMap<(u32, GeometryKey), Entry>,
}

/// Shader attribute slot for a geometry stream name. Unknown names pass
/// through untouched so custom shaders can declare their own streams.
#[must_use]
pub fn shader_attribute_name(name: &str) -> &str {
    match name {
        "position" => "a_Position",
        "normal" => "a_Normal",
        "uv" => "a_Uv",
        "uv2" => "a_Uv2",
        "color" => "a_Color",
        "skin_index" => "a_SkinIndex",
        "skin_weight" => "a_SkinWeight",
        other => other,
    }
}

/// Indices of the most influential morph targets, capped to the slot budget.
/// The uniform upload path uses the same selection so influence values line
/// up with the attribute slots.
pub(crate) fn select_morphs(influences: &[f32], limit: usize) -> MorphSelection {
    let mut ranked: SmallVec<[(usize, f32); 8]> = influences
        .iter()
        .enumerate()
        .filter(|&(_, &w)| w != 0.0)
        .map(|(i, &w)| (i, w))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(limit);
    ranked.into_iter().map(|(i, _)| i).collect()
}

impl VertexArrayCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the VAO for (program, geometry), building it on first use and
    /// refreshing any stale attribute payloads.
    pub fn bind(
        &mut self,
        driver: &mut dyn GlDriver,
        state: &mut StateCache,
        buffers: &mut BufferCache,
        program: &Program,
        geometry_key: GeometryKey,
        geometry: &Geometry,
        morph_influences: &[f32],
    ) {
        // Payload freshness is independent of VAO reuse.
        for (name, attribute) in geometry.attributes() {
            buffers.upload_attribute(driver, state, geometry_key, name, attribute);
        }
        if let Some(index) = geometry.index() {
            buffers.upload_index(driver, state, geometry_key, index);
        }

        let selection = select_morphs(morph_influences, MAX_MORPH_TARGETS);
        let cache_key = (program.id.0, geometry_key);

        let needs_setup = self
            .map
            .get(&cache_key)
            .is_none_or(|e| e.layout_version != geometry.layout_version());

        if needs_setup {
            if let Some(old) = self.map.remove(&cache_key) {
                state.bind_vertex_array(driver, None);
                driver.delete_vertex_array(old.vao);
            }
            let vao = driver.create_vertex_array();
            state.bind_vertex_array(driver, Some(vao));

            for (name, attribute) in geometry.attributes() {
                self.set_pointer(
                    driver, state, buffers, program, geometry_key, name, name, attribute,
                );
            }
            Self::bind_morphs(
                driver, state, buffers, program, geometry_key, geometry, &selection,
            );
            if let Some(index) = geometry.index() {
                let handle = buffers.upload_index(driver, state, geometry_key, index);
                state.bind_buffer(driver, BufferTarget::ElementArray, Some(handle));
            }

            self.map.insert(
                cache_key,
                Entry {
                    vao,
                    layout_version: geometry.layout_version(),
                    morph_selection: selection,
                },
            );
            return;
        }

        let entry = &self.map[&cache_key];
        let vao = entry.vao;
        let morph_stale = entry.morph_selection != selection;
        state.bind_vertex_array(driver, Some(vao));
        if morph_stale {
            Self::bind_morphs(
                driver, state, buffers, program, geometry_key, geometry, &selection,
            );
            if let Some(entry) = self.map.get_mut(&cache_key) {
                entry.morph_selection = selection;
            }
        }
    }

    fn set_pointer(
        &self,
        driver: &mut dyn GlDriver,
        state: &mut StateCache,
        buffers: &mut BufferCache,
        program: &Program,
        geometry_key: GeometryKey,
        stream_name: &str,
        slot_name: &str,
        attribute: &Attribute,
    ) {
        let Some(&location) = program.attributes.get(shader_attribute_name(slot_name)) else {
            return;
        };
        let handle = buffers.upload_attribute(driver, state, geometry_key, stream_name, attribute);
        state.bind_buffer(driver, BufferTarget::Array, Some(handle));
        driver.enable_vertex_attrib(location);
        driver.vertex_attrib_pointer(
            location,
            u32::from(attribute.size()),
            attribute.normalized,
            0,
            0,
        );
        if attribute.divisor > 0 {
            driver.vertex_attrib_divisor(location, attribute.divisor);
        }
    }

    fn bind_morphs(
        driver: &mut dyn GlDriver,
        state: &mut StateCache,
        buffers: &mut BufferCache,
        program: &Program,
        geometry_key: GeometryKey,
        geometry: &Geometry,
        selection: &MorphSelection,
    ) {
        for (slot, &target) in selection.iter().enumerate().take(MAX_MORPH_TARGETS) {
            let slot_name = format!("a_MorphTarget{slot}");
            let Some(&location) = program.attributes.get(slot_name.as_str()) else {
                continue;
            };
            let Some(attribute) = geometry.morph_positions.get(target) else {
                continue;
            };
            let stream = format!("morph_position_{target}");
            let handle = buffers.upload_attribute(driver, state, geometry_key, &stream, attribute);
            state.bind_buffer(driver, BufferTarget::Array, Some(handle));
            driver.enable_vertex_attrib(location);
            driver.vertex_attrib_pointer(
                location,
                u32::from(attribute.size()),
                attribute.normalized,
                0,
                0,
            );
        }
        for (slot, &target) in selection.iter().enumerate().take(MAX_MORPH_NORMALS) {
            let slot_name = format!("a_MorphNormal{slot}");
            let Some(&location) = program.attributes.get(slot_name.as_str()) else {
                continue;
            };
            let Some(attribute) = geometry.morph_normals.get(target) else {
                continue;
            };
            let stream = format!("morph_normal_{target}");
            let handle = buffers.upload_attribute(driver, state, geometry_key, &stream, attribute);
            state.bind_buffer(driver, BufferTarget::Array, Some(handle));
            driver.enable_vertex_attrib(location);
            driver.vertex_attrib_pointer(
                location,
                u32::from(attribute.size()),
                attribute.normalized,
                0,
                0,
            );
        }
    }

    /// Delete every VAO mirroring `geometry`.
    pub fn dispose_geometry(
        &mut self,
        driver: &mut dyn GlDriver,
        state: &mut StateCache,
        geometry: GeometryKey,
    ) {
        state.bind_vertex_array(driver, None);
        self.map.retain(|&(_, g), entry| {
            if g == geometry {
                driver.delete_vertex_array(entry.vao);
                false
            } else {
                true
            }
        });
    }

    /// Delete every VAO built against `program_id` (program eviction).
    pub fn dispose_program(
        &mut self,
        driver: &mut dyn GlDriver,
        state: &mut StateCache,
        program_id: u32,
    ) {
        state.bind_vertex_array(driver, None);
        self.map.retain(|&(p, _), entry| {
            if p == program_id {
                driver.delete_vertex_array(entry.vao);
                false
            } else {
                true
            }
        });
    }
}
