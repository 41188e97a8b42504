//! Linked program wrapper with reflected uniform/attribute tables.

use rustc_hash::FxHashMap;

use crate::gl::{GlDriver, ProgramId};
use crate::render::UniformBinding;

/// One compiled shader variant. Owned by the [`super::ProgramCache`] pool and
/// shared by every material whose props hash to the same key.
pub struct Program {
    pub id: ProgramId,
    pub key: u128,
    /// Live references; the pool deletes the driver object at zero.
    pub used_times: u32,
    pub uniforms: FxHashMap<String, UniformBinding>,
    pub attributes: FxHashMap<String, u32>,
}

impl Program {
    /// Build the uniform/attribute tables by scanning the final source text
    /// and asking the driver for locations. Declarations the linker dropped
    /// (inactive branches) simply resolve to no location and are skipped.
    pub(crate) fn reflect(
        driver: &mut dyn GlDriver,
        id: ProgramId,
        key: u128,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Self {
        let mut uniforms = FxHashMap::default();
        for source in [vertex_source, fragment_source] {
            for name in declared_names(source, "uniform ") {
                if uniforms.contains_key(&name) {
                    continue;
                }
                if let Some(location) = driver.uniform_location(id, &name) {
                    uniforms.insert(name, UniformBinding::new(location));
                }
            }
        }

        let mut attributes = FxHashMap::default();
        for name in declared_names(vertex_source, "attribute ")
            .chain(declared_names(vertex_source, "in "))
        {
            if attributes.contains_key(&name) {
                continue;
            }
            if let Some(location) = driver.attrib_location(id, &name) {
                attributes.insert(name, location);
            }
        }

        Self {
            id,
            key,
            used_times: 1,
            uniforms,
            attributes,
        }
    }

    pub fn uniform_mut(&mut self, name: &str) -> Option<&mut UniformBinding> {
        self.uniforms.get_mut(name)
    }

    /// Drop every cached uniform value (used when the program is rebound
    /// after external context changes).
    pub fn invalidate_uniforms(&mut self) {
        for binding in self.uniforms.values_mut() {
            binding.invalidate();
        }
    }
}

/// Names declared at top level with the given storage qualifier, array
/// suffixes stripped.
fn declared_names<'a>(source: &'a str, qualifier: &'a str) -> impl Iterator<Item = String> + 'a {
    source.lines().filter_map(move |line| {
        let trimmed = line.trim_start();
        let rest = trimmed.strip_prefix(qualifier)?;
        let declaration = rest.split(';').next()?;
        let last = declaration.split_whitespace().last()?;
        let name = last.split('[').next()?.trim();
        if name.is_empty() {
            None
        } else {
            Some(name.to_owned())
        }
    })
}
