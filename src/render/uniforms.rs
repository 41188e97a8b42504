//! Per-uniform dirty checking.
//!
//! Every active uniform in a linked program gets one [`UniformBinding`]
//! holding its location and the last value actually sent to the driver.
//! Comparison is bit-exact (see [`UniformValue`]'s `PartialEq`), which is the
//! primary mechanism keeping driver call counts flat at high draw counts.

use crate::gl::{GlDriver, UniformLocation};
use crate::resources::{UniformValue, bits_eq};

#[derive(Debug, Clone)]
pub struct UniformBinding {
    pub location: UniformLocation,
    cached: Option<UniformValue>,
}

impl UniformBinding {
    #[must_use]
    pub fn new(location: UniformLocation) -> Self {
        Self {
            location,
            cached: None,
        }
    }

    /// Upload `value` unless it is bit-identical to the last upload.
    /// Returns `true` when a driver call was issued.
    ///
    /// [`UniformValue::Texture`] never reaches this point: the render pass
    /// resolves texture references to a unit index first and uploads that as
    /// an `Int`.
    pub fn set(&mut self, driver: &mut dyn GlDriver, value: &UniformValue) -> bool {
        if self.cached.as_ref() == Some(value) {
            return false;
        }
        match value {
            UniformValue::Float(v) => driver.uniform_1f(self.location, *v),
            UniformValue::Int(v) => driver.uniform_1i(self.location, *v),
            UniformValue::Vec2(v) => driver.uniform_2f(self.location, *v),
            UniformValue::Vec3(v) => driver.uniform_3f(self.location, *v),
            UniformValue::Vec4(v) => driver.uniform_4f(self.location, *v),
            UniformValue::Mat3(v) => driver.uniform_matrix3(self.location, v),
            UniformValue::Mat4(v) => driver.uniform_matrix4(self.location, v),
            UniformValue::FloatArray(v) => driver.uniform_1fv(self.location, v),
            UniformValue::IntArray(v) => driver.uniform_1iv(self.location, v),
            UniformValue::Texture(_) => return false,
        }
        self.cached = Some(value.clone());
        true
    }

    /// Flat float array upload (light arrays, shadow params). The slice is
    /// compared against the cached payload before anything is cloned, so an
    /// unchanged array costs no allocation on the draw path.
    pub fn set_float_array(&mut self, driver: &mut dyn GlDriver, data: &[f32]) -> bool {
        if self.cached_slice_matches(data) {
            return false;
        }
        driver.uniform_1fv(self.location, data);
        self.cached = Some(UniformValue::FloatArray(data.to_vec()));
        true
    }

    /// Flat mat4 array upload (bone palettes, shadow matrices). Cached as a
    /// `FloatArray` payload; same allocation-free dirty check as
    /// [`UniformBinding::set_float_array`].
    pub fn set_matrix_array(&mut self, driver: &mut dyn GlDriver, data: &[f32]) -> bool {
        if self.cached_slice_matches(data) {
            return false;
        }
        driver.uniform_matrix4v(self.location, data);
        self.cached = Some(UniformValue::FloatArray(data.to_vec()));
        true
    }

    fn cached_slice_matches(&self, data: &[f32]) -> bool {
        matches!(&self.cached, Some(UniformValue::FloatArray(cached)) if bits_eq(cached, data))
    }

    /// Drop the cached value so the next set always uploads.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }
}
