//! Uniform value container.
//!
//! Comparison is bit-exact on float payloads: the per-uniform dirty check in
//! the render pass must treat `-0.0` and `0.0` (or NaN payloads) as distinct
//! bit patterns rather than relying on IEEE equality.

use crate::resources::TextureKey;

/// A value assignable to a shader uniform, either from a material's custom
/// uniform table or from the standard name dispatch table.
#[derive(Debug, Clone)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat3([f32; 9]),
    Mat4([f32; 16]),
    /// Flat float array (light arrays, shadow parameters, bone matrices).
    FloatArray(Vec<f32>),
    IntArray(Vec<i32>),
    /// Texture reference; resolved to a unit at bind time.
    Texture(TextureKey),
}

pub(crate) fn bits_eq(a: &[f32], b: &[f32]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b.iter())
            .all(|(x, y)| x.to_bits() == y.to_bits())
}

impl PartialEq for UniformValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Vec2(a), Self::Vec2(b)) => bits_eq(a, b),
            (Self::Vec3(a), Self::Vec3(b)) => bits_eq(a, b),
            (Self::Vec4(a), Self::Vec4(b)) => bits_eq(a, b),
            (Self::Mat3(a), Self::Mat3(b)) => bits_eq(a, b),
            (Self::Mat4(a), Self::Mat4(b)) => bits_eq(a, b),
            (Self::FloatArray(a), Self::FloatArray(b)) => bits_eq(a, b),
            (Self::IntArray(a), Self::IntArray(b)) => a == b,
            (Self::Texture(a), Self::Texture(b)) => a == b,
            _ => false,
        }
    }
}
