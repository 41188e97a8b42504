//! Math helpers layered on top of `glam`.
//!
//! Vector/matrix/quaternion primitives come straight from `glam`; this module
//! only adds the pieces the render core needs to coordinate: frustum planes,
//! bounding volumes, and TRS compose/decompose with reflection handling.

mod bounds;
mod frustum;
mod transform;

pub use bounds::{BoundingBox, BoundingSphere};
pub use frustum::Frustum;
pub use transform::{compose, decompose, try_inverse};
