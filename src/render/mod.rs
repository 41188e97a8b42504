//! Render queue construction and per-frame orchestration.
//!
//! | Piece             | Job                                                    |
//! |-------------------|--------------------------------------------------------|
//! | [`RenderQueue`]   | per-layer opaque/transparent buckets, dual-sorted      |
//! | [`LightingData`]  | flat light arrays, shadow-first order, count hash      |
//! | [`RenderStates`]  | per-(scene, camera) snapshot consumed by the pass      |
//! | [`RenderInfo`]    | draw call / primitive counters                         |
//! | [`Renderer`]      | owns the driver, every cache, and the draw loop        |
//!
//! Everything here is single-threaded by design: the caches are scoped to
//! the thread issuing driver calls, and draw order within a layer is
//! load-bearing for transparency correctness.

mod info;
mod lights;
mod pass;
mod queue;
mod renderer;
mod shadow;
mod states;
mod uniforms;

pub use info::RenderInfo;
pub use lights::{
    DIRECTIONAL_STRIDE, HEMISPHERE_STRIDE, LightHash, LightingData, POINT_STRIDE,
    SHADOW_PARAM_STRIDE, SPOT_STRIDE,
};
pub use queue::{Drawable, RenderQueue, RenderQueueLayer};
pub use renderer::Renderer;
pub use states::{CameraSnapshot, RenderCollection, RenderStates};
pub use uniforms::UniformBinding;
