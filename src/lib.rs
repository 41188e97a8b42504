pub mod errors;
pub mod gl;
pub mod math;
pub mod render;
pub mod resources;
pub mod scene;
pub mod shader;

pub use errors::{PrismError, Result};
pub use gl::{Capabilities, GlDriver, NullDriver};
pub use render::Renderer;
pub use resources::{Geometry, Material, MaterialKind, Resources, Texture};
pub use scene::{Camera, Light, LightKind, Node, Scene};
