//! Feature-flag derivation for program variant selection.
//!
//! [`Props`] is a plain-old-data snapshot of everything that influences the
//! generated shader text. It is derived fresh from current inputs on every
//! check (never mutating the material) and hashed structurally into the
//! program cache key, so no intermediate key string is allocated per frame.

use std::hash::Hash;

use log::warn;
use xxhash_rust::xxh3::Xxh3;

use crate::gl::Capabilities;
use crate::render::{LightHash, RenderStates};
use crate::resources::{
    EnvCombine, Material, MaterialKind, Resources, Side, TexelEncoding, VertexColorMode,
};
use crate::scene::{FogKind, ShadowType};

/// Reserved vertex-stage uniform vectors (transforms, camera, lights) before
/// bone matrices claim the rest.
const RESERVED_VECTORS: u32 = 20;

/// Per-object inputs to variant derivation, extracted from the drawable's
/// node and mesh.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectContext {
    pub receive_shadow: bool,
    pub shadow_type: ShadowType,
    pub use_morph_targets: bool,
    pub use_morph_normals: bool,
    /// 0 means not skinned.
    pub bone_count: u32,
}

/// The flattened feature record that fully determines a shader variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Props {
    pub shader_name: String,

    pub webgl2: bool,
    pub logarithmic_depth: bool,

    pub use_map: bool,
    pub map_uv: u8,
    pub map_encoding: TexelEncoding,
    pub use_env_map: bool,
    pub env_encoding: TexelEncoding,
    pub env_combine: EnvCombine,
    pub use_emissive_map: bool,
    pub emissive_uv: u8,
    pub emissive_encoding: TexelEncoding,
    pub output_encoding: TexelEncoding,
    pub gamma_factor_bits: u32,

    pub accept_light: bool,
    /// Shadow entries zeroed when the object does not receive shadows.
    pub light_hash: LightHash,
    pub use_shadow: bool,
    pub shadow_type: ShadowType,

    pub fog: Option<FogKind>,
    pub num_clipping_planes: u8,

    pub use_morph_targets: bool,
    pub use_morph_normals: bool,
    pub use_skinning: bool,
    pub bone_count: u32,
    pub use_bone_texture: bool,

    pub vertex_colors: VertexColorMode,
    pub flat_shading: bool,
    pub double_sided: bool,
}

impl Props {
    /// Flatten material + object + render-state features. Pure with respect
    /// to the material; capability shortfalls downgrade here (shadow
    /// technique, bone count) with a warning rather than failing.
    #[must_use]
    pub fn derive(
        material: &Material,
        object: &ObjectContext,
        states: &RenderStates,
        capabilities: &Capabilities,
        resources: &Resources,
    ) -> Self {
        let scene = &states.scene;

        let tex_meta = |key: Option<crate::resources::TextureKey>| {
            key.and_then(|k| resources.textures.get(k))
                .map_or((false, 0, TexelEncoding::Linear), |t| {
                    (true, t.uv_channel, t.encoding)
                })
        };
        let (use_map, map_uv, map_encoding) = tex_meta(material.map);
        let (use_env_map, _, env_encoding) = tex_meta(material.env_map);
        let (use_emissive_map, emissive_uv, emissive_encoding) = tex_meta(material.emissive_map);

        let accept_light = material.accept_light;
        let mut light_hash = if accept_light {
            states.lighting.hash()
        } else {
            LightHash::default()
        };
        if !object.receive_shadow {
            light_hash.0[5] = 0;
            light_hash.0[6] = 0;
            light_hash.0[7] = 0;
        }
        let use_shadow =
            accept_light && object.receive_shadow && (light_hash.0[5] + light_hash.0[6] + light_hash.0[7]) > 0;

        let mut shadow_type = object.shadow_type;
        if shadow_type.needs_shadow_sampler()
            && (!capabilities.webgl2 || scene.disable_shadow_sampler)
        {
            shadow_type = ShadowType::PoissonSoft;
        }

        let num_clipping_planes = material
            .clipping_planes
            .as_ref()
            .map_or(scene.clipping_planes.len(), Vec::len)
            .min(255) as u8;

        let mut bone_count = object.bone_count;
        let mut use_bone_texture = false;
        if bone_count > 0 {
            let max_bones = capabilities
                .max_vertex_uniform_vectors
                .saturating_sub(RESERVED_VECTORS)
                / 4;
            if bone_count > max_bones {
                if capabilities.float_vertex_textures && capabilities.max_vertex_textures > 0 {
                    use_bone_texture = true;
                } else {
                    warn!(
                        "Skeleton has {bone_count} bones but the driver can address {max_bones}; extra bones are ignored"
                    );
                    bone_count = max_bones;
                }
            }
        }

        Self {
            shader_name: material.kind.shader_name().to_owned(),
            webgl2: capabilities.webgl2,
            logarithmic_depth: scene.logarithmic_depth,
            use_map,
            map_uv,
            map_encoding,
            use_env_map,
            env_encoding,
            env_combine: material.env_combine,
            use_emissive_map,
            emissive_uv,
            emissive_encoding,
            output_encoding: scene.output_encoding,
            gamma_factor_bits: scene.gamma_factor.to_bits(),
            accept_light,
            light_hash,
            use_shadow,
            shadow_type,
            fog: material.fog.then(|| scene.fog.map(|f| f.kind)).flatten(),
            num_clipping_planes,
            use_morph_targets: object.use_morph_targets,
            use_morph_normals: object.use_morph_targets && object.use_morph_normals,
            use_skinning: bone_count > 0,
            bone_count,
            use_bone_texture,
            vertex_colors: material.vertex_colors,
            flat_shading: material.flat_shading,
            double_sided: material.side == Side::Double,
        }
    }

    /// Structural hash of the record, plus the material's custom defines and
    /// — for anonymous custom shaders only — the full raw source, so two
    /// textually different unnamed shaders never collide.
    #[must_use]
    pub fn cache_key(&self, material: &Material) -> u128 {
        let mut hasher = Xxh3::default();
        self.hash(&mut hasher);
        material.defines.hash(&mut hasher);
        if let MaterialKind::Shader(source) = &material.kind {
            if source.name.is_none() {
                source.vertex.hash(&mut hasher);
                source.fragment.hash(&mut hasher);
            }
        }
        hasher.digest128()
    }
}
