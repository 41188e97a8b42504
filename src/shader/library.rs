//! Built-in shader source pairs, composed from the chunk table.

/// Vertex/fragment source for a built-in shader name.
#[must_use]
pub fn built_in(name: &str) -> Option<(&'static str, &'static str)> {
    Some(match name {
        "basic" => (BASIC_VERT, BASIC_FRAG),
        "lambert" => (LAMBERT_VERT, LAMBERT_FRAG),
        "phong" => (PHONG_VERT, PHONG_FRAG),
        "depth" => (DEPTH_VERT, DEPTH_FRAG),
        "distance" => (DISTANCE_VERT, DISTANCE_FRAG),
        _ => return None,
    })
}

const BASIC_VERT: &str = "\
#include <common>
attribute vec3 a_Position;
uniform mat4 u_Model;
uniform mat4 u_ProjectionView;
varying vec3 v_WorldPosition;
#include <uv_pars_vert>
#include <color_pars_vert>
#include <morph_pars_vert>
#include <skinning_pars_vert>
#include <logdepth_pars_vert>
void main() {
    vec3 transformed = a_Position;
    #include <morph_vert>
    #include <skinning_vert>
    #include <transform_vert>
    #include <uv_vert>
    #include <color_vert>
    #include <logdepth_vert>
}
";

const BASIC_FRAG: &str = "\
#include <common>
#include <packing>
uniform vec4 u_Color;
uniform float u_Opacity;
varying vec3 v_WorldPosition;
#include <uv_pars_frag>
#include <color_pars_frag>
#include <map_pars_frag>
#include <fog_pars_frag>
#include <clipping_pars_frag>
#include <encoding_pars_frag>
void main() {
    #include <clipping_frag>
    outColor = u_Color;
    outColor.a *= u_Opacity;
    #include <map_frag>
    #include <color_frag>
    #include <fog_frag>
    #include <encoding_frag>
    #include <dithering_frag>
}
";

const LIT_VERT: &str = "\
#include <common>
attribute vec3 a_Position;
uniform mat4 u_Model;
uniform mat4 u_ProjectionView;
varying vec3 v_WorldPosition;
#include <normal_pars_vert>
#include <uv_pars_vert>
#include <color_pars_vert>
#include <morph_pars_vert>
#include <skinning_pars_vert>
#include <shadow_pars_vert>
#include <logdepth_pars_vert>
void main() {
    vec3 transformed = a_Position;
    #include <morph_vert>
    #include <skinning_vert>
    #include <transform_vert>
    #include <normal_vert>
    #include <uv_vert>
    #include <color_vert>
    #include <shadow_vert>
    #include <logdepth_vert>
}
";

const LAMBERT_VERT: &str = LIT_VERT;
const PHONG_VERT: &str = LIT_VERT;

const LAMBERT_FRAG: &str = "\
#include <common>
#include <packing>
uniform vec4 u_Color;
uniform float u_Opacity;
uniform vec3 u_CameraPosition;
varying vec3 v_WorldPosition;
#include <normal_pars_frag>
#include <uv_pars_frag>
#include <color_pars_frag>
#include <map_pars_frag>
#include <emissive_pars_frag>
#include <light_pars_frag>
#include <shadow_pars_frag>
#include <fog_pars_frag>
#include <clipping_pars_frag>
#include <encoding_pars_frag>
vec3 specularContribution(const in vec3 L, const in vec3 V, const in vec3 N) {
    return vec3(0.0);
}
void main() {
    #include <clipping_frag>
    outColor = u_Color;
    outColor.a *= u_Opacity;
    #include <map_frag>
    #include <color_frag>
#ifdef FLAT_SHADED
    vec3 N = normalize(cross(dFdx(v_WorldPosition), dFdy(v_WorldPosition)));
#else
    vec3 N = normalize(v_Normal);
#endif
    vec3 V = normalize(u_CameraPosition - v_WorldPosition);
    #include <light_frag>
    #include <emissive_frag>
    #include <fog_frag>
    #include <encoding_frag>
    #include <dithering_frag>
}
";

const PHONG_FRAG: &str = "\
#include <common>
#include <packing>
uniform vec4 u_Color;
uniform float u_Opacity;
uniform vec3 u_CameraPosition;
uniform vec3 u_Specular;
uniform float u_Shininess;
varying vec3 v_WorldPosition;
#include <normal_pars_frag>
#include <uv_pars_frag>
#include <color_pars_frag>
#include <map_pars_frag>
#include <envmap_pars_frag>
#include <emissive_pars_frag>
#include <light_pars_frag>
#include <shadow_pars_frag>
#include <fog_pars_frag>
#include <clipping_pars_frag>
#include <encoding_pars_frag>
vec3 specularContribution(const in vec3 L, const in vec3 V, const in vec3 N) {
    vec3 H = normalize(L + V);
    float dotNH = saturate(dot(N, H));
    return u_Specular * pow(dotNH, u_Shininess);
}
void main() {
    #include <clipping_frag>
    outColor = u_Color;
    outColor.a *= u_Opacity;
    #include <map_frag>
    #include <color_frag>
#ifdef FLAT_SHADED
    vec3 N = normalize(cross(dFdx(v_WorldPosition), dFdy(v_WorldPosition)));
#else
    vec3 N = normalize(v_Normal);
#endif
    vec3 V = normalize(u_CameraPosition - v_WorldPosition);
    #include <light_frag>
    #include <envmap_frag>
    #include <emissive_frag>
    #include <fog_frag>
    #include <encoding_frag>
    #include <dithering_frag>
}
";

const DEPTH_VERT: &str = "\
#include <common>
attribute vec3 a_Position;
uniform mat4 u_Model;
uniform mat4 u_ProjectionView;
varying vec3 v_WorldPosition;
#include <morph_pars_vert>
#include <skinning_pars_vert>
void main() {
    vec3 transformed = a_Position;
    #include <morph_vert>
    #include <skinning_vert>
    #include <transform_vert>
}
";

const DEPTH_FRAG: &str = "\
#include <common>
#include <packing>
varying vec3 v_WorldPosition;
#include <clipping_pars_frag>
void main() {
    #include <clipping_frag>
    outColor = packDepthToRGBA(gl_FragCoord.z);
}
";

const DISTANCE_VERT: &str = DEPTH_VERT;

const DISTANCE_FRAG: &str = "\
#include <common>
#include <packing>
uniform vec3 u_LightPosition;
uniform float u_ShadowCameraNear;
uniform float u_ShadowCameraFar;
varying vec3 v_WorldPosition;
#include <clipping_pars_frag>
void main() {
    #include <clipping_frag>
    float dist = length(v_WorldPosition - u_LightPosition);
    dist = (dist - u_ShadowCameraNear) / (u_ShadowCameraFar - u_ShadowCameraNear);
    outColor = packDepthToRGBA(saturate(dist));
}
";
