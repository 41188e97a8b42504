//! Static shader chunk table.
//!
//! Chunks are written in the 1.00 dialect (`attribute`/`varying`,
//! `texture2D`); the preprocessor rewrites them for 3.00 when the driver
//! supports it. Count placeholders (`NUM_DIR_LIGHTS` and friends) are
//! substituted textually before compilation.

/// Look up a chunk body by `#include <name>` name.
#[must_use]
pub fn chunk(name: &str) -> Option<&'static str> {
    Some(match name {
        "common" => COMMON,
        "packing" => PACKING,
        "transform_vert" => TRANSFORM_VERT,
        "uv_pars_vert" => UV_PARS_VERT,
        "uv_vert" => UV_VERT,
        "uv_pars_frag" => UV_PARS_FRAG,
        "color_pars_vert" => COLOR_PARS_VERT,
        "color_vert" => COLOR_VERT,
        "color_pars_frag" => COLOR_PARS_FRAG,
        "color_frag" => COLOR_FRAG,
        "normal_pars_vert" => NORMAL_PARS_VERT,
        "normal_vert" => NORMAL_VERT,
        "normal_pars_frag" => NORMAL_PARS_FRAG,
        "morph_pars_vert" => MORPH_PARS_VERT,
        "morph_vert" => MORPH_VERT,
        "skinning_pars_vert" => SKINNING_PARS_VERT,
        "skinning_vert" => SKINNING_VERT,
        "map_pars_frag" => MAP_PARS_FRAG,
        "map_frag" => MAP_FRAG,
        "envmap_pars_frag" => ENVMAP_PARS_FRAG,
        "envmap_frag" => ENVMAP_FRAG,
        "emissive_pars_frag" => EMISSIVE_PARS_FRAG,
        "emissive_frag" => EMISSIVE_FRAG,
        "fog_pars_frag" => FOG_PARS_FRAG,
        "fog_frag" => FOG_FRAG,
        "light_pars_frag" => LIGHT_PARS_FRAG,
        "light_frag" => LIGHT_FRAG,
        "shadow_pars_vert" => SHADOW_PARS_VERT,
        "shadow_vert" => SHADOW_VERT,
        "shadow_pars_frag" => SHADOW_PARS_FRAG,
        "clipping_pars_frag" => CLIPPING_PARS_FRAG,
        "clipping_frag" => CLIPPING_FRAG,
        "logdepth_pars_vert" => LOGDEPTH_PARS_VERT,
        "logdepth_vert" => LOGDEPTH_VERT,
        "encoding_pars_frag" => ENCODING_PARS_FRAG,
        "encoding_frag" => ENCODING_FRAG,
        "dithering_frag" => DITHERING_FRAG,
        _ => return None,
    })
}

const COMMON: &str = "\
#define PI 3.14159265359
#define RECIPROCAL_PI 0.31830988618
#define EPSILON 1e-6
#define saturate(a) clamp(a, 0.0, 1.0)
float pow2(const in float x) { return x * x; }
";

const PACKING: &str = "\
const vec4 PackFactors = vec4(256.0 * 256.0 * 256.0, 256.0 * 256.0, 256.0, 1.0);
const vec4 UnpackFactors = vec4(1.0 / (256.0 * 256.0 * 256.0), 1.0 / (256.0 * 256.0), 1.0 / 256.0, 1.0);
vec4 packDepthToRGBA(const in float v) {
    vec4 r = vec4(fract(v * PackFactors.xyz), v);
    r.yzw -= r.xyz / 256.0;
    return r;
}
float unpackRGBAToDepth(const in vec4 v) {
    return dot(v, UnpackFactors);
}
";

const TRANSFORM_VERT: &str = "\
vec4 worldPosition = u_Model * vec4(transformed, 1.0);
gl_Position = u_ProjectionView * worldPosition;
v_WorldPosition = worldPosition.xyz;
";

const UV_PARS_VERT: &str = "\
#ifdef USE_UV1
attribute vec2 a_Uv;
varying vec2 v_Uv;
#endif
#ifdef USE_UV2
attribute vec2 a_Uv2;
varying vec2 v_Uv2;
#endif
";

const UV_VERT: &str = "\
#ifdef USE_UV1
v_Uv = a_Uv;
#endif
#ifdef USE_UV2
v_Uv2 = a_Uv2;
#endif
";

const UV_PARS_FRAG: &str = "\
#ifdef USE_UV1
varying vec2 v_Uv;
#endif
#ifdef USE_UV2
varying vec2 v_Uv2;
#endif
";

const COLOR_PARS_VERT: &str = "\
#ifdef USE_VCOLOR_RGB
attribute vec3 a_Color;
varying vec3 v_Color;
#endif
#ifdef USE_VCOLOR_RGBA
attribute vec4 a_Color;
varying vec4 v_Color;
#endif
";

const COLOR_VERT: &str = "\
#if defined(USE_VCOLOR_RGB) || defined(USE_VCOLOR_RGBA)
v_Color = a_Color;
#endif
";

const COLOR_PARS_FRAG: &str = "\
#ifdef USE_VCOLOR_RGB
varying vec3 v_Color;
#endif
#ifdef USE_VCOLOR_RGBA
varying vec4 v_Color;
#endif
";

const COLOR_FRAG: &str = "\
#ifdef USE_VCOLOR_RGB
outColor.rgb *= v_Color;
#endif
#ifdef USE_VCOLOR_RGBA
outColor *= v_Color;
#endif
";

const NORMAL_PARS_VERT: &str = "\
attribute vec3 a_Normal;
#ifndef FLAT_SHADED
varying vec3 v_Normal;
#endif
";

const NORMAL_VERT: &str = "\
vec3 objectNormal = a_Normal;
#ifdef USE_MORPH_NORMALS
objectNormal += morphNormal;
#endif
#ifdef USE_SKINNING
objectNormal = (skinMatrix * vec4(objectNormal, 0.0)).xyz;
#endif
#ifndef FLAT_SHADED
v_Normal = normalize((u_Model * vec4(objectNormal, 0.0)).xyz);
#endif
";

const NORMAL_PARS_FRAG: &str = "\
#ifndef FLAT_SHADED
varying vec3 v_Normal;
#endif
";

const MORPH_PARS_VERT: &str = "\
#ifdef USE_MORPH_TARGETS
uniform float u_MorphInfluences[8];
attribute vec3 a_MorphTarget0;
attribute vec3 a_MorphTarget1;
attribute vec3 a_MorphTarget2;
attribute vec3 a_MorphTarget3;
#ifdef USE_MORPH_NORMALS
attribute vec3 a_MorphNormal0;
attribute vec3 a_MorphNormal1;
#endif
#endif
";

const MORPH_VERT: &str = "\
#ifdef USE_MORPH_TARGETS
transformed += a_MorphTarget0 * u_MorphInfluences[0];
transformed += a_MorphTarget1 * u_MorphInfluences[1];
transformed += a_MorphTarget2 * u_MorphInfluences[2];
transformed += a_MorphTarget3 * u_MorphInfluences[3];
#ifdef USE_MORPH_NORMALS
vec3 morphNormal = a_MorphNormal0 * u_MorphInfluences[0] + a_MorphNormal1 * u_MorphInfluences[1];
#endif
#endif
";

const SKINNING_PARS_VERT: &str = "\
#ifdef USE_SKINNING
attribute vec4 a_SkinIndex;
attribute vec4 a_SkinWeight;
#ifdef USE_BONE_TEXTURE
uniform sampler2D u_BoneTexture;
uniform int u_BoneTextureSize;
mat4 getBoneMatrix(const in float i) {
    float j = i * 4.0;
    float x = mod(j, float(u_BoneTextureSize));
    float y = floor(j / float(u_BoneTextureSize));
    float dx = 1.0 / float(u_BoneTextureSize);
    float dy = 1.0 / float(u_BoneTextureSize);
    y = dy * (y + 0.5);
    vec4 v1 = texture2D(u_BoneTexture, vec2(dx * (x + 0.5), y));
    vec4 v2 = texture2D(u_BoneTexture, vec2(dx * (x + 1.5), y));
    vec4 v3 = texture2D(u_BoneTexture, vec2(dx * (x + 2.5), y));
    vec4 v4 = texture2D(u_BoneTexture, vec2(dx * (x + 3.5), y));
    return mat4(v1, v2, v3, v4);
}
#else
uniform mat4 u_BoneMatrices[MAX_BONES];
mat4 getBoneMatrix(const in float i) {
    return u_BoneMatrices[int(i)];
}
#endif
#endif
";

const SKINNING_VERT: &str = "\
#ifdef USE_SKINNING
mat4 boneMatX = getBoneMatrix(a_SkinIndex.x);
mat4 boneMatY = getBoneMatrix(a_SkinIndex.y);
mat4 boneMatZ = getBoneMatrix(a_SkinIndex.z);
mat4 boneMatW = getBoneMatrix(a_SkinIndex.w);
mat4 skinMatrix = a_SkinWeight.x * boneMatX + a_SkinWeight.y * boneMatY + a_SkinWeight.z * boneMatZ + a_SkinWeight.w * boneMatW;
transformed = (skinMatrix * vec4(transformed, 1.0)).xyz;
#endif
";

const MAP_PARS_FRAG: &str = "\
#ifdef USE_MAP
uniform sampler2D u_Map;
#endif
";

const MAP_FRAG: &str = "\
#ifdef USE_MAP
vec4 texelColor = texture2D(u_Map, MAP_UV);
texelColor = mapTexelToLinear(texelColor);
outColor *= texelColor;
#endif
";

const ENVMAP_PARS_FRAG: &str = "\
#ifdef USE_ENV_MAP
uniform samplerCube u_EnvMap;
uniform float u_EnvMapIntensity;
#endif
";

const ENVMAP_FRAG: &str = "\
#ifdef USE_ENV_MAP
vec3 reflectVec = reflect(normalize(v_WorldPosition - u_CameraPosition), N);
vec4 envColor = textureCube(u_EnvMap, reflectVec);
envColor = envMapTexelToLinear(envColor);
#if defined(ENV_COMBINE_MULTIPLY)
outColor.rgb = mix(outColor.rgb, outColor.rgb * envColor.rgb, u_EnvMapIntensity);
#elif defined(ENV_COMBINE_MIX)
outColor.rgb = mix(outColor.rgb, envColor.rgb, u_EnvMapIntensity);
#else
outColor.rgb += envColor.rgb * u_EnvMapIntensity;
#endif
#endif
";

const EMISSIVE_PARS_FRAG: &str = "\
uniform vec3 u_Emissive;
#ifdef USE_EMISSIVE_MAP
uniform sampler2D u_EmissiveMap;
#endif
";

const EMISSIVE_FRAG: &str = "\
vec3 totalEmissive = u_Emissive;
#ifdef USE_EMISSIVE_MAP
vec4 emissiveTexel = texture2D(u_EmissiveMap, EMISSIVE_MAP_UV);
emissiveTexel = emissiveMapTexelToLinear(emissiveTexel);
totalEmissive *= emissiveTexel.rgb;
#endif
outColor.rgb += totalEmissive;
";

const FOG_PARS_FRAG: &str = "\
#ifdef USE_FOG
uniform vec3 u_FogColor;
#ifdef USE_EXP2_FOG
uniform float u_FogDensity;
#else
uniform float u_FogNear;
uniform float u_FogFar;
#endif
#endif
";

const FOG_FRAG: &str = "\
#ifdef USE_FOG
float fogDepth = gl_FragCoord.z / gl_FragCoord.w;
#ifdef USE_EXP2_FOG
float fogFactor = 1.0 - exp(-u_FogDensity * u_FogDensity * fogDepth * fogDepth);
#else
float fogFactor = smoothstep(u_FogNear, u_FogFar, fogDepth);
#endif
outColor.rgb = mix(outColor.rgb, u_FogColor, fogFactor);
#endif
";

const LIGHT_PARS_FRAG: &str = "\
uniform vec3 u_AmbientLightColor;
#if NUM_HEMI_LIGHTS > 0
uniform float u_HemisphereLights[NUM_HEMI_LIGHTS * 9];
#endif
#if NUM_DIR_LIGHTS > 0
uniform float u_DirectionalLights[NUM_DIR_LIGHTS * 6];
#endif
#if NUM_POINT_LIGHTS > 0
uniform float u_PointLights[NUM_POINT_LIGHTS * 8];
#endif
#if NUM_SPOT_LIGHTS > 0
uniform float u_SpotLights[NUM_SPOT_LIGHTS * 13];
#endif
float punctualAttenuation(const in float dist, const in float cutoff, const in float decay) {
    if (cutoff > 0.0 && decay > 0.0) {
        return pow(saturate(1.0 - dist / cutoff), decay);
    }
    return 1.0;
}
";

const LIGHT_FRAG: &str = "\
vec3 totalDiffuse = u_AmbientLightColor * outColor.rgb;
vec3 totalSpecular = vec3(0.0);
#if NUM_HEMI_LIGHTS > 0
#pragma unroll_loop_start
for (int i = 0; i < NUM_HEMI_LIGHTS; i++) {
    vec3 hemiDir = vec3(u_HemisphereLights[i * 9], u_HemisphereLights[i * 9 + 1], u_HemisphereLights[i * 9 + 2]);
    vec3 skyColor = vec3(u_HemisphereLights[i * 9 + 3], u_HemisphereLights[i * 9 + 4], u_HemisphereLights[i * 9 + 5]);
    vec3 groundColor = vec3(u_HemisphereLights[i * 9 + 6], u_HemisphereLights[i * 9 + 7], u_HemisphereLights[i * 9 + 8]);
    float hemiWeight = 0.5 * dot(N, -hemiDir) + 0.5;
    totalDiffuse += mix(groundColor, skyColor, hemiWeight) * outColor.rgb;
}
#pragma unroll_loop_end
#endif
#if NUM_DIR_LIGHTS > 0
#pragma unroll_loop_start
for (int i = 0; i < NUM_DIR_LIGHTS; i++) {
    vec3 lightDir = vec3(u_DirectionalLights[i * 6], u_DirectionalLights[i * 6 + 1], u_DirectionalLights[i * 6 + 2]);
    vec3 lightColor = vec3(u_DirectionalLights[i * 6 + 3], u_DirectionalLights[i * 6 + 4], u_DirectionalLights[i * 6 + 5]);
    float dotNL = saturate(dot(N, -lightDir));
    vec3 irradiance = lightColor * dotNL * shadowMask(UNROLLED_LOOP_INDEX);
    totalDiffuse += irradiance * outColor.rgb * RECIPROCAL_PI;
    totalSpecular += irradiance * specularContribution(-lightDir, V, N);
}
#pragma unroll_loop_end
#endif
#if NUM_POINT_LIGHTS > 0
#pragma unroll_loop_start
for (int i = 0; i < NUM_POINT_LIGHTS; i++) {
    vec3 lightPos = vec3(u_PointLights[i * 8], u_PointLights[i * 8 + 1], u_PointLights[i * 8 + 2]);
    vec3 lightColor = vec3(u_PointLights[i * 8 + 3], u_PointLights[i * 8 + 4], u_PointLights[i * 8 + 5]);
    vec3 toLight = lightPos - v_WorldPosition;
    float dist = length(toLight);
    vec3 L = toLight / max(dist, EPSILON);
    float atten = punctualAttenuation(dist, u_PointLights[i * 8 + 6], u_PointLights[i * 8 + 7]);
    float dotNL = saturate(dot(N, L));
    vec3 irradiance = lightColor * dotNL * atten;
    totalDiffuse += irradiance * outColor.rgb * RECIPROCAL_PI;
    totalSpecular += irradiance * specularContribution(L, V, N);
}
#pragma unroll_loop_end
#endif
#if NUM_SPOT_LIGHTS > 0
#pragma unroll_loop_start
for (int i = 0; i < NUM_SPOT_LIGHTS; i++) {
    vec3 lightPos = vec3(u_SpotLights[i * 13], u_SpotLights[i * 13 + 1], u_SpotLights[i * 13 + 2]);
    vec3 spotDir = vec3(u_SpotLights[i * 13 + 3], u_SpotLights[i * 13 + 4], u_SpotLights[i * 13 + 5]);
    vec3 lightColor = vec3(u_SpotLights[i * 13 + 6], u_SpotLights[i * 13 + 7], u_SpotLights[i * 13 + 8]);
    vec3 toLight = lightPos - v_WorldPosition;
    float dist = length(toLight);
    vec3 L = toLight / max(dist, EPSILON);
    float angleCos = dot(-L, spotDir);
    float spotEffect = smoothstep(u_SpotLights[i * 13 + 11], u_SpotLights[i * 13 + 12], angleCos);
    float atten = spotEffect * punctualAttenuation(dist, u_SpotLights[i * 13 + 9], u_SpotLights[i * 13 + 10]);
    float dotNL = saturate(dot(N, L));
    vec3 irradiance = lightColor * dotNL * atten;
    totalDiffuse += irradiance * outColor.rgb * RECIPROCAL_PI;
    totalSpecular += irradiance * specularContribution(L, V, N);
}
#pragma unroll_loop_end
#endif
outColor.rgb = totalDiffuse + totalSpecular;
";

const SHADOW_PARS_VERT: &str = "\
#ifdef USE_SHADOW
#if NUM_DIR_SHADOWS > 0
uniform mat4 u_DirectionalShadowMatrices[NUM_DIR_SHADOWS];
varying vec4 v_DirectionalShadowCoords[NUM_DIR_SHADOWS];
#endif
#if NUM_SPOT_SHADOWS > 0
uniform mat4 u_SpotShadowMatrices[NUM_SPOT_SHADOWS];
varying vec4 v_SpotShadowCoords[NUM_SPOT_SHADOWS];
#endif
#endif
";

const SHADOW_VERT: &str = "\
#ifdef USE_SHADOW
#if NUM_DIR_SHADOWS > 0
#pragma unroll_loop_start
for (int i = 0; i < NUM_DIR_SHADOWS; i++) {
    v_DirectionalShadowCoords[i] = u_DirectionalShadowMatrices[i] * worldPosition;
}
#pragma unroll_loop_end
#endif
#if NUM_SPOT_SHADOWS > 0
#pragma unroll_loop_start
for (int i = 0; i < NUM_SPOT_SHADOWS; i++) {
    v_SpotShadowCoords[i] = u_SpotShadowMatrices[i] * worldPosition;
}
#pragma unroll_loop_end
#endif
#endif
";

const SHADOW_PARS_FRAG: &str = "\
#ifdef USE_SHADOW
#if NUM_DIR_SHADOWS > 0
uniform sampler2D u_DirectionalShadowMaps[NUM_DIR_SHADOWS];
uniform mat4 u_DirectionalShadowMatrices[NUM_DIR_SHADOWS];
uniform float u_DirectionalShadowParams[NUM_DIR_SHADOWS * 6];
varying vec4 v_DirectionalShadowCoords[NUM_DIR_SHADOWS];
#endif
#if NUM_POINT_SHADOWS > 0
uniform samplerCube u_PointShadowMaps[NUM_POINT_SHADOWS];
uniform mat4 u_PointShadowMatrices[NUM_POINT_SHADOWS];
uniform float u_PointShadowParams[NUM_POINT_SHADOWS * 6];
#endif
#if NUM_SPOT_SHADOWS > 0
uniform sampler2D u_SpotShadowMaps[NUM_SPOT_SHADOWS];
uniform mat4 u_SpotShadowMatrices[NUM_SPOT_SHADOWS];
uniform float u_SpotShadowParams[NUM_SPOT_SHADOWS * 6];
varying vec4 v_SpotShadowCoords[NUM_SPOT_SHADOWS];
#endif
float sampleShadow(const in sampler2D map, const in vec4 coord, const in float bias) {
    vec3 shadowCoord = coord.xyz / coord.w;
    if (shadowCoord.x < 0.0 || shadowCoord.x > 1.0 || shadowCoord.y < 0.0 || shadowCoord.y > 1.0) {
        return 1.0;
    }
    float depth = unpackRGBAToDepth(texture2D(map, shadowCoord.xy));
    return step(shadowCoord.z - bias, depth);
}
#endif
float shadowMask(const in int i) {
#if defined(USE_SHADOW) && NUM_DIR_SHADOWS > 0
    if (i < NUM_DIR_SHADOWS) {
        return sampleShadow(u_DirectionalShadowMaps[i], v_DirectionalShadowCoords[i], u_DirectionalShadowParams[i * 6]);
    }
#endif
    return 1.0;
}
";

const CLIPPING_PARS_FRAG: &str = "\
#if NUM_CLIPPING_PLANES > 0
uniform vec4 u_ClippingPlanes[NUM_CLIPPING_PLANES];
#endif
";

const CLIPPING_FRAG: &str = "\
#if NUM_CLIPPING_PLANES > 0
#pragma unroll_loop_start
for (int i = 0; i < NUM_CLIPPING_PLANES; i++) {
    vec4 plane = u_ClippingPlanes[i];
    if (dot(v_WorldPosition, plane.xyz) > plane.w) discard;
}
#pragma unroll_loop_end
#endif
";

const LOGDEPTH_PARS_VERT: &str = "\
#ifdef USE_LOG_DEPTH
uniform float u_LogDepthFC;
varying float v_FragDepth;
#endif
";

const LOGDEPTH_VERT: &str = "\
#ifdef USE_LOG_DEPTH
v_FragDepth = 1.0 + gl_Position.w;
gl_Position.z = log2(max(1e-6, 1.0 + gl_Position.w)) * u_LogDepthFC - 1.0;
gl_Position.z *= gl_Position.w;
#endif
";

const ENCODING_PARS_FRAG: &str = "\
vec4 LinearToLinear(const in vec4 value) { return value; }
vec4 sRGBToLinear(const in vec4 value) {
    return vec4(pow(value.rgb, vec3(2.2)), value.a);
}
vec4 LinearTosRGB(const in vec4 value) {
    return vec4(pow(value.rgb, vec3(1.0 / 2.2)), value.a);
}
vec4 GammaToLinear(const in vec4 value, const in float gammaFactor) {
    return vec4(pow(value.rgb, vec3(gammaFactor)), value.a);
}
vec4 LinearToGamma(const in vec4 value, const in float gammaFactor) {
    return vec4(pow(value.rgb, vec3(1.0 / gammaFactor)), value.a);
}
";

const ENCODING_FRAG: &str = "\
outColor = linearToOutputTexel(outColor);
";

const DITHERING_FRAG: &str = "\
#ifdef USE_DITHERING
vec3 ditherGrid = vec3(dot(vec2(171.0, 231.0), gl_FragCoord.xy));
ditherGrid = fract(ditherGrid.rgb / vec3(103.0, 71.0, 97.0));
outColor.rgb += ditherGrid / 255.0;
#endif
";
