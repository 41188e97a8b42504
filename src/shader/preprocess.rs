//! Textual shader source assembly.
//!
//! Order matters: defines prefix, then recursive `#include` expansion against
//! the chunk table, then count-placeholder substitution, then loop unrolling,
//! then the 3.00 dialect rewrite. Every step outputs plain shading-language
//! text; the driver's compiler is the only real parser involved.

use std::fmt::Write as _;

use crate::errors::{PrismError, Result};
use crate::resources::{EnvCombine, Material, MaterialKind, TexelEncoding, VertexColorMode};
use crate::scene::FogKind;
use crate::shader::{chunks, library};
use crate::shader::props::Props;

const MAX_INCLUDE_DEPTH: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Vertex,
    Fragment,
}

/// Produce the final (vertex, fragment) source pair for one variant.
pub fn assemble(props: &Props, material: &Material) -> Result<(String, String)> {
    let (vertex_base, fragment_base) = match &material.kind {
        MaterialKind::Shader(source) => (source.vertex.as_str(), source.fragment.as_str()),
        kind => {
            // Built-in names always resolve; fall back to basic defensively
            // is not needed, the kind list is closed.
            library::built_in(kind.shader_name()).ok_or_else(|| {
                PrismError::UnknownShaderChunk(kind.shader_name().to_owned())
            })?
        }
    };

    let vertex = finish(Stage::Vertex, vertex_base, props, material)?;
    let fragment = finish(Stage::Fragment, fragment_base, props, material)?;
    Ok((vertex, fragment))
}

fn finish(stage: Stage, base: &str, props: &Props, material: &Material) -> Result<String> {
    let expanded = expand_includes(base, 0)?;
    let substituted = substitute_counts(&expanded, props);
    let unrolled = unroll_loops(&substituted)?;
    let body = if props.webgl2 {
        convert_to_es3(stage, &unrolled)
    } else {
        unrolled
    };
    let mut out = prefix(stage, props, material);
    out.push_str(&body);
    Ok(out)
}

// ─── Include Expansion ───────────────────────────────────────────────────────

/// Recursively expand `#include <name>` lines against the chunk table.
/// Unknown names fail loudly; silent omission produces far worse downstream
/// compiler errors.
pub fn expand_includes(source: &str, depth: u32) -> Result<String> {
    if depth > MAX_INCLUDE_DEPTH {
        return Err(PrismError::IncludeDepthExceeded(source.lines().next().unwrap_or("").to_owned()));
    }
    let mut out = String::with_capacity(source.len());
    for line in source.lines() {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix("#include") {
            let name = rest.trim();
            if let Some(name) = name.strip_prefix('<').and_then(|n| n.strip_suffix('>')) {
                let body = chunks::chunk(name)
                    .ok_or_else(|| PrismError::UnknownShaderChunk(name.to_owned()))?;
                out.push_str(&expand_includes(body, depth + 1)?);
                continue;
            }
        }
        out.push_str(line);
        out.push('\n');
    }
    Ok(out)
}

// ─── Count Substitution ──────────────────────────────────────────────────────

fn substitute_counts(source: &str, props: &Props) -> String {
    let counts = props.light_hash.0;
    let mut out = source.to_owned();
    for (token, value) in [
        ("NUM_HEMI_LIGHTS", u32::from(counts[1])),
        ("NUM_DIR_LIGHTS", u32::from(counts[2])),
        ("NUM_POINT_LIGHTS", u32::from(counts[3])),
        ("NUM_SPOT_LIGHTS", u32::from(counts[4])),
        ("NUM_DIR_SHADOWS", u32::from(counts[5])),
        ("NUM_POINT_SHADOWS", u32::from(counts[6])),
        ("NUM_SPOT_SHADOWS", u32::from(counts[7])),
        ("NUM_CLIPPING_PLANES", u32::from(props.num_clipping_planes)),
    ] {
        out = out.replace(token, &value.to_string());
    }
    out
}

// ─── Loop Unrolling ──────────────────────────────────────────────────────────

/// Expand `#pragma unroll_loop_start` regions by duplicating the loop body
/// once per index, substituting the loop variable and the literal
/// `UNROLLED_LOOP_INDEX` token. Exists because the shading language rejects
/// dynamic indexing into some fixed-size arrays.
pub fn unroll_loops(source: &str) -> Result<String> {
    const START: &str = "#pragma unroll_loop_start";
    const END: &str = "#pragma unroll_loop_end";

    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    while let Some(start_at) = rest.find(START) {
        out.push_str(&rest[..start_at]);
        let after_start = &rest[start_at + START.len()..];
        let Some(end_at) = after_start.find(END) else {
            return Err(PrismError::MalformedUnrollLoop(
                "missing unroll_loop_end".to_owned(),
            ));
        };
        let region = &after_start[..end_at];
        out.push_str(&expand_unroll_region(region)?);
        rest = &after_start[end_at + END.len()..];
    }
    out.push_str(rest);
    Ok(out)
}

fn expand_unroll_region(region: &str) -> Result<String> {
    let malformed = |what: &str| PrismError::MalformedUnrollLoop(what.to_owned());

    let for_at = region.find("for").ok_or_else(|| malformed("missing for header"))?;
    let open = region[for_at..]
        .find('{')
        .map(|i| for_at + i)
        .ok_or_else(|| malformed("missing loop body"))?;
    let close = region.rfind('}').ok_or_else(|| malformed("missing closing brace"))?;
    if close <= open {
        return Err(malformed("unbalanced loop braces"));
    }

    // Header shape: for (int i = START; i < END; i++)
    let header = &region[for_at..open];
    let mut nums = header
        .split(|c: char| !c.is_ascii_digit())
        .filter(|s| !s.is_empty())
        .map(str::parse::<u32>);
    let start: u32 = nums
        .next()
        .transpose()
        .ok()
        .flatten()
        .ok_or_else(|| malformed("missing loop start bound"))?;
    let end: u32 = nums
        .next()
        .transpose()
        .ok()
        .flatten()
        .ok_or_else(|| malformed("missing loop end bound"))?;

    let var: String = header
        .find("int ")
        .map(|p| {
            header[p + 4..]
                .trim_start()
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
                .collect()
        })
        .filter(|w: &String| !w.is_empty())
        .ok_or_else(|| malformed("missing loop variable"))?;

    let body = &region[open + 1..close];
    let mut out = String::with_capacity(body.len() * (end.saturating_sub(start)) as usize);
    for index in start..end {
        let literal = index.to_string();
        let iteration = body.replace("UNROLLED_LOOP_INDEX", &literal);
        out.push_str(&replace_word(&iteration, &var, &literal));
    }
    Ok(out)
}

/// Whole-word identifier replacement (the loop variable must not match
/// inside longer identifiers).
fn replace_word(source: &str, word: &str, replacement: &str) -> String {
    let is_ident = |c: u8| c.is_ascii_alphanumeric() || c == b'_';
    let bytes = source.as_bytes();
    let mut out = String::with_capacity(source.len());
    let mut i = 0;
    while let Some(found) = source[i..].find(word) {
        let at = i + found;
        let before_ok = at == 0 || !is_ident(bytes[at - 1]);
        let after = at + word.len();
        let after_ok = after >= bytes.len() || !is_ident(bytes[after]);
        out.push_str(&source[i..at]);
        if before_ok && after_ok {
            out.push_str(replacement);
        } else {
            out.push_str(word);
        }
        i = after;
    }
    out.push_str(&source[i..]);
    out
}

// ─── Dialect Conversion ──────────────────────────────────────────────────────

/// Rewrite 1.00 qualifiers and sampling builtins for GLSL ES 3.00.
fn convert_to_es3(stage: Stage, source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    for line in source.lines() {
        let trimmed = line.trim_start();
        let indent = &line[..line.len() - trimmed.len()];
        if let Some(rest) = trimmed.strip_prefix("attribute ") {
            let _ = writeln!(out, "{indent}in {rest}");
        } else if let Some(rest) = trimmed.strip_prefix("varying ") {
            let qualifier = match stage {
                Stage::Vertex => "out",
                Stage::Fragment => "in",
            };
            let _ = writeln!(out, "{indent}{qualifier} {rest}");
        } else {
            out.push_str(line);
            out.push('\n');
        }
    }
    out.replace("texture2D(", "texture(")
        .replace("textureCube(", "texture(")
}

// ─── Prefix Generation ───────────────────────────────────────────────────────

fn encode_fn(name: &str, encoding: TexelEncoding, gamma: f32, decode: bool) -> String {
    let body = match (encoding, decode) {
        (TexelEncoding::Linear, _) => "return value;".to_owned(),
        (TexelEncoding::Srgb, true) => {
            "return vec4(pow(value.rgb, vec3(2.2)), value.a);".to_owned()
        }
        (TexelEncoding::Srgb, false) => {
            "return vec4(pow(value.rgb, vec3(1.0 / 2.2)), value.a);".to_owned()
        }
        (TexelEncoding::Gamma, true) => {
            format!("return vec4(pow(value.rgb, vec3({gamma:?})), value.a);")
        }
        (TexelEncoding::Gamma, false) => {
            format!("return vec4(pow(value.rgb, vec3(1.0 / {gamma:?})), value.a);")
        }
    };
    format!("vec4 {name}(vec4 value) {{ {body} }}\n")
}

fn define(out: &mut String, name: &str) {
    let _ = writeln!(out, "#define {name}");
}

fn prefix(stage: Stage, props: &Props, material: &Material) -> String {
    let mut out = String::new();

    if props.webgl2 {
        out.push_str("#version 300 es\n");
    }
    if stage == Stage::Fragment {
        out.push_str("precision highp float;\nprecision highp int;\n");
        if props.webgl2 {
            out.push_str("layout(location = 0) out vec4 outColor;\n");
        } else {
            out.push_str("#define outColor gl_FragColor\n");
        }
    } else {
        out.push_str("precision highp float;\nprecision highp int;\n");
    }

    if props.use_map {
        define(&mut out, "USE_MAP");
    }
    if props.use_env_map {
        define(&mut out, "USE_ENV_MAP");
        match props.env_combine {
            EnvCombine::Multiply => define(&mut out, "ENV_COMBINE_MULTIPLY"),
            EnvCombine::Mix => define(&mut out, "ENV_COMBINE_MIX"),
            EnvCombine::Add => define(&mut out, "ENV_COMBINE_ADD"),
        }
    }
    if props.use_emissive_map {
        define(&mut out, "USE_EMISSIVE_MAP");
    }
    if props.use_map && props.map_uv == 0 || props.use_emissive_map && props.emissive_uv == 0 {
        define(&mut out, "USE_UV1");
    }
    if props.use_map && props.map_uv == 1 || props.use_emissive_map && props.emissive_uv == 1 {
        define(&mut out, "USE_UV2");
    }
    match props.vertex_colors {
        VertexColorMode::None => {}
        VertexColorMode::Rgb => define(&mut out, "USE_VCOLOR_RGB"),
        VertexColorMode::Rgba => define(&mut out, "USE_VCOLOR_RGBA"),
    }
    if props.flat_shading {
        define(&mut out, "FLAT_SHADED");
    }
    if props.double_sided {
        define(&mut out, "DOUBLE_SIDED");
    }
    match props.fog {
        Some(FogKind::Linear) => define(&mut out, "USE_FOG"),
        Some(FogKind::Exp2) => {
            define(&mut out, "USE_FOG");
            define(&mut out, "USE_EXP2_FOG");
        }
        None => {}
    }
    if props.use_shadow {
        define(&mut out, "USE_SHADOW");
        let _ = writeln!(out, "#define SHADOW_TYPE {}", props.shadow_type as u32);
    }
    if props.logarithmic_depth {
        define(&mut out, "USE_LOG_DEPTH");
    }
    if props.use_morph_targets {
        define(&mut out, "USE_MORPH_TARGETS");
    }
    if props.use_morph_normals {
        define(&mut out, "USE_MORPH_NORMALS");
    }
    if props.use_skinning {
        define(&mut out, "USE_SKINNING");
        if props.use_bone_texture {
            define(&mut out, "USE_BONE_TEXTURE");
        } else {
            let _ = writeln!(out, "#define MAX_BONES {}", props.bone_count.max(1));
        }
    }

    let _ = writeln!(
        out,
        "#define MAP_UV {}",
        if props.map_uv == 1 { "v_Uv2" } else { "v_Uv" }
    );
    let _ = writeln!(
        out,
        "#define EMISSIVE_MAP_UV {}",
        if props.emissive_uv == 1 { "v_Uv2" } else { "v_Uv" }
    );

    for (name, value) in &material.defines {
        let _ = writeln!(out, "#define {name} {value}");
    }

    if stage == Stage::Fragment {
        let gamma = f32::from_bits(props.gamma_factor_bits);
        out.push_str(&encode_fn("mapTexelToLinear", props.map_encoding, gamma, true));
        out.push_str(&encode_fn("envMapTexelToLinear", props.env_encoding, gamma, true));
        out.push_str(&encode_fn(
            "emissiveMapTexelToLinear",
            props.emissive_encoding,
            gamma,
            true,
        ));
        out.push_str(&encode_fn(
            "linearToOutputTexel",
            props.output_encoding,
            gamma,
            false,
        ));
    }

    out
}

// ─── Diagnostics ─────────────────────────────────────────────────────────────

/// Numbered source context around a reported error line (±6 lines), for the
/// compile-failure log.
#[must_use]
pub fn error_context(source: &str, line: u32) -> String {
    let line = line as usize;
    let from = line.saturating_sub(6).max(1);
    let to = line + 6;
    let mut out = String::new();
    for (number, text) in source.lines().enumerate().map(|(i, t)| (i + 1, t)) {
        if number < from || number > to {
            continue;
        }
        let marker = if number == line { ">" } else { " " };
        let _ = writeln!(out, "{marker}{number:4}: {text}");
    }
    out
}
