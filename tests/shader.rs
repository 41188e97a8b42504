//! Shader assembly pipeline and program cache behavior.

use glam::{Mat4, Vec3};
use prism::PrismError;
use prism::gl::{Capabilities, NullDriver, ProgramId};
use prism::render::RenderStates;
use prism::resources::{Material, MaterialKind, Resources, ShaderSource, TexelEncoding};
use prism::scene::{Light, SceneData, ShadowType};
use prism::shader::{ObjectContext, ProgramCache, Props, assemble};

fn derive(material: &Material, object: &ObjectContext, states: &RenderStates) -> Props {
    Props::derive(
        material,
        object,
        states,
        &Capabilities::default(),
        &Resources::new(),
    )
}

fn shader_material(name: Option<&str>, vertex: &str, fragment: &str) -> Material {
    Material::new(MaterialKind::Shader(ShaderSource {
        name: name.map(str::to_owned),
        vertex: vertex.to_owned(),
        fragment: fragment.to_owned(),
    }))
}

fn states_with_directional(count: usize, shadows: usize) -> RenderStates {
    let mut states = RenderStates::default();
    states.lighting.begin();
    for i in 0..count {
        let mut light = Light::directional(Vec3::ONE, 1.0);
        light.cast_shadow = i < shadows;
        states.lighting.push(&light, &Mat4::IDENTITY);
    }
    states.lighting.end(&SceneData::default());
    states
}

// ─── Assembly ────────────────────────────────────────────────────────────────

#[test]
fn built_in_basic_assembles_to_es3() {
    let material = Material::basic();
    let props = derive(&material, &ObjectContext::default(), &RenderStates::default());
    let (vertex, fragment) = assemble(&props, &material).unwrap();

    assert!(vertex.starts_with("#version 300 es\n"));
    assert!(fragment.contains("layout(location = 0) out vec4 outColor;"));
    assert!(fragment.contains("vec4 mapTexelToLinear"));
    assert!(!vertex.contains("#include"));
    assert!(!fragment.contains("#include"));
    assert!(!fragment.contains("texture2D("));
    assert!(!vertex.lines().any(|l| l.trim_start().starts_with("varying ")));
    assert!(!fragment.lines().any(|l| l.trim_start().starts_with("varying ")));
}

#[test]
fn every_built_in_kind_assembles() {
    for kind in [
        MaterialKind::Basic,
        MaterialKind::Lambert,
        MaterialKind::Phong,
        MaterialKind::Depth,
        MaterialKind::Distance,
    ] {
        let material = Material::new(kind);
        let props = derive(&material, &ObjectContext::default(), &RenderStates::default());
        let (vertex, fragment) = assemble(&props, &material).unwrap();
        assert!(vertex.contains("void main()"), "{}", material.kind.shader_name());
        assert!(fragment.contains("void main()"), "{}", material.kind.shader_name());
    }
}

#[test]
fn custom_shader_expands_includes() {
    let material = shader_material(
        None,
        "#include <common>\nvoid main() { gl_Position = vec4(0.0); }\n",
        "void main() { outColor = vec4(1.0); }\n",
    );
    let props = derive(&material, &ObjectContext::default(), &RenderStates::default());
    let (vertex, _) = assemble(&props, &material).unwrap();
    assert!(!vertex.contains("#include"));
}

#[test]
fn unknown_include_fails_loudly() {
    let material = shader_material(
        None,
        "#include <no_such_chunk>\nvoid main() {}\n",
        "void main() { outColor = vec4(1.0); }\n",
    );
    let props = derive(&material, &ObjectContext::default(), &RenderStates::default());
    match assemble(&props, &material) {
        Err(PrismError::UnknownShaderChunk(name)) => assert_eq!(name, "no_such_chunk"),
        other => panic!("expected UnknownShaderChunk, got {other:?}"),
    }
}

#[test]
fn light_counts_substitute_into_source() {
    let mut material = shader_material(
        None,
        "void main() { gl_Position = vec4(0.0); }\n",
        "const int dirCount = NUM_DIR_LIGHTS;\nvoid main() { outColor = vec4(1.0); }\n",
    );
    material.accept_light = true;

    let states = states_with_directional(2, 0);
    let props = derive(&material, &ObjectContext::default(), &states);
    let (_, fragment) = assemble(&props, &material).unwrap();
    assert!(fragment.contains("const int dirCount = 2;"));
}

#[test]
fn unroll_expands_substituted_bounds() {
    let mut material = shader_material(
        None,
        concat!(
            "#pragma unroll_loop_start\n",
            "for (int i = 0; i < NUM_DIR_LIGHTS; i++) {\n",
            "    sum += data[i] + item * UNROLLED_LOOP_INDEX;\n",
            "}\n",
            "#pragma unroll_loop_end\n",
            "void main() { gl_Position = vec4(0.0); }\n",
        ),
        "void main() { outColor = vec4(1.0); }\n",
    );
    material.accept_light = true;

    let states = states_with_directional(2, 0);
    let props = derive(&material, &ObjectContext::default(), &states);
    let (vertex, _) = assemble(&props, &material).unwrap();

    assert!(vertex.contains("data[0]"));
    assert!(vertex.contains("data[1]"));
    assert!(!vertex.contains("data[2]"));
    assert!(!vertex.contains("UNROLLED_LOOP_INDEX"));
    assert!(!vertex.contains("#pragma unroll_loop_start"));
    // The loop variable must not be replaced inside longer identifiers.
    assert!(vertex.contains("item * 0"));
    assert!(vertex.contains("item * 1"));
}

#[test]
fn unterminated_unroll_region_is_an_error() {
    let material = shader_material(
        None,
        "#pragma unroll_loop_start\nfor (int i = 0; i < 2; i++) { x += a[i]; }\n",
        "void main() { outColor = vec4(1.0); }\n",
    );
    let props = derive(&material, &ObjectContext::default(), &RenderStates::default());
    assert!(matches!(
        assemble(&props, &material),
        Err(PrismError::MalformedUnrollLoop(_))
    ));
}

#[test]
fn material_defines_land_in_both_stages() {
    let mut material = Material::basic();
    material.defines.insert("USE_FANCY".to_owned(), "1".to_owned());
    let props = derive(&material, &ObjectContext::default(), &RenderStates::default());
    let (vertex, fragment) = assemble(&props, &material).unwrap();
    assert!(vertex.contains("#define USE_FANCY 1"));
    assert!(fragment.contains("#define USE_FANCY 1"));
}

#[test]
fn es2_fallback_keeps_the_legacy_dialect() {
    let material = shader_material(
        None,
        "varying vec2 v_Uv;\nvoid main() { gl_Position = vec4(0.0); }\n",
        "varying vec2 v_Uv;\nvoid main() { outColor = vec4(1.0); }\n",
    );
    let mut capabilities = Capabilities::default();
    capabilities.webgl2 = false;
    let props = Props::derive(
        &material,
        &ObjectContext::default(),
        &RenderStates::default(),
        &capabilities,
        &Resources::new(),
    );
    let (vertex, fragment) = assemble(&props, &material).unwrap();

    assert!(!vertex.contains("#version 300 es"));
    assert!(vertex.contains("varying vec2 v_Uv;"));
    assert!(fragment.contains("#define outColor gl_FragColor"));
}

#[test]
fn srgb_output_generates_the_encode_pow() {
    let material = Material::basic();
    let mut states = RenderStates::default();
    states.scene.output_encoding = TexelEncoding::Srgb;
    let props = derive(&material, &ObjectContext::default(), &states);
    let (_, fragment) = assemble(&props, &material).unwrap();
    assert!(fragment.contains("linearToOutputTexel"));
    assert!(fragment.contains("1.0 / 2.2"));
}

// ─── Props derivation ────────────────────────────────────────────────────────

#[test]
fn receive_shadow_gates_the_shadow_hash() {
    let material = Material::lambert();
    let states = states_with_directional(1, 1);

    let receiver = ObjectContext {
        receive_shadow: true,
        ..ObjectContext::default()
    };
    let props = derive(&material, &receiver, &states);
    assert_eq!(props.light_hash.0[5], 1);
    assert!(props.use_shadow);

    let plain = ObjectContext::default();
    let props = derive(&material, &plain, &states);
    assert_eq!(props.light_hash.0[5], 0);
    assert!(!props.use_shadow);
    // Non-shadow light counts still apply.
    assert_eq!(props.light_hash.0[2], 1);
}

#[test]
fn unlit_materials_ignore_lighting_entirely() {
    let material = Material::basic();
    let states = states_with_directional(3, 1);
    let props = derive(&material, &ObjectContext::default(), &states);
    assert_eq!(props.light_hash.0, [0; 8]);
}

#[test]
fn shadow_sampler_downgrades_without_es3() {
    let material = Material::lambert();
    let object = ObjectContext {
        receive_shadow: true,
        shadow_type: ShadowType::Pcf5,
        ..ObjectContext::default()
    };
    let mut capabilities = Capabilities::default();
    capabilities.webgl2 = false;
    let props = Props::derive(
        &material,
        &object,
        &RenderStates::default(),
        &capabilities,
        &Resources::new(),
    );
    assert_eq!(props.shadow_type, ShadowType::PoissonSoft);

    let mut states = RenderStates::default();
    states.scene.disable_shadow_sampler = true;
    let props = derive(&material, &object, &states);
    assert_eq!(props.shadow_type, ShadowType::PoissonSoft);
}

#[test]
fn bone_count_clamps_to_the_uniform_budget() {
    let material = Material::lambert();
    let object = ObjectContext {
        bone_count: 30,
        ..ObjectContext::default()
    };
    let mut capabilities = Capabilities::default();
    capabilities.max_vertex_uniform_vectors = 100;
    capabilities.float_vertex_textures = false;

    let props = Props::derive(
        &material,
        &object,
        &RenderStates::default(),
        &capabilities,
        &Resources::new(),
    );
    assert!(props.use_skinning);
    assert!(!props.use_bone_texture);
    // (100 - 20 reserved) / 4 vectors per matrix.
    assert_eq!(props.bone_count, 20);

    capabilities.float_vertex_textures = true;
    let props = Props::derive(
        &material,
        &object,
        &RenderStates::default(),
        &capabilities,
        &Resources::new(),
    );
    assert!(props.use_bone_texture);
    assert_eq!(props.bone_count, 30);
}

#[test]
fn skinned_variant_defines_follow_the_bone_path() {
    let material = Material::basic();
    let object = ObjectContext {
        bone_count: 4,
        ..ObjectContext::default()
    };
    let props = derive(&material, &object, &RenderStates::default());
    let (vertex, _) = assemble(&props, &material).unwrap();
    assert!(vertex.contains("#define USE_SKINNING"));
    assert!(vertex.contains("#define MAX_BONES 4"));
    assert!(!vertex.contains("#define USE_BONE_TEXTURE"));
}

// ─── Cache keys ──────────────────────────────────────────────────────────────

#[test]
fn anonymous_shaders_key_on_their_source() {
    let a = shader_material(None, "void main() { gl_Position = vec4(0.0); }", "void main() {}");
    let b = shader_material(None, "void main() { gl_Position = vec4(1.0); }", "void main() {}");
    let states = RenderStates::default();
    let props_a = derive(&a, &ObjectContext::default(), &states);
    let props_b = derive(&b, &ObjectContext::default(), &states);
    assert_ne!(props_a.cache_key(&a), props_b.cache_key(&b));
}

#[test]
fn named_shaders_share_a_key() {
    let a = shader_material(Some("water"), "void main() { gl_Position = vec4(0.0); }", "void main() {}");
    let b = shader_material(Some("water"), "void main() { gl_Position = vec4(1.0); }", "void main() {}");
    let states = RenderStates::default();
    let props_a = derive(&a, &ObjectContext::default(), &states);
    let props_b = derive(&b, &ObjectContext::default(), &states);
    assert_eq!(props_a.cache_key(&a), props_b.cache_key(&b));
}

#[test]
fn defines_participate_in_the_key() {
    let plain = Material::basic();
    let mut tweaked = Material::basic();
    tweaked.defines.insert("ALPHATEST".to_owned(), "0.5".to_owned());
    let states = RenderStates::default();
    let props = derive(&plain, &ObjectContext::default(), &states);
    assert_ne!(props.cache_key(&plain), props.cache_key(&tweaked));
}

#[test]
fn light_counts_change_the_key() {
    let material = Material::lambert();
    let one = states_with_directional(1, 0);
    let two = states_with_directional(2, 0);
    let props_one = derive(&material, &ObjectContext::default(), &one);
    let props_two = derive(&material, &ObjectContext::default(), &two);
    assert_ne!(props_one.cache_key(&material), props_two.cache_key(&material));
}

// ─── Program cache ───────────────────────────────────────────────────────────

#[test]
fn identical_keys_share_one_program() {
    let mut driver = NullDriver::new();
    let mut cache = ProgramCache::new();

    let a = cache.acquire(&mut driver, 7, "v", "f").unwrap();
    let b = cache.acquire(&mut driver, 7, "ignored", "ignored").unwrap();
    assert_eq!(a, b);
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.used_times(a), Some(2));
    assert_eq!(driver.counts.programs_compiled, 1);
}

#[test]
fn release_deletes_at_refcount_zero() {
    let mut driver = NullDriver::new();
    let mut cache = ProgramCache::new();

    let id = cache.acquire(&mut driver, 7, "v", "f").unwrap();
    cache.acquire(&mut driver, 7, "v", "f").unwrap();

    cache.release(&mut driver, id);
    assert_eq!(cache.len(), 1);
    assert!(driver.alive_programs.contains(&id));

    cache.release(&mut driver, id);
    assert!(cache.is_empty());
    assert!(driver.alive_programs.is_empty());
    assert_eq!(driver.counts.programs_deleted, 1);

    // Releasing an id no longer pooled is a logged no-op.
    cache.release(&mut driver, ProgramId(999));
}

#[test]
fn distinct_keys_compile_separately() {
    let mut driver = NullDriver::new();
    let mut cache = ProgramCache::new();
    cache.acquire(&mut driver, 1, "v1", "f1").unwrap();
    cache.acquire(&mut driver, 2, "v2", "f2").unwrap();
    assert_eq!(cache.len(), 2);
    assert_eq!(driver.counts.programs_compiled, 2);
    assert_eq!(driver.compiled_sources.len(), 2);
}

#[test]
fn compile_failure_surfaces_the_log() {
    let mut driver = NullDriver::new();
    driver.fail_next_compile = Some("ERROR: 0:2: 'foo' : undeclared identifier".to_owned());
    let mut cache = ProgramCache::new();

    let err = cache
        .acquire(&mut driver, 1, "line one\nline two\nline three", "f")
        .unwrap_err();
    match err {
        PrismError::ProgramCompileFailed { log, .. } => {
            assert!(log.contains("undeclared identifier"));
        }
        other => panic!("expected ProgramCompileFailed, got {other:?}"),
    }
    assert!(cache.is_empty());
    assert!(driver.alive_programs.is_empty());
}
