//! Redundant-call elision in the pipeline state mirror and uniform bindings.

use prism::gl::{
    BufferTarget, CompareFunc, GlDriver, NullDriver, StateCache, UniformLocation, VertexArrayId,
    Winding,
};
use prism::render::UniformBinding;

#[test]
fn repeated_sets_reach_the_driver_once() {
    let mut driver = NullDriver::new();
    let mut state = StateCache::new(16);

    state.set_depth_test(&mut driver, true);
    state.set_depth_test(&mut driver, true);
    state.set_depth_test(&mut driver, true);
    assert_eq!(driver.counts.enable_disable, 1);

    state.set_depth_func(&mut driver, CompareFunc::LessEqual);
    state.set_depth_func(&mut driver, CompareFunc::LessEqual);
    assert_eq!(driver.counts.state_changes, 1);

    state.set_depth_func(&mut driver, CompareFunc::Always);
    assert_eq!(driver.counts.state_changes, 2);
}

#[test]
fn reset_forgets_every_mirror() {
    let mut driver = NullDriver::new();
    let mut state = StateCache::new(16);

    state.set_front_face(&mut driver, Winding::Ccw);
    state.set_viewport(&mut driver, [0, 0, 64, 64]);
    let before = driver.counts.state_changes;

    state.reset();
    state.set_front_face(&mut driver, Winding::Ccw);
    state.set_viewport(&mut driver, [0, 0, 64, 64]);
    assert_eq!(driver.counts.state_changes, before + 2);
}

#[test]
fn vao_binding_invalidates_the_element_buffer_mirror() {
    let mut driver = NullDriver::new();
    let mut state = StateCache::new(16);

    let buffer = driver.create_buffer();
    state.bind_buffer(&mut driver, BufferTarget::ElementArray, Some(buffer));
    state.bind_buffer(&mut driver, BufferTarget::ElementArray, Some(buffer));
    assert_eq!(driver.counts.bind_buffer, 1);

    // The element binding lives inside the VAO, so switching VAOs makes the
    // mirror stale.
    state.bind_vertex_array(&mut driver, Some(VertexArrayId(7)));
    state.bind_buffer(&mut driver, BufferTarget::ElementArray, Some(buffer));
    assert_eq!(driver.counts.bind_buffer, 2);

    // Array-buffer bindings are global and stay mirrored.
    state.bind_buffer(&mut driver, BufferTarget::Array, Some(buffer));
    state.bind_vertex_array(&mut driver, Some(VertexArrayId(8)));
    state.bind_buffer(&mut driver, BufferTarget::Array, Some(buffer));
    assert_eq!(driver.counts.bind_buffer, 3);
}

#[test]
fn texture_units_clamp_at_the_driver_budget() {
    let mut state = StateCache::new(2);
    assert_eq!(state.allocate_texture_unit(), 0);
    assert_eq!(state.allocate_texture_unit(), 1);
    // Over budget: warn and reuse the last unit rather than failing the draw.
    assert_eq!(state.allocate_texture_unit(), 1);

    state.reset_texture_units();
    assert_eq!(state.allocate_texture_unit(), 0);
}

#[test]
fn array_uniform_uploads_elide_repeats() {
    let mut driver = NullDriver::new();

    let mut palette_binding = UniformBinding::new(UniformLocation(0));
    let palette = vec![1.0f32; 32];
    assert!(palette_binding.set_matrix_array(&mut driver, &palette));
    assert!(!palette_binding.set_matrix_array(&mut driver, &palette));
    assert_eq!(driver.counts.uniform_uploads, 1);

    let mut changed = palette.clone();
    changed[5] = 2.0;
    assert!(palette_binding.set_matrix_array(&mut driver, &changed));
    assert_eq!(driver.counts.uniform_uploads, 2);

    let mut params_binding = UniformBinding::new(UniformLocation(1));
    let params = [0.5f32, 1.0, 0.0];
    assert!(params_binding.set_float_array(&mut driver, &params));
    assert!(!params_binding.set_float_array(&mut driver, &params));
    assert_eq!(driver.counts.uniform_uploads, 3);
}

#[test]
fn program_binding_reports_changes() {
    let mut driver = NullDriver::new();
    let mut state = StateCache::new(16);

    let program = driver.compile_program("v", "f").unwrap();
    assert!(state.use_program(&mut driver, Some(program)));
    assert!(!state.use_program(&mut driver, Some(program)));
    assert!(state.use_program(&mut driver, None));
    assert_eq!(driver.counts.use_program, 2);
}
