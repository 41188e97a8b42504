//! End-to-end frames against the headless driver.

use std::f32::consts::FRAC_PI_3;

use glam::Vec3;
use prism::gl::{CallCounts, NullDriver};
use prism::render::Renderer;
use prism::resources::{Attribute, Geometry, Material, MaterialKind, Resources, TextureKind};
use prism::scene::{Camera, Light, Mesh, Node, Scene};

fn triangle() -> Geometry {
    let mut geometry = Geometry::new();
    geometry.set_attribute(
        "position",
        Attribute::new(
            vec![-1.0, -1.0, 0.0, 1.0, -1.0, 0.0, 0.0, 1.0, 0.0],
            3,
        ),
    );
    geometry.compute_bounds();
    geometry
}

fn camera() -> Camera {
    let mut camera = Camera::new_perspective(FRAC_PI_3, 1.0, 0.1, 100.0);
    camera.set_position(Vec3::new(0.0, 0.0, 5.0));
    camera.look_at(Vec3::ZERO, Vec3::Y);
    camera.update_matrices();
    camera
}

fn renderer() -> Renderer<NullDriver> {
    // Surfaces the draw-skip error logs when a test fails under
    // RUST_LOG=debug.
    let _ = env_logger::builder().is_test(true).try_init();
    Renderer::new(NullDriver::new(), 256, 256)
}

fn delta(after: &CallCounts, before: &CallCounts) -> CallCounts {
    CallCounts {
        buffer_uploads: after.buffer_uploads - before.buffer_uploads,
        texture_uploads: after.texture_uploads - before.texture_uploads,
        programs_compiled: after.programs_compiled - before.programs_compiled,
        programs_deleted: after.programs_deleted - before.programs_deleted,
        use_program: after.use_program - before.use_program,
        uniform_uploads: after.uniform_uploads - before.uniform_uploads,
        state_changes: after.state_changes - before.state_changes,
        enable_disable: after.enable_disable - before.enable_disable,
        bind_texture: after.bind_texture - before.bind_texture,
        bind_buffer: after.bind_buffer - before.bind_buffer,
        bind_vertex_array: after.bind_vertex_array - before.bind_vertex_array,
        bind_framebuffer: after.bind_framebuffer - before.bind_framebuffer,
        draw_calls: after.draw_calls - before.draw_calls,
        clears: after.clears - before.clears,
    }
}

#[test]
fn single_mesh_draws_once() {
    let mut resources = Resources::new();
    let geometry = resources.add_geometry(triangle());
    let material = resources.add_material(Material::basic());

    let mut scene = Scene::new();
    scene.add_node(Node::with_mesh(Mesh::new(geometry, material)));

    let camera = camera();
    let mut renderer = renderer();
    renderer.render(&mut scene, &camera, &mut resources);

    assert_eq!(renderer.driver().counts.draw_calls, 1);
    assert_eq!(renderer.info.draw_calls, 1);
    assert_eq!(renderer.info.triangles, 1);
    assert_eq!(renderer.programs().len(), 1);
    assert!(renderer.material_program(material).is_some());
    assert_eq!(renderer.driver().counts.programs_compiled, 1);
}

#[test]
fn second_frame_is_all_cache_hits() {
    let mut resources = Resources::new();
    let geometry = resources.add_geometry(triangle());
    let material = resources.add_material(Material::basic());

    let mut scene = Scene::new();
    scene.add_node(Node::with_mesh(Mesh::new(geometry, material)));

    let camera = camera();
    let mut renderer = renderer();
    renderer.render(&mut scene, &camera, &mut resources);
    let first = renderer.driver().counts;
    renderer.render(&mut scene, &camera, &mut resources);
    let second = delta(&renderer.driver().counts, &first);

    assert_eq!(second.draw_calls, 1);
    assert_eq!(second.clears, 1);
    // Everything driver-side is mirrored; an unchanged scene re-issues
    // nothing but the clear and the draw itself.
    assert_eq!(second.programs_compiled, 0);
    assert_eq!(second.buffer_uploads, 0);
    assert_eq!(second.use_program, 0);
    assert_eq!(second.bind_vertex_array, 0);
    assert_eq!(second.bind_framebuffer, 0);
    assert_eq!(second.state_changes, 0);
    assert_eq!(second.enable_disable, 0);
    assert_eq!(second.uniform_uploads, 0);
}

#[test]
fn equal_feature_materials_share_one_program() {
    let mut resources = Resources::new();
    let geometry = resources.add_geometry(triangle());
    let a = resources.add_material(Material::basic());
    let b = resources.add_material(Material::basic());

    let mut scene = Scene::new();
    scene.add_node(Node::with_mesh(Mesh::new(geometry, a)));
    scene.add_node(Node::with_mesh(Mesh::new(geometry, b)));

    let camera = camera();
    let mut renderer = renderer();
    renderer.render(&mut scene, &camera, &mut resources);

    assert_eq!(renderer.driver().counts.draw_calls, 2);
    assert_eq!(renderer.programs().len(), 1);
    assert_eq!(renderer.driver().counts.programs_compiled, 1);
    assert_eq!(renderer.material_program(a), renderer.material_program(b));
}

#[test]
fn out_of_frustum_objects_are_culled() {
    let mut resources = Resources::new();
    let geometry = resources.add_geometry(triangle());
    let material = resources.add_material(Material::basic());

    let mut scene = Scene::new();
    scene.add_node(Node::with_mesh(Mesh::new(geometry, material)));
    let mut far_away = Node::with_mesh(Mesh::new(geometry, material));
    far_away.transform.position = Vec3::new(1000.0, 0.0, 0.0);
    scene.add_node(far_away);

    let camera = camera();
    let mut renderer = renderer();
    renderer.render(&mut scene, &camera, &mut resources);

    assert_eq!(renderer.info.draw_calls, 1);
}

#[test]
fn invisible_nodes_prune_their_subtree() {
    let mut resources = Resources::new();
    let geometry = resources.add_geometry(triangle());
    let material = resources.add_material(Material::basic());

    let mut scene = Scene::new();
    let mut hidden = Node::new();
    hidden.visible = false;
    let parent = scene.add_node(hidden);
    scene.add_child(parent, Node::with_mesh(Mesh::new(geometry, material)));

    let camera = camera();
    let mut renderer = renderer();
    renderer.render(&mut scene, &camera, &mut resources);

    assert_eq!(renderer.info.draw_calls, 0);
}

#[test]
fn light_count_change_swaps_the_variant() {
    let mut resources = Resources::new();
    let geometry = resources.add_geometry(triangle());
    let material = resources.add_material(Material::lambert());

    let mut scene = Scene::new();
    scene.add_node(Node::with_mesh(Mesh::new(geometry, material)));
    scene.add_node(Node::with_light(Light::directional(Vec3::ONE, 1.0)));

    let camera = camera();
    let mut renderer = renderer();
    renderer.render(&mut scene, &camera, &mut resources);
    let first_program = renderer.material_program(material).unwrap();
    assert_eq!(renderer.driver().counts.programs_compiled, 1);

    scene.add_node(Node::with_light(Light::directional(Vec3::ONE, 0.5)));
    renderer.render(&mut scene, &camera, &mut resources);

    let second_program = renderer.material_program(material).unwrap();
    assert_ne!(first_program, second_program);
    assert_eq!(renderer.driver().counts.programs_compiled, 2);
    // The old variant's last reference died with the swap.
    assert_eq!(renderer.driver().counts.programs_deleted, 1);
    assert_eq!(renderer.programs().len(), 1);
}

#[test]
fn directional_shadow_allocates_a_target_and_fills_the_arrays() {
    let mut resources = Resources::new();
    let geometry = resources.add_geometry(triangle());
    let floor_material = resources.add_material(Material::lambert());
    let caster_material = resources.add_material(Material::lambert());

    let mut scene = Scene::new();
    let mut floor = Node::with_mesh(Mesh::new(geometry, floor_material));
    floor.receive_shadow = true;
    scene.add_node(floor);
    let mut caster = Node::with_mesh(Mesh::new(geometry, caster_material));
    caster.cast_shadow = true;
    caster.receive_shadow = true;
    scene.add_node(caster);

    let mut light = Light::directional(Vec3::ONE, 1.0);
    light.cast_shadow = true;
    let mut light_node = Node::with_light(light);
    light_node.transform.position = Vec3::new(0.0, 0.0, 10.0);
    let light_key = scene.add_node(light_node);

    let camera = camera();
    let mut renderer = renderer();
    renderer.render(&mut scene, &camera, &mut resources);

    // Lazily allocated packed-depth target, hung off the light.
    let shadow = scene
        .node(light_key)
        .and_then(|n| n.light.as_ref())
        .and_then(|l| l.shadow.as_ref())
        .unwrap();
    assert!(shadow.map.is_some());
    assert_eq!(resources.render_targets.len(), 1);

    let states = renderer.collection().states(scene.id, camera.id).unwrap();
    assert_eq!(states.lighting.directional_shadow_count, 1);
    assert_eq!(states.lighting.directional_shadow_matrices.len(), 16);
    assert!(states.lighting.directional_shadow_maps[0].is_some());

    // One shadow-pass draw (only the caster) plus two main-pass draws.
    assert_eq!(renderer.info.draw_calls, 3);
    // Identical props share the lit variant; the depth override adds one.
    assert_eq!(renderer.programs().len(), 2);
    assert_eq!(
        renderer.material_program(floor_material),
        renderer.material_program(caster_material)
    );

    // A second frame reuses the target and both programs.
    let before = renderer.driver().counts;
    renderer.render(&mut scene, &camera, &mut resources);
    let second = delta(&renderer.driver().counts, &before);
    assert_eq!(second.programs_compiled, 0);
    assert_eq!(resources.render_targets.len(), 1);
}

#[test]
fn point_light_shadows_render_six_faces_into_a_cube() {
    let mut resources = Resources::new();
    let geometry = resources.add_geometry(triangle());
    let material = resources.add_material(Material::lambert());

    let mut scene = Scene::new();
    let mut caster = Node::with_mesh(Mesh::new(geometry, material));
    caster.cast_shadow = true;
    scene.add_node(caster);

    let mut light = Light::point(Vec3::ONE, 1.0, 50.0, 2.0);
    light.cast_shadow = true;
    let mut light_node = Node::with_light(light);
    light_node.transform.position = Vec3::new(0.0, 5.0, 0.0);
    scene.add_node(light_node);

    let camera = camera();
    let mut renderer = renderer();
    renderer.render(&mut scene, &camera, &mut resources);

    // All six faces clear their target; only the -Y face actually sees the
    // caster, and the main pass draws it once more.
    assert_eq!(renderer.driver().counts.clears, 7);
    assert_eq!(renderer.info.draw_calls, 2);

    let target = resources.render_targets.values().next().unwrap();
    let color = resources.textures.get(target.color.unwrap()).unwrap();
    assert_eq!(color.kind, TextureKind::Cube);

    // The distance override material exists and carries the light's range.
    assert!(
        resources
            .materials
            .values()
            .any(|m| matches!(m.kind, MaterialKind::Distance))
    );
}

#[test]
fn disabling_shadows_skips_the_pass() {
    let mut resources = Resources::new();
    let geometry = resources.add_geometry(triangle());
    let material = resources.add_material(Material::lambert());

    let mut scene = Scene::new();
    let mut caster = Node::with_mesh(Mesh::new(geometry, material));
    caster.cast_shadow = true;
    scene.add_node(caster);
    let mut light = Light::directional(Vec3::ONE, 1.0);
    light.cast_shadow = true;
    scene.add_node(Node::with_light(light));

    let camera = camera();
    let mut renderer = renderer();
    renderer.shadows_enabled = false;
    renderer.render(&mut scene, &camera, &mut resources);

    assert!(resources.render_targets.is_empty());
    assert_eq!(renderer.info.draw_calls, 1);
}

#[test]
fn hidden_lights_get_no_shadow_pass() {
    let mut resources = Resources::new();
    let geometry = resources.add_geometry(triangle());
    let material = resources.add_material(Material::lambert());

    let mut scene = Scene::new();
    let mut caster = Node::with_mesh(Mesh::new(geometry, material));
    caster.cast_shadow = true;
    scene.add_node(caster);

    // The caster light sits under a hidden parent, so the main traversal
    // never collects it; the shadow pass must not render a map for it either.
    let mut hidden = Node::new();
    hidden.visible = false;
    let parent = scene.add_node(hidden);
    let mut light = Light::directional(Vec3::ONE, 1.0);
    light.cast_shadow = true;
    let light_key = scene.add_child(parent, Node::with_light(light)).unwrap();

    let camera = camera();
    let mut renderer = renderer();
    renderer.render(&mut scene, &camera, &mut resources);

    assert!(resources.render_targets.is_empty());
    let shadow = scene
        .node(light_key)
        .and_then(|n| n.light.as_ref())
        .and_then(|l| l.shadow.as_ref())
        .unwrap();
    assert!(shadow.map.is_none());

    // Main pass only: one clear, one draw, no lighting entries.
    assert_eq!(renderer.driver().counts.clears, 1);
    assert_eq!(renderer.info.draw_calls, 1);
    let states = renderer.collection().states(scene.id, camera.id).unwrap();
    assert_eq!(states.lighting.directional_count, 0);
}

#[test]
fn dispose_tears_down_driver_mirrors() {
    let mut resources = Resources::new();
    let geometry = resources.add_geometry(triangle());
    let material = resources.add_material(Material::basic());

    let mut scene = Scene::new();
    let node = scene.add_node(Node::with_mesh(Mesh::new(geometry, material)));

    let camera = camera();
    let mut renderer = renderer();
    renderer.render(&mut scene, &camera, &mut resources);
    assert!(!renderer.driver().alive_buffers.is_empty());
    assert!(!renderer.driver().alive_programs.is_empty());

    scene.remove_node(node);
    resources.geometries.remove(geometry);
    resources.materials.remove(material);
    renderer.dispose_geometry(geometry);
    renderer.dispose_material(material);

    assert!(renderer.driver().alive_buffers.is_empty());
    assert!(renderer.driver().alive_programs.is_empty());
    assert!(renderer.programs().is_empty());
    assert!(renderer.material_program(material).is_none());
}

#[test]
fn info_resets_every_frame() {
    let mut resources = Resources::new();
    let geometry = resources.add_geometry(triangle());
    let material = resources.add_material(Material::basic());

    let mut scene = Scene::new();
    let node = scene.add_node(Node::with_mesh(Mesh::new(geometry, material)));

    let camera = camera();
    let mut renderer = renderer();
    renderer.render(&mut scene, &camera, &mut resources);
    assert_eq!(renderer.info.draw_calls, 1);

    scene.remove_node(node);
    renderer.render(&mut scene, &camera, &mut resources);
    assert_eq!(renderer.info.draw_calls, 0);
    assert_eq!(renderer.info.triangles, 0);
}
