//! Render queue ordering invariants.

use glam::Vec3;
use prism::render::{Drawable, RenderQueue};
use prism::resources::{Attribute, Geometry, GeometryGroup, Material, Resources};
use prism::scene::{Mesh, Node, NodeKey};

fn drawable(object_id: u32, material_id: u32, depth: f32, render_order: i32) -> Drawable {
    Drawable {
        node: NodeKey::default(),
        object_id,
        geometry: Default::default(),
        material: Default::default(),
        material_id,
        group: None,
        depth,
        render_order,
    }
}

#[test]
fn opaque_sorts_front_to_back_within_material() {
    let mut queue = RenderQueue::new();
    queue.begin();
    let layer = queue.layer_mut(0);
    layer.push_opaque(drawable(1, 7, 5.0, 0));
    layer.push_opaque(drawable(2, 7, 1.0, 0));
    layer.push_opaque(drawable(3, 7, 3.0, 0));
    queue.end();

    let layer = queue.layers().next().unwrap();
    let depths: Vec<f32> = layer.opaque.iter().map(|d| d.depth).collect();
    assert_eq!(depths, vec![1.0, 3.0, 5.0]);
}

#[test]
fn opaque_batches_by_material_before_depth() {
    let mut queue = RenderQueue::new();
    queue.begin();
    let layer = queue.layer_mut(0);
    layer.push_opaque(drawable(1, 9, 1.0, 0));
    layer.push_opaque(drawable(2, 3, 9.0, 0));
    layer.push_opaque(drawable(3, 9, 0.5, 0));
    queue.end();

    let layer = queue.layers().next().unwrap();
    let materials: Vec<u32> = layer.opaque.iter().map(|d| d.material_id).collect();
    assert_eq!(materials, vec![3, 9, 9]);
}

#[test]
fn transparent_sorts_back_to_front() {
    let mut queue = RenderQueue::new();
    queue.begin();
    let layer = queue.layer_mut(0);
    layer.push_transparent(drawable(1, 1, 2.0, 0));
    layer.push_transparent(drawable(2, 1, 8.0, 0));
    layer.push_transparent(drawable(3, 1, 5.0, 0));
    queue.end();

    let layer = queue.layers().next().unwrap();
    let depths: Vec<f32> = layer.transparent.iter().map(|d| d.depth).collect();
    assert_eq!(depths, vec![8.0, 5.0, 2.0]);
}

#[test]
fn render_order_dominates_both_buckets() {
    let mut queue = RenderQueue::new();
    queue.begin();
    let layer = queue.layer_mut(0);
    layer.push_opaque(drawable(1, 1, 0.0, 5));
    layer.push_opaque(drawable(2, 1, 9.0, -1));
    layer.push_transparent(drawable(3, 1, 9.0, 2));
    layer.push_transparent(drawable(4, 1, 0.0, -2));
    queue.end();

    let layer = queue.layers().next().unwrap();
    let opaque: Vec<u32> = layer.opaque.iter().map(|d| d.object_id).collect();
    let transparent: Vec<u32> = layer.transparent.iter().map(|d| d.object_id).collect();
    assert_eq!(opaque, vec![2, 1]);
    assert_eq!(transparent, vec![4, 3]);
}

#[test]
fn equal_depth_ties_break_on_object_id() {
    let mut queue = RenderQueue::new();
    queue.begin();
    let layer = queue.layer_mut(0);
    layer.push_transparent(drawable(42, 1, 3.0, 0));
    layer.push_transparent(drawable(7, 1, 3.0, 0));
    queue.end();

    let layer = queue.layers().next().unwrap();
    let ids: Vec<u32> = layer.transparent.iter().map(|d| d.object_id).collect();
    assert_eq!(ids, vec![7, 42]);
}

#[test]
fn layers_iterate_in_ascending_id_order() {
    let mut queue = RenderQueue::new();
    queue.begin();
    queue.layer_mut(5).push_opaque(drawable(1, 1, 0.0, 0));
    queue.layer_mut(0).push_opaque(drawable(2, 1, 0.0, 0));
    queue.layer_mut(3).push_opaque(drawable(3, 1, 0.0, 0));
    queue.end();

    let ids: Vec<u8> = queue.layers().map(|l| l.id).collect();
    assert_eq!(ids, vec![0, 3, 5]);
}

#[test]
fn pooled_slots_do_not_leak_across_frames() {
    let mut queue = RenderQueue::new();

    queue.begin();
    let layer = queue.layer_mut(0);
    layer.push_opaque(drawable(1, 1, 0.0, 0));
    layer.push_opaque(drawable(2, 1, 0.0, 0));
    layer.push_opaque(drawable(3, 1, 0.0, 0));
    queue.end();

    // A smaller second frame must not resurrect last frame's tail.
    queue.begin();
    queue.layer_mut(0).push_opaque(drawable(9, 1, 0.0, 0));
    queue.end();

    let layer = queue.layers().next().unwrap();
    assert_eq!(layer.opaque.len(), 1);
    assert_eq!(layer.opaque[0].object_id, 9);
}

#[test]
fn grouped_geometry_enqueues_one_drawable_per_group() {
    let mut resources = Resources::new();
    let opaque_mat = resources.add_material(Material::basic());
    let mut transparent = Material::basic();
    transparent.transparent = true;
    let transparent_mat = resources.add_material(transparent);

    let mut geometry = Geometry::new();
    geometry.set_attribute(
        "position",
        Attribute::new(vec![0.0; 18], 3),
    );
    geometry.groups = vec![
        GeometryGroup { start: 0, count: 3, material_index: 0 },
        GeometryGroup { start: 3, count: 3, material_index: 1 },
        // Out-of-range material slots are skipped, not an error.
        GeometryGroup { start: 0, count: 3, material_index: 9 },
    ];
    let geometry_key = resources.add_geometry(geometry);

    let mut mesh = Mesh::new(geometry_key, opaque_mat);
    mesh.materials.push(transparent_mat);
    let node = Node::with_mesh(mesh);

    let mut queue = RenderQueue::new();
    queue.begin();
    let geometry = resources.geometries.get(geometry_key).unwrap();
    queue.push(&node, NodeKey::default(), geometry, 1.0, &resources);
    queue.end();

    let layer = queue.layers().next().unwrap();
    assert_eq!(layer.opaque.len(), 1);
    assert_eq!(layer.transparent.len(), 1);
    assert_eq!(layer.opaque[0].group.unwrap().material_index, 0);
    assert_eq!(layer.transparent[0].group.unwrap().material_index, 1);
}

#[test]
fn single_material_ignores_groups() {
    let mut resources = Resources::new();
    let material = resources.add_material(Material::basic());

    let mut geometry = Geometry::new();
    geometry.set_attribute("position", Attribute::new(vec![0.0; 9], 3));
    geometry.groups = vec![GeometryGroup { start: 0, count: 3, material_index: 0 }];
    let geometry_key = resources.add_geometry(geometry);

    let node = Node::with_mesh(Mesh::new(geometry_key, material));

    let mut queue = RenderQueue::new();
    queue.begin();
    let geometry = resources.geometries.get(geometry_key).unwrap();
    queue.push(&node, NodeKey::default(), geometry, 1.0, &resources);
    queue.end();

    let layer = queue.layers().next().unwrap();
    assert_eq!(layer.opaque.len(), 1);
    assert!(layer.opaque[0].group.is_none());
}

#[test]
fn nan_depth_does_not_panic_the_sort() {
    let mut queue = RenderQueue::new();
    queue.begin();
    let layer = queue.layer_mut(0);
    layer.push_opaque(drawable(1, 1, f32::NAN, 0));
    layer.push_opaque(drawable(2, 1, 1.0, 0));
    layer.push_opaque(drawable(3, 1, Vec3::ZERO.x, 0));
    queue.end();
    assert_eq!(queue.layers().next().unwrap().opaque.len(), 3);
}
