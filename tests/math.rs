//! TRS round-trips, singular-matrix handling and frustum plane tests.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

use glam::{Mat4, Quat, Vec3};
use prism::math::{BoundingBox, BoundingSphere, Frustum, compose, decompose, try_inverse};
use prism::resources::{Attribute, Geometry};

fn approx(a: Vec3, b: Vec3) -> bool {
    (a - b).length() < 1e-4
}

#[test]
fn compose_decompose_round_trips() {
    let position = Vec3::new(1.0, -2.0, 3.5);
    let rotation = Quat::from_rotation_y(0.7) * Quat::from_rotation_x(-0.3);
    let scale = Vec3::new(1.5, 2.0, 0.5);

    let (p, q, s) = decompose(&compose(position, rotation, scale));

    assert!(approx(p, position));
    assert!(approx(s, scale));
    // q and -q encode the same rotation.
    assert!(q.dot(rotation).abs() > 1.0 - 1e-5);
}

#[test]
fn reflection_recovers_a_negative_scale() {
    let position = Vec3::new(0.5, 1.0, -4.0);
    let rotation = Quat::from_rotation_z(FRAC_PI_4);
    let scale = Vec3::new(-2.0, 3.0, 4.0);

    let matrix = compose(position, rotation, scale);
    assert!(matrix.determinant() < 0.0);

    let (p, q, s) = decompose(&matrix);
    assert!(s.x < 0.0);

    // Recomposing the recovered triple reproduces the mirrored matrix.
    let rebuilt = compose(p, q, s);
    for (a, b) in rebuilt
        .to_cols_array()
        .iter()
        .zip(matrix.to_cols_array().iter())
    {
        assert!((a - b).abs() < 1e-4);
    }
}

#[test]
fn singular_matrices_refuse_to_invert() {
    assert!(try_inverse(&Mat4::ZERO).is_err());

    let flat = Mat4::from_scale(Vec3::new(1.0, 0.0, 1.0));
    assert!(try_inverse(&flat).is_err());

    let spin = Mat4::from_rotation_y(0.3);
    let inverse = try_inverse(&spin).unwrap();
    let product = spin * inverse;
    for (a, b) in product
        .to_cols_array()
        .iter()
        .zip(Mat4::IDENTITY.to_cols_array().iter())
    {
        assert!((a - b).abs() < 1e-5);
    }
}

fn test_frustum() -> Frustum {
    // Camera at z = 5 looking at the origin, 90 degree vertical fov.
    let projection = Mat4::perspective_rh_gl(FRAC_PI_2, 1.0, 0.1, 100.0);
    let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
    Frustum::from_matrix(projection * view)
}

#[test]
fn frustum_accepts_contained_and_straddling_spheres() {
    let frustum = test_frustum();

    assert!(frustum.intersects_sphere(&BoundingSphere::new(Vec3::ZERO, 1.0)));
    assert!(frustum.contains_point(Vec3::ZERO));

    // Center past the far plane but the radius reaches back inside.
    let straddling = BoundingSphere::new(Vec3::new(0.0, 0.0, -100.0), 10.0);
    assert!(frustum.intersects_sphere(&straddling));
}

#[test]
fn frustum_rejects_fully_outside_spheres() {
    let frustum = test_frustum();

    // Behind the camera.
    assert!(!frustum.intersects_sphere(&BoundingSphere::new(Vec3::new(0.0, 0.0, 50.0), 1.0)));
    // Far off to the side.
    assert!(!frustum.intersects_sphere(&BoundingSphere::new(Vec3::new(500.0, 0.0, 0.0), 1.0)));
    assert!(!frustum.contains_point(Vec3::new(0.0, 0.0, 6.0)));
}

#[test]
fn bounding_box_transform_rebuilds_from_corners() {
    let bbox = BoundingBox::from_points([Vec3::splat(-1.0), Vec3::splat(1.0)]);
    let rotated = bbox.transform(&Mat4::from_rotation_y(FRAC_PI_4));

    // A rotated unit cube grows along the rotation plane.
    let expected = 2.0_f32.sqrt();
    assert!((rotated.max.x - expected).abs() < 1e-4);
    assert!((rotated.max.z - expected).abs() < 1e-4);
    assert!((rotated.max.y - 1.0).abs() < 1e-4);

    assert!(BoundingBox::EMPTY.transform(&Mat4::IDENTITY).is_empty());
}

#[test]
fn bounds_zero_fill_narrow_position_streams() {
    // 1-component stream: y and z fall back to zero.
    let mut line = Geometry::new();
    line.set_attribute("position", Attribute::new(vec![-2.0, 1.0, 4.0], 1));
    line.compute_bounds();
    let bbox = line.bounding_box().unwrap();
    assert_eq!(bbox.min, Vec3::new(-2.0, 0.0, 0.0));
    assert_eq!(bbox.max, Vec3::new(4.0, 0.0, 0.0));

    // 2-component overlay geometry.
    let mut flat = Geometry::new();
    flat.set_attribute("position", Attribute::new(vec![0.0, 0.0, 3.0, 4.0], 2));
    flat.compute_bounds();
    assert_eq!(flat.bounding_sphere().unwrap().radius, 2.5);
}

#[test]
fn bounding_sphere_radius_is_conservative_under_scale() {
    let sphere = BoundingSphere::new(Vec3::ZERO, 1.0);
    let scaled = sphere.transform(&Mat4::from_scale(Vec3::new(1.0, 3.0, 2.0)));
    assert_eq!(scaled.radius, 3.0);
}
