//! Lighting array aggregation: counts, strides, shadow-first ordering and
//! anchor re-expression.

use glam::{Mat4, Vec3};
use prism::render::{
    DIRECTIONAL_STRIDE, HEMISPHERE_STRIDE, LightHash, LightingData, POINT_STRIDE,
    SHADOW_PARAM_STRIDE, SPOT_STRIDE,
};
use prism::scene::{Light, SceneData};

fn finalize(lighting: &mut LightingData) {
    lighting.end(&SceneData::default());
}

#[test]
fn counts_and_hash_cover_every_kind() {
    let mut lighting = LightingData::new();
    lighting.begin();
    lighting.push(&Light::ambient(Vec3::ONE, 0.5), &Mat4::IDENTITY);
    lighting.push(
        &Light::hemisphere(Vec3::X, Vec3::Y, 1.0),
        &Mat4::IDENTITY,
    );
    lighting.push(&Light::directional(Vec3::ONE, 1.0), &Mat4::IDENTITY);
    lighting.push(&Light::point(Vec3::ONE, 1.0, 10.0, 2.0), &Mat4::IDENTITY);
    lighting.push(
        &Light::spot(Vec3::ONE, 1.0, 10.0, 2.0, 0.5, 0.1),
        &Mat4::IDENTITY,
    );
    finalize(&mut lighting);

    assert_eq!(lighting.ambient_count, 1);
    assert_eq!(lighting.hemisphere_count, 1);
    assert_eq!(lighting.directional_count, 1);
    assert_eq!(lighting.point_count, 1);
    assert_eq!(lighting.spot_count, 1);
    assert_eq!(lighting.hash(), LightHash([1, 1, 1, 1, 1, 0, 0, 0]));

    assert_eq!(lighting.hemisphere.len(), HEMISPHERE_STRIDE);
    assert_eq!(lighting.directional.len(), DIRECTIONAL_STRIDE);
    assert_eq!(lighting.point.len(), POINT_STRIDE);
    assert_eq!(lighting.spot.len(), SPOT_STRIDE);
}

#[test]
fn ambient_accumulates_premultiplied_color() {
    let mut lighting = LightingData::new();
    lighting.begin();
    lighting.push(&Light::ambient(Vec3::new(1.0, 0.5, 0.0), 2.0), &Mat4::IDENTITY);
    lighting.push(&Light::ambient(Vec3::new(0.0, 0.0, 1.0), 1.0), &Mat4::IDENTITY);
    finalize(&mut lighting);

    assert_eq!(lighting.ambient_count, 2);
    assert_eq!(lighting.ambient, [2.0, 1.0, 1.0]);
}

#[test]
fn default_orientation_shines_down_negative_z() {
    let mut lighting = LightingData::new();
    lighting.begin();
    lighting.push(&Light::directional(Vec3::ONE, 1.0), &Mat4::IDENTITY);
    finalize(&mut lighting);

    assert_eq!(&lighting.directional[..3], &[0.0, 0.0, -1.0]);
}

#[test]
fn hemisphere_scales_both_colors_by_intensity() {
    let mut lighting = LightingData::new();
    lighting.begin();
    lighting.push(
        &Light::hemisphere(Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0), 2.0),
        &Mat4::IDENTITY,
    );
    finalize(&mut lighting);

    // direction, sky, ground
    assert_eq!(&lighting.hemisphere[3..6], &[2.0, 0.0, 0.0]);
    assert_eq!(&lighting.hemisphere[6..9], &[0.0, 2.0, 0.0]);
}

#[test]
fn spot_entry_carries_cone_cosines() {
    let angle = 0.5_f32;
    let penumbra = 0.2_f32;
    let mut lighting = LightingData::new();
    lighting.begin();
    lighting.push(
        &Light::spot(Vec3::ONE, 1.0, 10.0, 2.0, angle, penumbra),
        &Mat4::IDENTITY,
    );
    finalize(&mut lighting);

    assert!((lighting.spot[11] - angle.cos()).abs() < 1e-6);
    assert!((lighting.spot[12] - (angle * (1.0 - penumbra)).cos()).abs() < 1e-6);
}

#[test]
fn shadow_casters_sort_to_the_front() {
    let plain = Light::directional(Vec3::X, 1.0);
    let mut caster = Light::directional(Vec3::Y, 1.0);
    caster.cast_shadow = true;

    let mut lighting = LightingData::new();
    lighting.begin();
    lighting.push(&plain, &Mat4::IDENTITY);
    lighting.push(&caster, &Mat4::IDENTITY);
    finalize(&mut lighting);

    assert_eq!(lighting.directional_count, 2);
    assert_eq!(lighting.directional_shadow_count, 1);
    // The caster's green entry leads the array so NUM_DIR_SHADOWS indexes a
    // dense prefix.
    assert_eq!(&lighting.directional[3..6], &[0.0, 1.0, 0.0]);
    assert_eq!(&lighting.directional[9..12], &[1.0, 0.0, 0.0]);

    let casters: Vec<_> = lighting.shadow_casters().collect();
    assert_eq!(casters.len(), 1);
    assert_eq!(casters[0].0.color, Vec3::Y);
}

#[test]
fn shadow_entries_fill_params_matrices_and_map_slots() {
    let mut caster = Light::directional(Vec3::ONE, 1.0);
    caster.cast_shadow = true;
    {
        let shadow = caster.shadow.as_mut().unwrap();
        shadow.bias = 0.002;
        shadow.radius = 3.0;
        shadow.map_size = 1024;
    }

    let mut lighting = LightingData::new();
    lighting.begin();
    lighting.push(&caster, &Mat4::IDENTITY);
    finalize(&mut lighting);

    assert_eq!(lighting.directional_shadow_params.len(), SHADOW_PARAM_STRIDE);
    assert_eq!(lighting.directional_shadow_matrices.len(), 16);
    assert_eq!(lighting.directional_shadow_maps, vec![None]);

    let params = &lighting.directional_shadow_params;
    assert_eq!(params[0], 0.002);
    assert_eq!(params[2], 3.0);
    assert_eq!(params[3], 1024.0);
    // Directional entries leave the near/far slots zeroed.
    assert_eq!(&params[4..6], &[0.0, 0.0]);
}

#[test]
fn point_shadow_params_carry_near_and_far() {
    let mut caster = Light::point(Vec3::ONE, 1.0, 0.0, 2.0);
    caster.cast_shadow = true;
    {
        let shadow = caster.shadow.as_mut().unwrap();
        shadow.camera_near = 0.5;
        shadow.camera_far = 100.0;
    }

    let mut lighting = LightingData::new();
    lighting.begin();
    lighting.push(&caster, &Mat4::IDENTITY);
    finalize(&mut lighting);

    assert_eq!(lighting.point_shadow_count, 1);
    assert_eq!(&lighting.point_shadow_params[4..6], &[0.5, 100.0]);
}

#[test]
fn anchor_rebases_positions_but_not_directions() {
    let mut scene_data = SceneData::default();
    scene_data.anchor_matrix = Some(Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0)));

    let mut lighting = LightingData::new();
    lighting.begin();
    lighting.push(
        &Light::point(Vec3::ONE, 1.0, 0.0, 2.0),
        &Mat4::from_translation(Vec3::new(12.0, 3.0, 4.0)),
    );
    lighting.push(&Light::directional(Vec3::ONE, 1.0), &Mat4::IDENTITY);
    lighting.end(&scene_data);

    assert_eq!(&lighting.point[..3], &[2.0, 3.0, 4.0]);
    // A translation anchor leaves directions untouched.
    assert_eq!(&lighting.directional[..3], &[0.0, 0.0, -1.0]);
}

#[test]
fn anchor_folds_into_shadow_matrices() {
    let anchor = Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0));
    let mut scene_data = SceneData::default();
    scene_data.anchor_matrix = Some(anchor);

    let mut caster = Light::directional(Vec3::ONE, 1.0);
    caster.cast_shadow = true;
    let shadow_matrix = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
    caster.shadow.as_mut().unwrap().matrix = shadow_matrix;

    let mut lighting = LightingData::new();
    lighting.begin();
    lighting.push(&caster, &Mat4::IDENTITY);
    lighting.end(&scene_data);

    let expected = (shadow_matrix * anchor).to_cols_array();
    assert_eq!(lighting.directional_shadow_matrices, expected.to_vec());
}

#[test]
fn hash_tracks_counts_not_light_identity() {
    let mut a = LightingData::new();
    a.begin();
    a.push(&Light::directional(Vec3::X, 1.0), &Mat4::IDENTITY);
    a.push(&Light::point(Vec3::ONE, 1.0, 5.0, 2.0), &Mat4::IDENTITY);
    finalize(&mut a);

    let mut b = LightingData::new();
    b.begin();
    b.push(&Light::directional(Vec3::Z, 7.0), &Mat4::from_translation(Vec3::ONE));
    b.push(&Light::point(Vec3::Y, 0.1, 50.0, 1.0), &Mat4::IDENTITY);
    finalize(&mut b);

    assert_eq!(a.hash(), b.hash());

    b.begin();
    b.push(&Light::directional(Vec3::Z, 7.0), &Mat4::IDENTITY);
    finalize(&mut b);
    assert_ne!(a.hash(), b.hash());
}

#[test]
fn pooled_buffer_shrinks_with_the_frame() {
    let mut lighting = LightingData::new();
    lighting.begin();
    lighting.push(&Light::directional(Vec3::ONE, 1.0), &Mat4::IDENTITY);
    lighting.push(&Light::directional(Vec3::ONE, 1.0), &Mat4::IDENTITY);
    lighting.push(&Light::directional(Vec3::ONE, 1.0), &Mat4::IDENTITY);
    finalize(&mut lighting);
    assert_eq!(lighting.directional_count, 3);

    lighting.begin();
    lighting.push(&Light::directional(Vec3::ONE, 1.0), &Mat4::IDENTITY);
    finalize(&mut lighting);

    assert_eq!(lighting.total(), 1);
    assert_eq!(lighting.directional_count, 1);
    assert_eq!(lighting.directional.len(), DIRECTIONAL_STRIDE);
}
