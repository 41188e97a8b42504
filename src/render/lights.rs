//! Light aggregation into upload-ready flat arrays.
//!
//! `begin` / `push` / `end` run once per scene traversal. `end` stable-sorts
//! shadow-casting lights to the front of the buffer so the shader's
//! `NUM_*_SHADOWS` constants index a dense prefix, then dispatches each light
//! by kind into the flat parameter arrays. The arrays are kept between frames
//! and only grow; shrinking truncates in place.

use glam::Mat4;

use crate::resources::RenderTargetKey;
use crate::scene::{Light, LightKind, LightShadow, SceneData};

/// Floats per entry in each parameter array.
pub const HEMISPHERE_STRIDE: usize = 9; // direction, sky color, ground color
pub const DIRECTIONAL_STRIDE: usize = 6; // direction, color
pub const POINT_STRIDE: usize = 8; // position, color, distance, decay
pub const SPOT_STRIDE: usize = 13; // position, direction, color, distance, decay, cone cos, penumbra cos
/// bias, normal bias, radius, map size, near, far (near/far used by point
/// shadows only, zero elsewhere).
pub const SHADOW_PARAM_STRIDE: usize = 6;

/// Per-kind light counts: ambient, hemisphere, directional, point, spot,
/// then shadow-caster counts for directional, point, spot.
///
/// Program staleness compares hashes, not individual lights — two
/// configurations with identical counts need the same shader variant
/// regardless of which lights they contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LightHash(pub [u16; 8]);

#[derive(Debug, Clone)]
struct Collected {
    light: Light,
    world_matrix: Mat4,
}

/// Flat lighting arrays for one (scene, camera) render state.
#[derive(Debug, Default)]
pub struct LightingData {
    buffer: Vec<Collected>,
    count: usize,

    pub ambient: [f32; 3],
    pub hemisphere: Vec<f32>,
    pub directional: Vec<f32>,
    pub point: Vec<f32>,
    pub spot: Vec<f32>,

    pub directional_shadow_params: Vec<f32>,
    pub directional_shadow_matrices: Vec<f32>,
    pub directional_shadow_maps: Vec<Option<RenderTargetKey>>,
    pub point_shadow_params: Vec<f32>,
    pub point_shadow_matrices: Vec<f32>,
    pub point_shadow_maps: Vec<Option<RenderTargetKey>>,
    pub spot_shadow_params: Vec<f32>,
    pub spot_shadow_matrices: Vec<f32>,
    pub spot_shadow_maps: Vec<Option<RenderTargetKey>>,

    pub ambient_count: u16,
    pub hemisphere_count: u16,
    pub directional_count: u16,
    pub point_count: u16,
    pub spot_count: u16,
    pub directional_shadow_count: u16,
    pub point_shadow_count: u16,
    pub spot_shadow_count: u16,

    hash: LightHash,
}

impl LightingData {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) {
        self.count = 0;
    }

    /// Record one light. Pool slots are overwritten in place; the buffer only
    /// reflects this frame after [`LightingData::end`].
    pub fn push(&mut self, light: &Light, world_matrix: &Mat4) {
        let collected = Collected {
            light: light.clone(),
            world_matrix: *world_matrix,
        };
        if self.count < self.buffer.len() {
            self.buffer[self.count] = collected;
        } else {
            self.buffer.push(collected);
        }
        self.count += 1;
    }

    /// Hash of the per-kind count vector, valid after [`LightingData::end`].
    #[must_use]
    pub fn hash(&self) -> LightHash {
        self.hash
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.count
    }

    /// Finalize the frame: shadow-first stable sort, flat array rebuild, hash
    /// recompute. Directions and positions are re-expressed relative to the
    /// scene's anchor matrix when one is active.
    pub fn end(&mut self, scene_data: &SceneData) {
        self.buffer.truncate(self.count);
        self.buffer.sort_by_key(|c| !c.light.casts_shadow());

        self.ambient = [0.0; 3];
        self.hemisphere.clear();
        self.directional.clear();
        self.point.clear();
        self.spot.clear();
        self.directional_shadow_params.clear();
        self.directional_shadow_matrices.clear();
        self.directional_shadow_maps.clear();
        self.point_shadow_params.clear();
        self.point_shadow_matrices.clear();
        self.point_shadow_maps.clear();
        self.spot_shadow_params.clear();
        self.spot_shadow_matrices.clear();
        self.spot_shadow_maps.clear();
        self.ambient_count = 0;
        self.hemisphere_count = 0;
        self.directional_count = 0;
        self.point_count = 0;
        self.spot_count = 0;
        self.directional_shadow_count = 0;
        self.point_shadow_count = 0;
        self.spot_shadow_count = 0;

        let anchor_inverse = scene_data.anchor_matrix_inverse();
        let anchor = scene_data.anchor_matrix.filter(|_| anchor_inverse.is_some());

        for i in 0..self.buffer.len() {
            let collected = self.buffer[i].clone();
            self.accumulate(&collected, anchor_inverse.as_ref(), anchor.as_ref());
        }

        self.hash = LightHash([
            self.ambient_count,
            self.hemisphere_count,
            self.directional_count,
            self.point_count,
            self.spot_count,
            self.directional_shadow_count,
            self.point_shadow_count,
            self.spot_shadow_count,
        ]);
    }

    fn accumulate(
        &mut self,
        collected: &Collected,
        anchor_inverse: Option<&Mat4>,
        anchor: Option<&Mat4>,
    ) {
        let light = &collected.light;
        let world = &collected.world_matrix;
        let color = light.color * light.intensity;

        let direction = || {
            let d = LightShadow::world_direction(world);
            match anchor_inverse {
                Some(inv) => inv.transform_vector3(d).normalize_or_zero(),
                None => d,
            }
        };
        let position = || {
            let p = world.w_axis.truncate();
            match anchor_inverse {
                Some(inv) => inv.transform_point3(p),
                None => p,
            }
        };

        match &light.kind {
            LightKind::Ambient => {
                self.ambient[0] += color.x;
                self.ambient[1] += color.y;
                self.ambient[2] += color.z;
                self.ambient_count += 1;
            }
            LightKind::Hemisphere { ground_color } => {
                let d = direction();
                let g = *ground_color * light.intensity;
                self.hemisphere
                    .extend_from_slice(&[d.x, d.y, d.z, color.x, color.y, color.z, g.x, g.y, g.z]);
                self.hemisphere_count += 1;
            }
            LightKind::Directional => {
                let d = direction();
                self.directional
                    .extend_from_slice(&[d.x, d.y, d.z, color.x, color.y, color.z]);
                self.directional_count += 1;
                if light.casts_shadow() {
                    let shadow = light.shadow.clone().unwrap_or_default();
                    self.push_shadow(ShadowSlot::Directional, &shadow, anchor);
                    self.directional_shadow_count += 1;
                }
            }
            LightKind::Point { distance, decay } => {
                let p = position();
                self.point.extend_from_slice(&[
                    p.x, p.y, p.z, color.x, color.y, color.z, *distance, *decay,
                ]);
                self.point_count += 1;
                if light.casts_shadow() {
                    let shadow = light.shadow.clone().unwrap_or_default();
                    self.push_shadow(ShadowSlot::Point, &shadow, anchor);
                    self.point_shadow_count += 1;
                }
            }
            LightKind::Spot {
                distance,
                decay,
                angle,
                penumbra,
            } => {
                let p = position();
                let d = direction();
                let cone_cos = angle.cos();
                let penumbra_cos = (angle * (1.0 - penumbra)).cos();
                self.spot.extend_from_slice(&[
                    p.x,
                    p.y,
                    p.z,
                    d.x,
                    d.y,
                    d.z,
                    color.x,
                    color.y,
                    color.z,
                    *distance,
                    *decay,
                    cone_cos,
                    penumbra_cos,
                ]);
                self.spot_count += 1;
                if light.casts_shadow() {
                    let shadow = light.shadow.clone().unwrap_or_default();
                    self.push_shadow(ShadowSlot::Spot, &shadow, anchor);
                    self.spot_shadow_count += 1;
                }
            }
        }
    }

    fn push_shadow(&mut self, slot: ShadowSlot, shadow: &LightShadow, anchor: Option<&Mat4>) {
        let (params, matrices, maps) = match slot {
            ShadowSlot::Directional => (
                &mut self.directional_shadow_params,
                &mut self.directional_shadow_matrices,
                &mut self.directional_shadow_maps,
            ),
            ShadowSlot::Point => (
                &mut self.point_shadow_params,
                &mut self.point_shadow_matrices,
                &mut self.point_shadow_maps,
            ),
            ShadowSlot::Spot => (
                &mut self.spot_shadow_params,
                &mut self.spot_shadow_matrices,
                &mut self.spot_shadow_maps,
            ),
        };

        let (near, far) = match slot {
            ShadowSlot::Point => (shadow.camera_near, shadow.camera_far),
            _ => (0.0, 0.0),
        };
        params.extend_from_slice(&[
            shadow.bias,
            shadow.normal_bias,
            shadow.radius,
            shadow.map_size as f32,
            near,
            far,
        ]);

        // Anchored worlds feed anchor-relative positions to the shader, so
        // the shadow transform picks the anchor back up on the way in.
        let matrix = match anchor {
            Some(anchor) => shadow.matrix * *anchor,
            None => shadow.matrix,
        };
        matrices.extend_from_slice(&matrix.to_cols_array());
        maps.push(shadow.map);
    }

    /// Shadow-caster lights in their finalized (front-of-buffer) order.
    pub fn shadow_casters(&self) -> impl Iterator<Item = (&Light, &Mat4)> {
        self.buffer
            .iter()
            .take_while(|c| c.light.casts_shadow())
            .map(|c| (&c.light, &c.world_matrix))
    }
}

#[derive(Clone, Copy)]
enum ShadowSlot {
    Directional,
    Point,
    Spot,
}
