//! Light components.
//!
//! Light kinds are a closed sum type so the aggregation code switches
//! exhaustively — adding a kind is a compile error until every accumulation
//! path handles it.

use glam::{Mat4, Vec3};

use crate::math::Frustum;
use crate::resources::RenderTargetKey;

/// Shadow filtering technique requested per receiving object.
///
/// Techniques above `PoissonSoft` need hardware shadow samplers; the props
/// derivation downgrades them when the driver (or the scene's
/// `disable_shadow_sampler` toggle) rules those out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShadowType {
    Hard,
    PoissonSoft,
    #[default]
    Pcf3,
    Pcf5,
    Pcss16,
    Pcss32,
    Pcss64,
}

impl ShadowType {
    #[must_use]
    pub fn needs_shadow_sampler(self) -> bool {
        !matches!(self, Self::Hard | Self::PoissonSoft)
    }
}

/// Closed set of light kinds with per-kind parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum LightKind {
    Ambient,
    Hemisphere { ground_color: Vec3 },
    Directional,
    Point { distance: f32, decay: f32 },
    Spot { distance: f32, decay: f32, angle: f32, penumbra: f32 },
}

/// Per-light shadow configuration and derived shadow-camera state.
#[derive(Debug, Clone)]
pub struct LightShadow {
    pub bias: f32,
    pub normal_bias: f32,
    /// Softness radius consumed by the PCF/PCSS chunks.
    pub radius: f32,
    pub map_size: u32,
    pub camera_near: f32,
    pub camera_far: f32,
    /// Orthographic half-extent for directional lights.
    pub window_size: f32,

    /// Light-space transform uploaded to the shadow matrix uniform array.
    /// Rebuilt by [`LightShadow::update`] each frame the light is collected.
    pub matrix: Mat4,
    /// Frustum of the last updated shadow camera (face 0 for point lights).
    pub frustum: Frustum,
    /// Packed-depth target; allocated lazily by the shadow pass.
    pub map: Option<RenderTargetKey>,
}

impl Default for LightShadow {
    fn default() -> Self {
        Self {
            bias: 0.0,
            normal_bias: 0.0,
            radius: 1.0,
            map_size: 512,
            camera_near: 1.0,
            camera_far: 500.0,
            window_size: 30.0,
            matrix: Mat4::IDENTITY,
            frustum: Frustum::default(),
            map: None,
        }
    }
}

/// Maps NDC `[-1,1]` to texture space `[0,1]`.
const UV_BIAS: Mat4 = Mat4::from_cols_array(&[
    0.5, 0.0, 0.0, 0.0, //
    0.0, 0.5, 0.0, 0.0, //
    0.0, 0.0, 0.5, 0.0, //
    0.5, 0.5, 0.5, 1.0,
]);

impl LightShadow {
    /// View/projection of the shadow camera for one cube face (face 0 for
    /// non-point lights).
    #[must_use]
    pub fn face_camera(&self, kind: &LightKind, world_matrix: &Mat4, face: u8) -> (Mat4, Mat4) {
        let position = world_matrix.w_axis.truncate();
        match kind {
            LightKind::Point { distance, .. } => {
                // +x, -x, +y, -y, +z, -z
                let (target, up) = match face {
                    0 => (Vec3::X, Vec3::NEG_Y),
                    1 => (Vec3::NEG_X, Vec3::NEG_Y),
                    2 => (Vec3::Y, Vec3::Z),
                    3 => (Vec3::NEG_Y, Vec3::NEG_Z),
                    4 => (Vec3::Z, Vec3::NEG_Y),
                    _ => (Vec3::NEG_Z, Vec3::NEG_Y),
                };
                let view = Mat4::look_at_rh(position, position + target, up);
                let far = distance.max(self.camera_far);
                let projection = Mat4::perspective_rh_gl(
                    std::f32::consts::FRAC_PI_2,
                    1.0,
                    self.camera_near,
                    far,
                );
                (view, projection)
            }
            LightKind::Spot { angle, distance, .. } => {
                let direction = Self::world_direction(world_matrix);
                let up = pick_up(direction);
                let view = Mat4::look_at_rh(position, position + direction, up);
                let fov = (angle * 2.0).clamp(0.1, std::f32::consts::PI - 0.01);
                let far = if *distance > 0.0 { *distance } else { self.camera_far };
                let projection = Mat4::perspective_rh_gl(fov, 1.0, self.camera_near, far);
                (view, projection)
            }
            _ => {
                let direction = Self::world_direction(world_matrix);
                let up = pick_up(direction);
                let view = Mat4::look_at_rh(position, position + direction, up);
                let w = self.window_size;
                let projection =
                    Mat4::orthographic_rh_gl(-w, w, -w, w, self.camera_near, self.camera_far);
                (view, projection)
            }
        }
    }

    /// Rebuild the shadow matrix (and face-0 frustum) from the light's world
    /// transform. Point lights store a translation-only matrix; the cube
    /// lookup direction is computed in the shader from the fragment position.
    pub fn update(&mut self, kind: &LightKind, world_matrix: &Mat4) {
        match kind {
            LightKind::Point { .. } => {
                let position = world_matrix.w_axis.truncate();
                let (view, projection) = self.face_camera(kind, world_matrix, 0);
                self.frustum = Frustum::from_matrix(projection * view);
                self.matrix = Mat4::from_translation(-position);
            }
            _ => {
                let (view, projection) = self.face_camera(kind, world_matrix, 0);
                let pv = projection * view;
                self.frustum = Frustum::from_matrix(pv);
                self.matrix = UV_BIAS * pv;
            }
        }
    }

    /// Lights shine down their local -Z axis.
    #[must_use]
    pub fn world_direction(world_matrix: &Mat4) -> Vec3 {
        let direction = -world_matrix.z_axis.truncate();
        if direction.length_squared() > 1e-12 {
            direction.normalize()
        } else {
            Vec3::NEG_Z
        }
    }
}

fn pick_up(direction: Vec3) -> Vec3 {
    if direction.y.abs() > 0.99 { Vec3::X } else { Vec3::Y }
}

#[derive(Debug, Clone)]
pub struct Light {
    pub color: Vec3,
    pub intensity: f32,
    pub kind: LightKind,
    pub cast_shadow: bool,
    pub shadow: Option<LightShadow>,
}

impl Light {
    #[must_use]
    pub fn new(kind: LightKind, color: Vec3, intensity: f32) -> Self {
        Self {
            color,
            intensity,
            kind,
            cast_shadow: false,
            shadow: Some(LightShadow::default()),
        }
    }

    #[must_use]
    pub fn ambient(color: Vec3, intensity: f32) -> Self {
        let mut light = Self::new(LightKind::Ambient, color, intensity);
        light.shadow = None;
        light
    }

    #[must_use]
    pub fn hemisphere(sky_color: Vec3, ground_color: Vec3, intensity: f32) -> Self {
        let mut light = Self::new(LightKind::Hemisphere { ground_color }, sky_color, intensity);
        light.shadow = None;
        light
    }

    #[must_use]
    pub fn directional(color: Vec3, intensity: f32) -> Self {
        Self::new(LightKind::Directional, color, intensity)
    }

    #[must_use]
    pub fn point(color: Vec3, intensity: f32, distance: f32, decay: f32) -> Self {
        Self::new(LightKind::Point { distance, decay }, color, intensity)
    }

    #[must_use]
    pub fn spot(
        color: Vec3,
        intensity: f32,
        distance: f32,
        decay: f32,
        angle: f32,
        penumbra: f32,
    ) -> Self {
        Self::new(
            LightKind::Spot {
                distance,
                decay,
                angle,
                penumbra,
            },
            color,
            intensity,
        )
    }

    /// Shadow-casting means both the flag and an actual shadow config.
    #[must_use]
    pub fn casts_shadow(&self) -> bool {
        self.cast_shadow && self.shadow.is_some()
    }
}
