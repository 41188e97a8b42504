use std::sync::atomic::{AtomicU32, Ordering};

use glam::{Mat4, Vec3, Vec4};

use crate::math::Frustum;

static NEXT_CAMERA_ID: AtomicU32 = AtomicU32::new(1);

/// A viewpoint the renderer draws from.
///
/// The core never drives camera updates itself: callers position the camera
/// (`world_matrix`) and must call [`Camera::update_matrices`] before handing
/// it to `Renderer::render` — a stale frustum is a precondition violation,
/// not a runtime-checked error.
#[derive(Debug, Clone)]
pub struct Camera {
    pub id: u32,

    pub world_matrix: Mat4,
    pub projection_matrix: Mat4,
    pub view_matrix: Mat4,
    pub projection_view_matrix: Mat4,
    pub frustum: Frustum,

    /// Normalized viewport sub-rectangle `[x, y, w, h]`.
    pub rect: Vec4,
    /// Whether this camera participates in frustum culling.
    pub frustum_culled: bool,

    pub near: f32,
    pub far: f32,
}

impl Camera {
    fn base(projection: Mat4, near: f32, far: f32) -> Self {
        let mut camera = Self {
            id: NEXT_CAMERA_ID.fetch_add(1, Ordering::Relaxed),
            world_matrix: Mat4::IDENTITY,
            projection_matrix: projection,
            view_matrix: Mat4::IDENTITY,
            projection_view_matrix: Mat4::IDENTITY,
            frustum: Frustum::default(),
            rect: Vec4::new(0.0, 0.0, 1.0, 1.0),
            frustum_culled: true,
            near,
            far,
        };
        camera.update_matrices();
        camera
    }

    /// `fov` in radians.
    #[must_use]
    pub fn new_perspective(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self::base(Mat4::perspective_rh_gl(fov, aspect, near, far), near, far)
    }

    #[must_use]
    pub fn new_orthographic(
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    ) -> Self {
        Self::base(
            Mat4::orthographic_rh_gl(left, right, bottom, top, near, far),
            near,
            far,
        )
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.world_matrix.w_axis = position.extend(1.0);
    }

    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.world_matrix.w_axis.truncate()
    }

    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        let position = self.position();
        self.world_matrix = Mat4::look_at_rh(position, target, up).inverse();
    }

    /// Recompute view / projection-view / frustum from the world matrix.
    pub fn update_matrices(&mut self) {
        self.view_matrix = self.world_matrix.inverse();
        self.projection_view_matrix = self.projection_matrix * self.view_matrix;
        self.frustum = Frustum::from_matrix(self.projection_view_matrix);
    }
}
