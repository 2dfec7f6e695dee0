//! Camera for the 3D viewport

use cloudview_core::{Matrix4, Point3, Vector3};
use nalgebra::Perspective3;

/// Pitch limit keeping the orbit away from the poles
const MAX_PITCH: f32 = 1.55;

/// A look-at perspective camera
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub fov: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// Create a new camera
    pub fn new(
        position: Point3<f32>,
        target: Point3<f32>,
        up: Vector3<f32>,
        fov: f32,
        aspect_ratio: f32,
        near: f32,
        far: f32,
    ) -> Self {
        Self {
            position,
            target,
            up,
            fov,
            aspect_ratio,
            near,
            far,
        }
    }

    /// Get the view matrix
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Get the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        let perspective = Perspective3::new(self.aspect_ratio, self.fov, self.near, self.far);
        perspective.into_inner()
    }

    /// Combined projection x view matrix, refreshed per redraw
    pub fn perspective_matrix(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }

    /// Rotate the camera around the target, keeping the distance fixed
    pub fn orbit(&mut self, horizontal: f32, vertical: f32) {
        let offset = self.position - self.target;
        let radius = offset.norm();
        if radius <= f32::EPSILON {
            return;
        }

        let mut yaw = offset.x.atan2(offset.z);
        let mut pitch = (offset.y / radius).clamp(-1.0, 1.0).asin();
        yaw -= horizontal;
        pitch = (pitch + vertical).clamp(-MAX_PITCH, MAX_PITCH);

        let (sin_pitch, cos_pitch) = pitch.sin_cos();
        let (sin_yaw, cos_yaw) = yaw.sin_cos();
        let offset = Vector3::new(cos_pitch * sin_yaw, sin_pitch, cos_pitch * cos_yaw) * radius;
        self.position = self.target + offset;
    }

    /// Slide the camera and target together in the view plane
    pub fn pan(&mut self, dx: f32, dy: f32) {
        let forward = (self.target - self.position).normalize();
        let right = forward.cross(&self.up).normalize();
        let up = right.cross(&forward);

        let distance = (self.target - self.position).norm();
        let offset = (right * dx + up * dy) * distance;
        self.position += offset;
        self.target += offset;
    }

    /// Move toward (positive) or away from (negative) the target
    pub fn zoom(&mut self, amount: f32) {
        let offset = self.target - self.position;
        let distance = offset.norm();
        let new_distance = (distance * (1.0 - amount)).max(self.near * 2.0);
        self.position = self.target - offset.normalize() * new_distance;
    }

    /// Return to the default pose, keeping the aspect ratio
    pub fn reset(&mut self) {
        let aspect_ratio = self.aspect_ratio;
        *self = Self::default();
        self.aspect_ratio = aspect_ratio;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(
            Point3::new(5.0, 5.0, 5.0),
            Point3::new(0.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            std::f32::consts::FRAC_PI_4,
            16.0 / 9.0,
            0.1,
            100.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn perspective_is_projection_times_view() {
        let camera = Camera::default();
        let expected = camera.projection_matrix() * camera.view_matrix();
        assert_relative_eq!(camera.perspective_matrix(), expected);
    }

    #[test]
    fn orbit_preserves_distance_to_target() {
        let mut camera = Camera::default();
        let before = (camera.position - camera.target).norm();

        camera.orbit(0.4, -0.2);
        let after = (camera.position - camera.target).norm();

        assert_relative_eq!(before, after, epsilon = 1.0e-4);
        assert_eq!(camera.target, Point3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn pan_moves_position_and_target_together() {
        let mut camera = Camera::default();
        let view_dir = camera.target - camera.position;

        camera.pan(0.5, 0.25);

        assert_relative_eq!(camera.target - camera.position, view_dir, epsilon = 1.0e-5);
    }

    #[test]
    fn zoom_in_shortens_the_view_distance() {
        let mut camera = Camera::default();
        let before = (camera.position - camera.target).norm();

        camera.zoom(0.3);
        let after = (camera.position - camera.target).norm();

        assert!(after < before);
        assert!(after >= camera.near * 2.0);
    }
}
