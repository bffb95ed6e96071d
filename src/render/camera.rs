//! Orbit camera with spherical coordinates.
//!
//! Y-up coordinate system, viewed from a fixed orbit angle. `frame_bounds`
//! is the only thing that moves the camera, fitting the orbit to a draw's
//! bounding box.

use crate::stage::Bounds;
use glam::{Mat4, Vec3};

const DEFAULT_FOV_DEGREES: f32 = 45.0;
const NEAR_PLANE: f32 = 0.01;
const FAR_PLANE: f32 = 100.0;
const UP_VECTOR: Vec3 = Vec3::Y;
const MIN_RADIUS: f32 = 0.5;
const ORBIT_THETA: f32 = -std::f32::consts::FRAC_PI_4;
const ORBIT_PHI: f32 = std::f32::consts::FRAC_PI_3;
const FRAMING_MARGIN: f32 = 1.6;

pub struct Camera {
    target: Vec3,
    radius: f32,
    aspect_ratio: f32,
    view_projection_matrix: Mat4,
}

impl Camera {
    pub fn new(aspect_ratio: f32) -> Self {
        let mut camera = Self {
            target: Vec3::ZERO,
            radius: 4.0,
            aspect_ratio,
            view_projection_matrix: Mat4::IDENTITY,
        };
        camera.update_matrices();
        camera
    }

    /// Centres the orbit on `bounds` at a distance that keeps the whole box in view.
    pub fn frame_bounds(&mut self, bounds: &Bounds) {
        let half_diagonal = bounds.half_extent().length();
        let half_fov = DEFAULT_FOV_DEGREES.to_radians() * 0.5;
        self.target = bounds.center;
        self.radius = (half_diagonal / half_fov.sin() * FRAMING_MARGIN).max(MIN_RADIUS);
        self.update_matrices();
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn view_projection_matrix(&self) -> [[f32; 4]; 4] {
        self.view_projection_matrix.to_cols_array_2d()
    }

    fn update_matrices(&mut self) {
        let position = self.calculate_eye_position();
        let view = Mat4::look_at_rh(position, self.target, UP_VECTOR);
        let projection = Mat4::perspective_rh(
            DEFAULT_FOV_DEGREES.to_radians(),
            self.aspect_ratio,
            NEAR_PLANE,
            FAR_PLANE,
        );
        self.view_projection_matrix = projection * view;
    }

    fn calculate_eye_position(&self) -> Vec3 {
        let sin_phi = ORBIT_PHI.sin();
        Vec3::new(
            self.target.x + self.radius * sin_phi * ORBIT_THETA.cos(),
            self.target.y + self.radius * ORBIT_PHI.cos(),
            self.target.z + self.radius * sin_phi * ORBIT_THETA.sin(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridResolution;

    #[test]
    fn test_frame_bounds_targets_centre() {
        let mut camera = Camera::new(1.0);
        let bounds = Bounds::for_grid(GridResolution::new(10).unwrap());
        camera.frame_bounds(&bounds);

        assert_eq!(camera.target(), Vec3::ZERO);
        assert!(camera.radius() > bounds.half_extent().length());
    }

    #[test]
    fn test_framed_matrix_is_finite() {
        let mut camera = Camera::new(16.0 / 9.0);
        camera.frame_bounds(&Bounds::for_grid(GridResolution::new(1000).unwrap()));
        for column in camera.view_projection_matrix() {
            assert!(column.iter().all(|v| v.is_finite()));
        }
    }
}
