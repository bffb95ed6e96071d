//! Transform of the container that carries the surface, and the scripted
//! path the headless demo moves it along.
//!
//! Rotation is kept as Euler angles in degrees, each wrapped by a remainder
//! of 360 (sign preserved), and composed Z first, then X, then Y.

use glam::{EulerRot, Mat4, Quat, Vec3};

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ContainerTransform {
    position: Vec3,
    euler_degrees: Vec3,
}

impl ContainerTransform {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            euler_degrees: Vec3::ZERO,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn translate(&mut self, offset: Vec3) {
        self.position += offset;
    }

    pub fn euler_degrees(&self) -> Vec3 {
        self.euler_degrees
    }

    pub fn increment_rotation(&mut self, x: f32, y: f32, z: f32) {
        let current = self.euler_degrees + Vec3::new(x, y, z);
        self.euler_degrees = Vec3::new(current.x % 360.0, current.y % 360.0, current.z % 360.0);
        log::debug!("Container rotation now {:?}", self.euler_degrees);
    }

    pub fn increment_rotation_x(&mut self, x: f32) {
        self.increment_rotation(x, 0.0, 0.0);
    }

    pub fn increment_rotation_y(&mut self, y: f32) {
        self.increment_rotation(0.0, y, 0.0);
    }

    pub fn increment_rotation_z(&mut self, z: f32) {
        self.increment_rotation(0.0, 0.0, z);
    }

    pub fn rotation(&self) -> Quat {
        let radians = Vec3::new(
            self.euler_degrees.x.to_radians(),
            self.euler_degrees.y.to_radians(),
            self.euler_degrees.z.to_radians(),
        );
        Quat::from_euler(EulerRot::YXZ, radians.y, radians.x, radians.z)
    }

    pub fn local_to_world(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation(), self.position)
    }
}

/// Container path sampled at frame times: a sway along X plus a constant
/// tilt rate around Z.
#[derive(Clone, Debug)]
pub struct ScriptedMotion {
    pub origin: Vec3,
    pub sway_amplitude: f32,
    pub sway_frequency: f32,
    pub tilt_degrees_per_second: f32,
}

impl ScriptedMotion {
    pub fn stationary(origin: Vec3) -> Self {
        Self::sway(origin, 0.0, 0.0)
    }

    pub fn sway(origin: Vec3, amplitude: f32, frequency: f32) -> Self {
        Self {
            origin,
            sway_amplitude: amplitude,
            sway_frequency: frequency,
            tilt_degrees_per_second: 0.0,
        }
    }

    pub fn with_tilt(mut self, degrees_per_second: f32) -> Self {
        self.tilt_degrees_per_second = degrees_per_second;
        self
    }

    pub fn position_at(&self, time: f32) -> Vec3 {
        let phase = std::f32::consts::TAU * self.sway_frequency * time;
        self.origin + Vec3::X * self.sway_amplitude * phase.sin()
    }

    /// Moves `transform` to the path position at `time` and tilts it by one
    /// frame's worth of rotation.
    pub fn apply(&self, transform: &mut ContainerTransform, time: f32, dt: f32) {
        transform.set_position(self.position_at(time));
        if self.tilt_degrees_per_second != 0.0 {
            transform.increment_rotation_z(self.tilt_degrees_per_second * dt);
        }
    }
}
