use approx::assert_relative_eq;
use glam::Vec3;
use reactive_surface::{force::ForceBlender, SmoothingLaw, SurfaceConfig, SurfaceError};

const GRAVITY: Vec3 = Vec3::new(0.0, -10.0, 0.0);

#[test]
fn test_raw_force_at_rest_opposes_gravity() {
    let blender = ForceBlender::new(GRAVITY, 2.5, 1000, SmoothingLaw::RawDelta).unwrap();
    assert_eq!(blender.raw_force(Vec3::ZERO), Vec3::new(0.0, 25.0, 0.0));
}

#[test]
fn test_raw_force_attenuates_acceleration() {
    let blender = ForceBlender::new(GRAVITY, 1.0, 1, SmoothingLaw::RawDelta).unwrap();
    let force = blender.raw_force(Vec3::new(4.0, 0.0, 0.0));
    // divisor is correction + 1
    assert_eq!(force, Vec3::new(2.0, 10.0, 0.0));
}

#[test]
fn test_zero_correction_uses_unit_divisor() {
    let blender = ForceBlender::new(Vec3::ZERO, 1.0, 0, SmoothingLaw::RawDelta).unwrap();
    assert_eq!(blender.raw_force(Vec3::new(3.0, 0.0, 0.0)), Vec3::new(3.0, 0.0, 0.0));
}

#[test]
fn test_initial_normal_opposes_gravity() {
    let blender = ForceBlender::from_config(&SurfaceConfig::default()).unwrap();
    assert_eq!(blender.normal(), Vec3::new(0.0, 10.0, 0.0));
}

#[test]
fn test_raw_delta_converges_geometrically() {
    let density = 3.0;
    let dt = 0.1;
    let mut blender = ForceBlender::new(GRAVITY, density, 1000, SmoothingLaw::RawDelta).unwrap();
    let target = -density * GRAVITY;

    let mut error = (blender.normal() - target).length();
    for _ in 0..50 {
        let blended = blender.blend(Vec3::ZERO, dt);
        assert_eq!(blended.raw, target);
        let next_error = (blended.smoothed - target).length();
        assert_relative_eq!(next_error, error * (1.0 - dt), max_relative = 1e-4);
        error = next_error;
    }
    assert!(error < 0.2);
}

#[test]
fn test_raw_delta_overshoots_for_large_dt() {
    let mut blender = ForceBlender::new(GRAVITY, 2.0, 1000, SmoothingLaw::RawDelta).unwrap();
    // normal starts at (0,10,0), raw force is (0,20,0); factor 1.5 lands past it
    let blended = blender.blend(Vec3::ZERO, 1.5);
    assert_relative_eq!(blended.smoothed.y, 25.0, epsilon = 1e-4);
}

#[test]
fn test_clamped_delta_does_not_overshoot() {
    let mut blender = ForceBlender::new(GRAVITY, 2.0, 1000, SmoothingLaw::ClampedDelta).unwrap();
    let blended = blender.blend(Vec3::ZERO, 1.5);
    assert_relative_eq!(blended.smoothed.y, 20.0, epsilon = 1e-4);
}

#[test]
fn test_time_constant_factor() {
    let law = SmoothingLaw::TimeConstant { tau: 0.5 };
    assert_relative_eq!(law.factor(0.5), 1.0 - (-1.0f32).exp(), epsilon = 1e-6);
    assert!(law.factor(100.0) <= 1.0);

    let mut blender = ForceBlender::new(GRAVITY, 2.0, 1000, law).unwrap();
    let blended = blender.blend(Vec3::ZERO, 0.5);
    let expected = 10.0 + (20.0 - 10.0) * (1.0 - (-1.0f32).exp());
    assert_relative_eq!(blended.smoothed.y, expected, epsilon = 1e-4);
}

#[test]
fn test_axes_blend_independently() {
    let mut blender = ForceBlender::new(GRAVITY, 1.0, 1, SmoothingLaw::RawDelta).unwrap();
    let blended = blender.blend(Vec3::new(8.0, 0.0, -4.0), 0.5);
    // raw = (4, 10, -2); normal starts at (0, 10, 0)
    assert_eq!(blended.raw, Vec3::new(4.0, 10.0, -2.0));
    assert_relative_eq!(blended.smoothed.x, 2.0, epsilon = 1e-6);
    assert_relative_eq!(blended.smoothed.y, 10.0, epsilon = 1e-6);
    assert_relative_eq!(blended.smoothed.z, -1.0, epsilon = 1e-6);
}

#[test]
fn test_reset_restores_rest_normal() {
    let mut blender = ForceBlender::new(GRAVITY, 1.0, 1, SmoothingLaw::RawDelta).unwrap();
    blender.blend(Vec3::new(100.0, 0.0, 0.0), 0.5);
    assert_ne!(blender.normal(), -GRAVITY);
    blender.reset();
    assert_eq!(blender.normal(), -GRAVITY);
}

#[test]
fn test_non_positive_time_constant_rejected() {
    for tau in [0.0, -0.1, f32::NAN, f32::INFINITY] {
        let result = ForceBlender::new(GRAVITY, 2.0, 1000, SmoothingLaw::TimeConstant { tau });
        assert!(
            matches!(result, Err(SurfaceError::InvalidConfig(_))),
            "tau {} should be rejected",
            tau
        );
    }
}
