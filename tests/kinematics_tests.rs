use approx::assert_relative_eq;
use glam::Vec3;
use reactive_surface::{kinematics::KinematicEstimator, SurfaceError};

#[test]
fn test_stationary_body_has_no_motion() {
    let position = Vec3::new(1.0, 2.0, 3.0);
    let mut estimator = KinematicEstimator::new(position);
    let dt = 0.016;

    let mut previous = estimator.stillness();
    for _ in 0..10 {
        let sample = estimator.observe(position, dt).unwrap();
        assert_eq!(sample.velocity, Vec3::ZERO);
        assert_eq!(sample.acceleration, Vec3::ZERO);

        let stillness = estimator.stillness();
        assert!(stillness > previous, "stillness must grow while at rest");
        assert_relative_eq!(stillness - previous, dt, epsilon = 1e-6);
        previous = stillness;
    }
}

#[test]
fn test_constant_velocity_settles_to_zero_acceleration() {
    // Exactly representable steps keep the finite differences exact.
    let dt = 0.25;
    let mut estimator = KinematicEstimator::new(Vec3::ZERO);

    let first = estimator.observe(Vec3::new(1.0, 0.0, 0.0), dt).unwrap();
    assert_eq!(first.velocity, Vec3::new(4.0, 0.0, 0.0));
    assert_eq!(first.acceleration, Vec3::new(16.0, 0.0, 0.0));
    assert_eq!(estimator.stillness(), 0.0, "motion onset resets stillness");

    let second = estimator.observe(Vec3::new(2.0, 0.0, 0.0), dt).unwrap();
    assert_eq!(second.velocity, Vec3::new(4.0, 0.0, 0.0));
    assert_eq!(second.acceleration, Vec3::ZERO);
    assert_eq!(estimator.stillness(), 0.25);

    let third = estimator.observe(Vec3::new(3.0, 0.0, 0.0), dt).unwrap();
    assert_eq!(third.acceleration, Vec3::ZERO);
    assert_eq!(estimator.stillness(), 0.5);
}

#[test]
fn test_motion_after_rest_resets_stillness() {
    let mut estimator = KinematicEstimator::new(Vec3::ZERO);
    for _ in 0..3 {
        estimator.observe(Vec3::ZERO, 0.5).unwrap();
    }
    assert_eq!(estimator.stillness(), 1.5);

    estimator.observe(Vec3::new(0.0, 0.5, 0.0), 0.5).unwrap();
    assert_eq!(estimator.stillness(), 0.0);
}

#[test]
fn test_zero_dt_is_rejected_without_state_change() {
    let mut estimator = KinematicEstimator::new(Vec3::ZERO);
    estimator.observe(Vec3::ZERO, 0.5).unwrap();
    let before = estimator.sample();
    let stillness = estimator.stillness();

    let result = estimator.observe(Vec3::ONE, 0.0);
    assert!(matches!(result, Err(SurfaceError::DegenerateTimeStep(dt)) if dt == 0.0));
    assert_eq!(estimator.sample(), before);
    assert_eq!(estimator.stillness(), stillness);
}

#[test]
fn test_negative_and_non_finite_dt_are_rejected() {
    let mut estimator = KinematicEstimator::new(Vec3::ZERO);
    assert!(estimator.observe(Vec3::ONE, -0.016).is_err());
    assert!(estimator.observe(Vec3::ONE, f32::NAN).is_err());
    assert!(estimator.observe(Vec3::ONE, f32::INFINITY).is_err());
}

#[test]
fn test_reset_anchors_at_new_position() {
    let mut estimator = KinematicEstimator::new(Vec3::ZERO);
    estimator.observe(Vec3::new(1.0, 0.0, 0.0), 0.5).unwrap();
    estimator.observe(Vec3::new(3.0, 0.0, 0.0), 0.5).unwrap();

    let anchor = Vec3::new(10.0, 0.0, 0.0);
    estimator.reset(anchor);
    let sample = estimator.sample();
    assert_eq!(sample.position, anchor);
    assert_eq!(sample.velocity, Vec3::ZERO);
    assert_eq!(sample.acceleration, Vec3::ZERO);
    assert_eq!(estimator.stillness(), 0.0);

    // Staying at the anchor is seen as rest, not as a jump.
    let next = estimator.observe(anchor, 0.5).unwrap();
    assert_eq!(next.acceleration, Vec3::ZERO);
}
