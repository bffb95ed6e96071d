use reactive_surface::{
    config::GridResolution,
    field::SurfaceField,
    stage::{DispatchSize, Kernel},
    test_utils::{RecordedBuffers, RecordingComputeStage, StageEvent},
    SurfaceError,
};

#[test]
fn test_allocate_at_full_capacity() {
    let mut stage = RecordingComputeStage::new();
    let mut field: SurfaceField<RecordedBuffers> = SurfaceField::new();
    assert!(!field.is_allocated());

    field.allocate(&mut stage).unwrap();
    assert!(field.is_allocated());
    assert_eq!(field.buffers().unwrap().capacity, 1_000_000);
    assert_eq!(stage.events(), vec![StageEvent::Allocate { capacity: 1_000_000 }]);
}

#[test]
fn test_double_allocate_is_rejected() {
    let mut stage = RecordingComputeStage::new();
    let mut field = SurfaceField::new();
    field.allocate(&mut stage).unwrap();

    assert!(matches!(field.allocate(&mut stage), Err(SurfaceError::AlreadyAllocated)));
    assert_eq!(stage.live_buffers().len(), 1, "no second buffer set may leak");
}

#[test]
fn test_release_drains_first() {
    let mut stage = RecordingComputeStage::new();
    let mut field = SurfaceField::new();
    field.allocate(&mut stage).unwrap();
    stage.clear();

    field.release(&mut stage).unwrap();
    assert_eq!(stage.events(), vec![StageEvent::Drain, StageEvent::Release { buffers: 1 }]);
    assert!(stage.live_buffers().is_empty());
    assert!(!field.is_allocated());
}

#[test]
fn test_use_after_release_is_rejected() {
    let mut stage = RecordingComputeStage::new();
    let mut field = SurfaceField::new();
    field.allocate(&mut stage).unwrap();
    field.release(&mut stage).unwrap();

    let size = DispatchSize { x: 1, y: 1, z: 1 };
    assert!(matches!(
        field.dispatch(&mut stage, Kernel::React, size),
        Err(SurfaceError::NotAllocated)
    ));
    assert!(matches!(field.buffers(), Err(SurfaceError::NotAllocated)));
    assert!(matches!(field.release(&mut stage), Err(SurfaceError::NotAllocated)));
}

#[test]
fn test_failed_drain_still_releases() {
    let mut stage = RecordingComputeStage::new();
    let mut field = SurfaceField::new();
    field.allocate(&mut stage).unwrap();
    stage.fail_drain = true;

    assert!(matches!(field.release(&mut stage), Err(SurfaceError::Gpu(_))));
    assert!(!field.is_allocated());
    assert!(stage.live_buffers().is_empty());
}

#[test]
fn test_reallocate_after_release() {
    let mut stage = RecordingComputeStage::new();
    let mut field = SurfaceField::new();
    field.allocate(&mut stage).unwrap();
    field.release(&mut stage).unwrap();
    field.allocate(&mut stage).unwrap();
    assert_eq!(field.buffers().unwrap().id, 2);
}

#[test]
fn test_initialize_dispatches_init_kernel() {
    let mut stage = RecordingComputeStage::new();
    let mut field = SurfaceField::new();
    field.allocate(&mut stage).unwrap();

    let resolution = GridResolution::new(20).unwrap();
    field
        .initialize(&mut stage, resolution, resolution.step(), 8)
        .unwrap();

    let parameters = stage.last_parameters().unwrap();
    assert_eq!(parameters.resolution, 20);
    assert_eq!(parameters.step, 0.1);
    assert_eq!(
        stage.dispatches(),
        vec![(Kernel::Init, DispatchSize { x: 3, y: 3, z: 1 })]
    );
}

#[test]
fn test_initialize_without_buffers() {
    let mut stage = RecordingComputeStage::new();
    let field: SurfaceField<RecordedBuffers> = SurfaceField::new();
    let resolution = GridResolution::new(10).unwrap();
    assert!(matches!(
        field.initialize(&mut stage, resolution, resolution.step(), 1),
        Err(SurfaceError::NotAllocated)
    ));
    assert!(stage.events().is_empty());
}
