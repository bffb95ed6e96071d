//! In-memory stages that record every call, for driving the simulation
//! without a GPU.

use crate::compute::SurfaceParameters;
use crate::error::{SurfaceError, SurfaceResult};
use crate::stage::{ComputeStage, DispatchSize, InstancedDraw, Kernel, RenderStage};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum StageEvent {
    Allocate { capacity: u32 },
    Parameters(SurfaceParameters),
    Dispatch { kernel: Kernel, size: DispatchSize, buffers: u32 },
    Drain,
    Release { buffers: u32 },
}

/// Handle standing in for the three GPU buffers.
#[derive(Debug, PartialEq, Eq)]
pub struct RecordedBuffers {
    pub id: u32,
    pub capacity: u32,
}

/// Shared view of a stage's event log. Stays readable after the stage
/// (or the driver owning it) has been dropped.
#[derive(Clone, Debug, Default)]
pub struct StageJournal {
    events: Rc<RefCell<Vec<StageEvent>>>,
    live: Rc<RefCell<Vec<u32>>>,
}

impl StageJournal {
    pub fn events(&self) -> Vec<StageEvent> {
        self.events.borrow().clone()
    }

    /// Buffer sets allocated and not yet released.
    pub fn live_buffers(&self) -> Vec<u32> {
        self.live.borrow().clone()
    }

    fn push(&self, event: StageEvent) {
        self.events.borrow_mut().push(event);
    }
}

#[derive(Debug, Default)]
pub struct RecordingComputeStage {
    journal: StageJournal,
    next_id: u32,
    pub fail_allocate: bool,
    pub fail_dispatch: bool,
    pub fail_drain: bool,
}

impl RecordingComputeStage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn journal(&self) -> StageJournal {
        self.journal.clone()
    }

    pub fn events(&self) -> Vec<StageEvent> {
        self.journal.events()
    }

    pub fn clear(&mut self) {
        self.journal.events.borrow_mut().clear();
    }

    pub fn live_buffers(&self) -> Vec<u32> {
        self.journal.live_buffers()
    }

    pub fn dispatches(&self) -> Vec<(Kernel, DispatchSize)> {
        self.journal
            .events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                StageEvent::Dispatch { kernel, size, .. } => Some((*kernel, *size)),
                _ => None,
            })
            .collect()
    }

    pub fn last_parameters(&self) -> Option<SurfaceParameters> {
        self.journal.events.borrow().iter().rev().find_map(|event| match event {
            StageEvent::Parameters(parameters) => Some(*parameters),
            _ => None,
        })
    }
}

impl ComputeStage for RecordingComputeStage {
    type Buffers = RecordedBuffers;

    fn allocate(&mut self, capacity: u32) -> SurfaceResult<RecordedBuffers> {
        if self.fail_allocate {
            return Err(SurfaceError::Gpu("allocation refused".into()));
        }
        self.next_id += 1;
        self.journal.live.borrow_mut().push(self.next_id);
        self.journal.push(StageEvent::Allocate { capacity });
        Ok(RecordedBuffers {
            id: self.next_id,
            capacity,
        })
    }

    fn write_parameters(&mut self, parameters: &SurfaceParameters) -> SurfaceResult<()> {
        self.journal.push(StageEvent::Parameters(*parameters));
        Ok(())
    }

    fn dispatch(
        &mut self,
        kernel: Kernel,
        buffers: &RecordedBuffers,
        size: DispatchSize,
    ) -> SurfaceResult<()> {
        if self.fail_dispatch {
            return Err(SurfaceError::Gpu("dispatch refused".into()));
        }
        self.journal.push(StageEvent::Dispatch {
            kernel,
            size,
            buffers: buffers.id,
        });
        Ok(())
    }

    fn drain(&mut self) -> SurfaceResult<()> {
        self.journal.push(StageEvent::Drain);
        if self.fail_drain {
            return Err(SurfaceError::Gpu("device lost".into()));
        }
        Ok(())
    }

    fn release(&mut self, buffers: RecordedBuffers) {
        self.journal.live.borrow_mut().retain(|id| *id != buffers.id);
        self.journal.push(StageEvent::Release { buffers: buffers.id });
    }
}

#[derive(Debug, Default)]
pub struct RecordingRenderer {
    draws: Vec<(u32, InstancedDraw)>,
    pub fail_draw: bool,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer id and descriptor of every draw, in order.
    pub fn draws(&self) -> &[(u32, InstancedDraw)] {
        &self.draws
    }
}

impl RenderStage<RecordedBuffers> for RecordingRenderer {
    fn draw(&mut self, buffers: &RecordedBuffers, draw: &InstancedDraw) -> SurfaceResult<()> {
        if self.fail_draw {
            return Err(SurfaceError::Gpu("draw refused".into()));
        }
        self.draws.push((buffers.id, *draw));
        Ok(())
    }
}
