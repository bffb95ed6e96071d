pub mod recording;

pub use recording::{
    RecordedBuffers, RecordingComputeStage, RecordingRenderer, StageEvent, StageJournal,
};
