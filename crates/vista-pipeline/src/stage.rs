//! Stage ordering.

use vista_core::HookStage;

/// Order in which a run invokes hooks. Stages never overlap.
pub const PIPELINE_STAGES: [HookStage; 3] = [HookStage::Guard, HookStage::Data, HookStage::Render];

/// What the pipeline does after a stage completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageFlow {
    /// Run the next stage.
    Continue,
    /// Stop; the page context already holds the final response.
    Halt,
}

impl StageFlow {
    pub fn is_halt(&self) -> bool {
        matches!(self, Self::Halt)
    }
}
