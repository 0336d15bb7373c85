//! Run lifecycle tracking.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use crate::page::HookStage;

/// Phases of the SSR responder state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponderPhase {
    /// Matching the URL to a page.
    Resolving,
    /// Hooks are executing.
    PipelineRunning,
    /// Status, headers and body are being written.
    Responding,
    /// The request was handed back to the host.
    PassThrough,
    /// An error occurred after headers were sent.
    Failed,
}

impl ResponderPhase {
    /// Whether no further transition can happen.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::PassThrough | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resolving => "resolving",
            Self::PipelineRunning => "pipeline_running",
            Self::Responding => "responding",
            Self::PassThrough => "pass_through",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ResponderPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timing context for observability.
#[derive(Debug, Clone)]
pub struct TimingContext {
    start: Instant,
    marks: HashMap<String, Instant>,
}

impl TimingContext {
    /// Create a new timing context.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            marks: HashMap::new(),
        }
    }

    /// Record a timing mark.
    pub fn mark(&mut self, name: &str) {
        self.marks.insert(name.to_string(), Instant::now());
    }

    /// Mark stage start.
    pub fn mark_stage_start(&mut self, stage: HookStage) {
        self.mark(&format!("stage_{}_start", stage));
    }

    /// Mark stage end.
    pub fn mark_stage_end(&mut self, stage: HookStage) {
        self.mark(&format!("stage_{}_end", stage));
    }

    /// Get elapsed time since start.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Time from start to a named mark.
    pub fn since_start(&self, name: &str) -> Option<Duration> {
        self.marks.get(name).map(|t| t.duration_since(self.start))
    }

    /// Get timing for a specific stage.
    pub fn stage_timing(&self, stage: HookStage) -> Option<StageTiming> {
        let start = self.marks.get(&format!("stage_{}_start", stage))?;
        let end = self.marks.get(&format!("stage_{}_end", stage))?;

        Some(StageTiming {
            stage,
            start: start.duration_since(self.start),
            duration: end.duration_since(*start),
        })
    }
}

impl Default for TimingContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Timing information for a hook stage.
#[derive(Debug, Clone)]
pub struct StageTiming {
    pub stage: HookStage,
    /// Time from run start to stage start.
    pub start: Duration,
    /// Stage duration.
    pub duration: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_timing_requires_both_marks() {
        let mut timing = TimingContext::new();
        timing.mark_stage_start(HookStage::Data);
        assert!(timing.stage_timing(HookStage::Data).is_none());

        timing.mark_stage_end(HookStage::Data);
        let stage = timing.stage_timing(HookStage::Data).unwrap();
        assert_eq!(stage.stage, HookStage::Data);
        assert!(timing.stage_timing(HookStage::Render).is_none());
    }

    #[test]
    fn test_since_start() {
        let mut timing = TimingContext::new();
        assert!(timing.since_start("resolved").is_none());
        timing.mark("resolved");
        assert!(timing.since_start("resolved").is_some());
    }

    #[test]
    fn test_terminal_phases() {
        assert!(ResponderPhase::PassThrough.is_terminal());
        assert!(ResponderPhase::Failed.is_terminal());
        assert!(!ResponderPhase::Responding.is_terminal());
        assert_eq!(ResponderPhase::PipelineRunning.to_string(), "pipeline_running");
    }
}
