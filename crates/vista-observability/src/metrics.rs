//! Per-run render metrics.

use std::collections::BTreeMap;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use vista_core::{HookStage, RequestId, ResponderPhase, TimingContext};

/// Final metrics for a single run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderSummary {
    /// Request ID for correlation.
    pub request_id: String,
    /// URL as received.
    pub url: String,
    /// Matched page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_id: Option<String>,
    /// Terminal responder phase.
    pub phase: String,
    /// Stage durations (microseconds), keyed by stage name.
    pub stages_us: BTreeMap<String, u64>,
    /// HTTP status code written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Body bytes written.
    pub bytes_written: usize,
    /// Total duration (microseconds).
    pub total_duration_us: u64,
}

impl RenderSummary {
    /// Format as a human-readable summary.
    pub fn to_summary(&self) -> String {
        let mut s = format!(
            "[{}] {} -> {}",
            self.request_id, self.url, self.phase
        );
        if let Some(page_id) = &self.page_id {
            s.push_str(&format!(" page={}", page_id));
        }
        if let Some(status) = self.status_code {
            s.push_str(&format!(" status={}", status));
        }
        for (stage, us) in &self.stages_us {
            s.push_str(&format!(" {}={}us", stage, us));
        }
        s.push_str(&format!(
            " bytes={} total={}us",
            self.bytes_written, self.total_duration_us
        ));
        s
    }
}

/// Collector for a single run's metrics.
#[derive(Debug)]
pub struct RenderMetrics {
    request_id: RequestId,
    url: String,
    page_id: Option<String>,
    start: Instant,
    stages_us: BTreeMap<String, u64>,
    status_code: Option<u16>,
    bytes_written: usize,
}

impl RenderMetrics {
    /// Create a new metrics collector.
    pub fn new(request_id: RequestId, url: impl Into<String>) -> Self {
        Self {
            request_id,
            url: url.into(),
            page_id: None,
            start: Instant::now(),
            stages_us: BTreeMap::new(),
            status_code: None,
            bytes_written: 0,
        }
    }

    /// Set the matched page.
    pub fn set_page(&mut self, page_id: impl Into<String>) {
        self.page_id = Some(page_id.into());
    }

    /// Copy hook stage durations out of a run's timing context.
    pub fn record_stages(&mut self, timing: &TimingContext) {
        for stage in [HookStage::Guard, HookStage::Data, HookStage::Render] {
            if let Some(t) = timing.stage_timing(stage) {
                self.stages_us
                    .insert(stage.to_string(), t.duration.as_micros() as u64);
            }
        }
    }

    /// Record the status code written.
    pub fn record_status(&mut self, status_code: u16) {
        self.status_code = Some(status_code);
    }

    /// Record body bytes written.
    pub fn record_bytes(&mut self, count: usize) {
        self.bytes_written += count;
    }

    /// Finish the run and build the summary.
    pub fn finalize(&self, phase: ResponderPhase) -> RenderSummary {
        RenderSummary {
            request_id: self.request_id.to_string(),
            url: self.url.clone(),
            page_id: self.page_id.clone(),
            phase: phase.to_string(),
            stages_us: self.stages_us.clone(),
            status_code: self.status_code,
            bytes_written: self.bytes_written,
            total_duration_us: self.start.elapsed().as_micros() as u64,
        }
    }

    /// Finish the run and emit the summary as a debug event.
    pub fn emit(&self, phase: ResponderPhase) -> RenderSummary {
        let summary = self.finalize(phase);
        tracing::debug!(
            request_id = %summary.request_id,
            url = %summary.url,
            page_id = summary.page_id.as_deref(),
            phase = %summary.phase,
            status = summary.status_code,
            bytes = summary.bytes_written,
            total_us = summary.total_duration_us,
            "render finished"
        );
        summary
    }
}
