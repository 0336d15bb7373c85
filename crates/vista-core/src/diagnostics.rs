//! Process-wide fire-once operator warnings.

use std::sync::atomic::{AtomicBool, Ordering};

/// Tracing target for deprecation notices.
pub const DEPRECATION_TARGET: &str = "vista::deprecation";

/// A warning that is emitted at most once per process.
///
/// Concurrent first calls race on a single compare-exchange, so exactly
/// one caller logs.
#[derive(Debug)]
pub struct OnceWarning {
    message: &'static str,
    fired: AtomicBool,
}

impl OnceWarning {
    pub const fn new(message: &'static str) -> Self {
        Self {
            message,
            fired: AtomicBool::new(false),
        }
    }

    /// Emit the warning unless it was already emitted.
    ///
    /// Returns `true` only for the call that actually logged.
    pub fn fire(&self) -> bool {
        let first = self
            .fired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if first {
            tracing::warn!(target: DEPRECATION_TARGET, "{}", self.message);
        }
        first
    }

    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    pub fn message(&self) -> &'static str {
        self.message
    }
}

/// Fired by the deprecated `PageContext::user_agent` accessor.
pub static USER_AGENT_DEPRECATION: OnceWarning = OnceWarning::new(
    "pageContext.userAgent is deprecated: use pageContext.headers['user-agent'] instead",
);
