use std::time::Duration;

/// Tuning knobs for the orchestrator's poll loop.
#[derive(Debug, Clone)]
pub struct OrchestratorTuning {
    /// Fixed cadence between status polls while the job is processing.
    pub poll_interval: Duration,
    /// Consecutive transient poll failures tolerated before the attempt is
    /// declared failed. Resets on any successful poll.
    pub max_transient_poll_failures: u32,
    /// Overall per-attempt budget; exceeding it fails the attempt with a
    /// timeout-specific diagnostic.
    pub max_wait: Duration,
}

impl Default for OrchestratorTuning {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(3),
            max_transient_poll_failures: 3,
            max_wait: Duration::from_secs(300),
        }
    }
}
