//! Span helpers.

use tracing::{info_span, Span};

/// Span covering generation of one workflow.
pub fn workflow_span(name: &str) -> Span {
    info_span!("workflow", name = %name)
}

/// Span covering one pipeline stage.
pub fn stage_span(stage: &str) -> Span {
    info_span!("stage", name = %stage)
}

/// Span covering one movie's jobs.
pub fn movie_span(basename: &str) -> Span {
    info_span!("movie", basename = %basename)
}

/// Timing utility for operations.
pub struct Timer {
    start: std::time::Instant,
    operation: &'static str,
}

impl Timer {
    /// Start a new timer.
    pub fn start(operation: &'static str) -> Self {
        Self {
            start: std::time::Instant::now(),
            operation,
        }
    }

    /// Complete the timer and record duration.
    pub fn finish(self) -> std::time::Duration {
        let duration = self.start.elapsed();
        tracing::debug!(
            operation = %self.operation,
            duration_ms = %duration.as_millis(),
            "operation completed"
        );
        duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_measures() {
        let timer = Timer::start("noop");
        let elapsed = timer.finish();
        assert!(elapsed.as_secs() < 5);
    }

    #[test]
    fn test_spans_construct_without_subscriber() {
        let _ = workflow_span("motioncor2");
        let _ = stage_span("gain_prep");
        let _ = movie_span("FoilHole_1");
    }
}
