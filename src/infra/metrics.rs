//! Per-run counters for the itinerary pipeline
//!
//! One pipeline run processes one batch synchronously, so these are plain
//! counters filled in stage by stage and logged once at the end.

use std::time::{Duration, Instant};
use tracing::info;

/// Stage-by-stage counts for a single pipeline run
#[derive(Debug, Clone)]
pub struct RunMetrics {
    started_at: Instant,
    pub events_loaded: usize,
    pub events_filtered_traveler: usize,
    pub events_filtered_cancelled: usize,
    pub events_deduped: usize,
    pub signals_generated: usize,
    pub visits_assembled: usize,
    pub visits_merged: usize,
    pub gaps_detected: usize,
    elapsed: Option<Duration>,
}

impl RunMetrics {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            events_loaded: 0,
            events_filtered_traveler: 0,
            events_filtered_cancelled: 0,
            events_deduped: 0,
            signals_generated: 0,
            visits_assembled: 0,
            visits_merged: 0,
            gaps_detected: 0,
            elapsed: None,
        }
    }

    /// Freeze the run duration
    pub fn finish(&mut self) {
        self.elapsed = Some(self.started_at.elapsed());
    }

    /// Duration of the run, or time since start if not finished
    pub fn elapsed(&self) -> Duration {
        self.elapsed.unwrap_or_else(|| self.started_at.elapsed())
    }

    /// Events collapsed into another booking by dedup
    pub fn duplicates_removed(&self) -> usize {
        let kept = self
            .events_loaded
            .saturating_sub(self.events_filtered_traveler + self.events_filtered_cancelled);
        kept.saturating_sub(self.events_deduped)
    }

    pub fn log(&self) {
        info!(
            events_loaded = %self.events_loaded,
            filtered_traveler = %self.events_filtered_traveler,
            filtered_cancelled = %self.events_filtered_cancelled,
            events_deduped = %self.events_deduped,
            duplicates_removed = %self.duplicates_removed(),
            signals = %self.signals_generated,
            visits_assembled = %self.visits_assembled,
            visits = %self.visits_merged,
            gaps = %self.gaps_detected,
            elapsed_ms = %self.elapsed().as_millis(),
            "run_summary"
        );
    }
}

impl Default for RunMetrics {
    fn default() -> Self {
        Self::new()
    }
}
