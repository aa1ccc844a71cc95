//! Pipeline - runs the assembly stages in order over one batch of events
//!
//! Filter -> Dedup -> Signals -> Sort/Assemble -> Merge -> Gaps. Every stage
//! is total; the only failures live at the IO boundary.

use crate::domain::event::{EventRef, TravelEvent};
use crate::domain::visit::{CityVisit, Gap};
use crate::infra::config::Config;
use crate::infra::metrics::RunMetrics;
use crate::services::assembler::VisitAssembler;
use crate::services::dedup::Deduplicator;
use crate::services::filter::filter_events;
use crate::services::gap_detector::detect_gaps;
use crate::services::merger::merge_consecutive;
use crate::services::signals::events_to_signals;
use std::rc::Rc;
use tracing::info;

/// Everything one run produces
#[derive(Debug)]
pub struct PipelineOutput {
    /// Chronological visits
    pub visits: Vec<CityVisit>,
    pub gaps: Vec<Gap>,
    /// Deduplicated events, shared with the visits that cite them
    pub events: Vec<EventRef>,
    pub metrics: RunMetrics,
}

impl PipelineOutput {
    /// Unique visited cities, sorted
    pub fn cities_visited(&self) -> Vec<String> {
        let mut cities: Vec<String> = self.visits.iter().map(|v| v.city.clone()).collect();
        cities.sort();
        cities.dedup();
        cities
    }
}

pub struct Pipeline {
    config: Config,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run every stage over `events`
    pub fn run(&self, events: Vec<TravelEvent>) -> PipelineOutput {
        let mut metrics = RunMetrics::new();
        metrics.events_loaded = events.len();

        let (events, filtered) = filter_events(events, &self.config);
        metrics.events_filtered_traveler = filtered.traveler;
        metrics.events_filtered_cancelled = filtered.cancelled;
        if filtered.traveler + filtered.cancelled > 0 {
            info!(
                traveler = %filtered.traveler,
                cancelled = %filtered.cancelled,
                remaining = %events.len(),
                "events_filtered"
            );
        }

        let events: Vec<EventRef> =
            Deduplicator::new(&self.config).deduplicate(events).into_iter().map(Rc::new).collect();
        metrics.events_deduped = events.len();

        let signals = events_to_signals(&events);
        metrics.signals_generated = signals.len();

        let visits = VisitAssembler::assemble(&self.config, signals);
        metrics.visits_assembled = visits.len();

        let visits = merge_consecutive(visits, &self.config);
        metrics.visits_merged = visits.len();

        let (visits, gaps) = detect_gaps(visits, &self.config);
        metrics.gaps_detected = gaps.len();
        metrics.finish();

        info!(visits = %visits.len(), gaps = %gaps.len(), "timeline_built");

        PipelineOutput { visits, gaps, events, metrics }
    }
}

/// Events to merged visits, without filtering or gap detection
pub fn build_timeline(events: &[EventRef], config: &Config) -> Vec<CityVisit> {
    let visits = VisitAssembler::assemble(config, events_to_signals(events));
    merge_consecutive(visits, config)
}
