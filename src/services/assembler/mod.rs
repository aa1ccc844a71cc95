//! Visit assembly - walks sorted signals and emits city visits
//!
//! The assembler is a two-state machine: either no visit is open, or one
//! visit is open and accumulating evidence. ENTER opens visits, EXIT closes
//! them, PRESENT corroborates or (when strong enough) overrides.
//!
//! Visits are emitted in the order they close, which for sorted input is
//! chronological.

mod handlers;

use crate::domain::signal::{CitySignal, SignalType};
use crate::domain::visit::{CityVisit, NOTE_NO_EXIT};
use crate::infra::config::Config;
use crate::services::signals::sort_signals;
use tracing::{debug, trace};

/// Assembler state between signals
#[derive(Debug, Default)]
pub(crate) enum VisitState {
    #[default]
    NoOpenVisit,
    Open(CityVisit),
}

/// Single-pass signal walker producing city visits
pub struct VisitAssembler {
    /// Current state of the walk
    pub(crate) state: VisitState,
    /// Visits closed so far, in close order
    pub(crate) visits: Vec<CityVisit>,
    /// PRESENT signals at or above this strength end a visit elsewhere
    pub(crate) override_strength: f64,
}

impl VisitAssembler {
    pub fn new(config: &Config) -> Self {
        Self {
            state: VisitState::NoOpenVisit,
            visits: Vec::new(),
            override_strength: config.present_override_strength(),
        }
    }

    /// Sort the signals, walk them, and return finalized visits
    pub fn assemble(config: &Config, mut signals: Vec<CitySignal>) -> Vec<CityVisit> {
        if signals.is_empty() {
            return Vec::new();
        }
        sort_signals(&mut signals);

        let mut assembler = Self::new(config);
        for signal in signals {
            assembler.process_signal(signal);
        }
        assembler.finish()
    }

    /// Process a single signal, dispatching to the appropriate handler.
    ///
    /// Signals must arrive in sorted order.
    pub fn process_signal(&mut self, signal: CitySignal) {
        trace!(
            signal = %signal.signal_type.as_str(),
            city = %signal.city,
            dt = %signal.dt,
            strength = %signal.strength,
            "signal_received"
        );
        match signal.signal_type {
            SignalType::Enter => self.handle_enter(signal),
            SignalType::Exit => self.handle_exit(signal),
            SignalType::Present => self.handle_present(signal),
        }
    }

    /// Whether a visit is currently open
    pub fn has_open_visit(&self) -> bool {
        matches!(self.state, VisitState::Open(_))
    }

    /// Close any open visit, attach bookings and score every visit
    pub fn finish(mut self) -> Vec<CityVisit> {
        if let VisitState::Open(mut visit) = std::mem::take(&mut self.state) {
            if visit.exit_date.is_none() {
                visit.add_note(NOTE_NO_EXIT);
            }
            debug!(city = %visit.city, "visit_left_open");
            self.visits.push(visit);
        }

        for visit in &mut self.visits {
            visit.collect_bookings();
            visit.confidence = visit.score_confidence();
        }

        debug!(visits = %self.visits.len(), "assembly_complete");
        self.visits
    }

    /// Emit a finished visit
    pub(crate) fn emit(&mut self, visit: CityVisit) {
        debug!(
            city = %visit.city,
            enter = ?visit.enter_date,
            exit = ?visit.exit_date,
            exit_method = %visit.exit_method,
            "visit_closed"
        );
        self.visits.push(visit);
    }
}
